//! Index records and entry payloads.
//!
//! # Index record
//! ```text
//! [2 bytes] Key length (big-endian u16)
//! [N bytes] Key (UTF-8 collation key)
//! [4|8]     Offset of the data record, relative to the end of the data header
//! [4 bytes] Stored payload length
//! ```
//!
//! # Entry payload (before compression)
//! ```text
//! display_form   u16 len + UTF-8
//! pos            u8
//! translit       u8 flag [+ u16 len + UTF-8]
//! sense_count    u16
//!   gloss          u32 len + UTF-8
//!   source         u8
//!   example_count  u16
//!     text           u16 len + UTF-8
//!     translation    u8 flag [+ u16 len + UTF-8]
//! ```

use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::lexicon::types::error::{LexiconError, Result};
use crate::lexicon::types::models::{Entry, Example, OffsetWidth, PartOfSpeech, Sense, SourceTag};
use crate::lexicon::utils;

/// One `(key, offset, length)` triple of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub key: String,
    pub offset: u64,
    pub length: u32,
}

impl IndexRecord {
    pub fn write<W: Write>(&self, out: &mut W, offset_width: OffsetWidth) -> Result<()> {
        if self.key.is_empty() {
            return Err(LexiconError::InvalidFormat("Empty index key".to_string()));
        }
        utils::write_text(out, &self.key, 2, "key")?;
        utils::write_number(out, self.offset, offset_width.bytes())?;
        out.write_u32::<BigEndian>(self.length)?;
        Ok(())
    }

    pub fn read<R: Read>(input: &mut R, offset_width: OffsetWidth) -> Result<Self> {
        let key = utils::read_text(input, 2)?;
        let offset = utils::read_number(input, offset_width.bytes())?;
        let length = input.read_u32::<BigEndian>()?;
        Ok(Self { key, offset, length })
    }
}

/// The decoded content of one data record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryRecord {
    pub display_form: String,
    pub part_of_speech: PartOfSpeech,
    pub transliteration: Option<String>,
    pub senses: Vec<Sense>,
}

/// Serializes `entry` into an uncompressed payload.
///
/// `extra_examples` are appended to the first sense, skipping any it already
/// carries.
pub fn encode_entry(entry: &Entry, extra_examples: &[Example]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(64 + entry.senses.iter().map(|s| s.gloss.len() + 8).sum::<usize>());
    utils::write_text(&mut out, &entry.display_form, 2, "display_form")?;
    out.write_u8(entry.part_of_speech as u8)?;
    utils::write_optional_text(&mut out, entry.transliteration.as_deref(), 2, "transliteration")?;
    out.write_u16::<BigEndian>(utils::count_u16(entry.senses.len(), "sense_count")?)?;

    for (i, sense) in entry.senses.iter().enumerate() {
        utils::write_text(&mut out, &sense.gloss, 4, "gloss")?;
        out.write_u8(sense.source as u8)?;

        let extra: Vec<&Example> = if i == 0 {
            extra_examples.iter().filter(|ex| !sense.examples.contains(ex)).collect()
        } else {
            Vec::new()
        };
        let count = utils::count_u16(sense.examples.len() + extra.len(), "example_count")?;
        out.write_u16::<BigEndian>(count)?;
        for example in sense.examples.iter().chain(extra) {
            utils::write_text(&mut out, &example.text, 2, "example")?;
            utils::write_optional_text(&mut out, example.translation.as_deref(), 2, "example_translation")?;
        }
    }
    Ok(out)
}

/// Parses an uncompressed payload.
pub fn decode_entry(payload: &[u8]) -> Result<DictionaryRecord> {
    let mut input = Cursor::new(payload);
    let display_form = utils::read_text(&mut input, 2)?;
    let part_of_speech = PartOfSpeech::try_from(input.read_u8()?)?;
    let transliteration = utils::read_optional_text(&mut input, 2)?;
    let sense_count = input.read_u16::<BigEndian>()?;

    let mut senses = Vec::with_capacity(sense_count as usize);
    for _ in 0..sense_count {
        let gloss = utils::read_text(&mut input, 4)?;
        let source = SourceTag::try_from(input.read_u8()?)?;
        let example_count = input.read_u16::<BigEndian>()?;
        let mut examples = Vec::with_capacity(example_count as usize);
        for _ in 0..example_count {
            let text = utils::read_text(&mut input, 2)?;
            let translation = utils::read_optional_text(&mut input, 2)?;
            examples.push(Example { text, translation });
        }
        senses.push(Sense { gloss, examples, source });
    }

    if input.position() != payload.len() as u64 {
        return Err(LexiconError::SizeMismatch {
            context: format!("record '{}'", display_form),
            expected: payload.len() as u64,
            found: input.position(),
        });
    }
    Ok(DictionaryRecord {
        display_form,
        part_of_speech,
        transliteration,
        senses,
    })
}
