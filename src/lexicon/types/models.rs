//! Core data structures shared by parsers, the merger and the encoder.
//!
//! This module defines:
//! - The canonical [`Entry`] and its [`Sense`]s
//! - Tag enumerations with stable byte values used in the binary format
//! - Format parameters ([`OffsetWidth`], [`CompressionType`])

use std::collections::BTreeSet;
use std::fmt;

use super::error::{LexiconError, Result};

/// Part-of-speech tag of an entry.
///
/// The discriminants are written to disk; never renumber them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PartOfSpeech {
    #[default]
    Unknown = 0,
    Noun = 1,
    Verb = 2,
    Adjective = 3,
    Adverb = 4,
    Pronoun = 5,
    Preposition = 6,
    Conjunction = 7,
    Interjection = 8,
    Numeral = 9,
    Article = 10,
    Particle = 11,
    Phrase = 12,
    ProperNoun = 13,
    Affix = 14,
}

impl PartOfSpeech {
    /// Maps a source tag (Kaikki `pos`, TEI `<pos>`) to a part of speech.
    ///
    /// Matching is case-insensitive; anything unrecognised is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().trim_end_matches('.').to_lowercase().as_str() {
            "noun" | "n" | "nn" | "subst" | "substantive" => Self::Noun,
            "verb" | "v" | "vb" | "vt" | "vi" | "aux" => Self::Verb,
            "adj" | "adjective" | "a" => Self::Adjective,
            "adv" | "adverb" => Self::Adverb,
            "pron" | "pronoun" | "det" | "determiner" => Self::Pronoun,
            "prep" | "preposition" | "postp" | "adp" => Self::Preposition,
            "conj" | "conjunction" | "cconj" | "sconj" => Self::Conjunction,
            "intj" | "interj" | "interjection" => Self::Interjection,
            "num" | "numeral" | "number" => Self::Numeral,
            "article" | "art" => Self::Article,
            "particle" | "part" | "ptcl" => Self::Particle,
            "phrase" | "prep_phrase" | "proverb" | "idiom" => Self::Phrase,
            "name" | "propn" | "proper noun" | "prop" => Self::ProperNoun,
            "affix" | "prefix" | "suffix" | "infix" | "interfix" | "circumfix" => Self::Affix,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::Pronoun => "pronoun",
            Self::Preposition => "preposition",
            Self::Conjunction => "conjunction",
            Self::Interjection => "interjection",
            Self::Numeral => "numeral",
            Self::Article => "article",
            Self::Particle => "particle",
            Self::Phrase => "phrase",
            Self::ProperNoun => "proper noun",
            Self::Affix => "affix",
        }
    }
}

impl TryFrom<u8> for PartOfSpeech {
    type Error = LexiconError;
    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Unknown,
            1 => Self::Noun,
            2 => Self::Verb,
            3 => Self::Adjective,
            4 => Self::Adverb,
            5 => Self::Pronoun,
            6 => Self::Preposition,
            7 => Self::Conjunction,
            8 => Self::Interjection,
            9 => Self::Numeral,
            10 => Self::Article,
            11 => Self::Particle,
            12 => Self::Phrase,
            13 => Self::ProperNoun,
            14 => Self::Affix,
            _ => return Err(LexiconError::InvalidFormat(format!("Unknown part of speech: {}", value))),
        })
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which parser a sense came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceTag {
    Wiktionary = 1,
    FreeDict = 2,
    Tatoeba = 3,
}

impl SourceTag {
    pub fn name(self) -> &'static str {
        match self {
            SourceTag::Wiktionary => "wiktionary",
            SourceTag::FreeDict => "freedict",
            SourceTag::Tatoeba => "tatoeba",
        }
    }
}

impl TryFrom<u8> for SourceTag {
    type Error = LexiconError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Wiktionary),
            2 => Ok(Self::FreeDict),
            3 => Ok(Self::Tatoeba),
            _ => Err(LexiconError::InvalidFormat(format!("Unknown source tag: {}", value))),
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An example sentence, optionally paired with its translation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Example {
    pub text: String,
    pub translation: Option<String>,
}

/// One distinct meaning of a headword.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sense {
    pub gloss: String,
    pub examples: Vec<Example>,
    pub source: SourceTag,
}

impl Sense {
    pub fn new(gloss: impl Into<String>, source: SourceTag) -> Self {
        Self {
            gloss: gloss.into(),
            examples: Vec::new(),
            source,
        }
    }

    pub fn with_examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self
    }

    /// The gloss with runs of whitespace collapsed; senses are deduplicated on this.
    pub fn normalized_gloss(&self) -> String {
        self.gloss.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// The canonical unit of meaning produced by every parser.
///
/// Parsers fill `display_form`; `headword` holds the collation key and is
/// assigned by the merger. Until then it mirrors the display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub headword: String,
    pub display_form: String,
    pub part_of_speech: PartOfSpeech,
    pub senses: Vec<Sense>,
    pub transliteration: Option<String>,
    pub source_priority: u32,
    /// Ordinal of the originating record within its source stream.
    pub sequence: u64,
    pub variant_forms: BTreeSet<String>,
}

impl Entry {
    pub fn new(display_form: impl Into<String>, part_of_speech: PartOfSpeech, source_priority: u32) -> Self {
        let display_form = display_form.into();
        Self {
            headword: display_form.clone(),
            display_form,
            part_of_speech,
            senses: Vec::new(),
            transliteration: None,
            source_priority,
            sequence: 0,
            variant_forms: BTreeSet::new(),
        }
    }

    pub fn with_sense(mut self, sense: Sense) -> Self {
        self.senses.push(sense);
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Adds an alternate form. Blank forms and the display form itself are ignored.
    pub fn add_variant(&mut self, form: &str) {
        let form = form.trim();
        if !form.is_empty() && form != self.display_form {
            self.variant_forms.insert(form.to_string());
        }
    }

    pub fn with_variant(mut self, form: &str) -> Self {
        self.add_variant(form);
        self
    }

    /// Entries with no senses only contribute aliases during the merge.
    pub fn is_alias_only(&self) -> bool {
        self.senses.is_empty()
    }
}

/// Width of the data offset field in index records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetWidth {
    #[default]
    U32,
    U64,
}

impl OffsetWidth {
    /// Returns the byte width of the offset field.
    pub fn bytes(&self) -> usize {
        match self {
            OffsetWidth::U32 => 4,
            OffsetWidth::U64 => 8,
        }
    }

    /// Largest offset representable at this width.
    pub fn max_offset(&self) -> u64 {
        match self {
            OffsetWidth::U32 => u32::MAX as u64,
            OffsetWidth::U64 => u64::MAX,
        }
    }
}

impl TryFrom<u8> for OffsetWidth {
    type Error = LexiconError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            4 => Ok(Self::U32),
            8 => Ok(Self::U64),
            _ => Err(LexiconError::InvalidFormat(format!("Unsupported offset width: {}", value))),
        }
    }
}

/// Per-record compression of the data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    #[default]
    None,
    Zlib,
}

impl CompressionType {
    pub fn as_byte(&self) -> u8 {
        match self {
            CompressionType::None => 0,
            CompressionType::Zlib => 2,
        }
    }
}

impl TryFrom<u8> for CompressionType {
    type Error = LexiconError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            2 => Ok(Self::Zlib),
            _ => Err(LexiconError::InvalidFormat(format!("Unknown compression type: {}", value))),
        }
    }
}
