//! Dictionary encoder.
//!
//! The encoder walks the merged lexicon once, in key order, appending each
//! primary entry to the data file and remembering where it went. The index
//! is then written by merge-joining the primary keys with the alias table, so
//! it comes out sorted without a separate sort pass.
//!
//! Any violation here (an oversized record, a key out of order, an offset too
//! wide for the index) aborts the encode. [`DictionaryEncoder::write_to_dir`]
//! writes to temporary files and only renames them into place on success.

use std::cmp::Ordering;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, WriteBytesExt};
use log::{debug, info, trace};
use tempfile::NamedTempFile;

use super::codec::compression;
use super::format::header::{DataHeader, IndexHeader};
use super::format::record::{self, IndexRecord};
use super::format::{ChecksumWriter, DATA_EXTENSION, INDEX_EXTENSION};
use super::merge::MergedLexicon;
use super::types::config::EncoderConfig;
use super::types::error::{LexiconError, Result};
use super::types::models::Example;

/// Supplies example sentences for a headword at encode time.
pub trait ExampleProvider: Sync {
    fn examples_for(&self, headword: &str) -> Vec<Example>;
}

/// Counters describing an encoded dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub primaries: u64,
    pub aliases: u64,
    /// Size of the data file, headers and trailer included.
    pub data_bytes: u64,
    /// Size of the index file, headers and trailer included.
    pub index_bytes: u64,
    /// Largest serialized (uncompressed) record.
    pub largest_record: u64,
    pub examples_attached: u64,
}

/// An index/data file pair written by [`DictionaryEncoder::write_to_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDictionary {
    pub index_path: PathBuf,
    pub data_path: PathBuf,
    pub stats: EncodeStats,
}

/// Position of a primary record in the data file.
#[derive(Debug, Clone, Copy)]
struct Location {
    offset: u64,
    length: u32,
}

#[derive(Debug, Clone)]
pub struct DictionaryEncoder {
    config: EncoderConfig,
}

impl DictionaryEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encodes `lexicon` into the given index and data writers.
    pub fn encode<I: Write, D: Write>(
        &self,
        lexicon: &MergedLexicon,
        examples: Option<&dyn ExampleProvider>,
        index_out: I,
        data_out: D,
    ) -> Result<EncodeStats> {
        let mut stats = EncodeStats::default();
        let locations = self.write_data(lexicon, examples, data_out, &mut stats)?;
        self.write_index(lexicon, &locations, index_out, &mut stats)?;
        info!(
            "Encoded {} primaries and {} aliases ({} data bytes, {} index bytes)",
            stats.primaries, stats.aliases, stats.data_bytes, stats.index_bytes
        );
        Ok(stats)
    }

    fn write_data<D: Write>(
        &self,
        lexicon: &MergedLexicon,
        examples: Option<&dyn ExampleProvider>,
        mut data_out: D,
        stats: &mut EncodeStats,
    ) -> Result<Vec<Location>> {
        DataHeader::new(self.config.compression).write(&mut data_out)?;
        let mut body = ChecksumWriter::new(data_out);
        let max_offset = self.config.offset_width.max_offset();
        let mut locations = Vec::with_capacity(lexicon.len());
        let mut previous: Option<&str> = None;

        for entry in lexicon.entries() {
            let key = entry.headword.as_str();
            if let Some(previous) = previous {
                match previous.as_bytes().cmp(key.as_bytes()) {
                    Ordering::Less => {}
                    Ordering::Equal => return Err(LexiconError::DuplicateKey(key.to_string())),
                    Ordering::Greater => {
                        return Err(LexiconError::UnsortedKeys {
                            previous: previous.to_string(),
                            current: key.to_string(),
                        });
                    }
                }
            }
            previous = Some(key);

            let extra = examples.map(|p| p.examples_for(key)).unwrap_or_default();
            let payload = record::encode_entry(entry, &extra)?;
            let serialized_len = payload.len() as u64;
            if serialized_len > self.config.max_record_len {
                return Err(LexiconError::RecordTooLarge {
                    key: key.to_string(),
                    len: serialized_len,
                    max: self.config.max_record_len,
                });
            }
            stats.largest_record = stats.largest_record.max(serialized_len);
            stats.examples_attached += extra.len() as u64;

            let stored = compression::compress_payload(&payload, self.config.compression)?;
            let length = u32::try_from(stored.len()).map_err(|_| LexiconError::FieldTooLong {
                field: "record",
                len: stored.len(),
                width: 4,
            })?;
            let offset = body.written();
            if offset > max_offset {
                return Err(LexiconError::OffsetOverflow {
                    offset,
                    width: self.config.offset_width.bytes(),
                });
            }

            body.write_u32::<BigEndian>(length)?;
            body.write_all(&stored)?;
            trace!("Record '{}' at offset {} ({} bytes stored)", key, offset, length);
            locations.push(Location { offset, length });
        }

        let checksum = body.checksum();
        let records_len = body.written();
        let mut data_out = body.into_inner();
        data_out.write_u32::<BigEndian>(checksum)?;
        data_out.flush()?;

        stats.primaries = locations.len() as u64;
        stats.data_bytes = DataHeader::LEN + records_len + 4;
        debug!("Data section: {} records, {} bytes, checksum {:#010x}", locations.len(), records_len, checksum);
        Ok(locations)
    }

    fn write_index<I: Write>(
        &self,
        lexicon: &MergedLexicon,
        locations: &[Location],
        mut index_out: I,
        stats: &mut EncodeStats,
    ) -> Result<()> {
        let entries = lexicon.entries();
        let total = entries.len() + lexicon.aliases().len();
        let count = u32::try_from(total).map_err(|_| LexiconError::FieldTooLong {
            field: "index_count",
            len: total,
            width: 4,
        })?;
        IndexHeader::new(self.config.offset_width, count).write(&mut index_out)?;
        let mut body = ChecksumWriter::new(index_out);

        let location_of = |primary: &str| -> Result<Location> {
            entries
                .binary_search_by(|e| e.headword.as_bytes().cmp(primary.as_bytes()))
                .map(|i| locations[i])
                .map_err(|_| LexiconError::InvalidFormat(format!("Alias points at missing primary '{}'", primary)))
        };

        let mut primaries = entries.iter().zip(locations).peekable();
        let mut aliases = lexicon.aliases().iter().peekable();
        let mut previous: Option<String> = None;
        let mut alias_count = 0u64;

        loop {
            let take_primary = match (primaries.peek(), aliases.peek()) {
                (None, None) => break,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some((entry, _)), Some((alias, _))) => match entry.headword.as_bytes().cmp(alias.as_bytes()) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => return Err(LexiconError::DuplicateKey(entry.headword.clone())),
                },
            };
            let index_record = if take_primary {
                let Some((entry, location)) = primaries.next() else { break };
                IndexRecord {
                    key: entry.headword.clone(),
                    offset: location.offset,
                    length: location.length,
                }
            } else {
                let Some((alias, primary)) = aliases.next() else { break };
                let location = location_of(primary)?;
                alias_count += 1;
                IndexRecord {
                    key: alias.clone(),
                    offset: location.offset,
                    length: location.length,
                }
            };

            if let Some(previous) = &previous
                && previous.as_bytes() >= index_record.key.as_bytes()
            {
                return Err(LexiconError::UnsortedKeys {
                    previous: previous.clone(),
                    current: index_record.key,
                });
            }
            index_record.write(&mut body, self.config.offset_width)?;
            previous = Some(index_record.key);
        }

        let checksum = body.checksum();
        let records_len = body.written();
        let mut index_out = body.into_inner();
        index_out.write_u32::<BigEndian>(checksum)?;
        index_out.flush()?;

        stats.aliases = alias_count;
        stats.index_bytes = IndexHeader::LEN + records_len + 4;
        debug!("Index section: {} records, {} bytes, checksum {:#010x}", total, records_len, checksum);
        Ok(())
    }

    /// Encodes `lexicon` into `<dir>/<basename>.idx` and `<dir>/<basename>.dat`.
    ///
    /// Both files are written to temporaries in `dir` first and renamed into
    /// place once encoding has succeeded. A failed encode leaves nothing behind.
    pub fn write_to_dir(
        &self,
        lexicon: &MergedLexicon,
        dir: impl AsRef<Path>,
        basename: &str,
        examples: Option<&dyn ExampleProvider>,
    ) -> Result<EncodedDictionary> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let index_path = dir.join(format!("{}.{}", basename, INDEX_EXTENSION));
        let data_path = dir.join(format!("{}.{}", basename, DATA_EXTENSION));

        let index_tmp = NamedTempFile::new_in(dir)?;
        let data_tmp = NamedTempFile::new_in(dir)?;
        let stats = {
            let index_writer = BufWriter::new(index_tmp.as_file());
            let data_writer = BufWriter::new(data_tmp.as_file());
            self.encode(lexicon, examples, index_writer, data_writer)?
        };
        index_tmp.as_file().sync_all()?;
        data_tmp.as_file().sync_all()?;

        data_tmp.persist(&data_path).map_err(|e| LexiconError::Io(e.error))?;
        if let Err(e) = index_tmp.persist(&index_path) {
            let _ = fs::remove_file(&data_path);
            return Err(LexiconError::Io(e.error));
        }
        info!("Wrote dictionary {} / {}", index_path.display(), data_path.display());

        Ok(EncodedDictionary {
            index_path,
            data_path,
            stats,
        })
    }
}
