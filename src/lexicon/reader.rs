use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};

use adler2::Adler32;
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info};

use super::codec::compression;
use super::collation::Collation;
use super::format::header::{DataHeader, IndexHeader};
use super::format::record::{self, DictionaryRecord, IndexRecord};
use super::format::{DATA_EXTENSION, INDEX_EXTENSION};
use super::iter::{KeysIterator, RecordIterator};
use super::types::error::{LexiconError, Result};

/// Upper bound on an inflated record; anything larger is treated as corruption.
const MAX_DECODED_RECORD: u64 = 1 << 30;

/// Reader for an encoded dictionary (`.idx` + `.dat`).
///
/// The index is loaded and verified on open; data records are read on demand.
#[derive(Debug)]
pub struct DictionaryReader {
    data: Arc<Mutex<File>>,
    pub index_header: IndexHeader,
    pub data_header: DataHeader,
    index: Vec<IndexRecord>,
    /// Length of the data records section.
    data_len: u64,
}

impl DictionaryReader {
    /// Opens `<dir>/<basename>.idx` and `<dir>/<basename>.dat`.
    pub fn open_dir(dir: impl AsRef<Path>, basename: &str) -> Result<Self> {
        let dir = dir.as_ref();
        Self::open(
            dir.join(format!("{}.{}", basename, INDEX_EXTENSION)),
            dir.join(format!("{}.{}", basename, DATA_EXTENSION)),
        )
    }

    /// Opens an index/data pair.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Either file cannot be opened
    /// - A header is invalid or has an unsupported version
    /// - A checksum does not match
    /// - Index keys are not strictly ascending
    /// - An index record points outside the data section
    pub fn open(index_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<Self> {
        let index_path = index_path.as_ref();
        let data_path = data_path.as_ref();
        info!("Opening dictionary: {}", index_path.display());

        let (index_header, index) = Self::load_index(index_path)?;

        let mut file = File::open(data_path)?;
        let file_len = file.metadata()?.len();
        let data_header = DataHeader::parse(&mut file)?;
        let data_len = file_len
            .checked_sub(DataHeader::LEN + 4)
            .ok_or_else(|| LexiconError::InvalidFormat(format!("Data file too short: {} bytes", file_len)))?;
        Self::verify_data(&mut file, data_len)?;

        for record in &index {
            let in_bounds = record
                .offset
                .checked_add(4 + record.length as u64)
                .is_some_and(|end| end <= data_len);
            if !in_bounds {
                return Err(LexiconError::InvalidFormat(format!(
                    "Record for '{}' at offset {} ({} bytes) lies beyond data section of {} bytes",
                    record.key, record.offset, record.length, data_len
                )));
            }
        }

        info!("Dictionary opened: {} index records, {} data bytes", index.len(), data_len);
        Ok(Self {
            data: Arc::new(Mutex::new(file)),
            index_header,
            data_header,
            index,
            data_len,
        })
    }

    fn load_index(path: &Path) -> Result<(IndexHeader, Vec<IndexRecord>)> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        let mut input = bytes.as_slice();
        let header = IndexHeader::parse(&mut input)?;

        let body_len = input
            .len()
            .checked_sub(4)
            .ok_or_else(|| LexiconError::InvalidFormat("Index file truncated".to_string()))?;
        let (mut body, mut trailer) = input.split_at(body_len);
        let expected = trailer.read_u32::<BigEndian>()?;
        let actual = adler2::adler32_slice(body);
        if expected != actual {
            return Err(LexiconError::ChecksumMismatch {
                context: "index records",
                expected,
                actual,
            });
        }

        let mut index: Vec<IndexRecord> = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            let record = IndexRecord::read(&mut body, header.offset_width)?;
            if let Some(previous) = index.last()
                && previous.key.as_bytes() >= record.key.as_bytes()
            {
                return Err(LexiconError::UnsortedKeys {
                    previous: previous.key.clone(),
                    current: record.key,
                });
            }
            index.push(record);
        }
        if !body.is_empty() {
            return Err(LexiconError::SizeMismatch {
                context: "index records".to_string(),
                expected: (body_len - body.len()) as u64,
                found: body_len as u64,
            });
        }
        debug!("Loaded {} index records", index.len());
        Ok((header, index))
    }

    fn verify_data(file: &mut File, data_len: u64) -> Result<()> {
        let mut hasher = Adler32::new();
        let mut section = BufReader::new(&mut *file).take(data_len);
        let mut chunk = vec![0u8; 1 << 16];
        loop {
            let n = section.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.write_slice(&chunk[..n]);
        }
        drop(section);
        file.seek(SeekFrom::Start(DataHeader::LEN + data_len))?;
        let expected = file.read_u32::<BigEndian>()?;
        let actual = hasher.checksum();
        if expected != actual {
            return Err(LexiconError::ChecksumMismatch {
                context: "data records",
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Returns the number of index records (primaries and aliases).
    pub fn num_keys(&self) -> usize {
        self.index.len()
    }

    /// Returns the number of distinct data records.
    pub fn num_entries(&self) -> usize {
        let mut offsets: Vec<u64> = self.index.iter().map(|r| r.offset).collect();
        offsets.sort_unstable();
        offsets.dedup();
        offsets.len()
    }

    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    pub fn index(&self) -> &[IndexRecord] {
        &self.index
    }

    /// Finds the index record for an exact key by binary search.
    pub fn find(&self, key: &str) -> Option<&IndexRecord> {
        self.index
            .binary_search_by(|record| record.key.as_bytes().cmp(key.as_bytes()))
            .ok()
            .map(|i| &self.index[i])
    }

    /// Reads the record stored under `key`. Aliases resolve to their primary's record.
    pub fn get(&self, key: &str) -> Result<Option<DictionaryRecord>> {
        match self.find(key) {
            Some(record) => self.read_record(record).map(Some),
            None => Ok(None),
        }
    }

    /// Looks up a surface form, normalizing it with `collation` first.
    pub fn lookup(&self, word: &str, collation: &Collation) -> Result<Option<DictionaryRecord>> {
        self.get(&collation.key(word))
    }

    /// Reads and decodes the data record an index record points at.
    pub fn read_record(&self, record: &IndexRecord) -> Result<DictionaryRecord> {
        let stored = self.read_stored(record)?;
        let mut payload = Vec::new();
        compression::decompress_payload_into(&mut payload, &stored, self.data_header.compression, MAX_DECODED_RECORD)?;
        record::decode_entry(&payload)
    }

    fn read_stored(&self, record: &IndexRecord) -> Result<Vec<u8>> {
        let mut file = self.data.lock().map_err(|_| LexiconError::LockPoisoned)?;
        let position = DataHeader::LEN
            .checked_add(record.offset)
            .ok_or_else(|| LexiconError::InvalidFormat(format!("Offset {} of '{}' overflows", record.offset, record.key)))?;
        file.seek(SeekFrom::Start(position))?;
        let length = file.read_u32::<BigEndian>()?;
        if length != record.length {
            return Err(LexiconError::SizeMismatch {
                context: format!("data record for '{}'", record.key),
                expected: record.length as u64,
                found: length as u64,
            });
        }
        let mut stored = vec![0u8; length as usize];
        file.read_exact(&mut stored)?;
        Ok(stored)
    }

    /// Returns the base iterator over all index records, in key order.
    ///
    /// Chain with `.with_records()` to decode the data they point at.
    pub fn iter_keys(&self) -> KeysIterator<'_> {
        KeysIterator::new(self)
    }

    /// Iterator over all `(key, record)` pairs, aliases included.
    ///
    /// Shortcut for `reader.iter_keys().with_records()`.
    pub fn iter_records(&self) -> RecordIterator<'_> {
        self.iter_keys().with_records()
    }
}
