//! Iterators for sequential access to an encoded dictionary.
//!
//! 1. [`KeysIterator`] - index records in key order, no data access
//! 2. [`RecordIterator`] - `(key, record)` pairs, decoding each data record
//!    once even when several aliases point at it
//!
//! # Example
//! ```no_run
//! # use dictweave::DictionaryReader;
//! # let reader = DictionaryReader::open_dir("out", "sr-en").unwrap();
//! for result in reader.iter_records() {
//!     let (key, record) = result.unwrap();
//!     println!("{}: {} senses", key, record.senses.len());
//! }
//! ```

use std::collections::HashMap;
use std::slice::Iter;

use super::format::record::{DictionaryRecord, IndexRecord};
use super::reader::DictionaryReader;
use super::types::error::Result;

/// Iterator over the index records of a dictionary.
///
/// Created by [`DictionaryReader::iter_keys()`].
pub struct KeysIterator<'a> {
    reader: &'a DictionaryReader,
    records: Iter<'a, IndexRecord>,
}

impl<'a> KeysIterator<'a> {
    pub(super) fn new(reader: &'a DictionaryReader) -> Self {
        Self {
            reader,
            records: reader.index().iter(),
        }
    }

    /// Transforms this iterator to yield decoded records.
    pub fn with_records(self) -> RecordIterator<'a> {
        let mut pending: HashMap<u64, usize> = HashMap::new();
        for record in self.records.as_slice() {
            *pending.entry(record.offset).or_default() += 1;
        }
        RecordIterator {
            reader: self.reader,
            keys_iter: self,
            pending,
            cache: HashMap::new(),
        }
    }
}

impl<'a> Iterator for KeysIterator<'a> {
    type Item = &'a IndexRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

/// Iterator over complete `(key, record)` pairs.
///
/// Aliases share the data record of their primary; each record is decoded
/// once and kept until every key pointing at it has been yielded.
///
/// Created by [`KeysIterator::with_records()`].
pub struct RecordIterator<'a> {
    keys_iter: KeysIterator<'a>,
    reader: &'a DictionaryReader,
    /// Keys not yet yielded, per data offset.
    pending: HashMap<u64, usize>,
    cache: HashMap<u64, DictionaryRecord>,
}

impl Iterator for RecordIterator<'_> {
    type Item = Result<(String, DictionaryRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        let index_record = self.keys_iter.next()?;
        let offset = index_record.offset;

        let remaining = match self.pending.get_mut(&offset) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };

        let record = match self.cache.get(&offset) {
            Some(record) if remaining > 0 => record.clone(),
            Some(_) => self.cache.remove(&offset)?,
            None => match self.reader.read_record(index_record) {
                Ok(record) => {
                    if remaining > 0 {
                        self.cache.insert(offset, record.clone());
                    }
                    record
                }
                Err(e) => return Some(Err(e)),
            },
        };
        if remaining == 0 {
            self.pending.remove(&offset);
        }
        Some(Ok((index_record.key.clone(), record)))
    }
}
