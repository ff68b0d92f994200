//! On-disk layout of an encoded dictionary.
//!
//! A dictionary is a pair of files sharing a base name:
//!
//! ```text
//! <name>.idx                        <name>.dat
//! ┌──────────────────────┐          ┌──────────────────────┐
//! │ IndexHeader (12)     │          │ DataHeader (8)       │
//! ├──────────────────────┤          ├──────────────────────┤
//! │ IndexRecord × count  │ ──────→  │ len u32 | payload    │
//! │ (sorted by key bytes)│ offset   │ len u32 | payload    │
//! ├──────────────────────┤          ├──────────────────────┤
//! │ adler32 of records   │          │ adler32 of records   │
//! └──────────────────────┘          └──────────────────────┘
//! ```
//!
//! All integers are big-endian. Aliases are ordinary index records that
//! share the offset and length of their primary.
//!
//! - [`header`]: the fixed file headers
//! - [`record`]: index records and entry payloads

pub mod header;
pub mod record;

use std::io::{self, Write};

use adler2::Adler32;

pub const INDEX_EXTENSION: &str = "idx";
pub const DATA_EXTENSION: &str = "dat";

/// Writer that tracks the adler32 checksum and byte count of what passes through.
pub struct ChecksumWriter<W: Write> {
    inner: W,
    hasher: Adler32,
    written: u64,
}

impl<W: Write> ChecksumWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Adler32::new(),
            written: 0,
        }
    }

    pub fn checksum(&self) -> u32 {
        self.hasher.checksum()
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.write_slice(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
