//! Raw dump handles and record streams.
//!
//! A [`DumpSource`] can be opened any number of times; every [`open`] starts a
//! fresh stream at the first byte. Streams are read once, front to back, and
//! never buffer more than one record.
//!
//! [`open`]: DumpSource::open

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::MultiGzDecoder;
use log::debug;

use crate::lexicon::types::error::Result;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A readable dump supplied by the download/cache layer.
pub trait DumpSource: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> String;

    /// Opens a new stream positioned at the start of the dump.
    fn open(&self) -> Result<Box<dyn BufRead + Send>>;
}

/// A dump on the local file system. Gzip files are inflated on the fly.
#[derive(Debug, Clone)]
pub struct FileDump {
    path: PathBuf,
}

impl FileDump {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DumpSource for FileDump {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        let mut reader = BufReader::with_capacity(1 << 16, File::open(&self.path)?);
        let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        if is_gzip {
            debug!("Opening gzip dump {}", self.path.display());
            Ok(Box::new(BufReader::with_capacity(1 << 16, MultiGzDecoder::new(reader))))
        } else {
            debug!("Opening plain dump {}", self.path.display());
            Ok(Box::new(reader))
        }
    }
}

/// A dump held in memory, shared between openers.
#[derive(Debug, Clone)]
pub struct MemoryDump {
    name: String,
    bytes: Arc<[u8]>,
}

impl MemoryDump {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }
}

impl DumpSource for MemoryDump {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.bytes))))
    }
}

/// Iterator over the lines of a stream, without their line terminators.
///
/// Invalid UTF-8 is replaced rather than reported: the parser sees the damaged
/// line and decides whether it is usable. Read errors end the stream.
pub struct LineRecords<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> LineRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineRecords<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
