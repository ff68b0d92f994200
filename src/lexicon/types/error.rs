//! Error types for the dictweave crate.
//!
//! Data-quality problems (a malformed dump record, an entry with nothing usable
//! in it) are not errors: parsers report them as [`SkipReason`] values and the
//! pipeline counts them. Everything in [`LexiconError`] aborts the build.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum LexiconError {
    /// An error originating from I/O operations (unreadable dump, full disk, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The build configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A source marked as required produced nothing for the requested pair.
    #[error("Required source '{source_name}' is unavailable for {pair}: {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        pair: String,
        reason: String,
    },

    /// Every source came up empty, so there is no dictionary to encode.
    #[error("No entries for {pair}: nothing to encode")]
    EmptyDictionary { pair: String },

    /// A serialized record is larger than the configured maximum.
    #[error("Record for '{key}' is {len} bytes, exceeding the maximum of {max} bytes")]
    RecordTooLarge { key: String, len: u64, max: u64 },

    /// A length-prefixed field does not fit its prefix width.
    #[error("Field {field} is {len} bytes, which does not fit a {width}-byte length prefix")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        width: usize,
    },

    /// The running data offset no longer fits the configured offset width.
    #[error("Data offset {offset} does not fit a {width}-byte offset field")]
    OffsetOverflow { offset: u64, width: usize },

    /// Two index records share the same key.
    #[error("Duplicate index key '{0}'")]
    DuplicateKey(String),

    /// Index keys were not handed to the encoder in ascending order.
    #[error("Index keys out of order: '{previous}' precedes '{current}'")]
    UnsortedKeys { previous: String, current: String },

    /// The encoded dictionary is structurally invalid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A checksum validation failed, indicating data corruption.
    #[error("Checksum mismatch in {context}: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        context: &'static str,
        expected: u32,
        actual: u32,
    },

    /// A buffer or data block has an unexpected size after an operation.
    #[error("Size mismatch for {context}: expected {expected} bytes, but found {found} bytes")]
    SizeMismatch {
        context: String,
        expected: u64,
        found: u64,
    },

    /// An error occurred during compression or decompression.
    #[error("Compression failed: {0}")]
    CompressionError(String),

    /// The external compiler rejected the encoded dictionary.
    #[error("Compiler '{program}' failed: {message}")]
    Compiler { program: PathBuf, message: String },

    /// The build was cancelled because another worker hit a fatal error.
    #[error("Build cancelled")]
    Cancelled,

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

impl From<toml::de::Error> for LexiconError {
    fn from(e: toml::de::Error) -> Self {
        LexiconError::Config(e.to_string())
    }
}

/// A convenience `Result` type alias using the crate's `LexiconError` type.
pub type Result<T> = std::result::Result<T, LexiconError>;

/// Why a raw dump record produced no entries.
///
/// Skips are counted per source and reported in the build summary; they never
/// abort a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The record is not valid in its source format (bad JSON, broken XML, ...).
    Malformed(String),
    /// A field the entry cannot exist without is absent or empty.
    MissingField(&'static str),
    /// The record parsed but carried no usable sense.
    NoUsableSense,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Malformed(detail) => write!(f, "malformed record: {}", detail),
            SkipReason::MissingField(field) => write!(f, "missing field '{}'", field),
            SkipReason::NoUsableSense => write!(f, "no usable sense"),
        }
    }
}
