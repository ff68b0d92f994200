//! Building and reading bilingual dictionaries.
//!
//! # Architecture
//!
//! - **[`source`]**: dump handles and one parser per input format
//! - **[`merge`]**: collation-keyed deduplication into a [`merge::MergedLexicon`]
//! - **[`encoder`]**: the sorted index/data file pair
//! - **[`reader`]** and **[`iter`]**: lookups and sequential access on that pair
//! - **[`build`]**: the pipeline tying it together, plus the [`compiler`] hand-off
//! - **[`types`]**: errors, models, languages and configuration
//!
//! Lower-level pieces ([`format`], [`codec`], [`collation`], [`translit`]) are
//! public for callers that need the raw layout.

pub mod build;
pub mod codec;
pub mod collation;
pub mod compiler;
pub mod encoder;
pub mod format;
pub mod iter;
pub mod merge;
pub mod reader;
pub mod source;
pub mod translit;
pub mod types;
mod utils;

pub use reader::DictionaryReader;
pub use types::error::{LexiconError, Result};
