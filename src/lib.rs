//! # dictweave
//!
//! Builds a bilingual dictionary for e-reader lookup from Wiktionary (Kaikki
//! JSONL), FreeDict (TEI XML) and Tatoeba (sentence pairs) dumps.
//!
//! Entries from all sources are merged under a collation key, so `Čaj`, `čaj`
//! and `чај` land on the same headword, and written as a sorted binary
//! index/data pair that a reader can binary-search. An external compiler can
//! then turn that pair into a device format.
//!
//! ```no_run
//! use dictweave::{Build, BuildConfig};
//!
//! let config = BuildConfig::from_file("sr-en.toml")?;
//! let summary = Build::new(config).run(None)?;
//! println!("{}", summary);
//! # Ok::<(), dictweave::LexiconError>(())
//! ```
pub mod lexicon;

// Re-export the main types for convenience
pub use lexicon::{
    DictionaryReader,
    LexiconError,
    Result,
    build::{Build, BuildSummary},
    collation::Collation,
    compiler::{Compiler, DictionaryMeta, ExternalCompiler},
    encoder::{DictionaryEncoder, EncodedDictionary, ExampleProvider},
    merge::{MergedLexicon, merge},
    types::{
        config::BuildConfig,
        language::{Language, LanguagePair},
        models::{Entry, Example, PartOfSpeech, Sense, SourceTag},
    },
};
