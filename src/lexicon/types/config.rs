//! Build configuration, deserialized from TOML.
//!
//! ```toml
//! [pair]
//! source = "sr"
//! target = "en"
//!
//! [sources.wiktionary]
//! path = "dumps/kaikki-serbo-croatian.jsonl.gz"
//! required = true
//!
//! [sources.tatoeba]
//! path = "dumps/srp-eng.tsv"
//!
//! [output]
//! dir = "out"
//! basename = "sr-en"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{LexiconError, Result};
use super::language::{Language, LanguagePair};
use super::models::{CompressionType, OffsetWidth};

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    pub pair: PairConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub compiler: Option<CompilerConfig>,
}

/// The requested language pair. Codes missing from the built-in table can be
/// described in full under `[[pair.languages]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct PairConfig {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    pub wiktionary: Option<WiktionaryConfig>,
    pub freedict: Option<FreeDictConfig>,
    pub tatoeba: Option<TatoebaConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WiktionaryConfig {
    pub path: PathBuf,
    #[serde(default = "default_wiktionary_priority")]
    pub priority: u32,
    #[serde(default)]
    pub required: bool,
    /// Language the dump's glosses are written in (the Wiktionary edition).
    #[serde(default = "default_edition")]
    pub edition: String,
    /// Dump of the edition language itself, used to pivot glosses into the
    /// target language when it differs from the edition.
    #[serde(default)]
    pub pivot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreeDictConfig {
    pub path: PathBuf,
    #[serde(default = "default_freedict_priority")]
    pub priority: u32,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TatoebaConfig {
    pub path: PathBuf,
    #[serde(default = "default_tatoeba_priority")]
    pub priority: u32,
    #[serde(default)]
    pub required: bool,
    /// Examples attached to an entry at encode time.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    /// Sentences up to this many words also become phrase entries.
    #[serde(default = "default_max_phrase_words")]
    pub max_phrase_words: usize,
}

/// Encoder limits and on-disk format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Largest allowed serialized record, before compression.
    pub max_record_len: u64,
    pub compression: CompressionType,
    pub offset_width: OffsetWidth,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_record_len: 1 << 20,
            compression: CompressionType::None,
            offset_width: OffsetWidth::U32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LimitsConfig {
    /// Keep only the first `max_entries` merged entries (in key order).
    #[serde(default)]
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    #[serde(default = "default_basename")]
    pub basename: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Reader locale to declare instead of the one derived from the source language.
    #[serde(default)]
    pub locale_override: Option<String>,
}

fn default_wiktionary_priority() -> u32 {
    1
}

fn default_freedict_priority() -> u32 {
    2
}

fn default_tatoeba_priority() -> u32 {
    3
}

fn default_edition() -> String {
    "en".to_string()
}

fn default_max_examples() -> usize {
    3
}

fn default_max_phrase_words() -> usize {
    3
}

fn default_basename() -> String {
    "dictionary".to_string()
}

impl BuildConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BuildConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Resolves the configured pair, preferring `[[pair.languages]]` entries
    /// over the built-in table.
    pub fn language_pair(&self) -> LanguagePair {
        let lookup = |code: &str| {
            self.pair
                .languages
                .iter()
                .find(|lang| lang.code.eq_ignore_ascii_case(code) || lang.name.eq_ignore_ascii_case(code))
                .cloned()
                .unwrap_or_else(|| Language::resolve(code))
        };
        LanguagePair::new(lookup(&self.pair.source), lookup(&self.pair.target))
    }

    /// Human readable dictionary title.
    pub fn title(&self) -> String {
        match &self.output.title {
            Some(title) => title.clone(),
            None => {
                let pair = self.language_pair();
                format!("{} - {} Dictionary", pair.source.name, pair.target.name)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pair.source.trim().is_empty() || self.pair.target.trim().is_empty() {
            return Err(LexiconError::Config("pair.source and pair.target must be set".to_string()));
        }
        if self.encoder.max_record_len == 0 {
            return Err(LexiconError::Config("encoder.max_record_len must be positive".to_string()));
        }
        if self.output.basename.is_empty() || self.output.basename.contains(['/', '\\']) {
            return Err(LexiconError::Config(format!(
                "output.basename '{}' is not a plain file name",
                self.output.basename
            )));
        }
        let sources = &self.sources;
        if sources.wiktionary.is_none() && sources.freedict.is_none() && sources.tatoeba.is_none() {
            return Err(LexiconError::Config("at least one source must be configured".to_string()));
        }
        Ok(())
    }
}
