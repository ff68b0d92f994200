//! End-to-end build: dumps in, encoded dictionary out.
//!
//! ```text
//! open dumps ──→ parse (one rayon worker per source) ──→ merge ──→ truncate
//!                                                                    │
//!            compiler (optional) ←── write_to_dir ←── sentence bank ←┘
//! ```
//!
//! Workers share nothing but a cancellation flag: the first worker to fail
//! raises it and the others stop at their next record.

use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use rayon::prelude::*;

use super::collation::Collation;
use super::compiler::{self, Compiler, DictionaryMeta, ExternalCompiler};
use super::encoder::{DictionaryEncoder, EncodeStats, EncodedDictionary, ExampleProvider};
use super::merge::{self, MergeStats};
use super::source::dump::{DumpSource, FileDump, LineRecords};
use super::source::freedict::{FreeDictParser, TeiRecords};
use super::source::pivot::TranslationPivot;
use super::source::tatoeba::{SentenceBank, TatoebaParser};
use super::source::wiktionary::WiktionaryParser;
use super::source::{SourceStats, collect_entries};
use super::types::config::{BuildConfig, WiktionaryConfig};
use super::types::error::{LexiconError, Result};
use super::types::language::{Language, LanguagePair};
use super::types::models::{Entry, SourceTag};

/// Extension of the compiled e-reader artifact.
pub const ARTIFACT_EXTENSION: &str = "mobi";

/// Everything a finished build reports.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub pair: LanguagePair,
    /// Per-source counters, in source order. Sources that were skipped are absent.
    pub sources: Vec<(SourceTag, SourceStats)>,
    pub merge: MergeStats,
    pub encode: EncodeStats,
    pub dictionary: EncodedDictionary,
    pub compiled: Option<PathBuf>,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dictionary {}", self.pair)?;
        for (tag, stats) in &self.sources {
            writeln!(f, "  {:<10} {}", tag.name(), stats)?;
        }
        writeln!(f, "  merge      {}", self.merge)?;
        writeln!(
            f,
            "  encode     {} primaries, {} aliases, {} examples",
            self.encode.primaries, self.encode.aliases, self.encode.examples_attached
        )?;
        writeln!(f, "  index      {} ({} bytes)", self.dictionary.index_path.display(), self.encode.index_bytes)?;
        write!(f, "  data       {} ({} bytes)", self.dictionary.data_path.display(), self.encode.data_bytes)?;
        if let Some(path) = &self.compiled {
            write!(f, "\n  compiled   {}", path.display())?;
        }
        Ok(())
    }
}

/// One source ready to be parsed: its parser and an open stream.
enum SourceJob {
    Wiktionary(WiktionaryParser, Box<dyn BufRead + Send>),
    FreeDict(FreeDictParser, Box<dyn BufRead + Send>),
    Tatoeba(TatoebaParser, Box<dyn BufRead + Send>),
}

impl SourceJob {
    fn tag(&self) -> SourceTag {
        match self {
            SourceJob::Wiktionary(..) => SourceTag::Wiktionary,
            SourceJob::FreeDict(..) => SourceTag::FreeDict,
            SourceJob::Tatoeba(..) => SourceTag::Tatoeba,
        }
    }

    fn run(self, pair: &LanguagePair, cancel: &AtomicBool) -> Result<(Vec<Entry>, SourceStats)> {
        match self {
            SourceJob::Wiktionary(parser, stream) => collect_entries(&parser, LineRecords::new(stream), pair, cancel),
            SourceJob::FreeDict(parser, stream) => collect_entries(&parser, TeiRecords::new(stream), pair, cancel),
            SourceJob::Tatoeba(parser, stream) => collect_entries(&parser, LineRecords::new(stream), pair, cancel),
        }
    }
}

/// A configured build.
pub struct Build {
    config: BuildConfig,
    pair: LanguagePair,
    wiktionary: Option<Arc<dyn DumpSource>>,
    pivot: Option<Arc<dyn DumpSource>>,
    freedict: Option<Arc<dyn DumpSource>>,
    tatoeba: Option<Arc<dyn DumpSource>>,
    cancel: Arc<AtomicBool>,
}

impl Build {
    /// Prepares a build reading the dumps named in `config` from disk.
    pub fn new(config: BuildConfig) -> Self {
        let pair = config.language_pair();
        let sources = &config.sources;
        let file = |path: &PathBuf| Arc::new(FileDump::new(path)) as Arc<dyn DumpSource>;
        Self {
            wiktionary: sources.wiktionary.as_ref().map(|c| file(&c.path)),
            pivot: sources.wiktionary.as_ref().and_then(|c| c.pivot_path.as_ref()).map(file),
            freedict: sources.freedict.as_ref().map(|c| file(&c.path)),
            tatoeba: sources.tatoeba.as_ref().map(|c| file(&c.path)),
            cancel: Arc::new(AtomicBool::new(false)),
            pair,
            config,
        }
    }

    /// Reads `source` from `dump` instead of the configured path.
    ///
    /// The source still needs a section in the configuration for its priority
    /// and limits.
    pub fn with_dump(mut self, source: SourceTag, dump: impl DumpSource + 'static) -> Self {
        let dump: Arc<dyn DumpSource> = Arc::new(dump);
        match source {
            SourceTag::Wiktionary => self.wiktionary = Some(dump),
            SourceTag::FreeDict => self.freedict = Some(dump),
            SourceTag::Tatoeba => self.tatoeba = Some(dump),
        }
        self
    }

    /// Reads the translation pivot from `dump` instead of the configured path.
    pub fn with_pivot_dump(mut self, dump: impl DumpSource + 'static) -> Self {
        self.pivot = Some(Arc::new(dump));
        self
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Flag that stops a running build when set. The build then fails with
    /// [`LexiconError::Cancelled`].
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// The external compiler described by the configuration, if any.
    pub fn configured_compiler(&self) -> Option<ExternalCompiler> {
        self.config
            .compiler
            .as_ref()
            .map(|c| ExternalCompiler::new(&c.program, c.args.iter().cloned()))
    }

    /// Runs the whole pipeline.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A required source cannot be opened or yields no entries
    /// - No entry survives merging, so there is nothing to encode
    /// - A dump stream fails while being read
    /// - The build is cancelled
    /// - Encoding fails (nothing is written in that case)
    /// - The compiler fails (the encoded files stay on disk)
    pub fn run(&self, compiler: Option<&dyn Compiler>) -> Result<BuildSummary> {
        info!("Building {} dictionary", self.pair);
        let jobs = self.open_sources()?;

        let results: Vec<(SourceTag, Result<(Vec<Entry>, SourceStats)>)> = jobs
            .into_par_iter()
            .map(|job| {
                let tag = job.tag();
                let result = job.run(&self.pair, &self.cancel);
                if let Err(e) = &result
                    && !matches!(e, LexiconError::Cancelled)
                {
                    self.cancel.store(true, Ordering::Relaxed);
                }
                (tag, result)
            })
            .collect();

        let mut entries = Vec::new();
        let mut sources = Vec::with_capacity(results.len());
        let mut first_error: Option<LexiconError> = None;
        for (tag, result) in results {
            match result {
                Ok((parsed, stats)) => {
                    if parsed.is_empty() && self.is_required(tag) {
                        return Err(self.unavailable(tag, "no entries for this pair"));
                    }
                    entries.extend(parsed);
                    sources.push((tag, stats));
                }
                Err(e) => {
                    let replace = match &first_error {
                        None => true,
                        Some(LexiconError::Cancelled) => !matches!(e, LexiconError::Cancelled),
                        Some(_) => false,
                    };
                    if replace {
                        first_error = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let collation = Collation::for_language(&self.pair.source);
        let mut lexicon = merge::merge(entries, &self.pair, &collation);
        if let Some(max_entries) = self.config.limits.max_entries {
            lexicon.truncate(max_entries);
        }
        if lexicon.is_empty() {
            return Err(LexiconError::EmptyDictionary {
                pair: self.pair.to_string(),
            });
        }

        let bank = self.load_sentence_bank(&collation)?;
        let examples = bank.as_ref().map(|b| b as &dyn ExampleProvider);

        let output = &self.config.output;
        let encoder = DictionaryEncoder::new(self.config.encoder);
        let dictionary = encoder.write_to_dir(&lexicon, &output.dir, &output.basename, examples)?;

        let compiled = match compiler {
            Some(compiler) => Some(compiler.compile(&dictionary, &self.meta()?)?),
            None => None,
        };

        info!("Build of {} finished", self.pair);
        Ok(BuildSummary {
            pair: self.pair.clone(),
            sources,
            merge: *lexicon.stats(),
            encode: dictionary.stats,
            dictionary,
            compiled,
        })
    }

    /// Builds the parser for every configured source and opens its dump.
    fn open_sources(&self) -> Result<Vec<SourceJob>> {
        let mut jobs = Vec::new();
        let sources = &self.config.sources;

        if let Some(config) = &sources.wiktionary
            && let Some(dump) = &self.wiktionary
            && let Some(job) = self.wiktionary_job(config, dump.as_ref())?
        {
            jobs.push(job);
        }

        if let Some(config) = &sources.freedict
            && let Some(dump) = &self.freedict
            && let Some(stream) = self.open(SourceTag::FreeDict, dump.as_ref(), config.required)?
        {
            jobs.push(SourceJob::FreeDict(FreeDictParser::new(config.priority), stream));
        }

        if let Some(config) = &sources.tatoeba
            && let Some(dump) = &self.tatoeba
            && let Some(stream) = self.open(SourceTag::Tatoeba, dump.as_ref(), config.required)?
        {
            jobs.push(SourceJob::Tatoeba(
                TatoebaParser::new(config.priority, config.max_phrase_words),
                stream,
            ));
        }

        info!("{} sources opened for {}", jobs.len(), self.pair);
        Ok(jobs)
    }

    fn wiktionary_job(&self, config: &WiktionaryConfig, dump: &dyn DumpSource) -> Result<Option<SourceJob>> {
        let edition = Language::resolve(&config.edition);
        let mut parser = WiktionaryParser::new(config.priority, edition.clone());
        if edition.code != self.pair.target.code
            && let Some(pivot_dump) = &self.pivot
        {
            match TranslationPivot::load(pivot_dump.as_ref(), &self.pair.target) {
                Ok(pivot) => parser = parser.with_pivot(pivot),
                Err(e) if config.required => {
                    return Err(self.unavailable(
                        SourceTag::Wiktionary,
                        &format!("cannot load pivot {}: {}", pivot_dump.name(), e),
                    ));
                }
                Err(e) => {
                    warn!("Skipping wiktionary: cannot load pivot {}: {}", pivot_dump.name(), e);
                    return Ok(None);
                }
            }
        }

        if !parser.supports(&self.pair) {
            if config.required {
                return Err(self.unavailable(
                    SourceTag::Wiktionary,
                    &format!("{} edition glosses need a pivot dump", edition.name),
                ));
            }
            warn!(
                "Skipping wiktionary: {} edition has no {} glosses and no pivot is configured",
                edition.name, self.pair.target.name
            );
            return Ok(None);
        }

        Ok(self
            .open(SourceTag::Wiktionary, dump, config.required)?
            .map(|stream| SourceJob::Wiktionary(parser, stream)))
    }

    fn open(&self, tag: SourceTag, dump: &dyn DumpSource, required: bool) -> Result<Option<Box<dyn BufRead + Send>>> {
        match dump.open() {
            Ok(stream) => Ok(Some(stream)),
            Err(e) if required => Err(self.unavailable(tag, &format!("cannot open {}: {}", dump.name(), e))),
            Err(e) => {
                warn!("Skipping {}: cannot open {}: {}", tag, dump.name(), e);
                Ok(None)
            }
        }
    }

    fn load_sentence_bank(&self, collation: &Collation) -> Result<Option<SentenceBank>> {
        let (Some(config), Some(dump)) = (&self.config.sources.tatoeba, &self.tatoeba) else {
            return Ok(None);
        };
        if config.max_examples == 0 {
            return Ok(None);
        }
        match SentenceBank::load(dump.as_ref(), &self.pair, collation.clone(), config.max_examples) {
            Ok(bank) => Ok(Some(bank)),
            Err(e) if !config.required => {
                warn!("No example sentences: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn meta(&self) -> Result<DictionaryMeta> {
        let locale_override = self.config.compiler.as_ref().and_then(|c| c.locale_override.as_deref());
        let output = &self.config.output;
        Ok(DictionaryMeta {
            title: self.config.title(),
            source: self.pair.source.clone(),
            target: self.pair.target.clone(),
            locale: compiler::reader_locale(&self.pair.source.code, locale_override)?,
            output: output.dir.join(format!("{}.{}", output.basename, ARTIFACT_EXTENSION)),
        })
    }

    fn is_required(&self, tag: SourceTag) -> bool {
        let sources = &self.config.sources;
        match tag {
            SourceTag::Wiktionary => sources.wiktionary.as_ref().is_some_and(|c| c.required),
            SourceTag::FreeDict => sources.freedict.as_ref().is_some_and(|c| c.required),
            SourceTag::Tatoeba => sources.tatoeba.as_ref().is_some_and(|c| c.required),
        }
    }

    fn unavailable(&self, tag: SourceTag, reason: &str) -> LexiconError {
        LexiconError::SourceUnavailable {
            source_name: tag.name(),
            pair: self.pair.to_string(),
            reason: reason.to_string(),
        }
    }
}
