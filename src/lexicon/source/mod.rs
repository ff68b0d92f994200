//! Source parsers.
//!
//! Every input format gets a [`SourceParser`] turning one raw record into
//! zero or more canonical [`Entry`] values. [`collect_entries`] drives a parser
//! over a record stream and does the bookkeeping that is the same for all of
//! them: skip counting, sequence numbering and cancellation.
//!
//! # Submodules
//!
//! - [`dump`]: restartable dump handles and line streams
//! - [`markup`]: wikitext/HTML cleanup shared by the parsers
//! - [`wiktionary`]: Kaikki (wiktextract) JSONL
//! - [`pivot`]: gloss translation through the Wiktionary edition language
//! - [`freedict`]: FreeDict TEI XML
//! - [`tatoeba`]: sentence pairs, phrase entries and the example bank

pub mod dump;
pub mod freedict;
pub mod markup;
pub mod pivot;
pub mod tatoeba;
pub mod wiktionary;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::lexicon::types::error::{LexiconError, Result, SkipReason};
use crate::lexicon::types::language::LanguagePair;
use crate::lexicon::types::models::{Entry, SourceTag};

/// Produces canonical entries from the raw records of one input format.
pub trait SourceParser: Sync {
    /// One raw record as read from the dump.
    type Record;

    fn source_tag(&self) -> SourceTag;

    /// Parses one record.
    ///
    /// `Ok(vec![])` means the record is legitimately not for this pair (another
    /// language, no target-language gloss). `Err` means the record is damaged;
    /// it is counted as skipped and the stream carries on.
    fn parse(&self, record: Self::Record, pair: &LanguagePair) -> std::result::Result<Vec<Entry>, SkipReason>;
}

/// Per-source counters reported in the build summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub records_read: u64,
    pub records_skipped: u64,
    pub records_filtered: u64,
    pub entries_emitted: u64,
}

impl fmt::Display for SourceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records read, {} skipped, {} filtered, {} entries",
            self.records_read, self.records_skipped, self.records_filtered, self.entries_emitted
        )
    }
}

/// Runs `parser` over every record of `records`.
///
/// Entries are numbered in emission order (`Entry::sequence`), which makes
/// the merge independent of how workers are scheduled. Stream errors and
/// cancellation are fatal; skipped records are only counted.
pub fn collect_entries<P, I>(
    parser: &P,
    records: I,
    pair: &LanguagePair,
    cancel: &AtomicBool,
) -> Result<(Vec<Entry>, SourceStats)>
where
    P: SourceParser,
    I: IntoIterator<Item = Result<P::Record>>,
{
    let source = parser.source_tag();
    let mut stats = SourceStats::default();
    let mut entries = Vec::new();

    for record in records {
        if cancel.load(Ordering::Relaxed) {
            debug!("{} parser cancelled after {} records", source, stats.records_read);
            return Err(LexiconError::Cancelled);
        }
        let record = record?;
        stats.records_read += 1;

        match parser.parse(record, pair) {
            Ok(parsed) if parsed.is_empty() => stats.records_filtered += 1,
            Ok(parsed) => {
                for mut entry in parsed {
                    entry.sequence = stats.entries_emitted;
                    stats.entries_emitted += 1;
                    entries.push(entry);
                }
            }
            Err(reason) => {
                stats.records_skipped += 1;
                debug!("Skipped {} record #{}: {}", source, stats.records_read, reason);
            }
        }
    }

    info!("{} parser finished for {}: {}", source, pair, stats);
    Ok((entries, stats))
}
