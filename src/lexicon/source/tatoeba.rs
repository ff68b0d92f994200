//! Tatoeba sentence pairs.
//!
//! Each line is one aligned source/target pair. Three layouts are accepted:
//!
//! ```text
//! src_text \t tgt_text
//! src_id \t src_text \t tgt_id \t tgt_text
//! src_id \t src_lang \t src_text \t tgt_id \t tgt_lang \t tgt_text
//! ```
//!
//! Very short sentences become phrase entries of their own. Every pair also
//! goes into a [`SentenceBank`], which the encoder queries for example
//! sentences one headword at a time.

use std::collections::HashMap;

use log::info;
use unicode_normalization::UnicodeNormalization;

use super::SourceParser;
use super::dump::{DumpSource, LineRecords};
use crate::lexicon::collation::Collation;
use crate::lexicon::encoder::ExampleProvider;
use crate::lexicon::types::error::{Result, SkipReason};
use crate::lexicon::types::language::{Language, LanguagePair};
use crate::lexicon::types::models::{Entry, Example, PartOfSpeech, Sense, SourceTag};

/// Characters trimmed from both ends of a sentence.
const WRAPPING_CHARS: &[char] = &['\'', '"', '“', '”', '‘', '’', '„', '(', ')', '[', ']', '{', '}', '«', '»'];

/// Sentence-final punctuation dropped from phrase entries.
const FINAL_PUNCTUATION: &[char] = &['.', '!', '?', '…', ',', ';', ':'];

/// Tatoeba files Serbian, Croatian and Bosnian sentences separately; they are
/// one language for dictionary purposes.
const SERBO_CROATIAN: &[&str] = &["srp", "hrv", "bos", "hbs", "sr", "hr", "bs", "sh"];

/// Normalizes sentence text: NFC, collapsed whitespace, wrapping quotes and
/// brackets removed.
pub fn clean_text(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_matches(WRAPPING_CHARS).trim().to_string()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn language_matches(language: &Language, tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    language.matches(&tag) || (SERBO_CROATIAN.contains(&language.code.as_str()) && SERBO_CROATIAN.contains(&tag.as_str()))
}

/// Splits one line into its (source, target) sentences.
///
/// `Ok(None)` is a comment, a blank line or a pair in other languages.
pub fn split_pair(line: &str, pair: &LanguagePair) -> std::result::Result<Option<(String, String)>, SkipReason> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split('\t').collect();
    let (source, target) = match fields.as_slice() {
        [source, target] => (*source, *target),
        [_, source, _, target] => (*source, *target),
        [_, source_lang, source, _, target_lang, target] => {
            if !language_matches(&pair.source, source_lang) || !language_matches(&pair.target, target_lang) {
                return Ok(None);
            }
            (*source, *target)
        }
        _ => return Err(SkipReason::Malformed(format!("expected 2, 4 or 6 tab-separated fields, found {}", fields.len()))),
    };
    let source = clean_text(source);
    let target = clean_text(target);
    if source.is_empty() || target.is_empty() {
        return Err(SkipReason::MissingField("text"));
    }
    Ok(Some((source, target)))
}

/// Turns short sentence pairs into phrase entries.
#[derive(Debug, Clone)]
pub struct TatoebaParser {
    priority: u32,
    max_phrase_words: usize,
}

impl TatoebaParser {
    pub fn new(priority: u32, max_phrase_words: usize) -> Self {
        Self {
            priority,
            max_phrase_words,
        }
    }
}

impl SourceParser for TatoebaParser {
    type Record = String;

    fn source_tag(&self) -> SourceTag {
        SourceTag::Tatoeba
    }

    fn parse(&self, line: String, pair: &LanguagePair) -> std::result::Result<Vec<Entry>, SkipReason> {
        let Some((source, target)) = split_pair(&line, pair)? else {
            return Ok(Vec::new());
        };
        let words = word_count(&source);
        if words > self.max_phrase_words {
            return Ok(Vec::new());
        }
        let display = source.trim_end_matches(FINAL_PUNCTUATION).trim();
        let gloss = target.trim_end_matches(FINAL_PUNCTUATION).trim();
        if display.is_empty() || gloss.is_empty() {
            return Ok(Vec::new());
        }
        let pos = if words > 1 { PartOfSpeech::Phrase } else { PartOfSpeech::Unknown };
        Ok(vec![Entry::new(display, pos, self.priority).with_sense(Sense::new(gloss, SourceTag::Tatoeba))])
    }
}

/// All sentence pairs of a corpus with an inverted token index.
///
/// Pairs are kept sorted by lowercased source, then target, so every query
/// returns examples in the same order. Nothing is computed per headword
/// until [`SentenceBank::examples_for`] is called.
#[derive(Debug, Clone, Default)]
pub struct SentenceBank {
    pairs: Vec<(String, String)>,
    index: HashMap<String, Vec<u32>>,
    collation: Collation,
    max_examples: usize,
}

impl SentenceBank {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>, collation: Collation, max_examples: usize) -> Self {
        let mut pairs: Vec<(String, String)> = pairs.into_iter().collect();
        pairs.sort_by_cached_key(|(s, t)| (s.to_lowercase(), t.to_lowercase(), s.clone(), t.clone()));
        pairs.dedup();

        let mut index: HashMap<String, Vec<u32>> = HashMap::new();
        for (id, (source, _)) in pairs.iter().enumerate() {
            let mut tokens = tokenize(&collation, source);
            tokens.sort();
            tokens.dedup();
            for token in tokens {
                index.entry(token).or_default().push(id as u32);
            }
        }
        Self {
            pairs,
            index,
            collation,
            max_examples,
        }
    }

    /// Reads every usable pair of the dump. Damaged lines are ignored here;
    /// the phrase parser already counted them.
    pub fn load(dump: &dyn DumpSource, pair: &LanguagePair, collation: Collation, max_examples: usize) -> Result<Self> {
        let mut pairs = Vec::new();
        for line in LineRecords::new(dump.open()?) {
            if let Ok(Some(sentences)) = split_pair(&line?, pair) {
                pairs.push(sentences);
            }
        }
        let bank = Self::new(pairs, collation, max_examples);
        info!("Sentence bank for {}: {} pairs, {} tokens", pair, bank.len(), bank.index.len());
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs whose source sentence contains every token of `headword`.
    ///
    /// A sentence that consists of nothing but the headword is not an example
    /// of it and is left out. At most `max_examples` pairs are returned.
    pub fn examples_for(&self, headword: &str) -> Vec<Example> {
        let tokens = tokenize(&self.collation, headword);
        let Some((first, rest)) = tokens.split_first() else {
            return Vec::new();
        };
        let Some(candidates) = self.index.get(first) else {
            return Vec::new();
        };
        let whole = tokens.join(" ");
        candidates
            .iter()
            .filter(|id| rest.iter().all(|token| self.index.get(token).is_some_and(|ids| ids.binary_search(id).is_ok())))
            .map(|id| &self.pairs[*id as usize])
            .filter(|(source, _)| tokenize(&self.collation, source).join(" ") != whole)
            .take(self.max_examples)
            .map(|(source, target)| Example {
                text: source.clone(),
                translation: Some(target.clone()),
            })
            .collect()
    }
}

impl ExampleProvider for SentenceBank {
    fn examples_for(&self, headword: &str) -> Vec<Example> {
        SentenceBank::examples_for(self, headword)
    }
}

fn tokenize(collation: &Collation, text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '-' && c != '\'')
        .map(|token| collation.key(token.trim_matches(['-', '\''])))
        .filter(|token| !token.is_empty())
        .collect()
}
