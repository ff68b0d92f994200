//! Gloss translation through the Wiktionary edition language.
//!
//! Kaikki dumps of a non-English language still carry English glosses (they
//! come from the English Wiktionary). To build, say, a Serbian→German
//! dictionary, each English gloss is looked up among the translation tables of
//! the English dump and replaced by its German translations.

use std::collections::{BTreeSet, HashMap};

use log::info;
use serde_json::Value;

use super::dump::{DumpSource, LineRecords};
use crate::lexicon::types::error::Result;
use crate::lexicon::types::language::Language;

/// Map from edition-language headword (lowercased) to target translations.
#[derive(Debug, Clone, Default)]
pub struct TranslationPivot {
    translations: HashMap<String, Vec<String>>,
}

impl TranslationPivot {
    /// Scans an edition-language Kaikki dump for translations into `target`.
    ///
    /// Undecodable lines are ignored; a pivot is a best-effort lookup table.
    pub fn load(dump: &dyn DumpSource, target: &Language) -> Result<Self> {
        let mut pivot = Self::default();
        for line in LineRecords::new(dump.open()?) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Ok(record) = serde_json::from_str::<Value>(&line) else {
                continue;
            };
            pivot.add_record(&record, target);
        }
        info!(
            "Loaded translation pivot from {}: {} headwords with {} translations",
            dump.name(),
            pivot.translations.len(),
            target
        );
        Ok(pivot)
    }

    /// Builds a pivot from explicit pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut grouped: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (word, translation) in pairs {
            grouped.entry(word.to_lowercase()).or_default().insert(translation.to_string());
        }
        Self {
            translations: grouped
                .into_iter()
                .map(|(word, set)| (word, set.into_iter().collect()))
                .collect(),
        }
    }

    fn add_record(&mut self, record: &Value, target: &Language) {
        let Some(word) = record.get("word").and_then(Value::as_str) else {
            return;
        };
        let senses = record.get("senses").and_then(Value::as_array).into_iter().flatten();
        let found: BTreeSet<String> = senses
            .chain(std::iter::once(record))
            .filter_map(|holder| holder.get("translations").and_then(Value::as_array))
            .flatten()
            .filter(|tr| {
                let lang = tr.get("lang").and_then(Value::as_str).unwrap_or_default();
                let code = tr.get("code").and_then(Value::as_str).unwrap_or_default();
                target.matches(lang) || target.matches(code)
            })
            .filter_map(|tr| tr.get("word").and_then(Value::as_str))
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if found.is_empty() {
            return;
        }
        let existing = self.translations.entry(word.to_lowercase()).or_default();
        let merged: BTreeSet<String> = existing.drain(..).chain(found).collect();
        existing.extend(merged);
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn lookup(&self, word: &str) -> Option<&[String]> {
        self.translations.get(&word.to_lowercase()).map(Vec::as_slice)
    }

    /// Translates one sense.
    ///
    /// Link targets are tried first, then each whole gloss, then each gloss
    /// cut at the first `;` or `(`. Returns the sorted, deduplicated
    /// translations, or an empty list when nothing matched.
    pub fn translate_sense(&self, links: &[String], glosses: &[String]) -> Vec<String> {
        let mut found = BTreeSet::new();
        for link in links {
            if let Some(words) = self.lookup(link) {
                found.extend(words.iter().cloned());
            }
        }
        if found.is_empty() {
            for gloss in glosses {
                if let Some(words) = self.lookup(gloss.trim()) {
                    found.extend(words.iter().cloned());
                    continue;
                }
                let cut = gloss.split([';', '(']).next().unwrap_or_default().trim();
                if let Some(words) = self.lookup(cut) {
                    found.extend(words.iter().cloned());
                }
            }
        }
        found.into_iter().collect()
    }
}
