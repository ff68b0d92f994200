//! Kaikki (wiktextract) JSONL parser.
//!
//! One JSON object per line, one object per (word, part of speech). Only the
//! fields used here are modelled; everything else is ignored.

use std::collections::HashSet;

use serde::Deserialize;

use super::SourceParser;
use super::markup::{clean_markup, plain_text};
use super::pivot::TranslationPivot;
use crate::lexicon::types::error::SkipReason;
use crate::lexicon::types::language::{Language, LanguagePair};
use crate::lexicon::types::models::{Entry, Example, PartOfSpeech, Sense, SourceTag};

/// Form tags that mark table scaffolding rather than real word forms.
const IGNORED_FORM_TAGS: &[&str] = &["table-tags", "inflection-template", "romanization", "class"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KaikkiRecord {
    word: Option<String>,
    lang: Option<String>,
    lang_code: Option<String>,
    pos: Option<String>,
    forms: Vec<KaikkiForm>,
    senses: Option<Vec<KaikkiSense>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KaikkiForm {
    form: String,
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KaikkiSense {
    glosses: Vec<String>,
    raw_glosses: Vec<String>,
    links: Vec<Vec<String>>,
    examples: Vec<KaikkiExample>,
    form_of: Vec<KaikkiLink>,
    alt_of: Vec<KaikkiLink>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KaikkiExample {
    text: Option<String>,
    english: Option<String>,
    translation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KaikkiLink {
    word: String,
}

impl KaikkiSense {
    fn glosses(&self) -> &[String] {
        if self.glosses.is_empty() { &self.raw_glosses } else { &self.glosses }
    }

    fn redirect_targets(&self) -> impl Iterator<Item = &str> {
        self.form_of
            .iter()
            .chain(&self.alt_of)
            .map(|link| link.word.trim())
            .filter(|word| !word.is_empty())
    }
}

/// Parser for Kaikki JSONL lines.
#[derive(Debug, Clone)]
pub struct WiktionaryParser {
    priority: u32,
    /// Language the glosses of the dump are written in.
    edition: Language,
    pivot: Option<TranslationPivot>,
}

impl WiktionaryParser {
    pub fn new(priority: u32, edition: Language) -> Self {
        Self {
            priority,
            edition,
            pivot: None,
        }
    }

    /// Rewrites glosses into the target language when it differs from the edition.
    pub fn with_pivot(mut self, pivot: TranslationPivot) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Whether this parser can produce glosses for `pair` at all.
    pub fn supports(&self, pair: &LanguagePair) -> bool {
        self.edition.code == pair.target.code || self.pivot.is_some()
    }

    /// A record without any language tag cannot be attributed and is filtered.
    fn matches_language(record: &KaikkiRecord, source: &Language) -> bool {
        record.lang_code.as_deref().is_some_and(|c| source.matches(c))
            || record.lang.as_deref().is_some_and(|l| source.matches(l))
    }

    /// Resolves the gloss text of `sense`, collapsing repeated parent glosses.
    ///
    /// wiktextract repeats the parent gloss at the head of each subsense. If
    /// a sibling carries exactly that head, only the subsense's own gloss is
    /// kept; otherwise the head stays as `parent: child`.
    fn resolve_gloss(sense: &KaikkiSense, sibling_glosses: &HashSet<&[String]>) -> Option<String> {
        let glosses = sense.glosses();
        let (last, head) = glosses.split_last()?;
        let text = if head.is_empty() || sibling_glosses.contains(head) {
            last.clone()
        } else {
            glosses.join(": ")
        };
        let cleaned = clean_markup(&text);
        (!cleaned.is_empty()).then_some(cleaned)
    }

    fn examples(sense: &KaikkiSense, keep_translation: bool) -> Vec<Example> {
        sense
            .examples
            .iter()
            .filter_map(|ex| {
                let text = plain_text(ex.text.as_deref()?);
                if text.is_empty() {
                    return None;
                }
                let translation = keep_translation
                    .then(|| ex.english.as_deref().or(ex.translation.as_deref()))
                    .flatten()
                    .map(plain_text)
                    .filter(|t| !t.is_empty());
                Some(Example { text, translation })
            })
            .collect()
    }
}

impl SourceParser for WiktionaryParser {
    type Record = String;

    fn source_tag(&self) -> SourceTag {
        SourceTag::Wiktionary
    }

    fn parse(&self, line: String, pair: &LanguagePair) -> Result<Vec<Entry>, SkipReason> {
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        let record: KaikkiRecord =
            serde_json::from_str(&line).map_err(|e| SkipReason::Malformed(e.to_string()))?;

        let word = record
            .word
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or(SkipReason::MissingField("word"))?
            .to_string();
        if !Self::matches_language(&record, &pair.source) {
            return Ok(Vec::new());
        }
        if !self.supports(pair) {
            return Ok(Vec::new());
        }
        let senses = record.senses.as_deref().ok_or(SkipReason::MissingField("senses"))?;

        let sibling_glosses: HashSet<&[String]> = senses.iter().map(|s| s.glosses()).collect();
        let pivoting = self.edition.code != pair.target.code;
        let pos = PartOfSpeech::from_tag(record.pos.as_deref().unwrap_or_default());

        let mut entry = Entry::new(word.clone(), pos, self.priority);
        let mut redirects: Vec<Entry> = Vec::new();
        let mut had_gloss = false;

        for sense in senses {
            let mut is_redirect = false;
            for target in sense.redirect_targets() {
                is_redirect = true;
                if target != word && !redirects.iter().any(|r| r.display_form == target) {
                    redirects.push(Entry::new(target, PartOfSpeech::Unknown, self.priority).with_variant(&word));
                }
            }
            if is_redirect {
                continue;
            }

            let Some(gloss) = Self::resolve_gloss(sense, &sibling_glosses) else {
                continue;
            };
            had_gloss = true;

            let gloss = match (&self.pivot, pivoting) {
                (Some(pivot), true) => {
                    let links: Vec<String> = sense.links.iter().filter_map(|l| l.first().cloned()).collect();
                    let plain = vec![plain_text(&gloss)];
                    let translated = pivot.translate_sense(&links, &plain);
                    if translated.is_empty() {
                        continue;
                    }
                    translated.join(", ")
                }
                _ => gloss,
            };
            let examples = Self::examples(sense, !pivoting);
            entry.senses.push(Sense::new(gloss, SourceTag::Wiktionary).with_examples(examples));
        }

        for form in &record.forms {
            if form.tags.iter().any(|t| IGNORED_FORM_TAGS.contains(&t.as_str())) {
                continue;
            }
            let form = plain_text(&form.form);
            if form != "-" {
                entry.add_variant(&form);
            }
        }

        let mut out = Vec::with_capacity(1 + redirects.len());
        if !entry.senses.is_empty() {
            out.push(entry);
        } else if !had_gloss && redirects.is_empty() {
            return Err(SkipReason::NoUsableSense);
        }
        out.extend(redirects);
        Ok(out)
    }
}
