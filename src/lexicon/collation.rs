//! Collation keys for headwords.
//!
//! A key is the NFC form of the headword, lowercased, with whitespace
//! collapsed and diacritics folded away. Letters that a language treats as
//! distinct (Serbian `č`, Swedish `å`, Russian `й`) are protected from folding.
//! Index records are sorted by the UTF-8 bytes of these keys.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::lexicon::translit::{Script, transliterate};
use crate::lexicon::types::language::Language;

/// Letters with diacritics that are separate letters of the alphabet.
const PROTECTED_LETTERS: &[(&str, &str)] = &[
    ("sh", "čćđšž"),
    ("sr", "čćđšž"),
    ("hr", "čćđšž"),
    ("bs", "čćđšž"),
    ("sl", "čšž"),
    ("cs", "čďěňřšťůž"),
    ("sk", "äčďĺľňôŕšťž"),
    ("pl", "ąćęłńóśźż"),
    ("de", "äöüß"),
    ("sv", "åäö"),
    ("fi", "åäö"),
    ("da", "æøå"),
    ("no", "æøå"),
    ("et", "äöõüšž"),
    ("es", "ñ"),
    ("tr", "çğıöşü"),
    ("hu", "áéíóöőúüű"),
    ("ro", "ăâîșț"),
    ("lv", "āčēģīķļņšūž"),
    ("lt", "ąčęėįšųūž"),
    ("ru", "йё"),
    ("uk", "йїє"),
    ("be", "йёў"),
    ("bg", "й"),
    ("mk", "ѓќ"),
];

/// Languages whose dictionaries mix scripts; keys are folded into Latin so
/// both spellings of a word share one entry.
const BISCRIPTAL: &[&str] = &["sr", "sh"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collation {
    protected: Vec<char>,
    fold_script: Option<Script>,
}

impl Collation {
    /// A collation with no protected letters and no script folding.
    pub fn plain() -> Self {
        Self {
            protected: Vec::new(),
            fold_script: None,
        }
    }

    /// The collation used for headwords of `language`.
    pub fn for_language(language: &Language) -> Self {
        let protected = PROTECTED_LETTERS
            .iter()
            .find(|(code, _)| *code == language.code)
            .map(|(_, letters)| letters.chars().collect())
            .unwrap_or_default();
        let fold_script = BISCRIPTAL
            .contains(&language.code.as_str())
            .then_some(Script::Cyrillic);
        Self {
            protected,
            fold_script,
        }
    }

    /// Computes the collation key of `text`. Returns an empty string when
    /// nothing but whitespace remains.
    pub fn key(&self, text: &str) -> String {
        let collapsed = text.nfc().collect::<String>();
        let collapsed = collapsed.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut lowered = collapsed.to_lowercase();
        if let Some(script) = self.fold_script {
            lowered = transliterate(&lowered, script);
        }

        let mut key = String::with_capacity(lowered.len());
        for c in lowered.chars() {
            if self.protected.contains(&c) {
                key.push(c);
                continue;
            }
            key.extend(std::iter::once(c).nfd().filter(|d| !is_combining_mark(*d)));
        }
        key.nfc().collect()
    }
}

impl Default for Collation {
    fn default() -> Self {
        Self::plain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_but_keeps_protected_letters() {
        let serbian = Collation::for_language(&Language::resolve("sr"));
        assert_eq!(serbian.key("Kuća"), "kuća");
        assert_eq!(serbian.key("kúća"), "kuća");
        assert_eq!(serbian.key("кућа"), "kuća");

        let plain = Collation::plain();
        assert_eq!(plain.key("  Café \t au  lait "), "cafe au lait");
        assert_eq!(plain.key("   "), "");
    }
}
