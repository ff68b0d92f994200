//! Languages and language pairs.
//!
//! A [`LanguagePair`] is passed explicitly into every parse, merge and encode
//! call, so builds for different pairs can run side by side.

use std::fmt;

use serde::Deserialize;

use crate::lexicon::translit::Script;

/// Built-in metadata: (ISO 639-1, ISO 639-3, English name, script).
const KNOWN_LANGUAGES: &[(&str, &str, &str, Script)] = &[
    ("en", "eng", "English", Script::Latin),
    ("de", "deu", "German", Script::Latin),
    ("fr", "fra", "French", Script::Latin),
    ("es", "spa", "Spanish", Script::Latin),
    ("it", "ita", "Italian", Script::Latin),
    ("pt", "por", "Portuguese", Script::Latin),
    ("nl", "nld", "Dutch", Script::Latin),
    ("sv", "swe", "Swedish", Script::Latin),
    ("da", "dan", "Danish", Script::Latin),
    ("no", "nor", "Norwegian", Script::Latin),
    ("fi", "fin", "Finnish", Script::Latin),
    ("pl", "pol", "Polish", Script::Latin),
    ("cs", "ces", "Czech", Script::Latin),
    ("sk", "slk", "Slovak", Script::Latin),
    ("sl", "slv", "Slovene", Script::Latin),
    ("hr", "hrv", "Croatian", Script::Latin),
    ("bs", "bos", "Bosnian", Script::Latin),
    ("sh", "hbs", "Serbo-Croatian", Script::Latin),
    ("sr", "srp", "Serbian", Script::Cyrillic),
    ("ru", "rus", "Russian", Script::Cyrillic),
    ("uk", "ukr", "Ukrainian", Script::Cyrillic),
    ("be", "bel", "Belarusian", Script::Cyrillic),
    ("bg", "bul", "Bulgarian", Script::Cyrillic),
    ("mk", "mkd", "Macedonian", Script::Cyrillic),
    ("el", "ell", "Greek", Script::Greek),
    ("tr", "tur", "Turkish", Script::Latin),
    ("hu", "hun", "Hungarian", Script::Latin),
    ("ro", "ron", "Romanian", Script::Latin),
    ("et", "est", "Estonian", Script::Latin),
    ("lv", "lav", "Latvian", Script::Latin),
    ("lt", "lit", "Lithuanian", Script::Latin),
    ("la", "lat", "Latin", Script::Latin),
    ("eo", "epo", "Esperanto", Script::Latin),
];

/// Kaikki publishes these languages under a shared name.
const KAIKKI_FALLBACKS: &[(&str, &str)] = &[
    ("Croatian", "Serbo-Croatian"),
    ("Serbian", "Serbo-Croatian"),
    ("Bosnian", "Serbo-Croatian"),
    ("Montenegrin", "Serbo-Croatian"),
];

/// A language as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    /// Short code, ISO 639-1 where one exists (`"sr"`, `"en"`).
    pub code: String,
    /// English name as used by Kaikki (`"Serbian"`).
    pub name: String,
    pub script: Script,
}

impl Language {
    /// Resolves a code (639-1 or 639-3) or English name against the built-in table.
    ///
    /// Unknown inputs become a Latin-script language with the input as both code
    /// and name.
    pub fn resolve(code_or_name: &str) -> Self {
        let needle = code_or_name.trim();
        let lower = needle.to_lowercase();
        KNOWN_LANGUAGES
            .iter()
            .find(|(c1, c3, name, _)| *c1 == lower || *c3 == lower || name.eq_ignore_ascii_case(needle))
            .map(|(c1, _, name, script)| Language {
                code: c1.to_string(),
                name: name.to_string(),
                script: *script,
            })
            .unwrap_or_else(|| Language {
                code: lower.clone(),
                name: needle.to_string(),
                script: Script::Latin,
            })
    }

    /// The three-letter code Tatoeba and FreeDict use, if known.
    pub fn iso639_3(&self) -> Option<&'static str> {
        KNOWN_LANGUAGES
            .iter()
            .find(|(c1, _, _, _)| *c1 == self.code)
            .map(|(_, c3, _, _)| *c3)
    }

    /// The language name under which Kaikki files this language.
    pub fn kaikki_name(&self) -> &str {
        KAIKKI_FALLBACKS
            .iter()
            .find(|(name, _)| *name == self.name)
            .map(|(_, fallback)| *fallback)
            .unwrap_or(&self.name)
    }

    /// True when `tag` names this language by 639-1 code, 639-3 code or name.
    ///
    /// Region subtags are ignored (`"en-GB"` matches English).
    pub fn matches(&self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        let primary = tag.split(['-', '_']).next().unwrap_or(tag).to_lowercase();
        primary == self.code
            || self.iso639_3() == Some(primary.as_str())
            || tag.eq_ignore_ascii_case(&self.name)
            || tag.eq_ignore_ascii_case(self.kaikki_name())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// The source→target pair a build is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    pub fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    /// Shorthand for `LanguagePair::new(Language::resolve(a), Language::resolve(b))`.
    pub fn resolve(source: &str, target: &str) -> Self {
        Self::new(Language::resolve(source), Language::resolve(target))
    }

    /// Script to transliterate `headword` from, if it needs a transliteration.
    ///
    /// Only Latin targets get one. The headword's own script decides, since
    /// biscriptal languages are tabled as Latin but carry Cyrillic headwords.
    pub fn transliteration_script(&self, headword: &str) -> Option<Script> {
        if self.target.script != Script::Latin {
            return None;
        }
        Script::detect(headword).filter(|script| *script != Script::Latin)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.source.code, self.target.code)
    }
}
