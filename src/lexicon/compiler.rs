//! Hand-off to the external e-reader dictionary compiler.
//!
//! The compiler itself is a third-party program; this module only describes
//! the artifact it receives and runs it.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use super::encoder::EncodedDictionary;
use super::types::error::{LexiconError, Result};
use super::types::language::Language;

/// Locale codes the e-reader compiler accepts.
const SUPPORTED_LOCALES: &[&str] = &[
    "af", "sq", "ar", "ar-dz", "ar-bh", "ar-eg", "ar-iq", "ar-jo", "ar-kw", "ar-lb", "ar-ly", "ar-ma", "ar-om",
    "ar-qa", "ar-sa", "ar-sy", "ar-tn", "ar-ae", "ar-ye", "hy", "az", "eu", "be", "bn", "bg", "ca", "zh", "zh-hk",
    "zh-cn", "zh-sg", "zh-tw", "hr", "cs", "da", "nl", "nl-be", "en", "en-au", "en-bz", "en-ca", "en-ie", "en-jm",
    "en-nz", "en-ph", "en-za", "en-tt", "en-gb", "en-us", "en-zw", "et", "fo", "fa", "fi", "fr", "fr-be", "fr-ca",
    "fr-lu", "fr-mc", "fr-ch", "ka", "de", "de-at", "de-li", "de-lu", "de-ch", "el", "gu", "he", "hi", "hu", "is",
    "id", "it", "it-ch", "ja", "kn", "kk", "x-kok", "ko", "lv", "lt", "mk", "ms", "ms-bn", "ml", "mt", "mr", "ne",
    "no", "no-bok", "no-nyn", "or", "pl", "pt", "pt-br", "pa", "rm", "ro", "ro-mo", "ru", "ru-mo", "sz", "sa",
    "sr-latn", "sk", "sl", "sb", "es", "es-ar", "es-bo", "es-cl", "es-co", "es-cr", "es-do", "es-ec", "es-sv",
    "es-gt", "es-hn", "es-mx", "es-ni", "es-pa", "es-py", "es-pe", "es-pr", "es-uy", "es-ve", "sx", "sw", "sv",
    "sv-fi", "ta", "tt", "te", "th", "ts", "tn", "tr", "uk", "ur", "uz", "vi", "xh", "zu",
];

/// Codes the compiler rejects but has a close stand-in for.
const LOCALE_SUBSTITUTES: &[(&str, &str)] = &[("sr", "hr"), ("en", "en-us")];

/// Maps a language code to a locale the compiler accepts.
///
/// An explicit `override_code` wins but must itself be supported. Without one,
/// supported codes pass through, a few known codes are substituted, and
/// anything else falls back to `en`.
pub fn reader_locale(code: &str, override_code: Option<&str>) -> Result<String> {
    if let Some(requested) = override_code.filter(|c| !c.trim().is_empty()) {
        let normalized = requested.trim().to_lowercase();
        return if SUPPORTED_LOCALES.contains(&normalized.as_str()) {
            Ok(normalized)
        } else {
            Err(LexiconError::Config(format!(
                "Locale override '{}' is not supported by the dictionary compiler",
                requested
            )))
        };
    }

    let normalized = code.trim().to_lowercase();
    if normalized.is_empty() {
        return Ok("en".to_string());
    }
    if let Some((_, substitute)) = LOCALE_SUBSTITUTES.iter().find(|(from, _)| *from == normalized) {
        return Ok(substitute.to_string());
    }
    if SUPPORTED_LOCALES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Ok("en".to_string())
    }
}

/// What a compiler needs to know besides the two files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryMeta {
    pub title: String,
    pub source: Language,
    pub target: Language,
    /// Locale of the source language, see [`reader_locale`].
    pub locale: String,
    /// Path of the artifact the compiler is expected to produce.
    pub output: PathBuf,
}

/// Turns an encoded dictionary into a device-specific artifact.
pub trait Compiler {
    fn compile(&self, dictionary: &EncodedDictionary, meta: &DictionaryMeta) -> Result<PathBuf>;
}

/// Runs an external program.
///
/// Arguments may contain the placeholders `{index}`, `{data}`, `{source}`,
/// `{target}`, `{locale}`, `{title}` and `{out}`.
#[derive(Debug, Clone)]
pub struct ExternalCompiler {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCompiler {
    pub fn new(program: impl AsRef<Path>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn expand(&self, dictionary: &EncodedDictionary, meta: &DictionaryMeta) -> Vec<String> {
        let index = dictionary.index_path.display().to_string();
        let data = dictionary.data_path.display().to_string();
        let out = meta.output.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{index}", &index)
                    .replace("{data}", &data)
                    .replace("{source}", &meta.source.code)
                    .replace("{target}", &meta.target.code)
                    .replace("{locale}", &meta.locale)
                    .replace("{title}", &meta.title)
                    .replace("{out}", &out)
            })
            .collect()
    }

    fn failure(&self, message: impl Into<String>) -> LexiconError {
        LexiconError::Compiler {
            program: self.program.clone(),
            message: message.into(),
        }
    }
}

impl Compiler for ExternalCompiler {
    fn compile(&self, dictionary: &EncodedDictionary, meta: &DictionaryMeta) -> Result<PathBuf> {
        let args = self.expand(dictionary, meta);
        info!("Running compiler {} for '{}'", self.program.display(), meta.title);
        debug!("Compiler arguments: {:?}", args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| self.failure(format!("could not be started: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let detail = tail.into_iter().rev().collect::<Vec<_>>().join("\n");
            return Err(self.failure(format!("exited with {}: {}", output.status, detail.trim())));
        }
        if !meta.output.exists() {
            return Err(self.failure(format!("finished but did not produce {}", meta.output.display())));
        }

        info!("Compiled {}", meta.output.display());
        Ok(meta.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_substitutes_and_fallbacks() {
        assert_eq!(reader_locale("sr", None).unwrap(), "hr");
        assert_eq!(reader_locale("EN", None).unwrap(), "en-us");
        assert_eq!(reader_locale("de", None).unwrap(), "de");
        assert_eq!(reader_locale("xx", None).unwrap(), "en");
        assert_eq!(reader_locale("", None).unwrap(), "en");
    }

    #[test]
    fn locale_override_is_validated() {
        assert_eq!(reader_locale("sr", Some("sr-Latn")).unwrap(), "sr-latn");
        assert!(matches!(reader_locale("sr", Some("klingon")), Err(LexiconError::Config(_))));
    }
}
