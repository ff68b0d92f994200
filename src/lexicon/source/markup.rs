//! Markup cleanup for gloss and example text.
//!
//! Wikitext templates and links are reduced to their visible text, wikitext
//! emphasis becomes `<i>`/`<b>`, and HTML tags outside a small inline whitelist
//! are removed. Entities are decoded and whitespace collapsed.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Inline tags that survive cleanup (attributes are dropped).
pub const INLINE_WHITELIST: &[&str] = &["i", "b", "em", "strong", "sub", "sup"];

const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&amp;", "&"),
];

static TEMPLATE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn template_re() -> &'static Regex {
    TEMPLATE_PATTERN.get_or_init(|| Regex::new(r"\{\{[^{}]*\}\}").expect("Invalid template regex pattern"))
}

static LINK_PATTERN: OnceLock<Regex> = OnceLock::new();

fn link_re() -> &'static Regex {
    LINK_PATTERN.get_or_init(|| Regex::new(r"\[\[(?:[^\[\]|]*\|)?([^\[\]|]*)\]\]").expect("Invalid link regex pattern"))
}

static BOLD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn bold_re() -> &'static Regex {
    BOLD_PATTERN.get_or_init(|| Regex::new(r"'''(.+?)'''").expect("Invalid bold regex pattern"))
}

static ITALIC_PATTERN: OnceLock<Regex> = OnceLock::new();

fn italic_re() -> &'static Regex {
    ITALIC_PATTERN.get_or_init(|| Regex::new(r"''(.+?)''").expect("Invalid italic regex pattern"))
}

static TAG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_PATTERN.get_or_init(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)\b[^<>]*?(/?)>").expect("Invalid tag regex pattern"))
}

/// Cleans `text`, keeping whitelisted inline emphasis.
pub fn clean_markup(text: &str) -> String {
    let mut current = text.to_string();
    // Templates can nest; strip innermost first until none are left.
    loop {
        let stripped = template_re().replace_all(&current, "");
        if stripped == current {
            break;
        }
        current = stripped.into_owned();
    }
    let current = link_re().replace_all(&current, "$1");
    let current = bold_re().replace_all(&current, "<b>$1</b>");
    let current = italic_re().replace_all(&current, "<i>$1</i>");
    let current = tag_re().replace_all(&current, |caps: &Captures| {
        let name = caps[2].to_ascii_lowercase();
        if !INLINE_WHITELIST.contains(&name.as_str()) || !caps[3].is_empty() {
            return String::new();
        }
        format!("<{}{}>", &caps[1], name)
    });
    collapse_whitespace(&decode_entities(&current))
}

/// Cleans `text` down to plain text with no tags at all.
pub fn plain_text(text: &str) -> String {
    let cleaned = clean_markup(text);
    let without_tags = tag_re().replace_all(&cleaned, "");
    collapse_whitespace(&without_tags)
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, plain)| acc.replace(entity, plain))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
