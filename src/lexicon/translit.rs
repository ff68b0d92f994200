//! Script transliteration.
//!
//! [`transliterate`] maps the characters of one script onto a Latin
//! approximation and leaves everything else untouched, so mixed-script input
//! is safe. All functions here are pure and total.

use serde::Deserialize;

/// Writing systems the transliterator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
}

impl Script {
    /// Returns the script of a single character, if it belongs to a known one.
    pub fn of(c: char) -> Option<Script> {
        match c {
            '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}' => Some(Script::Cyrillic),
            '\u{0370}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}' => Some(Script::Greek),
            c if c.is_ascii_alphabetic() => Some(Script::Latin),
            '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}' if c.is_alphabetic() => Some(Script::Latin),
            _ => None,
        }
    }

    /// Detects the dominant script of `text`; `None` when it has no letters.
    pub fn detect(text: &str) -> Option<Script> {
        let mut counts = [0usize; 3];
        for script in text.chars().filter_map(Script::of) {
            counts[script as usize] += 1;
        }
        let (index, count) = counts
            .iter()
            .enumerate()
            .max_by_key(|(i, count)| (**count, std::cmp::Reverse(*i)))?;
        if *count == 0 {
            return None;
        }
        Some(match index {
            0 => Script::Latin,
            1 => Script::Cyrillic,
            _ => Script::Greek,
        })
    }
}

/// Cyrillic lowercase → Latin. Serbian letters use the official Serbian Latin
/// alphabet; the remaining letters follow scientific transliteration.
const CYRILLIC: &[(char, &str)] = &[
    ('а', "a"), ('б', "b"), ('в', "v"), ('г', "g"), ('д', "d"), ('ђ', "đ"),
    ('е', "e"), ('ж', "ž"), ('з', "z"), ('и', "i"), ('ј', "j"), ('к', "k"),
    ('л', "l"), ('љ', "lj"), ('м', "m"), ('н', "n"), ('њ', "nj"), ('о', "o"),
    ('п', "p"), ('р', "r"), ('с', "s"), ('т', "t"), ('ћ', "ć"), ('у', "u"),
    ('ф', "f"), ('х', "h"), ('ц', "c"), ('ч', "č"), ('џ', "dž"), ('ш', "š"),
    // Russian, Ukrainian, Belarusian, Bulgarian, Macedonian
    ('й', "j"), ('щ', "šč"), ('ъ', "ʺ"), ('ы', "y"), ('ь', "ʹ"), ('э', "è"),
    ('ю', "ju"), ('я', "ja"), ('ё', "ë"), ('є', "je"), ('і', "i"), ('ї', "ji"),
    ('ґ', "g"), ('ў', "ŭ"), ('ѓ', "ǵ"), ('ќ', "ḱ"), ('ѕ', "dz"),
];

/// Greek lowercase → Latin (ISO 843 style, tonos dropped).
const GREEK: &[(char, &str)] = &[
    ('α', "a"), ('ά', "a"), ('β', "v"), ('γ', "g"), ('δ', "d"), ('ε', "e"),
    ('έ', "e"), ('ζ', "z"), ('η', "i"), ('ή', "i"), ('θ', "th"), ('ι', "i"),
    ('ί', "i"), ('ϊ', "i"), ('ΐ', "i"), ('κ', "k"), ('λ', "l"), ('μ', "m"),
    ('ν', "n"), ('ξ', "x"), ('ο', "o"), ('ό', "o"), ('π', "p"), ('ρ', "r"),
    ('σ', "s"), ('ς', "s"), ('τ', "t"), ('υ', "y"), ('ύ', "y"), ('ϋ', "y"),
    ('ΰ', "y"), ('φ', "f"), ('χ', "ch"), ('ψ', "ps"), ('ω', "o"), ('ώ', "o"),
];

/// Serbian Latin digraphs that map to a single Cyrillic letter.
const LATIN_DIGRAPHS: &[(&str, char)] = &[("dž", 'џ'), ("lj", 'љ'), ("nj", 'њ')];

/// Serbian Latin single letters → Cyrillic.
const LATIN_TO_CYRILLIC: &[(char, char)] = &[
    ('a', 'а'), ('b', 'б'), ('c', 'ц'), ('č', 'ч'), ('ć', 'ћ'), ('d', 'д'),
    ('đ', 'ђ'), ('e', 'е'), ('f', 'ф'), ('g', 'г'), ('h', 'х'), ('i', 'и'),
    ('j', 'ј'), ('k', 'к'), ('l', 'л'), ('m', 'м'), ('n', 'н'), ('o', 'о'),
    ('p', 'п'), ('r', 'р'), ('s', 'с'), ('š', 'ш'), ('t', 'т'), ('u', 'у'),
    ('v', 'в'), ('z', 'з'), ('ž', 'ж'),
];

fn lookup<'a>(table: &'a [(char, &'a str)], c: char) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == c).map(|(_, v)| *v)
}

fn lower_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Transliterates the `script` characters of `text` into Latin.
///
/// Characters of other scripts, digits and punctuation pass through
/// unchanged; so does any character missing from the tables. `Latin` is the
/// identity. An uppercase letter that expands to several Latin letters is
/// title-cased (`Љ` → `Lj`), or fully upper-cased when the next letter is
/// uppercase too (`ЉУБАВ` → `LJUBAV`).
pub fn transliterate(text: &str, script: Script) -> String {
    let table = match script {
        Script::Latin => return text.to_string(),
        Script::Cyrillic => CYRILLIC,
        Script::Greek => GREEK,
    };

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if Script::of(c) != Some(script) {
            out.push(c);
            continue;
        }
        let lower = lower_char(c);
        let Some(latin) = lookup(table, lower) else {
            out.push(c);
            continue;
        };
        if lower == c {
            out.push_str(latin);
        } else {
            let next_upper = chars
                .get(i + 1)
                .is_some_and(|n| n.is_uppercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if next_upper || (prev_upper && chars.get(i + 1).is_none_or(|n| !n.is_alphabetic())) {
                out.push_str(&latin.to_uppercase());
            } else {
                let mut letters = latin.chars();
                if let Some(first) = letters.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(letters.as_str());
                }
            }
        }
    }
    out
}

/// Serbian Latin → Cyrillic. Digraphs `lj`, `nj` and `dž` are consumed greedily.
pub fn to_cyrillic(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair: String = [lower_char(chars[i]), lower_char(chars[i + 1])].iter().collect();
            if let Some((_, cyr)) = LATIN_DIGRAPHS.iter().find(|(d, _)| *d == pair) {
                if chars[i].is_uppercase() {
                    out.extend(cyr.to_uppercase());
                } else {
                    out.push(*cyr);
                }
                i += 2;
                continue;
            }
        }
        let c = chars[i];
        let lower = lower_char(c);
        match LATIN_TO_CYRILLIC.iter().find(|(l, _)| *l == lower) {
            Some((_, cyr)) if c.is_uppercase() => out.extend(cyr.to_uppercase()),
            Some((_, cyr)) => out.push(*cyr),
            None => out.push(c),
        }
        i += 1;
    }
    out
}
