//! FreeDict TEI XML parser.
//!
//! [`TeiRecords`] streams a TEI document and cuts it into one record per
//! `<entry>` element, so only a single entry is ever held in memory.
//! [`FreeDictParser`] then maps the entry onto canonical entries.
//!
//! ```xml
//! <entry>
//!   <form><orth>kuća</orth><orth>kuča</orth></form>
//!   <gramGrp><pos>n</pos></gramGrp>
//!   <sense>
//!     <cit type="trans" xml:lang="en"><quote>house</quote></cit>
//!     <cit type="example"><quote>Moja kuća.</quote>
//!       <cit type="trans"><quote>My house.</quote></cit></cit>
//!   </sense>
//! </entry>
//! ```

use std::io::{self, BufRead};

use log::trace;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::SourceParser;
use super::markup::{collapse_whitespace, decode_entities};
use crate::lexicon::types::error::{LexiconError, Result, SkipReason};
use crate::lexicon::types::language::LanguagePair;
use crate::lexicon::types::models::{Entry, Example, PartOfSpeech, Sense, SourceTag};

/// Elements whose `xml:lang` declares the language of the whole document.
const DOCUMENT_ELEMENTS: &[&str] = &["TEI", "text", "body"];

/// A node of a captured entry subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let attrs = start
            .attributes()
            .map(|attr_result| {
                let attr = attr_result.map_err(|e| format!("Failed to parse XML attribute: {}", e))?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map_err(|e| format!("Failed to decode XML value: {}", e))?
                    .into_owned();
                Ok((key, value))
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |el| el.name == name)
    }

    /// All text below this element, whitespace collapsed.
    pub fn text(&self) -> String {
        fn collect(el: &XmlElement, out: &mut String) {
            for child in &el.children {
                match child {
                    XmlNode::Text(text) => out.push_str(text),
                    XmlNode::Element(inner) => {
                        out.push(' ');
                        collect(inner, out);
                        out.push(' ');
                    }
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        collapse_whitespace(&out)
    }
}

/// One `<entry>` cut out of a TEI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeiRecord {
    Entry {
        /// `xml:lang` declared on `<TEI>`, `<text>` or `<body>`, if any.
        document_lang: Option<String>,
        element: XmlElement,
    },
    /// The entry could not be read as XML.
    Malformed(String),
}

/// Streams `<entry>` records out of a TEI document.
pub struct TeiRecords<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    document_lang: Option<String>,
    stack: Vec<XmlElement>,
    done: bool,
}

impl<R: BufRead> TeiRecords<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            buf: Vec::new(),
            document_lang: None,
            stack: Vec::new(),
            done: false,
        }
    }

    fn open_element(&mut self, element: XmlElement) {
        if !self.stack.is_empty() || element.name == "entry" {
            self.stack.push(element);
        } else if DOCUMENT_ELEMENTS.contains(&element.name.as_str())
            && let Some(lang) = element.attr("xml:lang")
        {
            self.document_lang = Some(lang.to_string());
        }
    }

    /// Closes the innermost open element; returns the entry when it completes.
    fn close_element(&mut self) -> Option<TeiRecord> {
        let finished = self.stack.pop()?;
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(XmlNode::Element(finished));
                None
            }
            None => Some(TeiRecord::Entry {
                document_lang: self.document_lang.clone(),
                element: finished,
            }),
        }
    }

    fn push_text(&mut self, text: String) {
        if let Some(top) = self.stack.last_mut() {
            top.children.push(XmlNode::Text(text));
        }
    }
}

impl<R: BufRead> Iterator for TeiRecords<R> {
    type Item = Result<TeiRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event.into_owned(),
                Err(quick_xml::Error::Io(e)) => {
                    self.done = true;
                    return Some(Err(LexiconError::Io(io::Error::new(e.kind(), e.to_string()))));
                }
                Err(e) => {
                    // A broken entry is dropped whole; stop if the reader cannot advance.
                    if self.reader.buffer_position() == position {
                        self.done = true;
                    }
                    if self.stack.is_empty() {
                        continue;
                    }
                    self.stack.clear();
                    return Some(Ok(TeiRecord::Malformed(e.to_string())));
                }
            };

            match event {
                Event::Start(start) => match XmlElement::from_start(&start) {
                    Ok(element) => self.open_element(element),
                    Err(message) if !self.stack.is_empty() || start.local_name().as_ref() == b"entry" => {
                        self.stack.clear();
                        let _ = self.reader.read_to_end_into(start.name(), &mut Vec::new());
                        return Some(Ok(TeiRecord::Malformed(message)));
                    }
                    Err(_) => {}
                },
                Event::Empty(start) => {
                    if let Ok(element) = XmlElement::from_start(&start) {
                        self.open_element(element);
                        if !self.stack.is_empty()
                            && let Some(record) = self.close_element()
                        {
                            return Some(Ok(record));
                        }
                    }
                }
                Event::End(_) => {
                    if let Some(record) = self.close_element() {
                        trace!("Captured TEI entry record");
                        return Some(Ok(record));
                    }
                }
                Event::Text(text) => {
                    if !self.stack.is_empty() {
                        let decoded = match text.unescape() {
                            Ok(decoded) => decoded.into_owned(),
                            Err(_) => decode_entities(&String::from_utf8_lossy(&text)),
                        };
                        self.push_text(decoded);
                    }
                }
                Event::CData(data) => {
                    if !self.stack.is_empty() {
                        self.push_text(String::from_utf8_lossy(&data).into_owned());
                    }
                }
                Event::Eof => {
                    self.done = true;
                    if !self.stack.is_empty() {
                        self.stack.clear();
                        return Some(Ok(TeiRecord::Malformed("document ends inside an entry".to_string())));
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Parser for FreeDict TEI entries.
#[derive(Debug, Clone)]
pub struct FreeDictParser {
    priority: u32,
}

/// Orthographies of one entry or homograph.
#[derive(Debug, Default)]
struct Forms {
    display: Option<String>,
    variants: Vec<String>,
}

impl Forms {
    /// The first `<orth>` of the first `<form>` is the display form. Further
    /// orths and every orth of a nested `<form>` are variants.
    fn collect(node: &XmlElement, into: &mut Forms) {
        for form in node.children_named("form") {
            for (i, orth) in form.children_named("orth").enumerate() {
                let text = orth.text();
                if text.is_empty() {
                    continue;
                }
                if i == 0 && into.display.is_none() {
                    into.display = Some(text);
                } else {
                    into.variants.push(text);
                }
            }
            let mut nested = Forms::default();
            Forms::collect(form, &mut nested);
            into.variants.extend(nested.display);
            into.variants.extend(nested.variants);
        }
    }
}

impl FreeDictParser {
    pub fn new(priority: u32) -> Self {
        Self { priority }
    }

    fn part_of_speech(node: &XmlElement) -> Option<PartOfSpeech> {
        node.children_named("gramGrp")
            .flat_map(|grp| grp.children_named("pos"))
            .chain(node.children_named("pos"))
            .map(|pos| PartOfSpeech::from_tag(&pos.text()))
            .find(|pos| pos.is_known())
    }

    fn is_type(cit: &XmlElement, types: &[&str]) -> bool {
        cit.attr("type").is_some_and(|t| types.contains(&t))
    }

    fn quotes(cit: &XmlElement) -> impl Iterator<Item = String> + '_ {
        cit.children_named("quote").map(XmlElement::text).filter(|q| !q.is_empty())
    }

    /// Collects the senses under `node`, flattening nested `<sense>` elements.
    ///
    /// Returns the senses kept for the target language and whether any
    /// gloss text was present at all.
    fn senses(node: &XmlElement, pair: &LanguagePair, out: &mut Vec<Sense>) -> bool {
        let mut saw_text = false;
        for sense in node.children_named("sense") {
            let mut translations: Vec<String> = Vec::new();
            let mut examples: Vec<Example> = Vec::new();
            for cit in sense.children_named("cit") {
                if Self::is_type(cit, &["trans", "translation", "translationEquivalent"]) {
                    let quotes: Vec<String> = Self::quotes(cit).collect();
                    saw_text |= !quotes.is_empty();
                    if cit.attr("xml:lang").is_none_or(|lang| pair.target.matches(lang)) {
                        for quote in quotes {
                            if !translations.contains(&quote) {
                                translations.push(quote);
                            }
                        }
                    }
                } else if Self::is_type(cit, &["example"]) {
                    for text in Self::quotes(cit) {
                        let translation = cit
                            .children_named("cit")
                            .filter(|inner| Self::is_type(inner, &["trans", "translation"]))
                            .flat_map(Self::quotes)
                            .next();
                        examples.push(Example { text, translation });
                    }
                }
            }
            let defs: Vec<String> = sense
                .children_named("def")
                .map(XmlElement::text)
                .filter(|d| !d.is_empty())
                .collect();
            saw_text |= !defs.is_empty();

            let gloss = if !translations.is_empty() {
                translations.join(", ")
            } else {
                defs.join("; ")
            };
            if !gloss.is_empty() {
                out.push(Sense::new(gloss, SourceTag::FreeDict).with_examples(examples));
            }
            saw_text |= Self::senses(sense, pair, out);
        }
        saw_text
    }
}

impl SourceParser for FreeDictParser {
    type Record = TeiRecord;

    fn source_tag(&self) -> SourceTag {
        SourceTag::FreeDict
    }

    fn parse(&self, record: TeiRecord, pair: &LanguagePair) -> std::result::Result<Vec<Entry>, SkipReason> {
        let (document_lang, element) = match record {
            TeiRecord::Entry { document_lang, element } => (document_lang, element),
            TeiRecord::Malformed(message) => return Err(SkipReason::Malformed(message)),
        };
        let lang = element.attr("xml:lang").map(str::to_string).or(document_lang);
        if lang.as_deref().is_some_and(|l| !pair.source.matches(l)) {
            return Ok(Vec::new());
        }

        let mut entry_forms = Forms::default();
        Forms::collect(&element, &mut entry_forms);
        let entry_pos = Self::part_of_speech(&element);

        let homographs: Vec<&XmlElement> = element.children_named("hom").collect();
        let nodes = if homographs.is_empty() { vec![&element] } else { homographs };

        let mut out = Vec::with_capacity(nodes.len());
        let mut saw_text = false;
        let mut saw_orth = entry_forms.display.is_some();
        for node in nodes {
            let mut forms = Forms::default();
            if !std::ptr::eq(node, &element) {
                Forms::collect(node, &mut forms);
            }
            let Some(display) = entry_forms.display.clone().or_else(|| forms.display.clone()) else {
                continue;
            };
            saw_orth = true;
            let pos = Self::part_of_speech(node).or(entry_pos).unwrap_or_default();

            let mut senses = Vec::new();
            saw_text |= Self::senses(node, pair, &mut senses);
            if senses.is_empty() {
                continue;
            }

            let mut entry = Entry::new(display, pos, self.priority);
            entry.senses = senses;
            let own_display = forms.display.iter().filter(|_| entry_forms.display.is_some());
            for variant in entry_forms.variants.iter().chain(own_display).chain(&forms.variants) {
                entry.add_variant(variant);
            }
            out.push(entry);
        }

        if !saw_orth {
            return Err(SkipReason::MissingField("orth"));
        }
        if out.is_empty() && !saw_text {
            return Err(SkipReason::NoUsableSense);
        }
        Ok(out)
    }
}
