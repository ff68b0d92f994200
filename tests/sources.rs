use dictweave::lexicon::source::dump::{DumpSource, FileDump, LineRecords, MemoryDump};
use dictweave::lexicon::source::freedict::{FreeDictParser, TeiRecords};
use dictweave::lexicon::source::pivot::TranslationPivot;
use dictweave::lexicon::source::tatoeba::{SentenceBank, TatoebaParser, split_pair};
use dictweave::lexicon::source::wiktionary::WiktionaryParser;
use dictweave::lexicon::source::{SourceParser, collect_entries};
use dictweave::lexicon::types::error::SkipReason;
use dictweave::{Collation, Entry, ExampleProvider, Language, LanguagePair, LexiconError, PartOfSpeech, SourceTag};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::sync::atomic::AtomicBool;

const KAIKKI_SR: &str = r#"{"word": "кућа", "lang": "Serbo-Croatian", "lang_code": "sh", "pos": "noun", "forms": [{"form": "куће", "tags": ["genitive", "singular"]}, {"form": "no-table-tags", "tags": ["table-tags"]}, {"form": "kuća", "tags": ["romanization"]}], "senses": [{"glosses": ["house"], "examples": [{"text": "Ово је моја кућа.", "english": "This is my house."}]}, {"glosses": ["home"]}]}
this is not json
{"lang": "Serbo-Croatian", "lang_code": "sh", "pos": "noun", "senses": [{"glosses": ["nameless"]}]}
{"word": "Haus", "lang": "German", "lang_code": "de", "pos": "noun", "senses": [{"glosses": ["house"]}]}
{"word": "куће", "lang": "Serbo-Croatian", "lang_code": "sh", "pos": "noun", "senses": [{"glosses": ["inflection of кућа"], "form_of": [{"word": "кућа"}]}]}
{"word": "пас", "lang": "Serbo-Croatian", "lang_code": "sh", "pos": "noun", "senses": [{"glosses": ["dog"]}, {"glosses": ["dog", "male dog"]}, {"raw_glosses": ["[[belt]] (''clothing'')"]}]}

{"word": "ништа", "lang": "Serbo-Croatian", "lang_code": "sh", "pos": "pron", "senses": [{"tags": ["no-gloss"]}]}
"#;

const TEI_SR_EN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <text xml:lang="sr">
    <body>
      <entry>
        <form type="lemma"><orth>pas</orth><orth>pseto</orth></form>
        <gramGrp><pos>n</pos></gramGrp>
        <sense>
          <cit type="trans" xml:lang="en"><quote>dog</quote></cit>
          <cit type="trans" xml:lang="de"><quote>Hund</quote></cit>
          <cit type="example"><quote>Pas laje.</quote><cit type="trans"><quote>The dog barks.</quote></cit></cit>
        </sense>
        <sense><cit type="trans"><quote>hound</quote></cit></sense>
      </entry>
      <entry>
        <form><orth>luk</orth></form>
        <hom><gramGrp><pos>n</pos></gramGrp><sense><cit type="trans"><quote>onion</quote></cit></sense></hom>
        <hom><gramGrp><pos>n</pos></gramGrp><sense><cit type="trans"><quote>bow</quote></cit></sense></hom>
      </entry>
      <entry>
        <sense><cit type="trans"><quote>orphan</quote></cit></sense>
      </entry>
      <entry>
        <form><orth>mačka &amp; mače</orth></form>
        <sense><def>a cat &lt;domestic&gt;</def></sense>
      </entry>
    </body>
  </text>
</TEI>
"#;

const TATOEBA_SR_EN: &str = "1\tsrp\tHvala!\t2\teng\tThank you!
3\tsrp\tPas laje na mačku.\t4\teng\tThe dog barks at the cat.
5\tsrp\tMoj pas spava.\t6\teng\tMy dog is sleeping.
7\tdeu\tDanke!\t8\teng\tThanks!
# comment
9\tsrp\tsplit\tinto five\tfields
10\thrv\tDobro jutro.\t11\teng\tGood morning.
12\tsrp\t\t13\teng\tEmpty source.
";

fn serbian() -> LanguagePair {
    LanguagePair::resolve("sr", "en")
}

fn run<P, I>(parser: &P, records: I) -> (Vec<Entry>, dictweave::lexicon::source::SourceStats)
where
    P: SourceParser,
    I: IntoIterator<Item = dictweave::Result<P::Record>>,
{
    collect_entries(parser, records, &serbian(), &AtomicBool::new(false)).unwrap()
}

fn find<'a>(entries: &'a [Entry], display: &str) -> &'a Entry {
    entries
        .iter()
        .find(|e| e.display_form == display && !e.senses.is_empty())
        .unwrap_or_else(|| panic!("no entry for {}", display))
}

#[test]
fn kaikki_lines_become_entries_and_bad_lines_are_counted() {
    let dump = MemoryDump::new("kaikki-sh", KAIKKI_SR);
    let parser = WiktionaryParser::new(1, Language::resolve("en"));
    let (entries, stats) = run(&parser, LineRecords::new(dump.open().unwrap()));

    assert_eq!(stats.records_read, 8);
    // not json, no word, nothing glossed
    assert_eq!(stats.records_skipped, 3);
    // other language, blank line
    assert_eq!(stats.records_filtered, 2);

    let house = find(&entries, "кућа");
    assert_eq!(house.part_of_speech, PartOfSpeech::Noun);
    let glosses: Vec<&str> = house.senses.iter().map(|s| s.gloss.as_str()).collect();
    assert_eq!(glosses, ["house", "home"]);
    assert_eq!(house.senses[0].examples[0].translation.as_deref(), Some("This is my house."));
    assert!(house.variant_forms.contains("куће"));
    assert!(!house.variant_forms.contains("no-table-tags"));
    assert!(!house.variant_forms.contains("kuća"));

    let redirect = entries.iter().find(|e| e.display_form == "кућа" && e.is_alias_only()).unwrap();
    assert!(redirect.variant_forms.contains("куће"));

    let dog = find(&entries, "пас");
    let glosses: Vec<&str> = dog.senses.iter().map(|s| s.gloss.as_str()).collect();
    assert_eq!(glosses, ["dog", "male dog", "belt (<i>clothing</i>)"]);

    assert!(entries.iter().all(|e| e.display_form != "Haus"));
    let sequences: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, (0..entries.len() as u64).collect::<Vec<_>>());
}

#[test]
fn kaikki_record_without_word_is_a_skip_not_an_error() {
    let parser = WiktionaryParser::new(1, Language::resolve("en"));
    let line = r#"{"lang_code": "sh", "senses": [{"glosses": ["x"]}]}"#.to_string();
    assert_eq!(parser.parse(line, &serbian()), Err(SkipReason::MissingField("word")));
}

#[test]
fn kaikki_record_without_language_is_filtered() {
    let parser = WiktionaryParser::new(1, Language::resolve("en"));
    let line = r#"{"word": "kuća", "pos": "noun", "senses": [{"glosses": ["house"]}]}"#.to_string();
    assert_eq!(parser.parse(line, &serbian()), Ok(Vec::new()));
}

#[test]
fn kaikki_glosses_are_pivoted_into_another_target() {
    let pair = LanguagePair::resolve("sr", "de");
    let pivot = TranslationPivot::from_pairs([("house", "Haus"), ("house", "Gebäude"), ("home", "Heim")]);
    let parser = WiktionaryParser::new(1, Language::resolve("en")).with_pivot(pivot);
    assert!(parser.supports(&pair));

    let line = r#"{"word": "кућа", "lang": "Serbo-Croatian", "lang_code": "sh", "pos": "noun", "senses": [{"glosses": ["house"], "examples": [{"text": "Кућа.", "english": "House."}]}, {"glosses": ["shed"]}]}"#;
    let entries = parser.parse(line.to_string(), &pair).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].senses.len(), 1);
    assert_eq!(entries[0].senses[0].gloss, "Gebäude, Haus");
    assert_eq!(entries[0].senses[0].examples[0].translation, None);

    let unsupported = WiktionaryParser::new(1, Language::resolve("en"));
    assert!(!unsupported.supports(&pair));
    assert_eq!(unsupported.parse(line.to_string(), &pair), Ok(Vec::new()));
}

#[test]
fn pivot_is_loaded_from_an_edition_dump() {
    let english = r#"{"word": "house", "lang_code": "en", "senses": [{"glosses": ["a building"], "translations": [{"lang": "German", "code": "de", "word": "Haus"}, {"lang": "French", "code": "fr", "word": "maison"}]}]}
{"word": "dog", "lang_code": "en", "translations": [{"code": "de", "word": "Hund"}]}
garbage
"#;
    let pivot = TranslationPivot::load(&MemoryDump::new("kaikki-en", english), &Language::resolve("de")).unwrap();
    assert_eq!(pivot.len(), 2);
    assert_eq!(pivot.lookup("House"), Some(&["Haus".to_string()][..]));
    assert_eq!(pivot.lookup("dog"), Some(&["Hund".to_string()][..]));
}

#[test]
fn tei_entries_homographs_and_broken_entries() {
    let dump = MemoryDump::new("freedict-srp-eng", TEI_SR_EN);
    let parser = FreeDictParser::new(2);
    let (entries, stats) = run(&parser, TeiRecords::new(dump.open().unwrap()));

    assert_eq!(stats.records_read, 4);
    assert_eq!(stats.records_skipped, 1);

    let dog = find(&entries, "pas");
    assert_eq!(dog.part_of_speech, PartOfSpeech::Noun);
    let glosses: Vec<&str> = dog.senses.iter().map(|s| s.gloss.as_str()).collect();
    assert_eq!(glosses, ["dog", "hound"]);
    assert_eq!(dog.senses[0].examples[0].text, "Pas laje.");
    assert_eq!(dog.senses[0].examples[0].translation.as_deref(), Some("The dog barks."));
    assert!(dog.variant_forms.contains("pseto"));
    assert!(dog.senses.iter().all(|s| s.source == SourceTag::FreeDict));

    let luk: Vec<&Entry> = entries.iter().filter(|e| e.display_form == "luk").collect();
    assert_eq!(luk.len(), 2);
    assert_eq!(luk[0].senses[0].gloss, "onion");
    assert_eq!(luk[1].senses[0].gloss, "bow");

    let cat = find(&entries, "mačka & mače");
    assert_eq!(cat.senses[0].gloss, "a cat <domestic>");
}

#[test]
fn tei_truncated_document_yields_a_malformed_record() {
    let truncated = &TEI_SR_EN[..TEI_SR_EN.find("<sense><cit type=\"trans\"><quote>hound").unwrap()];
    let records: Vec<_> = TeiRecords::new(truncated.as_bytes()).collect::<dictweave::Result<_>>().unwrap();
    let parser = FreeDictParser::new(2);
    let results: Vec<_> = records.into_iter().map(|r| parser.parse(r, &serbian())).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(SkipReason::Malformed(_))));
}

#[test]
fn tatoeba_lines_split_by_layout_and_language() {
    let pair = serbian();
    assert_eq!(
        split_pair("Hvala.\tThanks.", &pair),
        Ok(Some(("Hvala.".to_string(), "Thanks.".to_string())))
    );
    assert_eq!(
        split_pair("1\t„Da”\t2\t\"Yes\"", &pair),
        Ok(Some(("Da".to_string(), "Yes".to_string())))
    );
    assert_eq!(split_pair("1\tdeu\tJa\t2\teng\tYes", &pair), Ok(None));
    assert_eq!(split_pair("# header", &pair), Ok(None));
    assert!(matches!(split_pair("a\tb\tc", &pair), Err(SkipReason::Malformed(_))));
}

#[test]
fn tatoeba_short_sentences_become_phrases() {
    let dump = MemoryDump::new("tatoeba-srp-eng", TATOEBA_SR_EN);
    let parser = TatoebaParser::new(3, 3);
    let (entries, stats) = run(&parser, LineRecords::new(dump.open().unwrap()));

    assert_eq!(stats.records_read, 8);
    assert_eq!(stats.records_skipped, 2);
    let displays: Vec<&str> = entries.iter().map(|e| e.display_form.as_str()).collect();
    assert_eq!(displays, ["Hvala", "Moj pas spava", "Dobro jutro"]);
    assert_eq!(entries[0].part_of_speech, PartOfSpeech::Unknown);
    assert_eq!(entries[0].senses[0].gloss, "Thank you");
    assert_eq!(entries[1].part_of_speech, PartOfSpeech::Phrase);
}

#[test]
fn sentence_bank_finds_examples_by_token() {
    let pair = serbian();
    let collation = Collation::for_language(&pair.source);
    let bank = SentenceBank::load(&MemoryDump::new("tatoeba", TATOEBA_SR_EN), &pair, collation, 1).unwrap();

    assert_eq!(bank.len(), 4);
    let examples = ExampleProvider::examples_for(&bank, "pas");
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].text, "Moj pas spava.");
    assert_eq!(examples[0].translation.as_deref(), Some("My dog is sleeping."));

    // the sentence "Hvala!" is the headword itself
    assert!(bank.examples_for("hvala").is_empty());
    assert!(bank.examples_for("mačka").is_empty());
}

#[test]
fn gzip_dumps_are_inflated_and_reopened() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tatoeba.tsv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(TATOEBA_SR_EN.as_bytes()).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let dump = FileDump::new(&path);
    for _ in 0..2 {
        let lines: Vec<String> = LineRecords::new(dump.open().unwrap()).collect::<dictweave::Result<_>>().unwrap();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("1\tsrp\tHvala!"));
    }
}

#[test]
fn cancelled_collection_stops() {
    let dump = MemoryDump::new("tatoeba", TATOEBA_SR_EN);
    let parser = TatoebaParser::new(3, 3);
    let cancel = AtomicBool::new(true);
    let result = collect_entries(&parser, LineRecords::new(dump.open().unwrap()), &serbian(), &cancel);
    assert!(matches!(result, Err(LexiconError::Cancelled)));
}
