use dictweave::lexicon::source::dump::MemoryDump;
use dictweave::lexicon::types::models::{CompressionType, OffsetWidth};
use dictweave::{
    Build, BuildConfig, Collation, Compiler, DictionaryMeta, DictionaryReader, EncodedDictionary, LexiconError,
    SourceTag,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{TempDir, tempdir};

const KAIKKI: &str = r#"{"word": "кућа", "lang": "Serbo-Croatian", "lang_code": "sh", "pos": "noun", "forms": [{"form": "куће", "tags": ["genitive"]}], "senses": [{"glosses": ["house"]}]}
{"word": "пас", "lang": "Serbo-Croatian", "lang_code": "sh", "pos": "noun", "senses": [{"glosses": ["dog"]}]}
{"lang": "Serbo-Croatian", "pos": "noun", "senses": [{"glosses": ["no headword"]}]}
not json at all
"#;

const TEI: &str = r#"<TEI><text xml:lang="sr"><body>
<entry><form><orth>pas</orth><orth>psi</orth></form><gramGrp><pos>n</pos></gramGrp><sense><cit type="trans"><quote>hound</quote></cit></sense><sense><cit type="trans"><quote>dog</quote></cit></sense></entry>
<entry><form><orth>mačka</orth></form><sense><cit type="trans"><quote>cat</quote></cit></sense></entry>
</body></text></TEI>
"#;

const TATOEBA: &str = "1\tsrp\tHvala!\t2\teng\tThank you!
3\tsrp\tMoj pas spava.\t4\teng\tMy dog is sleeping.
5\tsrp\tMačka i pas.\t6\teng\tA cat and a dog.
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kaikki.jsonl"), KAIKKI).unwrap();
        fs::write(dir.path().join("freedict.tei"), TEI).unwrap();
        fs::write(dir.path().join("tatoeba.tsv"), TATOEBA).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn out(&self) -> PathBuf {
        self.path("out")
    }

    fn config(&self, extra: &str) -> BuildConfig {
        let text = format!(
            r#"
[pair]
source = "sr"
target = "en"

[sources.wiktionary]
path = '{kaikki}'
required = true

[sources.freedict]
path = '{freedict}'

[sources.tatoeba]
path = '{tatoeba}'
max_examples = 2
max_phrase_words = 1

[output]
dir = '{out}'
basename = "sr-en"
{extra}
"#,
            kaikki = self.path("kaikki.jsonl").display(),
            freedict = self.path("freedict.tei").display(),
            tatoeba = self.path("tatoeba.tsv").display(),
            out = self.out().display(),
            extra = extra,
        );
        BuildConfig::from_toml_str(&text).unwrap()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| entries.map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn full_build_merges_all_sources() {
    let ws = Workspace::new();
    let summary = Build::new(ws.config("")).run(None).unwrap();

    let by_source: Vec<(SourceTag, u64, u64)> = summary
        .sources
        .iter()
        .map(|(tag, stats)| (*tag, stats.entries_emitted, stats.records_skipped))
        .collect();
    assert_eq!(
        by_source,
        [(SourceTag::Wiktionary, 2, 2), (SourceTag::FreeDict, 2, 0), (SourceTag::Tatoeba, 1, 0)]
    );
    assert_eq!(files_in(&ws.out()), ["sr-en.dat", "sr-en.idx"]);
    assert_eq!(summary.compiled, None);

    let reader = DictionaryReader::open_dir(ws.out(), "sr-en").unwrap();
    let collation = Collation::for_language(&summary.pair.source);

    let dog = reader.lookup("пас", &collation).unwrap().unwrap();
    assert_eq!(dog.display_form, "пас");
    assert_eq!(dog.transliteration.as_deref(), Some("pas"));
    let glosses: Vec<&str> = dog.senses.iter().map(|s| s.gloss.as_str()).collect();
    assert_eq!(glosses, ["dog", "hound"]);
    let examples: Vec<&str> = dog.senses[0].examples.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(examples, ["Mačka i pas.", "Moj pas spava."]);

    assert_eq!(reader.lookup("psi", &collation).unwrap().as_ref(), Some(&dog));
    assert_eq!(reader.lookup("куће", &collation).unwrap().unwrap().display_form, "кућа");
    assert_eq!(reader.lookup("Hvala", &collation).unwrap().unwrap().senses[0].gloss, "Thank you");
    assert_eq!(summary.encode.primaries, 4);
}

#[test]
fn config_controls_limits_and_format() {
    let ws = Workspace::new();
    let config = ws.config(
        r#"
[encoder]
compression = "zlib"
offset_width = "u64"

[limits]
max_entries = 2
"#,
    );
    assert_eq!(config.encoder.compression, CompressionType::Zlib);
    assert_eq!(config.encoder.offset_width, OffsetWidth::U64);

    let summary = Build::new(config).run(None).unwrap();
    assert_eq!(summary.encode.primaries, 2);

    let reader = DictionaryReader::open_dir(ws.out(), "sr-en").unwrap();
    assert_eq!(reader.data_header.compression, CompressionType::Zlib);
    let keys: Vec<&str> = reader.iter_keys().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["hvala", "kuća", "kuće"]);
}

#[test]
fn in_memory_dumps_replace_configured_paths() {
    let ws = Workspace::new();
    let kaikki = r#"{"word": "чај", "lang": "Serbo-Croatian", "pos": "noun", "senses": [{"glosses": ["tea"]}]}"#;
    let summary = Build::new(ws.config(""))
        .with_dump(SourceTag::Wiktionary, MemoryDump::new("memory", kaikki))
        .run(None)
        .unwrap();

    assert_eq!(summary.sources[0].0, SourceTag::Wiktionary);
    assert_eq!(summary.sources[0].1.entries_emitted, 1);
    let reader = DictionaryReader::open_dir(ws.out(), "sr-en").unwrap();
    assert!(reader.get("čaj").unwrap().is_some());
    assert!(reader.get("kuća").unwrap().is_none());
}

#[test]
fn missing_required_source_fails_before_encoding() {
    let ws = Workspace::new();
    fs::remove_file(ws.path("kaikki.jsonl")).unwrap();

    let err = Build::new(ws.config("")).run(None).unwrap_err();
    assert!(
        matches!(err, LexiconError::SourceUnavailable { source_name: "wiktionary", .. }),
        "{:?}",
        err
    );
    assert!(files_in(&ws.out()).is_empty());
}

#[test]
fn required_source_without_entries_fails() {
    let ws = Workspace::new();
    let german_only = r#"{"word": "Haus", "lang": "German", "lang_code": "de", "senses": [{"glosses": ["house"]}]}"#;
    let err = Build::new(ws.config(""))
        .with_dump(SourceTag::Wiktionary, MemoryDump::new("german", german_only))
        .run(None)
        .unwrap_err();
    assert!(matches!(err, LexiconError::SourceUnavailable { .. }), "{:?}", err);
    assert!(files_in(&ws.out()).is_empty());
}

#[test]
fn optional_source_that_cannot_be_opened_is_skipped() {
    let ws = Workspace::new();
    fs::remove_file(ws.path("freedict.tei")).unwrap();

    let summary = Build::new(ws.config("")).run(None).unwrap();
    let tags: Vec<SourceTag> = summary.sources.iter().map(|(tag, _)| *tag).collect();
    assert_eq!(tags, [SourceTag::Wiktionary, SourceTag::Tatoeba]);
}

#[test]
fn nothing_to_encode_never_reaches_the_compiler() {
    let ws = Workspace::new();
    let text = format!(
        r#"
[pair]
source = "sr"
target = "en"

[sources.tatoeba]
path = '{}'

[output]
dir = '{}'
"#,
        ws.path("missing.tsv").display(),
        ws.out().display()
    );
    let compiler = CountingCompiler::default();

    let err = Build::new(BuildConfig::from_toml_str(&text).unwrap())
        .run(Some(&compiler))
        .unwrap_err();

    assert!(matches!(err, LexiconError::EmptyDictionary { .. }), "{:?}", err);
    assert_eq!(compiler.calls.load(Ordering::Relaxed), 0);
    assert!(files_in(&ws.out()).is_empty());
}

#[test]
fn all_entries_filtered_out_fails_the_build() {
    let ws = Workspace::new();
    let german_only = r#"{"word": "Haus", "lang": "German", "lang_code": "de", "senses": [{"glosses": ["house"]}]}"#;
    let mut config = ws.config("");
    if let Some(wiktionary) = config.sources.wiktionary.as_mut() {
        wiktionary.required = false;
    }
    let compiler = CountingCompiler::default();

    let err = Build::new(config)
        .with_dump(SourceTag::Wiktionary, MemoryDump::new("german", german_only))
        .with_dump(SourceTag::FreeDict, MemoryDump::new("empty", r#"<TEI><text xml:lang="sr"><body></body></text></TEI>"#))
        .with_dump(SourceTag::Tatoeba, MemoryDump::new("empty", ""))
        .run(Some(&compiler))
        .unwrap_err();

    assert!(matches!(err, LexiconError::EmptyDictionary { .. }), "{:?}", err);
    assert_eq!(compiler.calls.load(Ordering::Relaxed), 0);
    assert!(files_in(&ws.out()).is_empty());
}

fn pivot_config(ws: &Workspace, wiktionary_required: bool) -> BuildConfig {
    let text = format!(
        r#"
[pair]
source = "sr"
target = "de"

[sources.wiktionary]
path = '{}'
pivot_path = '{}'
required = {}

[sources.freedict]
path = '{}'
required = true

[output]
dir = '{}'
"#,
        ws.path("kaikki.jsonl").display(),
        ws.path("missing-pivot.jsonl").display(),
        wiktionary_required,
        ws.path("freedict.tei").display(),
        ws.out().display()
    );
    BuildConfig::from_toml_str(&text).unwrap()
}

#[test]
fn unreadable_pivot_skips_an_optional_wiktionary() {
    let ws = Workspace::new();
    let summary = Build::new(pivot_config(&ws, false)).run(None).unwrap();

    let tags: Vec<SourceTag> = summary.sources.iter().map(|(tag, _)| *tag).collect();
    assert_eq!(tags, [SourceTag::FreeDict]);
    assert_eq!(files_in(&ws.out()), ["dictionary.dat", "dictionary.idx"]);
}

#[test]
fn unreadable_pivot_fails_a_required_wiktionary() {
    let ws = Workspace::new();
    let err = Build::new(pivot_config(&ws, true)).run(None).unwrap_err();

    assert!(
        matches!(err, LexiconError::SourceUnavailable { source_name: "wiktionary", .. }),
        "{:?}",
        err
    );
    assert!(files_in(&ws.out()).is_empty());
}

#[test]
fn wiktionary_without_pivot_is_skipped_for_other_targets() {
    let ws = Workspace::new();
    let text = format!(
        r#"
[pair]
source = "sr"
target = "de"

[sources.wiktionary]
path = '{}'

[sources.freedict]
path = '{}'

[output]
dir = '{}'
"#,
        ws.path("kaikki.jsonl").display(),
        ws.path("freedict.tei").display(),
        ws.out().display()
    );
    let config = BuildConfig::from_toml_str(&text).unwrap();
    assert_eq!(config.output.basename, "dictionary");
    assert_eq!(config.title(), "Serbian - German Dictionary");

    let summary = Build::new(config).run(None).unwrap();
    let tags: Vec<SourceTag> = summary.sources.iter().map(|(tag, _)| *tag).collect();
    assert_eq!(tags, [SourceTag::FreeDict]);
}

#[test]
fn invalid_configs_are_rejected() {
    let no_sources = r#"
[pair]
source = "sr"
target = "en"

[output]
dir = "out"
"#;
    assert!(matches!(BuildConfig::from_toml_str(no_sources), Err(LexiconError::Config(_))));

    let bad_basename = r#"
[pair]
source = "sr"
target = "en"

[sources.tatoeba]
path = "t.tsv"

[output]
dir = "out"
basename = "../escape"
"#;
    assert!(matches!(BuildConfig::from_toml_str(bad_basename), Err(LexiconError::Config(_))));
    assert!(matches!(BuildConfig::from_toml_str("pair = 3"), Err(LexiconError::Config(_))));
}

/// Writes a marker file where the artifact is expected.
struct RecordingCompiler;

impl Compiler for RecordingCompiler {
    fn compile(&self, dictionary: &EncodedDictionary, meta: &DictionaryMeta) -> dictweave::Result<PathBuf> {
        assert!(dictionary.index_path.exists());
        fs::write(&meta.output, format!("{}|{}|{}", meta.title, meta.locale, meta.target.code))?;
        Ok(meta.output.clone())
    }
}

#[derive(Default)]
struct CountingCompiler {
    calls: AtomicUsize,
}

impl Compiler for CountingCompiler {
    fn compile(&self, _: &EncodedDictionary, meta: &DictionaryMeta) -> dictweave::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(meta.output.clone())
    }
}

struct FailingCompiler;

impl Compiler for FailingCompiler {
    fn compile(&self, _: &EncodedDictionary, _: &DictionaryMeta) -> dictweave::Result<PathBuf> {
        Err(LexiconError::Compiler {
            program: PathBuf::from("fake-compiler"),
            message: "exited with 1".to_string(),
        })
    }
}

#[test]
fn compiler_receives_the_encoded_dictionary() {
    let ws = Workspace::new();
    let summary = Build::new(ws.config("")).run(Some(&RecordingCompiler)).unwrap();

    let compiled = summary.compiled.expect("compiler ran");
    assert_eq!(compiled, ws.out().join("sr-en.mobi"));
    assert_eq!(fs::read_to_string(compiled).unwrap(), "Serbian - English Dictionary|hr|en");
}

#[test]
fn compiler_failure_keeps_the_encoded_files() {
    let ws = Workspace::new();
    let err = Build::new(ws.config("")).run(Some(&FailingCompiler)).unwrap_err();

    assert!(matches!(err, LexiconError::Compiler { .. }));
    assert_eq!(files_in(&ws.out()), ["sr-en.dat", "sr-en.idx"]);
    assert!(DictionaryReader::open_dir(ws.out(), "sr-en").is_ok());
}

#[test]
fn cancelled_build_fails() {
    let ws = Workspace::new();
    let build = Build::new(ws.config(""));
    build.cancel_handle().store(true, Ordering::Relaxed);

    assert!(matches!(build.run(None), Err(LexiconError::Cancelled)));
    assert!(files_in(&ws.out()).is_empty());
}
