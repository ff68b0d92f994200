use dictweave::{Collation, Entry, LanguagePair, PartOfSpeech, Sense, SourceTag, merge};
use proptest::prelude::*;

fn sense(gloss: &str) -> Sense {
    Sense::new(gloss, SourceTag::Wiktionary)
}

fn english() -> (LanguagePair, Collation) {
    let pair = LanguagePair::resolve("en", "de");
    let collation = Collation::for_language(&pair.source);
    (pair, collation)
}

fn serbian() -> (LanguagePair, Collation) {
    let pair = LanguagePair::resolve("sr", "en");
    let collation = Collation::for_language(&pair.source);
    (pair, collation)
}

#[test]
fn conflicting_candidates_concatenate_senses_by_priority() {
    let (pair, collation) = english();
    let low = Entry::new("run", PartOfSpeech::Noun, 2)
        .with_sense(sense("B"))
        .with_sense(sense("C"));
    let high = Entry::new("run", PartOfSpeech::Verb, 1)
        .with_sense(sense("A"))
        .with_sense(sense("B"));

    let lexicon = merge([low, high], &pair, &collation);

    assert_eq!(lexicon.len(), 1);
    let run = lexicon.get("run").expect("run is merged");
    let glosses: Vec<&str> = run.senses.iter().map(|s| s.gloss.as_str()).collect();
    assert_eq!(glosses, ["A", "B", "C"]);
    assert_eq!(run.part_of_speech, PartOfSpeech::Verb);
    assert_eq!(lexicon.stats().duplicate_senses, 1);
    assert_eq!(lexicon.stats().pos_conflicts, 1);
}

#[test]
fn variant_colliding_with_primary_is_not_an_alias() {
    let (pair, collation) = english();
    let colour = Entry::new("colour", PartOfSpeech::Noun, 1)
        .with_sense(sense("Farbe"))
        .with_variant("color")
        .with_variant("colours");
    let color = Entry::new("color", PartOfSpeech::Noun, 2).with_sense(sense("Farbe (US)"));

    let lexicon = merge([colour, color], &pair, &collation);

    let keys: Vec<&str> = lexicon.entries().iter().map(|e| e.headword.as_str()).collect();
    assert_eq!(keys, ["color", "colour"]);
    assert!(!lexicon.aliases().contains_key("color"));
    assert_eq!(lexicon.aliases().get("colours").map(String::as_str), Some("colour"));
    assert_eq!(lexicon.get("color").map(|e| e.senses[0].gloss.as_str()), Some("Farbe (US)"));
    assert_eq!(lexicon.stats().aliases_colliding, 1);
}

#[test]
fn contested_alias_goes_to_the_higher_priority_claimant() {
    let (pair, collation) = english();
    let a = Entry::new("lead", PartOfSpeech::Verb, 2)
        .with_sense(sense("führen"))
        .with_variant("led");
    let b = Entry::new("lede", PartOfSpeech::Noun, 1)
        .with_sense(sense("Vorspann"))
        .with_variant("led");

    let lexicon = merge([a, b], &pair, &collation);

    assert_eq!(lexicon.aliases().get("led").map(String::as_str), Some("lede"));
    assert_eq!(lexicon.stats().aliases_contested, 1);
    assert!(lexicon.get("lede").is_some_and(|e| e.variant_forms.contains("led")));
    assert!(lexicon.get("lead").is_some_and(|e| !e.variant_forms.contains("led")));
}

#[test]
fn blank_headwords_and_empty_entries_are_dropped() {
    let (pair, collation) = english();
    let entries = vec![
        Entry::new("   ", PartOfSpeech::Noun, 1).with_sense(sense("nothing")),
        Entry::new("ghost", PartOfSpeech::Noun, 1),
        Entry::new("house", PartOfSpeech::Noun, 1).with_sense(sense("Haus")),
    ];

    let lexicon = merge(entries, &pair, &collation);

    assert_eq!(lexicon.len(), 1);
    assert_eq!(lexicon.stats().dropped_empty_headword, 1);
    assert_eq!(lexicon.stats().dropped_without_senses, 1);
}

#[test]
fn alias_only_entries_attach_forms_to_an_existing_primary() {
    let (pair, collation) = english();
    let go = Entry::new("go", PartOfSpeech::Verb, 1).with_sense(sense("gehen"));
    let redirect = Entry::new("go", PartOfSpeech::Unknown, 1).with_sequence(1).with_variant("went");

    let lexicon = merge([go, redirect], &pair, &collation);

    assert_eq!(lexicon.len(), 1);
    assert_eq!(lexicon.aliases().get("went").map(String::as_str), Some("go"));
    assert_eq!(lexicon.get("went").map(|e| e.display_form.as_str()), Some("go"));
}

#[test]
fn serbian_scripts_share_one_entry_with_transliteration() {
    let (pair, collation) = serbian();
    let cyrillic = Entry::new("кућа", PartOfSpeech::Noun, 1).with_sense(sense("house"));
    let latin = Entry::new("Kuća", PartOfSpeech::Noun, 2).with_sense(sense("home"));

    let lexicon = merge([latin, cyrillic], &pair, &collation);

    assert_eq!(lexicon.len(), 1);
    let entry = &lexicon.entries()[0];
    assert_eq!(entry.headword, "kuća");
    assert_eq!(entry.display_form, "кућа");
    assert_eq!(entry.transliteration.as_deref(), Some("kuća"));
    let glosses: Vec<&str> = entry.senses.iter().map(|s| s.gloss.as_str()).collect();
    assert_eq!(glosses, ["house", "home"]);
}

#[test]
fn cyrillic_headwords_get_a_transliteration_in_latin_tabled_languages() {
    let pair = LanguagePair::resolve("sh", "en");
    let collation = Collation::for_language(&pair.source);
    let entries = vec![
        Entry::new("кућа", PartOfSpeech::Noun, 1).with_sense(sense("house")),
        Entry::new("voda", PartOfSpeech::Noun, 1).with_sense(sense("water")),
    ];

    let lexicon = merge(entries, &pair, &collation);

    let house = lexicon.get("kuća").expect("kuća is merged");
    assert_eq!(house.display_form, "кућа");
    assert_eq!(house.transliteration.as_deref(), Some("kuća"));
    assert_eq!(lexicon.get("voda").map(|e| e.transliteration.clone()), Some(None));
}

#[test]
fn non_latin_targets_get_no_transliteration() {
    let pair = LanguagePair::resolve("sr", "ru");
    let collation = Collation::for_language(&pair.source);
    let lexicon = merge([Entry::new("кућа", PartOfSpeech::Noun, 1).with_sense(sense("дом"))], &pair, &collation);

    assert_eq!(lexicon.entries()[0].transliteration, None);
}

#[test]
fn truncate_drops_aliases_of_removed_entries() {
    let (pair, collation) = english();
    let entries = vec![
        Entry::new("apple", PartOfSpeech::Noun, 1).with_sense(sense("Apfel")).with_variant("apples"),
        Entry::new("zebra", PartOfSpeech::Noun, 1).with_sense(sense("Zebra")).with_variant("zebras"),
    ];

    let mut lexicon = merge(entries, &pair, &collation);
    lexicon.truncate(1);

    assert_eq!(lexicon.len(), 1);
    assert!(lexicon.aliases().contains_key("apples"));
    assert!(!lexicon.aliases().contains_key("zebras"));
}

const WORDS: &[&str] = &["run", "Run", "rún", "colour", "color", "walk", "walks", "house"];
const GLOSSES: &[&str] = &["A", "B", "C", "to move fast", "Farbe"];

fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        prop::sample::select(WORDS),
        0u8..4,
        1u32..4,
        prop::collection::vec(prop::sample::select(GLOSSES), 0..3),
        prop::collection::vec(prop::sample::select(WORDS), 0..2),
    )
        .prop_map(|(word, pos, priority, glosses, variants)| {
            let pos = PartOfSpeech::try_from(pos).unwrap_or_default();
            let mut entry = Entry::new(word, pos, priority);
            for gloss in glosses {
                entry.senses.push(sense(gloss));
            }
            for variant in variants {
                entry.add_variant(variant);
            }
            entry
        })
}

proptest! {
    #[test]
    fn merge_ignores_arrival_order(
        (entries, shuffled) in prop::collection::vec(arb_entry(), 0..12)
            .prop_map(|entries| {
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, e)| e.with_sequence(i as u64))
                    .collect::<Vec<_>>()
            })
            .prop_flat_map(|entries| {
                let shuffled = Just(entries.clone()).prop_shuffle();
                (Just(entries), shuffled)
            })
    ) {
        let (pair, collation) = english();
        let a = merge(entries, &pair, &collation);
        let b = merge(shuffled, &pair, &collation);
        prop_assert_eq!(a, b);
    }
}
