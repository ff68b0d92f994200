use dictweave::lexicon::translit::{Script, to_cyrillic, transliterate};
use proptest::prelude::*;

#[test]
fn mixed_script_text_only_converts_the_source_script() {
    assert_eq!(transliterate("кућа (house) 42", Script::Cyrillic), "kuća (house) 42");
    assert_eq!(transliterate("Ђорђе и Ана", Script::Cyrillic), "Đorđe i Ana");
    assert_eq!(transliterate("Αθήνα и Beograd", Script::Greek), "Athina и Beograd");
    assert_eq!(transliterate("Щука", Script::Cyrillic), "Ščuka");
}

#[test]
fn latin_is_the_identity() {
    assert_eq!(transliterate("кућа", Script::Latin), "кућа");
}

#[test]
fn cyrillic_from_serbian_latin() {
    assert_eq!(to_cyrillic("Njegoš"), "Његош");
    assert_eq!(to_cyrillic("LJUBAV"), "ЉУБАВ");
    assert_eq!(to_cyrillic("džem, 3 kg"), "џем, 3 кг");
}

proptest! {
    #[test]
    fn transliteration_is_repeatable(text in "[а-яА-Яђјљњћџ a-zA-Z0-9.,!?-]{0,40}") {
        let once = transliterate(&text, Script::Cyrillic);
        prop_assert_eq!(&once, &transliterate(&text, Script::Cyrillic));
        prop_assert_eq!(&once, &transliterate(&once, Script::Cyrillic));
    }

    #[test]
    fn target_script_text_is_unchanged(text in "[a-zA-ZčćđšžČĆĐŠŽ 0-9.,!?-]{0,40}") {
        prop_assert_eq!(transliterate(&text, Script::Cyrillic), text.clone());
        prop_assert_eq!(transliterate(&text, Script::Greek), text);
    }
}
