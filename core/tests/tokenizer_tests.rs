use search_core::tokenizer::{normalize, normalize_to_string};

#[test]
fn it_lowercases_and_strips_punctuation() {
    let words = normalize("Running, RUNNERS' run! (The) café's menu.");
    assert_eq!(words, vec!["running", "runners", "run", "the", "café", "s", "menu"]);
}

#[test]
fn it_keeps_digits_and_underscores() {
    let words = normalize("snake_case v2.0 #42");
    assert_eq!(words, vec!["snake_case", "v2", "0", "42"]);
}

#[test]
fn it_never_merges_words_across_punctuation() {
    assert_eq!(normalize("cat/dog"), vec!["cat", "dog"]);
    assert_eq!(normalize("tab\tand\nnewline"), vec!["tab", "and", "newline"]);
}

#[test]
fn normalization_is_idempotent() {
    let samples = [
        "The quick brown fox, jumped over the lazy dog!",
        "  multiple   spaces\t\tand\r\nbreaks  ",
        "ÉCOLE — naïve coöperation... 3.14159",
        "",
        "!!!",
    ];
    for text in samples {
        let once = normalize(text);
        assert_eq!(normalize(&normalize_to_string(text)), once, "not idempotent for {text:?}");
    }
}

#[test]
fn it_splits_on_marks_joiners_and_connectors() {
    assert_eq!(normalize("a\u{200d}b"), vec!["a", "b"]);
    assert_eq!(normalize("cafe\u{301} menu"), vec!["cafe", "menu"]);
    assert_eq!(normalize("x\u{203f}y"), vec!["x", "y"]);
    assert_eq!(normalize("x\u{fe4f}y under_score"), vec!["x", "y", "under_score"]);
}

#[test]
fn it_keeps_non_latin_letters_and_digits() {
    assert_eq!(normalize("Ωmega 東京 ٣"), vec!["ωmega", "東京", "٣"]);
}
