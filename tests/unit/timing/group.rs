use super::*;

fn w(text: &str, start: f64, end: f64) -> WordTimestamp {
    WordTimestamp::new(text, start, end)
}

#[test]
fn empty_input_yields_no_captions() {
    assert!(group(&[]).is_empty());
}

#[test]
fn single_word_is_closed() {
    let caps = group(&[w("Hello", 0.0, 0.5)]);
    assert_eq!(caps.len(), 1);
    assert_eq!(caps[0].text, "Hello");
    assert_eq!(caps[0].words.len(), 1);
}

#[test]
fn hi_there_forms_one_caption() {
    let caps = group(&[w("Hi", 0.0, 0.4), w("there.", 0.4, 0.9)]);
    assert_eq!(caps.len(), 1);
    assert_eq!(caps[0].text, "Hi there.");
    assert_eq!(caps[0].start_sec, 0.0);
    assert_eq!(caps[0].end_sec, 0.9);
}

#[test]
fn sentence_boundary_splits_after_min_duration() {
    let caps = group(&[
        w("First", 0.0, 0.3),
        w("one.", 0.3, 0.6),
        w("Second", 0.7, 1.0),
        w("one!", 1.0, 1.4),
    ]);
    assert_eq!(caps.len(), 2);
    assert_eq!(caps[0].text, "First one.");
    assert_eq!(caps[1].text, "Second one!");
}

#[test]
fn short_sentence_keeps_accumulating() {
    let caps = group(&[
        w("No.", 0.0, 0.2),
        w("Really", 0.2, 0.5),
        w("not?", 0.5, 0.9),
        w("Fine", 1.0, 1.3),
    ]);
    assert_eq!(caps.len(), 2);
    assert_eq!(caps[0].text, "No. Really not?");
    assert_eq!(caps[1].text, "Fine");
}

#[test]
fn emergency_close_on_duration_without_punctuation() {
    let words: Vec<_> = (0..30)
        .map(|i| w("word", i as f64, i as f64 + 1.0))
        .collect();
    let caps = group(&words);
    // 5s * 4 = 20s: the caption closes on the first word pushing past 20s.
    assert!(caps.len() >= 2);
    assert!(caps[0].natural_duration_sec > 20.0);
    assert!(caps[0].natural_duration_sec <= 21.0);
}

#[test]
fn emergency_close_on_characters() {
    let limits = GroupingLimits {
        max_chars: 4,
        char_overflow_factor: 2.0,
        ..GroupingLimits::default()
    };
    let caps = Grouper::new(limits).group(&[
        w("aaa", 0.0, 0.1),
        w("bbb", 0.1, 0.2),
        w("ccc", 0.2, 0.3),
        w("ddd", 0.3, 0.4),
    ]);
    // "aaa bbb ccc" is 11 chars > 8.
    assert_eq!(caps[0].text, "aaa bbb ccc");
    assert_eq!(caps[1].text, "ddd");
}

#[test]
fn blank_words_are_dropped() {
    let caps = group(&[w("Hi", 0.0, 0.4), w("  ", 0.4, 0.5), w("you.", 0.5, 0.9)]);
    assert_eq!(caps.len(), 1);
    assert_eq!(caps[0].text, "Hi you.");
    assert_eq!(caps[0].words.len(), 2);
}

#[test]
fn sentence_end_detection() {
    assert!(is_sentence_end("done."));
    assert!(is_sentence_end("what?"));
    assert!(is_sentence_end("wow! "));
    assert!(!is_sentence_end("comma,"));
    assert!(!is_sentence_end(""));
}

fn transcript() -> Vec<WordTimestamp> {
    let texts = [
        "So", "here", "we", "go.", "This", "is", "a", "longer", "sentence", "without", "any",
        "stops", "and", "then", "it", "ends!", "Why?", "Because", "short", "ones", "wait.",
    ];
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| w(t, i as f64 * 0.35, i as f64 * 0.35 + 0.3))
        .collect()
}

#[test]
fn grouping_is_deterministic() {
    let words = transcript();
    assert_eq!(group(&words), group(&words));
}

#[test]
fn every_word_lands_in_exactly_one_caption_in_order() {
    let words = transcript();
    let caps = group(&words);
    let flattened: Vec<&WordTimestamp> = caps.iter().flat_map(|c| c.words.iter()).collect();
    assert_eq!(flattened.len(), words.len());
    for (a, b) in flattened.iter().zip(words.iter()) {
        assert_eq!(*a, b);
    }
    for pair in caps.windows(2) {
        assert!(pair[0].end_sec <= pair[1].start_sec);
    }
    for c in &caps {
        let joined: Vec<&str> = c.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(c.text, joined.join(" "));
    }
}

#[test]
fn closed_captions_end_on_a_boundary_or_overflow() {
    let caps = group(&transcript());
    // All but the last caption close on sentence punctuation here (no overflow at these sizes).
    for c in &caps[..caps.len() - 1] {
        let last = c.words.last().unwrap();
        assert!(is_sentence_end(&last.text), "{}", c.text);
        assert!(c.natural_duration_sec >= 0.5);
    }
}
