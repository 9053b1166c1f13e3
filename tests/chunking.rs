use proptest::prelude::*;
use streammark::{Hooks, Options, markdown_to_html, render_chunks};

/// Split `doc` at the given fractions of its length, snapped to char boundaries
fn split_at_fractions(doc: &str, cuts: &[f64]) -> Vec<String> {
    let mut points: Vec<usize> = cuts
        .iter()
        .map(|cut| {
            let mut at = (doc.len() as f64 * cut) as usize;
            while !doc.is_char_boundary(at) {
                at -= 1;
            }
            at
        })
        .collect();
    points.sort_unstable();
    let mut chunks = Vec::new();
    let mut start = 0;
    for at in points {
        chunks.push(doc[start..at].to_string());
        start = at;
    }
    chunks.push(doc[start..].to_string());
    chunks
}

proptest! {
    #[test]
    fn chunking_never_changes_output(
        doc in r"[a-c 1.#*_~`!:>=<\[\]()\n-]{0,60}",
        cuts in prop::collection::vec(0.0f64..=1.0, 0..6),
    ) {
        let whole = markdown_to_html(&doc).expect("rendering failed");
        let chunks = split_at_fractions(&doc, &cuts);
        let split = render_chunks(chunks.iter().map(String::as_str), Options::default(), Hooks::new())
            .expect("rendering failed");
        prop_assert_eq!(split, whole, "chunks: {:?}", chunks);
    }

    #[test]
    fn plain_words_render_as_one_paragraph(words in prop::collection::vec("[a-z]{1,8}", 1..8)) {
        let doc = words.join(" ");
        let html = markdown_to_html(&doc).expect("rendering failed");
        prop_assert_eq!(html, format!("<p>{}</p>", doc));
    }

    #[test]
    fn unicode_text_survives(doc in "\\PC{0,40}") {
        let whole = markdown_to_html(&doc).expect("rendering failed");
        let chars: Vec<String> = doc.chars().map(String::from).collect();
        let split = render_chunks(chars.iter().map(String::as_str), Options::default(), Hooks::new())
            .expect("rendering failed");
        prop_assert_eq!(split, whole);
    }
}
