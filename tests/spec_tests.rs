use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::fs;
use streammark::{Hooks, Options, markdown_to_html, render_chunks};

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    markdown: String,
    html: String,
}

fn load_cases() -> Vec<Case> {
    let data = fs::read_to_string("tests/data/cases.json").expect("Failed to read cases.json");
    serde_json::from_str(&data).expect("Failed to parse cases.json")
}

#[test]
fn rendering_cases() {
    let cases = load_cases();
    let mut failures = Vec::new();

    for case in &cases {
        let result = markdown_to_html(&case.markdown).expect("rendering failed");
        if result != case.html {
            eprintln!("\nCase '{}' failed", case.name);
            eprintln!("  Input: {:?}", case.markdown);
            eprintln!("  Expected: {:?}", case.html);
            eprintln!("  Got: {:?}", result);
            failures.push(case.name.as_str());
        }
    }

    eprintln!(
        "\nRendering cases: {} passed, {} failed",
        cases.len() - failures.len(),
        failures.len()
    );
    assert!(failures.is_empty(), "failed cases: {:?}", failures);
}

#[test]
fn every_split_renders_the_same() {
    for case in load_cases() {
        let input = case.markdown.as_str();
        for split in (0..=input.len()).filter(|&i| input.is_char_boundary(i)) {
            let (head, tail) = input.split_at(split);
            let result = render_chunks([head, tail], Options::default(), Hooks::new())
                .expect("rendering failed");
            assert_eq!(result, case.html, "case '{}' split at {}", case.name, split);
        }
    }
}

#[test]
fn one_character_at_a_time() {
    for case in load_cases() {
        let chars: Vec<String> = case.markdown.chars().map(String::from).collect();
        let result = render_chunks(
            chars.iter().map(String::as_str),
            Options::default(),
            Hooks::new(),
        )
        .expect("rendering failed");
        assert_eq!(result, case.html, "case '{}'", case.name);
    }
}
