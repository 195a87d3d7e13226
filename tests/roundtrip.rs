mod common;

use proptest::prelude::*;

use common::{assert_widths_add_up, parse};

const LINES: &[&str] = &[
    "Feature: F",
    "Feature F",
    "Rule: R",
    "Background:",
    "Scenario: S",
    "Scenario Outline: O",
    "Examples:",
    "Given a thing",
    "And <x> more",
    "When I press {int}",
    "Then it works",
    "* star step",
    "| a | b |",
    "| c |",
    "| open",
    "| a\\|b | c # note",
    "\"\"\"",
    "\"\"\"json",
    "```",
    "@tag @other",
    "@tag # comment",
    "# comment",
    "# language: fr",
    "# language: zz",
    "Fonctionnalité: Bonjour",
    "free text",
    "",
];

const BREAKS: &[&str] = &["\n", "\r\n", "\r", ""];

fn gherkin_like() -> impl Strategy<Value = String> {
    let line = (
        0usize..6,
        prop::sample::select(LINES),
        prop::sample::select(BREAKS),
    )
        .prop_map(|(indent, line, brk)| format!("{}{}{}", " ".repeat(indent), line, brk));
    prop::collection::vec(line, 0..24).prop_map(|lines| lines.concat())
}

proptest! {
    #[test]
    fn gherkin_like_text_round_trips(text in gherkin_like()) {
        let tree = parse(&text);
        prop_assert_eq!(tree.to_string(), text);
        assert_widths_add_up(tree.root());

        let starts: Vec<usize> = tree.diagnostics().map(|d| d.span().start).collect();
        prop_assert!(starts.windows(2).all(|w| w[0] <= w[1]), "out of order: {:?}", starts);
    }

    #[test]
    fn arbitrary_text_round_trips(text in "[ -~\t\r\néü€|@#:\"`\\\\]{0,300}") {
        let tree = parse(&text);
        prop_assert_eq!(tree.to_string(), text.clone());
        prop_assert_eq!(tree.root().full_span().length, text.len());
    }
}
