mod common;

use gherkin_bind::parsing::ParseOptions;
use gherkin_bind::syntax::{FeatureChild, StepArgument, StepKeywordType, SyntaxKind};
use pretty_assertions::assert_eq;

use common::{assert_widths_add_up, diagnostic_ids, parse, parse_with, read_fixture};

#[test]
fn minimal_feature_round_trips_without_diagnostics() {
    let text = "Feature: F\n  Scenario: S\n    Given a thing\n";
    let tree = parse(text);
    assert_eq!(tree.to_string(), text);
    assert_eq!(tree.root().to_full_string(), text);
    assert!(diagnostic_ids(&tree).is_empty());
    assert!(!tree.has_errors());

    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    assert_eq!(feature.name().as_deref(), Some("F"));
    let scenarios = feature.scenarios();
    assert_eq!(scenarios.len(), 1);
    assert_eq!(scenarios[0].name().as_deref(), Some("S"));
    let steps = scenarios[0].steps();
    assert_eq!(steps[0].keyword_text(), "Given ");
    assert_eq!(steps[0].keyword_type(), StepKeywordType::Context);
    assert_eq!(steps[0].text(), "a thing");
}

#[test]
fn missing_colon_is_reported_once_and_text_survives() {
    let text = "Feature F\n";
    let tree = parse(text);
    assert_eq!(tree.to_string(), text);

    let diagnostics: Vec<_> = tree.diagnostics().collect();
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.id(), "GH1002");
    assert_eq!(diagnostic.message(), "Expected ':' after 'Feature'");
    assert_eq!(diagnostic.span().start, 7);
    assert_eq!(diagnostic.span().length, 0);
    let location = diagnostic.location().unwrap();
    assert_eq!(location.to_string(), "test.feature:1:8");

    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    assert!(feature.colon().unwrap().is_missing());
    assert_eq!(feature.name().as_deref(), Some("F"));
}

#[test]
fn empty_input_has_only_end_of_file() {
    let tree = parse("");
    assert_eq!(tree.to_string(), "");
    let document = tree.document().unwrap();
    assert!(document.feature().is_none());
    assert_eq!(
        document.end_of_file().map(|t| t.kind()),
        Some(SyntaxKind::EndOfFileToken)
    );
}

#[test]
fn calculator_fixture_structure() {
    let text = read_fixture("calculator.feature");
    let tree = parse(&text);
    assert_eq!(tree.to_string(), text);
    assert!(diagnostic_ids(&tree).is_empty());
    assert_widths_add_up(tree.root());

    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    assert_eq!(feature.tag_names(), vec!["@math"]);
    assert_eq!(
        feature.description().map(|d| d.text()).as_deref(),
        Some("Simple arithmetic on a pocket calculator.")
    );

    let background = feature.background().unwrap();
    let background_steps: Vec<String> = background.steps().iter().map(|s| s.text()).collect();
    assert_eq!(background_steps, vec!["a calculator"]);

    let scenarios = feature.scenarios();
    assert_eq!(scenarios.len(), 2);
    assert!(!scenarios[0].is_outline());
    assert!(scenarios[1].is_outline());
    assert_eq!(scenarios[1].tag_names(), vec!["@outline"]);

    let keyword_types: Vec<_> = scenarios[0].steps().iter().map(|s| s.keyword_type()).collect();
    assert_eq!(
        keyword_types,
        vec![
            StepKeywordType::Context,
            StepKeywordType::Conjunction,
            StepKeywordType::Action,
            StepKeywordType::Outcome,
        ]
    );

    let examples = scenarios[1].examples();
    assert_eq!(examples.len(), 1);
    let table = examples[0].table().unwrap().values();
    assert_eq!(
        table,
        vec![
            vec!["a", "b", "product"],
            vec!["2", "3", "6"],
            vec!["4", "5", "20"],
        ]
    );
}

#[test]
fn rules_own_their_background_and_scenarios() {
    let text = "\
Feature: F
  Scenario: Top
    Given top

  @slow
  Rule: R
    Background:
      Given rule setup
    Scenario: Inside
      When inside
";
    let tree = parse(text);
    assert!(diagnostic_ids(&tree).is_empty());
    let feature = tree.document().and_then(|d| d.feature()).unwrap();

    let children = feature.children();
    assert_eq!(children.len(), 2);
    assert!(matches!(children[0], FeatureChild::Scenario(_)));
    let FeatureChild::Rule(rule) = &children[1] else {
        panic!("expected a rule, got {:?}", children[1]);
    };
    assert_eq!(rule.name().as_deref(), Some("R"));
    assert_eq!(rule.tag_names(), vec!["@slow"]);
    assert_eq!(rule.background().unwrap().steps()[0].text(), "rule setup");
    assert_eq!(rule.scenarios()[0].name().as_deref(), Some("Inside"));
    assert_eq!(feature.scenarios().len(), 1);
    assert_eq!(feature.rules().len(), 1);
}

#[test]
fn doc_string_strips_indent_and_unescapes_delimiters() {
    let text = "\
Feature: F
  Scenario: S
    Given a payload
      \"\"\"json
      {
        \"a\": 1
      }
      \\\"\\\"\\\"
      \"\"\"
";
    let tree = parse(text);
    assert_eq!(tree.to_string(), text);
    assert!(diagnostic_ids(&tree).is_empty());

    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    let step = &feature.scenarios()[0].steps()[0];
    let Some(StepArgument::DocString(doc)) = step.argument() else {
        panic!("expected a doc string");
    };
    assert_eq!(doc.media_type().as_deref(), Some("json"));
    assert_eq!(doc.content(), "{\n  \"a\": 1\n}\n\"\"\"");
    assert!(!doc.close_delimiter().unwrap().is_missing());
}

#[test]
fn backtick_doc_strings_are_recognized() {
    let text = "Feature: F\n  Scenario: S\n    Given text\n      ```\n      plain\n      ```\n";
    let tree = parse(text);
    assert!(diagnostic_ids(&tree).is_empty());
    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    let step = &feature.scenarios()[0].steps()[0];
    let Some(StepArgument::DocString(doc)) = step.argument() else {
        panic!("expected a doc string");
    };
    assert_eq!(doc.media_type(), None);
    assert_eq!(doc.content(), "plain");
}

#[test]
fn table_cells_unescape_and_keep_trailing_comments() {
    let text = "\
Feature: F
  Scenario: S
    Given a table
      | a\\|b | c\\\\d | e\\nf | # note
";
    let tree = parse(text);
    assert_eq!(tree.to_string(), text);
    assert!(diagnostic_ids(&tree).is_empty());

    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    let step = &feature.scenarios()[0].steps()[0];
    let Some(StepArgument::DataTable(table)) = step.argument() else {
        panic!("expected a data table");
    };
    assert_eq!(table.values(), vec![vec!["a|b", "c\\d", "e\nf"]]);
    let row = &table.rows()[0];
    assert_eq!(row.cells()[0].text(), "a\\|b");
}

#[test]
fn language_directive_switches_dialect() {
    let text = "# language: fr\nFonctionnalité: Calculatrice\n  Scénario: Addition\n    Soit une calculatrice\n";
    let tree = parse(text);
    assert_eq!(tree.to_string(), text);
    assert!(diagnostic_ids(&tree).is_empty());

    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    assert_eq!(feature.keyword().unwrap().text(), "Fonctionnalité");
    let step = &feature.scenarios()[0].steps()[0];
    assert_eq!(step.keyword_text(), "Soit ");
    assert_eq!(step.keyword_type(), StepKeywordType::Context);

    let directive = feature.keyword().unwrap().leading_trivia();
    assert!(directive
        .iter()
        .any(|t| t.kind() == SyntaxKind::LanguageDirectiveTrivia));
}

#[test]
fn culture_option_selects_the_initial_dialect() {
    let text = read_fixture("french.feature");
    let tree = parse_with(&text, &ParseOptions::default().with_culture("fr"));
    assert!(diagnostic_ids(&tree).is_empty());
    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    let types: Vec<_> = feature.scenarios()[0]
        .steps()
        .iter()
        .map(|s| s.keyword_type())
        .collect();
    assert_eq!(
        types,
        vec![StepKeywordType::Context, StepKeywordType::Action, StepKeywordType::Outcome]
    );
}

#[test]
fn scenario_template_is_an_outline() {
    let text = "Feature: F\n  Scenario Template: T\n    Given <x>\n    Examples:\n      | x |\n      | 1 |\n";
    let tree = parse(text);
    assert!(diagnostic_ids(&tree).is_empty());
    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    let scenario = &feature.scenarios()[0];
    assert!(scenario.is_outline());
    assert_eq!(scenario.keyword().unwrap().kind(), SyntaxKind::ScenarioOutlineKeyword);
}

#[test]
fn mixed_line_endings_round_trip_and_locate() {
    let text = "Feature: F\r\n  Scenario: S\r    Given x\n";
    let tree = parse(text);
    assert_eq!(tree.to_string(), text);
    assert!(diagnostic_ids(&tree).is_empty());

    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    let step = &feature.scenarios()[0].steps()[0];
    let location = tree.location(step.keyword().unwrap().span());
    assert_eq!(location.line_span.start.line, 2);
    assert_eq!(location.line_span.start.character, 4);
}

#[test]
fn columns_count_characters_not_bytes() {
    let text = "Feature: Café\n  Scenario: S\n";
    let tree = parse(text);
    let end_of_name = text.find('\n').unwrap();
    let position = tree.text().position_of(end_of_name);
    assert_eq!(position.line, 0);
    assert_eq!(position.character, "Feature: Café".chars().count());
    assert!(end_of_name > position.character);
}

#[test]
fn comments_and_blank_lines_are_trivia() {
    let text = "# leading\n\nFeature: F\n  # inside\n  Scenario: S\n\n    Given x # not a comment\n";
    let tree = parse(text);
    assert_eq!(tree.to_string(), text);
    assert!(diagnostic_ids(&tree).is_empty());
    let feature = tree.document().and_then(|d| d.feature()).unwrap();
    assert_eq!(feature.scenarios()[0].steps()[0].text(), "x # not a comment");
}
