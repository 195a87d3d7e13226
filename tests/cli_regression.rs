// CLI regression tests: exit codes and the text each subcommand prints.

mod common;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use common::fixture;

fn gherkin_bind() -> Command {
    let mut cmd = Command::cargo_bin("gherkin-bind").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn check_reports_missing_colon() {
    gherkin_bind()
        .arg("check")
        .arg(fixture("broken/missing_colon.feature"))
        .assert()
        .code(1)
        .stdout(contains("GH1002").and(contains("Expected ':' after 'Feature'")))
        .stdout(contains("Checked 1 file(s): 1 diagnostic(s)"))
        .stderr(contains("GH1002"));
}

#[test]
fn check_walks_directories() {
    gherkin_bind()
        .arg("check")
        .arg(fixture("broken"))
        .assert()
        .code(1)
        .stdout(contains("Checked 2 file(s): 1 diagnostic(s)"));
}

#[test]
fn check_passes_clean_files() {
    gherkin_bind()
        .arg("check")
        .arg(fixture("calculator.feature"))
        .assert()
        .success()
        .stdout(contains("Checked 1 file(s): 0 diagnostic(s)"));
}

#[test]
fn language_flag_selects_the_dialect() {
    gherkin_bind()
        .args(["--language", "fr", "check"])
        .arg(fixture("french.feature"))
        .assert()
        .success();

    gherkin_bind()
        .arg("--config")
        .arg(fixture("french.json"))
        .arg("check")
        .arg(fixture("french.feature"))
        .assert()
        .success();
}

#[test]
fn unknown_language_cannot_run() {
    gherkin_bind()
        .args(["--language", "zz", "check"])
        .arg(fixture("calculator.feature"))
        .assert()
        .code(2)
        .stderr(contains("Language not supported: zz"));
}

#[test]
fn missing_file_cannot_run() {
    gherkin_bind()
        .arg("tree")
        .arg(fixture("nope.feature"))
        .assert()
        .code(2)
        .stderr(contains("cannot read"));
}

#[test]
fn tree_prints_the_outline() {
    gherkin_bind()
        .arg("tree")
        .arg(fixture("broken/missing_colon.feature"))
        .assert()
        .success()
        .stdout(contains("GherkinDocument@").and(contains("ColonToken@[7..7) (missing)")));
}

#[test]
fn classify_prints_one_line_per_pattern() {
    gherkin_bind()
        .args(["classify", "I have {int} cukes", r"I have (\d+) cukes"])
        .assert()
        .success()
        .stdout(
            contains("cucumber-expression\tI have {int} cukes")
                .and(contains("regex\tI have (\\d+) cukes")),
        );
}

#[test]
fn dialects_lists_languages() {
    gherkin_bind()
        .arg("dialects")
        .assert()
        .success()
        .stdout(contains("fr\tFrench\tfrançais").and(contains("en\tEnglish")));
}

#[test]
fn pickles_as_json() {
    gherkin_bind()
        .arg("pickles")
        .arg("--json")
        .arg(fixture("calculator.feature"))
        .assert()
        .success()
        .stdout(contains("\"keywordType\": \"Context\"").and(contains("\"name\": \"Multiply\"")));
}

#[test]
fn match_binds_every_calculator_step() {
    gherkin_bind()
        .arg("match")
        .arg(fixture("calculator.feature"))
        .arg("--bindings")
        .arg(fixture("calculator_bindings.yaml"))
        .assert()
        .success()
        .stdout(contains("15 bound, 0 undefined, 0 ambiguous"))
        .stdout(contains("CalculatorSteps.WhenIPressMultiply()"));
}

#[test]
fn match_fails_on_ambiguity_and_suggests_snippets() {
    gherkin_bind()
        .arg("match")
        .arg(fixture("button.feature"))
        .arg("--bindings")
        .arg(fixture("button_bindings.json"))
        .assert()
        .code(1)
        .stdout(contains("Ambiguous step definitions found for step 'When I press the button'"))
        .stdout(contains("No matching step definition found for step 'a step nobody wrote'"))
        .stdout(contains("name: ThenAStepNobodyWrote"))
        .stdout(contains("0 bound, 1 undefined, 1 ambiguous"));
}

#[test]
fn undefined_steps_fail_only_when_configured() {
    gherkin_bind()
        .arg("match")
        .arg(fixture("calculator.feature"))
        .arg("--bindings")
        .arg(fixture("button_bindings.json"))
        .assert()
        .success()
        .stdout(contains("0 bound, 15 undefined, 0 ambiguous"));

    gherkin_bind()
        .arg("--config")
        .arg(fixture("strict.yaml"))
        .arg("match")
        .arg(fixture("calculator.feature"))
        .arg("--bindings")
        .arg(fixture("button_bindings.json"))
        .assert()
        .code(1);
}

#[test]
fn invalid_config_cannot_run() {
    gherkin_bind()
        .arg("--config")
        .arg(fixture("invalid_config.yaml"))
        .arg("dialects")
        .assert()
        .code(2)
        .stderr(contains("invalid").or(contains("unknown field")));
}
