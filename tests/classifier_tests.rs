use gherkin_bind::bindings::is_cucumber_expression;
use proptest::prelude::*;

#[test]
fn placeholder_and_group_examples() {
    assert!(is_cucumber_expression("I have {int} cukes"));
    assert!(!is_cucumber_expression(r"I have (\d+) cukes"));
}

#[test]
fn placeholder_wins_over_later_regex_signals() {
    assert!(is_cucumber_expression(r"I have {count} cukes \d+"));
    assert!(is_cucumber_expression(r"the total is {float} \. ok"));
}

#[test]
fn anchors_win_over_placeholders() {
    assert!(!is_cucumber_expression("^I have {int} cukes$"));
}

#[test]
fn plain_and_optional_text_is_a_cucumber_expression() {
    assert!(is_cucumber_expression("I press the button"));
    assert!(is_cucumber_expression("I have a cuke(s)"));
    assert!(is_cucumber_expression("I eat/drink it"));
}

proptest! {
    #[test]
    fn classification_is_deterministic(text in "\\PC{0,60}") {
        prop_assert_eq!(is_cucumber_expression(&text), is_cucumber_expression(&text));
    }

    #[test]
    fn a_placeholder_always_makes_an_expression(
        prefix in "[a-z ]{0,20}",
        name in "[a-z]{0,8}",
        suffix in "[a-z \\\\.+*()d]{0,20}",
    ) {
        let text = format!("{prefix}{{{name}}}{suffix}");
        prop_assert!(is_cucumber_expression(&text));
    }

    #[test]
    fn an_anchor_always_makes_a_regex(body in "[a-z {}]{0,30}") {
        let anchored = format!("^{}", body);
        prop_assert!(!is_cucumber_expression(&anchored));
    }
}
