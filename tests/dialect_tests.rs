use std::sync::Arc;
use std::thread;

use gherkin_bind::dialect::{DialectProvider, DEFAULT_LANGUAGE};
use gherkin_bind::syntax::StepKeywordType;
use gherkin_bind::text::{LinePosition, LinePositionSpan, Location, TextSpan};
use gherkin_bind::{to_error_source, ErrorType};
use miette::Diagnostic;
use pretty_assertions::assert_eq;

#[test]
fn region_falls_back_to_the_base_language() {
    let provider = DialectProvider::default();
    let fr = provider.get_dialect("fr", None).unwrap();
    let fr_ca = provider.get_dialect("fr-CA", None).unwrap();
    assert_eq!(fr_ca.language(), "fr-CA");
    assert_eq!(fr_ca.feature_keywords(), fr.feature_keywords());
    assert_eq!(fr_ca.given_keywords(), fr.given_keywords());
}

#[test]
fn en_us_uses_english_keywords() {
    let provider = DialectProvider::new(DEFAULT_LANGUAGE);
    let en = provider.default_dialect().unwrap();
    let en_us = provider.get_dialect("en-US", None).unwrap();
    assert_eq!(en_us.language(), "en-US");
    assert_eq!(en_us.feature_keywords(), en.feature_keywords());
    assert_eq!(en_us.scenario_outline_keywords(), en.scenario_outline_keywords());
}

#[test]
fn unknown_language_names_the_tag_and_location() {
    let provider = DialectProvider::default();
    let location = Location {
        path: "a.feature".to_string(),
        span: TextSpan::new(0, 14),
        line_span: LinePositionSpan {
            start: LinePosition::new(0, 0),
            end: LinePosition::new(0, 14),
        },
    };
    let error = provider.get_dialect("zz-ZZ", Some(&location)).unwrap_err();
    assert_eq!(error.error_type(), ErrorType::Language);
    assert_eq!(error.message(), "Language not supported: zz-ZZ (a.feature:1:1)");
}

#[test]
fn unknown_language_in_a_file_labels_the_tag() {
    let text = "# language: zz-ZZ\nFeature: F\n";
    let source = to_error_source("a.feature", text);
    let location = Location {
        path: "a.feature".to_string(),
        span: TextSpan::new(12, 5),
        line_span: LinePositionSpan {
            start: LinePosition::new(0, 12),
            end: LinePosition::new(0, 17),
        },
    };
    let error = DialectProvider::default()
        .get_dialect_in("zz-ZZ", &source, &location)
        .unwrap_err();
    assert_eq!(error.error_type(), ErrorType::Language);
    assert_eq!(error.message(), "Language not supported: zz-ZZ (a.feature:1:13)");
    assert!(error.source_code().is_some());
    let labels: Vec<_> = error.labels().map(|l| l.collect()).unwrap_or_default();
    assert_eq!(labels.len(), 1);
    assert_eq!((labels[0].offset(), labels[0].len()), (12, 5));
    assert!(error.help().is_some());
}

#[test]
fn located_lookup_falls_back_like_the_plain_one() {
    let text = "# language: fr-CA\n";
    let source = to_error_source("a.feature", text);
    let location = Location {
        path: "a.feature".to_string(),
        span: TextSpan::new(12, 5),
        line_span: LinePositionSpan {
            start: LinePosition::new(0, 12),
            end: LinePosition::new(0, 17),
        },
    };
    let dialect = DialectProvider::default()
        .get_dialect_in("fr-CA", &source, &location)
        .unwrap();
    assert_eq!(dialect.language(), "fr-CA");
}

#[test]
fn repeated_lookups_share_one_dialect() {
    let provider = DialectProvider::default();
    let first = provider.get_dialect("de-CH", None).unwrap();
    let second = provider.get_dialect("de-CH", None).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn concurrent_lookups_agree() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                DialectProvider::default()
                    .get_dialect("es-MX", None)
                    .map(|d| d.feature_keywords().to_vec())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn available_languages_are_sorted_and_include_common_ones() {
    let languages = DialectProvider::default().available_languages().unwrap();
    for expected in ["de", "en", "fr", "es"] {
        assert!(languages.iter().any(|l| l == expected), "missing {expected}");
    }
    let mut sorted = languages.clone();
    sorted.sort();
    assert_eq!(languages, sorted);
}

#[test]
fn step_keyword_types() {
    let en = DialectProvider::default().default_dialect().unwrap();
    assert_eq!(en.step_keyword_type("Given "), StepKeywordType::Context);
    assert_eq!(en.step_keyword_type("When "), StepKeywordType::Action);
    assert_eq!(en.step_keyword_type("Then "), StepKeywordType::Outcome);
    assert_eq!(en.step_keyword_type("And "), StepKeywordType::Conjunction);
    assert_eq!(en.step_keyword_type("But "), StepKeywordType::Conjunction);
    assert_eq!(en.step_keyword_type("* "), StepKeywordType::Unknown);
}
