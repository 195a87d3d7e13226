//! Pickle compilation.
//!
//! A pickle is one executable scenario instance: background steps followed by
//! scenario steps, with outline placeholders filled from one Examples row and
//! conjunction keywords resolved to the type of the step before them.

use serde::Serialize;
use tracing::debug;

use crate::syntax::{
    BackgroundSyntax, DataTableSyntax, FeatureChild, GherkinSyntaxTree, ScenarioSyntax,
    StepArgument, StepKeywordType, StepSyntax, TableRowSyntax,
};
use crate::text::Location;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pickle {
    /// `path:line` of the scenario, or of the Examples row for outlines.
    pub id: String,
    pub name: String,
    pub uri: String,
    pub tags: Vec<String>,
    pub steps: Vec<PickleStep>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleStep {
    /// Keyword as written, including its trailing space (`"And "`).
    pub keyword: String,
    /// Resolved type: conjunctions carry the type of the step before them.
    pub keyword_type: StepKeywordType,
    /// The step was written with And/But.
    pub is_conjunction: bool,
    pub text: String,
    pub argument: Option<PickleStepArgument>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PickleStepArgument {
    DataTable { rows: Vec<Vec<String>> },
    DocString {
        #[serde(rename = "mediaType")]
        media_type: Option<String>,
        content: String,
    },
}

/// Placeholder names and the values of one Examples row.
struct Bindings<'a> {
    names: &'a [String],
    values: &'a [String],
}

impl Bindings<'_> {
    fn apply(&self, text: &str) -> String {
        self.names
            .iter()
            .zip(self.values)
            .fold(text.to_string(), |acc, (name, value)| {
                acc.replace(&format!("<{name}>"), value)
            })
    }
}

fn substitute(text: &str, bindings: Option<&Bindings<'_>>) -> String {
    bindings.map_or_else(|| text.to_string(), |b| b.apply(text))
}

/// Compiles every scenario in `tree` into pickles, in document order.
pub fn compile_pickles(tree: &GherkinSyntaxTree) -> Vec<Pickle> {
    let Some(feature) = tree.document().and_then(|d| d.feature()) else {
        return Vec::new();
    };
    let compiler = Compiler { tree };
    let feature_tags = feature.tag_names();
    let feature_background: Vec<StepSyntax> = feature
        .background()
        .as_ref()
        .map(BackgroundSyntax::steps)
        .unwrap_or_default();

    let mut pickles = Vec::new();
    for child in feature.children() {
        match child {
            FeatureChild::Scenario(scenario) => {
                compiler.scenario(&scenario, &feature_tags, &feature_background, &mut pickles)
            }
            FeatureChild::Rule(rule) => {
                let mut tags = feature_tags.clone();
                tags.extend(rule.tag_names());
                let mut background = feature_background.clone();
                background.extend(rule.background().as_ref().map(BackgroundSyntax::steps).unwrap_or_default());
                for scenario in rule.scenarios() {
                    compiler.scenario(&scenario, &tags, &background, &mut pickles);
                }
            }
        }
    }
    debug!(path = tree.file_path(), pickles = pickles.len(), "compiled pickles");
    pickles
}

struct Compiler<'t> {
    tree: &'t GherkinSyntaxTree,
}

impl Compiler<'_> {
    fn scenario(
        &self,
        scenario: &ScenarioSyntax,
        inherited_tags: &[String],
        background: &[StepSyntax],
        out: &mut Vec<Pickle>,
    ) {
        let mut tags = inherited_tags.to_vec();
        tags.extend(scenario.tag_names());
        let scenario_steps = scenario.steps();
        // Background steps only run for scenarios that have steps of their own.
        let steps: Vec<StepSyntax> = if scenario_steps.is_empty() {
            Vec::new()
        } else {
            background.iter().cloned().chain(scenario_steps).collect()
        };
        let name = scenario.name().unwrap_or_default();

        let examples = scenario.examples();
        if examples.is_empty() {
            let location = self.tree.location(scenario.syntax().span());
            out.push(Pickle {
                id: self.id(&location),
                name,
                uri: self.tree.file_path().to_string(),
                tags,
                steps: self.steps(&steps, None),
                location,
            });
            return;
        }

        for example in examples {
            let mut example_tags = tags.clone();
            example_tags.extend(example.tag_names());
            let Some(table) = example.table() else {
                continue;
            };
            let rows = table.rows();
            let Some((header, body)) = rows.split_first() else {
                continue;
            };
            let names = header.values();
            for row in body {
                let values = row.values();
                let bindings = Bindings {
                    names: &names,
                    values: &values,
                };
                let location = self.tree.location(row.syntax().span());
                out.push(Pickle {
                    id: self.id(&location),
                    name: bindings.apply(&name),
                    uri: self.tree.file_path().to_string(),
                    tags: example_tags.clone(),
                    steps: self.steps(&steps, Some(&bindings)),
                    location,
                });
            }
        }
    }

    fn id(&self, location: &Location) -> String {
        format!("{}:{}", self.tree.file_path(), location.line_span.start.line + 1)
    }

    fn steps(&self, steps: &[StepSyntax], bindings: Option<&Bindings<'_>>) -> Vec<PickleStep> {
        let mut previous = StepKeywordType::Unknown;
        steps
            .iter()
            .map(|step| {
                let written = step.keyword_type();
                let is_conjunction = written == StepKeywordType::Conjunction;
                if !is_conjunction {
                    previous = written;
                }
                PickleStep {
                    keyword: step.keyword_text(),
                    keyword_type: previous,
                    is_conjunction,
                    text: substitute(&step.text(), bindings),
                    argument: step.argument().map(|a| argument(&a, bindings)),
                    location: self.tree.location(step.syntax().span()),
                }
            })
            .collect()
    }
}

fn argument(argument: &StepArgument, bindings: Option<&Bindings<'_>>) -> PickleStepArgument {
    match argument {
        StepArgument::DataTable(table) => PickleStepArgument::DataTable {
            rows: table_values(table, bindings),
        },
        StepArgument::DocString(doc) => PickleStepArgument::DocString {
            media_type: doc.media_type().map(|m| substitute(&m, bindings)),
            content: substitute(&doc.content(), bindings),
        },
    }
}

fn table_values(table: &DataTableSyntax, bindings: Option<&Bindings<'_>>) -> Vec<Vec<String>> {
    table
        .rows()
        .iter()
        .map(TableRowSyntax::values)
        .map(|row| row.iter().map(|cell| substitute(cell, bindings)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ParseOptions;

    fn pickles(text: &str) -> Vec<Pickle> {
        let tree = GherkinSyntaxTree::parse_text(text, &ParseOptions::default(), "t.feature").unwrap();
        compile_pickles(&tree)
    }

    #[test]
    fn conjunctions_take_previous_type() {
        let got = pickles("Feature: F\n  Scenario: S\n    And first\n    Given g\n    And more\n    * star\n    But no\n");
        let types: Vec<_> = got[0].steps.iter().map(|s| s.keyword_type).collect();
        assert_eq!(
            types,
            vec![
                StepKeywordType::Unknown,
                StepKeywordType::Context,
                StepKeywordType::Context,
                StepKeywordType::Unknown,
                StepKeywordType::Unknown,
            ]
        );
        assert!(got[0].steps[2].is_conjunction);
        assert_eq!(got[0].steps[2].keyword, "And ");
    }

    #[test]
    fn outline_rows_expand() {
        let text = "\
Feature: F
  Scenario Outline: eat <n>
    Given I have <n> cukes
  Examples:
    | n |
    | 1 |
    | 2 |
";
        let got = pickles(text);
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].name, "eat 2");
        assert_eq!(got[1].steps[0].text, "I have 2 cukes");
        assert_eq!(got[1].id, "t.feature:7");
    }

    #[test]
    fn background_and_tags_are_inherited() {
        let text = "\
@f
Feature: F
  Background:
    Given bg
  Rule: R
    Background:
      Given rule bg
    @s
    Scenario: S
      When x
";
        let got = pickles(text);
        assert_eq!(got.len(), 1);
        let texts: Vec<_> = got[0].steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["bg", "rule bg", "x"]);
        assert_eq!(got[0].tags, vec!["@f", "@s"]);
    }
}
