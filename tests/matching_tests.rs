mod common;

use std::collections::HashSet;

use gherkin_bind::bindings::{
    ArgumentValue, BindingMethod, BindingSet, ExpressionType, HookBinding, HookType, MatchResult,
    RegistryBuilder, StepArgumentTransformation, StepDefinitionDeclaration,
    StepDefinitionRegistry, StepDefinitionType, StepInstance, StepMatchError,
};
use gherkin_bind::pickles::compile_pickles;
use gherkin_bind::syntax::StepKeywordType;
use pretty_assertions::assert_eq;

use common::{fixture, parse, read_fixture};

fn method(declaring_type: &str, name: &str) -> BindingMethod {
    BindingMethod::new("Specs", declaring_type, name)
}

fn declaration(keyword: StepDefinitionType, text: &str, name: &str) -> StepDefinitionDeclaration {
    StepDefinitionDeclaration::new(keyword, Some(text), method("Steps", name))
}

fn registry(declarations: Vec<StepDefinitionDeclaration>) -> StepDefinitionRegistry {
    let mut builder = RegistryBuilder::new();
    for d in declarations {
        builder.add_step_definition(d);
    }
    builder.build().into_result().unwrap()
}

fn when(text: &str) -> StepInstance {
    StepInstance::new("When ", StepKeywordType::Action, text)
}

#[test]
fn expression_and_regex_covering_the_same_text_are_ambiguous() {
    let set = BindingSet::load(fixture("button_bindings.json")).unwrap();
    let mut builder = RegistryBuilder::new();
    builder.add_binding_set(set);
    let registry = builder.build().into_result().unwrap();

    let expression_types: Vec<_> = registry
        .step_definitions()
        .iter()
        .map(|b| b.expression_type())
        .collect();
    assert_eq!(
        expression_types,
        vec![ExpressionType::CucumberExpression, ExpressionType::RegularExpression]
    );

    let step = when("I press the button");
    let MatchResult::Ambiguous(candidates) = registry.match_step(&step) else {
        panic!("expected an ambiguous match");
    };
    assert_eq!(candidates.len(), 2);

    let error = MatchResult::Ambiguous(candidates).into_result(&step).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Ambiguous step definitions found for step 'When I press the button': \
         Ui.Specs:ButtonSteps.PressButton(), Ui.Specs:LegacySteps.PressTheButton()"
    );
}

#[test]
fn nothing_matching_is_undefined() {
    let registry = registry(vec![declaration(StepDefinitionType::When, "I press the button", "Press")]);
    let step = when("a step nobody wrote");
    let result = registry.match_step(&step);
    assert!(matches!(result, MatchResult::Undefined));
    assert_eq!(
        result.into_result(&step).unwrap_err(),
        StepMatchError::Undefined {
            step: "a step nobody wrote".to_string()
        }
    );
}

#[test]
fn empty_registry_leaves_everything_undefined() {
    let registry = StepDefinitionRegistry::default();
    assert!(registry.is_empty());
    assert!(matches!(registry.match_step(&when("anything")), MatchResult::Undefined));
}

#[test]
fn every_matching_binding_is_a_candidate() {
    let registry = registry(vec![
        declaration(StepDefinitionType::When, "I pay {int} euros", "PayInt"),
        declaration(StepDefinitionType::When, r"I pay (\d+) euros", "PayRegex"),
        declaration(StepDefinitionType::Any, "I pay {} euros", "PayAnything"),
        declaration(StepDefinitionType::Then, "I pay {int} euros", "WrongKeyword"),
        declaration(StepDefinitionType::When, "I pay {int} dollars", "OtherCurrency"),
    ]);
    let MatchResult::Ambiguous(candidates) = registry.match_step(&when("I pay 12 euros")) else {
        panic!("expected an ambiguous match");
    };
    let names: Vec<&str> = candidates.iter().map(|c| c.binding().method().name.as_str()).collect();
    assert_eq!(names, vec!["PayInt", "PayRegex", "PayAnything"]);
    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
}

#[test]
fn keyword_must_be_compatible() {
    let registry = registry(vec![declaration(StepDefinitionType::Given, "a calculator", "Calc")]);
    assert!(matches!(registry.match_step(&when("a calculator")), MatchResult::Undefined));
    let star = StepInstance::new("* ", StepKeywordType::Unknown, "a calculator");
    assert!(registry.match_step(&star).is_bound());
}

#[test]
fn arguments_are_converted_by_parameter_type() {
    let registry = registry(vec![declaration(
        StepDefinitionType::Given,
        "I have {int} cukes costing {float} in {string}",
        "Cukes",
    )]);
    let step = StepInstance::new("Given ", StepKeywordType::Context, "I have 5 cukes costing 1.5 in \"my belly\"");
    let MatchResult::Bound(found) = registry.match_step(&step) else {
        panic!("expected a bound step");
    };
    let values: Vec<_> = found.arguments().iter().map(|a| a.value.clone()).collect();
    assert_eq!(
        values,
        vec![
            ArgumentValue::Int(5),
            ArgumentValue::Float(1.5),
            ArgumentValue::String("my belly".to_string()),
        ]
    );
    assert_eq!(found.arguments()[0].start, 7);
}

#[test]
fn transformations_add_parameter_types() {
    let mut builder = RegistryBuilder::new();
    builder
        .add_transformation(StepArgumentTransformation {
            name: "color".to_string(),
            regex: Some("red|blue".to_string()),
            method: method("Transforms", "ToColor"),
            use_for_snippets: true,
        })
        .add_step_definition(declaration(StepDefinitionType::When, "I paint it {color}", "Paint"));
    let registry = builder.build().into_result().unwrap();
    assert!(registry.parameter_types().lookup("color").is_some());

    let MatchResult::Bound(found) = registry.match_step(&when("I paint it blue")) else {
        panic!("expected a bound step");
    };
    assert_eq!(
        found.arguments()[0].value,
        ArgumentValue::Custom {
            type_name: "color".to_string(),
            text: "blue".to_string()
        }
    );
    assert!(matches!(registry.match_step(&when("I paint it green")), MatchResult::Undefined));
}

#[test]
fn invalid_bindings_are_reported_and_left_out() {
    let mut builder = RegistryBuilder::new();
    builder
        .add_step_definition(declaration(StepDefinitionType::Given, "   ", "Blank"))
        .add_step_definition(declaration(StepDefinitionType::Given, r"^broken (\d+$", "BadRegex"))
        .add_step_definition(declaration(StepDefinitionType::Given, "I have {unknown}", "BadType"))
        .add_step_definition(declaration(StepDefinitionType::Given, " padded ", "Padded"))
        .add_step_definition(declaration(StepDefinitionType::Given, "fine", "Fine"));
    let build = builder.build();

    let failed: Vec<&str> = build.errors().map(|d| d.method.as_str()).collect();
    assert_eq!(
        failed,
        vec!["Specs:Steps.Blank()", "Specs:Steps.BadRegex()", "Specs:Steps.BadType()"]
    );
    assert_eq!(build.diagnostics.len(), 4);

    let kept: Vec<&str> = build
        .registry
        .step_definitions()
        .iter()
        .map(|b| b.method().name.as_str())
        .collect();
    assert_eq!(kept, vec!["Padded", "Fine"]);
    assert!(build.into_result().is_err());
}

#[test]
fn hooks_come_back_in_order() {
    let mut builder = RegistryBuilder::new();
    builder
        .add_hook(HookBinding {
            hook_type: HookType::BeforeScenario,
            method: method("Hooks", "Late"),
            order: 20,
        })
        .add_hook(HookBinding {
            hook_type: HookType::AfterScenario,
            method: method("Hooks", "Teardown"),
            order: 0,
        })
        .add_hook(HookBinding {
            hook_type: HookType::BeforeScenario,
            method: method("Hooks", "Early"),
            order: -5,
        });
    let registry = builder.build().into_result().unwrap();
    let before: Vec<&str> = registry
        .hooks(HookType::BeforeScenario)
        .map(|h| h.method.name.as_str())
        .collect();
    assert_eq!(before, vec!["Early", "Late"]);
    assert_eq!(registry.hooks(HookType::BeforeStep).count(), 0);
}

#[test]
fn calculator_feature_binds_end_to_end() {
    let tree = parse(&read_fixture("calculator.feature"));
    let pickles = compile_pickles(&tree);
    assert_eq!(pickles.len(), 3);

    let set = BindingSet::load(fixture("calculator_bindings.yaml")).unwrap();
    let mut builder = RegistryBuilder::new();
    builder.add_binding_set(set);
    let registry = builder.build().into_result().unwrap();
    assert_eq!(registry.len(), 5);
    assert_eq!(registry.hooks(HookType::BeforeScenario).count(), 1);

    let mut bound_methods = Vec::new();
    for pickle in &pickles {
        for step in &pickle.steps {
            let instance = StepInstance::from(step);
            let found = registry
                .match_step(&instance)
                .into_result(&instance)
                .unwrap_or_else(|e| panic!("{e}"));
            bound_methods.push(found.binding().method().name.clone());
        }
    }
    assert_eq!(bound_methods.len(), 15);
    assert!(bound_methods.iter().any(|m| m == "WhenIPressMultiply"));

    let entered = StepInstance::from(&pickles[0].steps[1]);
    let MatchResult::Bound(found) = registry.match_step(&entered) else {
        panic!("expected a bound step");
    };
    assert_eq!(found.arguments()[0].value, ArgumentValue::Int(50));
    assert_eq!(found.arguments()[0].start, 15);

    let result = StepInstance::from(&pickles[2].steps[4]);
    assert_eq!(result.text, "the result should be 20 on the screen");
    let MatchResult::Bound(found) = registry.match_step(&result) else {
        panic!("expected a bound step");
    };
    assert_eq!(found.binding().expression_type(), ExpressionType::RegularExpression);
    assert_eq!(found.arguments()[0].value, ArgumentValue::Text("20".to_string()));
    assert_eq!(found.arguments()[0].start, 21);
}

#[test]
fn registry_can_be_published_once() {
    let registry = registry(vec![declaration(StepDefinitionType::Given, "global step", "Global")]);
    let installed = registry.install_global().unwrap();
    assert_eq!(installed.len(), 1);
    assert!(StepDefinitionRegistry::global().is_some());

    let again = StepDefinitionRegistry::default().install_global();
    assert!(again.is_err());
    let step = StepInstance::new("Given ", StepKeywordType::Context, "global step");
    assert!(StepDefinitionRegistry::global().unwrap().match_step(&step).is_bound());
}
