use pcore::{CompletionOptions, Role};
use praxis_prompt::{PromptError, PromptRegistry, PromptTemplate};
use std::collections::BTreeMap;

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<compact_str::CompactString, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).into(), (*v).to_owned()))
        .collect()
}

#[test]
fn compiles_with_interpolation() {
    let registry = PromptRegistry::new();
    registry.register(PromptTemplate::new("greet", "Hi {{name}}").require(["name"]));

    let compiled = registry.compile("greet", &vars(&[("name", "Ada")])).unwrap();
    assert_eq!(compiled.content, "Hi Ada");
}

#[test]
fn missing_required_variable_fails() {
    let registry = PromptRegistry::new();
    registry.register(PromptTemplate::new("greet", "Hi {{name}}").require(["name"]));

    let err = registry.compile("greet", &BTreeMap::new()).unwrap_err();
    assert_eq!(
        err,
        PromptError::MissingVariable {
            template: "greet".into(),
            name: "name".into(),
        }
    );
}

#[test]
fn defaults_fill_in_and_call_vars_win() {
    let registry = PromptRegistry::new();
    registry.register(
        PromptTemplate::new("greet", "{{salutation}} {{name}}")
            .require(["name"])
            .with_default("salutation", "Hello"),
    );

    let compiled = registry.compile("greet", &vars(&[("name", "Ada")])).unwrap();
    assert_eq!(compiled.content, "Hello Ada");

    let compiled = registry
        .compile("greet", &vars(&[("name", "Ada"), ("salutation", "Hi")]))
        .unwrap();
    assert_eq!(compiled.content, "Hi Ada");
}

#[test]
fn unknown_placeholders_stay_verbatim() {
    let registry = PromptRegistry::new();
    registry.register(PromptTemplate::new("partial", "{{known}} and {{unknown}}"));

    let compiled = registry
        .compile("partial", &vars(&[("known", "yes")]))
        .unwrap();
    assert_eq!(compiled.content, "yes and {{unknown}}");
}

#[test]
fn unknown_template_fails() {
    let registry = PromptRegistry::new();
    let err = registry.compile("nope", &BTreeMap::new()).unwrap_err();
    assert_eq!(err, PromptError::UnknownTemplate("nope".into()));
}

#[test]
fn system_prompt_is_interpolated_too() {
    let registry = PromptRegistry::new();
    registry.register(
        PromptTemplate::new("review", "Review: {{code}}")
            .with_system_prompt("You are a {{language}} reviewer")
            .require(["code", "language"]),
    );

    let compiled = registry
        .compile("review", &vars(&[("code", "fn main() {}"), ("language", "Rust")]))
        .unwrap();
    assert_eq!(
        compiled.system_prompt.as_deref(),
        Some("You are a Rust reviewer")
    );

    let messages = compiled.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "Review: fn main() {}");
}

#[test]
fn re_registering_overwrites() {
    let registry = PromptRegistry::new();
    registry.register(PromptTemplate::new("greet", "old"));
    registry.register(PromptTemplate::new("greet", "new"));

    let compiled = registry.compile("greet", &BTreeMap::new()).unwrap();
    assert_eq!(compiled.content, "new");
    assert_eq!(registry.list(), vec!["greet"]);
}

#[test]
fn template_overrides_apply_to_options() {
    let registry = PromptRegistry::new();
    registry.register(
        PromptTemplate::new("cold", "{{x}}")
            .with_temperature(0.0)
            .with_max_tokens(64),
    );

    let compiled = registry.compile("cold", &vars(&[("x", "y")])).unwrap();
    let options = compiled.options(CompletionOptions::default());
    assert_eq!(options.temperature, 0.0);
    assert_eq!(options.max_tokens, 64);
}

#[test]
fn get_and_has_are_side_effect_free() {
    let registry = PromptRegistry::new();
    registry.register(PromptTemplate::new("a", "body"));

    assert!(registry.has("a"));
    assert!(!registry.has("b"));
    assert_eq!(registry.get("a").unwrap().template, "body");
    assert!(registry.get("b").is_none());
    assert_eq!(registry.list(), vec!["a"]);
}
