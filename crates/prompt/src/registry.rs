//! Named prompt templates with variable interpolation.

use compact_str::CompactString;
use pcore::{CompletionOptions, Message};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// A named, parameterized prompt blueprint.
///
/// Immutable after registration; re-registering the same id overwrites
/// the previous entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptTemplate {
    /// Unique key.
    pub id: CompactString,
    /// Body with `{{name}}` placeholders.
    pub template: String,
    /// Optional system prompt, also interpolated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Variables that must be present at compile time.
    #[serde(default)]
    pub required_variables: Vec<CompactString>,
    /// Variables supplied when the caller omits them.
    #[serde(default)]
    pub default_variables: BTreeMap<CompactString, String>,
    /// Per-template temperature override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Per-template token cap override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl PromptTemplate {
    /// Create a template with the given id and body.
    pub fn new(id: impl Into<CompactString>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template: template.into(),
            system_prompt: None,
            required_variables: Vec::new(),
            default_variables: BTreeMap::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Mark variables as required.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.required_variables
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a default variable value.
    pub fn with_default(mut self, name: impl Into<CompactString>, value: impl Into<String>) -> Self {
        self.default_variables.insert(name.into(), value.into());
        self
    }

    /// Set the temperature override.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the token cap override.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A compiled prompt: template with all variables resolved.
///
/// Derived and throwaway; never persisted.
#[derive(Debug, Clone)]
pub struct CompiledPrompt {
    /// The interpolated body.
    pub content: String,
    /// The interpolated system prompt, if the template has one.
    pub system_prompt: Option<String>,
    /// The template this was compiled from.
    pub template: PromptTemplate,
    /// The merged variable set used for interpolation.
    pub variables: BTreeMap<CompactString, String>,
}

impl CompiledPrompt {
    /// The message list for a completion call: the system prompt (when
    /// present) followed by the body as a user turn.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(self.content.clone()));
        messages
    }

    /// Apply the template's temperature and token-cap overrides to base
    /// completion options.
    pub fn options(&self, base: CompletionOptions) -> CompletionOptions {
        let mut options = base;
        if let Some(temperature) = self.template.temperature {
            options.temperature = temperature;
        }
        if let Some(max_tokens) = self.template.max_tokens {
            options.max_tokens = max_tokens;
        }
        options
    }
}

/// Compilation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    /// No template registered under the requested id.
    #[error("unknown prompt template '{0}'")]
    UnknownTemplate(CompactString),

    /// A required variable is absent from the merged variable set.
    #[error("template '{template}' is missing required variable '{name}'")]
    MissingVariable {
        /// The template being compiled.
        template: CompactString,
        /// The absent variable.
        name: CompactString,
    },
}

/// A catalog of prompt templates.
///
/// Registered once at process start; lookups are cheap clones behind a
/// read lock.
#[derive(Debug, Default)]
pub struct PromptRegistry {
    templates: RwLock<BTreeMap<CompactString, PromptTemplate>>,
}

impl PromptRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. Silently overwrites an existing entry with
    /// the same id; last write wins.
    pub fn register(&self, template: PromptTemplate) {
        let mut templates = self.templates.write().expect("prompt registry lock poisoned");
        if templates
            .insert(template.id.clone(), template)
            .is_some()
        {
            tracing::debug!("replaced an already-registered prompt template");
        }
    }

    /// Compile a template against the given variables.
    ///
    /// Defaults merge under call-supplied variables (call wins). Fails
    /// only when a required variable is absent from the merged set;
    /// placeholders naming unknown variables stay in the output as-is.
    pub fn compile(
        &self,
        id: &str,
        variables: &BTreeMap<CompactString, String>,
    ) -> Result<CompiledPrompt, PromptError> {
        let template = self
            .get(id)
            .ok_or_else(|| PromptError::UnknownTemplate(CompactString::from(id)))?;

        let mut merged = template.default_variables.clone();
        merged.extend(
            variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        for name in &template.required_variables {
            if !merged.contains_key(name) {
                return Err(PromptError::MissingVariable {
                    template: template.id.clone(),
                    name: name.clone(),
                });
            }
        }

        Ok(CompiledPrompt {
            content: interpolate(&template.template, &merged),
            system_prompt: template
                .system_prompt
                .as_deref()
                .map(|s| interpolate(s, &merged)),
            template,
            variables: merged,
        })
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Option<PromptTemplate> {
        self.templates
            .read()
            .expect("prompt registry lock poisoned")
            .get(id)
            .cloned()
    }

    /// Whether a template is registered under the id.
    pub fn has(&self, id: &str) -> bool {
        self.templates
            .read()
            .expect("prompt registry lock poisoned")
            .contains_key(id)
    }

    /// The registered template ids, sorted.
    pub fn list(&self) -> Vec<CompactString> {
        self.templates
            .read()
            .expect("prompt registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

/// Replace `{{name}}` placeholders for every name in the variable set.
///
/// Placeholders naming variables outside the set are left untouched —
/// only missing *required* variables are an error, and that is checked
/// before interpolation.
fn interpolate(text: &str, variables: &BTreeMap<CompactString, String>) -> String {
    let mut out = text.to_owned();
    for (name, value) in variables {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}
