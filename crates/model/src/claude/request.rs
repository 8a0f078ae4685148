//! Request body for the Anthropic Messages API.

use pcore::{CompletionOptions, Message, Role, merge_system};
use serde::Serialize;
use serde_json::{Value, json};

/// The request body for the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Request {
    /// The model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// System prompt (top-level, not in the messages array).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// The messages array.
    pub messages: Vec<Value>,
    /// Temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl Request {
    /// Build the request body from unified messages and options.
    ///
    /// System turns are folded into the top-level `system` field; an
    /// explicit `options.system_prompt` overrides them.
    pub fn build(model: &str, messages: &[Message], options: &CompletionOptions) -> Self {
        let system = options
            .system_prompt
            .clone()
            .or_else(|| merge_system(messages));

        let anthropic_msgs = messages
            .iter()
            .filter(|msg| msg.role != Role::System)
            .map(|msg| {
                json!({
                    "role": match msg.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                        Role::System => unreachable!("system turns are filtered"),
                    },
                    "content": msg.content,
                })
            })
            .collect();

        Self {
            model: model.to_owned(),
            max_tokens: options.max_tokens,
            system,
            messages: anthropic_msgs,
            temperature: Some(options.temperature),
            stop_sequences: options.stop_sequences.clone(),
        }
    }
}
