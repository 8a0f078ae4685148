//! Request body for the Google generateContent API.

use pcore::{CompletionOptions, Message, Role, merge_system};
use serde::Serialize;

/// The request body for the generateContent API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Request {
    /// System instruction (top-level, not in the contents array).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// The conversation turns.
    pub contents: Vec<Content>,
    /// Generation parameters.
    pub generation_config: GenerationConfig,
}

/// A single content entry: a role plus text parts.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Content {
    /// The author role; Gemini uses `model` for assistant turns and
    /// omits the role on system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    /// The text parts.
    pub parts: Vec<Part>,
}

/// A text part.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Part {
    pub text: String,
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    /// Maximum tokens to generate.
    pub max_output_tokens: u32,
    /// Temperature.
    pub temperature: f32,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl Request {
    /// Build the request body from unified messages and options.
    ///
    /// System turns fold into `systemInstruction`; an explicit
    /// `options.system_prompt` overrides them.
    pub fn build(messages: &[Message], options: &CompletionOptions) -> Self {
        let system = options
            .system_prompt
            .clone()
            .or_else(|| merge_system(messages));

        let contents = messages
            .iter()
            .filter(|msg| msg.role != Role::System)
            .map(|msg| Content {
                role: Some(match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                    Role::System => unreachable!("system turns are filtered"),
                }),
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        Self {
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: options.max_tokens,
                temperature: options.temperature,
                stop_sequences: options.stop_sequences.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Request;
    use pcore::{CompletionOptions, Message};

    #[test]
    fn assistant_role_becomes_model() {
        let messages = vec![
            Message::user("how do I reschedule?"),
            Message::assistant("pick a new slot"),
            Message::user("tuesday then"),
        ];
        let req = Request::build(&messages, &CompletionOptions::default());
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "tuesday then");
    }

    #[test]
    fn system_turns_become_system_instruction() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let req = Request::build(&messages, &CompletionOptions::default());
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn generation_config_maps_options() {
        let options = CompletionOptions::new(512)
            .with_temperature(0.2)
            .with_stop_sequences(vec!["\n\n".into()]);
        let req = Request::build(&[Message::user("hi")], &options);
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(body["generationConfig"]["stopSequences"][0], "\n\n");
    }
}
