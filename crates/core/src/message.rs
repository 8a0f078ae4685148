//! Chat message types.

use serde::{Deserialize, Serialize};

/// A message in a completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,

    /// The content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Role {
    /// The user role.
    #[serde(rename = "user")]
    User,
    /// The assistant role.
    #[serde(rename = "assistant")]
    Assistant,
    /// The system role.
    #[serde(rename = "system")]
    System,
}

/// Merge all system messages into a single system instruction.
///
/// Not every backend accepts inline system turns, so providers fold
/// `Role::System` entries into one top-level instruction (joined with
/// blank lines) and send the remaining turns as the conversation.
/// Returns `None` when no system message is present.
pub fn merge_system(messages: &[Message]) -> Option<String> {
    let mut merged = String::new();
    for msg in messages.iter().filter(|m| m.role == Role::System) {
        if !merged.is_empty() {
            merged.push_str("\n\n");
        }
        merged.push_str(&msg.content);
    }
    if merged.is_empty() { None } else { Some(merged) }
}

#[cfg(test)]
mod tests {
    use super::{Message, merge_system};

    #[test]
    fn merges_system_turns_in_order() {
        let messages = vec![
            Message::system("You are a scheduling assistant."),
            Message::user("book tomorrow"),
            Message::system("Answer in English."),
        ];
        assert_eq!(
            merge_system(&messages).as_deref(),
            Some("You are a scheduling assistant.\n\nAnswer in English.")
        );
    }

    #[test]
    fn no_system_turns_yields_none() {
        let messages = vec![Message::user("hi")];
        assert_eq!(merge_system(&messages), None);
    }
}
