//! Completion response types.

use crate::kind::ProviderKind;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A normalized completion result.
///
/// Produced once per call and never mutated afterwards, except by the
/// fallback chain which annotates `is_fallback`/`original_provider`
/// before handing the result to the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionResult {
    /// The generated text.
    pub content: String,

    /// The backend that produced this result.
    pub provider: ProviderKind,

    /// The model that produced this result.
    pub model: CompactString,

    /// Token usage, when the backend reports it. Never fabricated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Why generation stopped, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Whether this result came from a provider other than the first
    /// in the chain.
    #[serde(default)]
    pub is_fallback: bool,

    /// The chain's first provider, set when `is_fallback` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_provider: Option<ProviderKind>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub input_tokens: u32,

    /// Number of generated tokens.
    pub output_tokens: u32,

    /// Total tokens used.
    pub total_tokens: u32,
}

impl Usage {
    /// Build usage from input/output counts.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// The reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model finished naturally.
    Stop,

    /// The model hit the max token limit.
    Length,

    /// A stop sequence ended generation.
    StopSequence,

    /// Content was filtered by the backend.
    ContentFilter,

    /// Any other backend-specific reason.
    Other,
}
