//! Completion contract implementation for the Claude provider.

use super::{Claude, Request};
use compact_str::CompactString;
use pcore::{
    Completion, CompletionOptions, CompletionResult, ErrorCode, FinishReason, Message,
    ProviderError, ProviderKind, Usage,
};
use reqwest::StatusCode;

/// Raw Anthropic non-streaming response.
#[derive(serde::Deserialize)]
struct AnthropicResponse {
    model: CompactString,
    content: Vec<ContentBlock>,
    stop_reason: Option<CompactString>,
    usage: Option<AnthropicUsage>,
}

#[derive(serde::Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(serde::Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Raw Anthropic error envelope.
#[derive(serde::Deserialize)]
struct AnthropicErrorEnvelope {
    error: AnthropicError,
}

#[derive(serde::Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl Completion for Claude {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, ProviderError> {
        let body = Request::build(&self.model, messages, options);
        tracing::trace!(model = %self.model, "claude request");
        let (status, text) = self
            .transport
            .post(ProviderKind::Claude, &body, options.timeout)
            .await?;

        if !status.is_success() {
            return Err(map_error(status, &text));
        }

        let raw: AnthropicResponse = serde_json::from_str(&text).map_err(|err| {
            ProviderError::new(
                ProviderKind::Claude,
                ErrorCode::ProviderError,
                "unexpected response shape from anthropic",
            )
            .with_cause(err)
        })?;
        Ok(to_result(raw))
    }
}

/// Map a non-2xx Anthropic response onto the shared taxonomy.
///
/// The native `error.type` is authoritative; the HTTP status is the
/// fallback when the body is not the documented error envelope.
fn map_error(status: StatusCode, body: &str) -> ProviderError {
    let Ok(envelope) = serde_json::from_str::<AnthropicErrorEnvelope>(body) else {
        return ProviderError::from_status(
            ProviderKind::Claude,
            status.as_u16(),
            format!("anthropic request failed with status {status}"),
        );
    };

    let message = envelope.error.message;
    let code = match envelope.error.kind.as_str() {
        "rate_limit_error" => ErrorCode::RateLimit,
        "authentication_error" | "permission_error" => ErrorCode::InvalidApiKey,
        "overloaded_error" | "api_error" => ErrorCode::ProviderError,
        "request_too_large" => ErrorCode::ContextLengthExceeded,
        "invalid_request_error" if message.contains("prompt is too long") => {
            ErrorCode::ContextLengthExceeded
        }
        "invalid_request_error" if message.contains("content filtering") => {
            ErrorCode::ContentFiltered
        }
        _ => return ProviderError::from_status(ProviderKind::Claude, status.as_u16(), message),
    };
    ProviderError::new(ProviderKind::Claude, code, message).with_status(status.as_u16())
}

/// Convert an Anthropic response to the normalized result.
fn to_result(raw: AnthropicResponse) -> CompletionResult {
    let mut content = String::new();
    for block in raw.content {
        if let ContentBlock::Text { text } = block {
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(&text);
        }
    }

    let finish_reason = raw.stop_reason.as_deref().map(|reason| match reason {
        "end_turn" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        "stop_sequence" => FinishReason::StopSequence,
        "refusal" => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    });

    CompletionResult {
        content,
        provider: ProviderKind::Claude,
        model: raw.model,
        usage: raw
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens)),
        finish_reason,
        is_fallback: false,
        original_provider: None,
    }
}
