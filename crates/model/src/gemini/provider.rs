//! Completion contract implementation for the Gemini provider.

use super::{Gemini, Request};
use pcore::{
    Completion, CompletionOptions, CompletionResult, ErrorCode, FinishReason, Message,
    ProviderError, ProviderKind, Usage,
};
use reqwest::StatusCode;

/// Raw generateContent response.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(serde::Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Raw Google error envelope.
#[derive(serde::Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(serde::Deserialize)]
struct GoogleError {
    #[serde(default)]
    status: String,
    message: String,
}

impl Completion for Gemini {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, ProviderError> {
        let body = Request::build(messages, options);
        tracing::trace!(model = %self.model, "gemini request");
        let (status, text) = self
            .transport
            .post(ProviderKind::Gemini, &body, options.timeout)
            .await?;

        if !status.is_success() {
            return Err(map_error(status, &text));
        }

        let raw: GeminiResponse = serde_json::from_str(&text).map_err(|err| {
            ProviderError::new(
                ProviderKind::Gemini,
                ErrorCode::ProviderError,
                "unexpected response shape from google",
            )
            .with_cause(err)
        })?;
        to_result(raw, &self.model)
    }
}

/// Map a non-2xx Google response onto the shared taxonomy.
///
/// Google reports a gRPC-style `error.status` string; the HTTP status
/// is the fallback for unrecognized payloads.
fn map_error(status: StatusCode, body: &str) -> ProviderError {
    let Ok(envelope) = serde_json::from_str::<GoogleErrorEnvelope>(body) else {
        return ProviderError::from_status(
            ProviderKind::Gemini,
            status.as_u16(),
            format!("google request failed with status {status}"),
        );
    };

    let message = envelope.error.message;
    let code = match envelope.error.status.as_str() {
        "RESOURCE_EXHAUSTED" => ErrorCode::RateLimit,
        "UNAUTHENTICATED" | "PERMISSION_DENIED" => ErrorCode::InvalidApiKey,
        "UNAVAILABLE" | "INTERNAL" => ErrorCode::ProviderError,
        "DEADLINE_EXCEEDED" => ErrorCode::Timeout,
        "INVALID_ARGUMENT" if message.contains("token") && message.contains("exceeds") => {
            ErrorCode::ContextLengthExceeded
        }
        _ => return ProviderError::from_status(ProviderKind::Gemini, status.as_u16(), message),
    };
    ProviderError::new(ProviderKind::Gemini, code, message).with_status(status.as_u16())
}

/// Convert a generateContent response to the normalized result.
///
/// A blocked prompt or a safety-terminated candidate is a
/// `ContentFiltered` failure, not an empty success.
fn to_result(raw: GeminiResponse, model: &str) -> Result<CompletionResult, ProviderError> {
    if let Some(feedback) = &raw.prompt_feedback
        && let Some(reason) = &feedback.block_reason
    {
        return Err(ProviderError::new(
            ProviderKind::Gemini,
            ErrorCode::ContentFiltered,
            format!("prompt blocked by safety filter: {reason}"),
        ));
    }

    let Some(candidate) = raw.candidates.into_iter().next() else {
        return Err(ProviderError::new(
            ProviderKind::Gemini,
            ErrorCode::ProviderError,
            "google returned no candidates",
        ));
    };

    let finish_reason = candidate.finish_reason.as_deref().map(|reason| match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "PROHIBITED_CONTENT" => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    });

    if finish_reason == Some(FinishReason::ContentFilter) {
        return Err(ProviderError::new(
            ProviderKind::Gemini,
            ErrorCode::ContentFiltered,
            "response terminated by safety filter",
        ));
    }

    let mut content = String::new();
    for part in candidate.content.into_iter().flat_map(|c| c.parts) {
        if let Some(text) = part.text {
            content.push_str(&text);
        }
    }

    Ok(CompletionResult {
        content,
        provider: ProviderKind::Gemini,
        model: raw
            .model_version
            .map(Into::into)
            .unwrap_or_else(|| model.into()),
        usage: raw
            .usage_metadata
            .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count)),
        finish_reason,
        is_fallback: false,
        original_provider: None,
    })
}

#[cfg(test)]
mod tests {
    use super::{map_error, to_result};
    use pcore::{ErrorCode, FinishReason};
    use reqwest::StatusCode;

    fn parse(body: &str) -> super::GeminiResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn extracts_text_and_usage() {
        let raw = parse(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "hello"}, {"text": " there"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 8, "candidatesTokenCount": 2},
                "modelVersion": "gemini-2.0-flash"
            }"#,
        );
        let result = to_result(raw, "gemini-2.0-flash").unwrap();
        assert_eq!(result.content, "hello there");
        assert_eq!(result.finish_reason, Some(FinishReason::Stop));
        assert_eq!(result.usage.unwrap().total_tokens, 10);
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let raw = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        let err = to_result(raw, "gemini-2.0-flash").unwrap_err();
        assert_eq!(err.code, ErrorCode::ContentFiltered);
        assert!(!err.retryable);
    }

    #[test]
    fn safety_finish_is_content_filtered() {
        let raw = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        let err = to_result(raw, "gemini-2.0-flash").unwrap_err();
        assert_eq!(err.code, ErrorCode::ContentFiltered);
    }

    #[test]
    fn maps_google_status_strings() {
        let err = map_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#,
        );
        assert_eq!(err.code, ErrorCode::RateLimit);
        assert!(err.retryable);

        let err = map_error(
            StatusCode::FORBIDDEN,
            r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#,
        );
        assert_eq!(err.code, ErrorCode::InvalidApiKey);
        assert!(!err.retryable);

        let err = map_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": {"code": 400, "message": "input token count exceeds the maximum", "status": "INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(err.code, ErrorCode::ContextLengthExceeded);
    }
}
