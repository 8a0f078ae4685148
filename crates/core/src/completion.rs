//! The uniform completion contract.
//!
//! Concrete backends implement `complete`; `complete_json` and
//! `health_check` are provided on top of it so every implementor (and
//! the fallback chain) exposes the same surface.

use crate::error::{JsonError, ProviderError};
use crate::health::HealthStatus;
use crate::kind::ProviderKind;
use crate::message::Message;
use crate::options::CompletionOptions;
use crate::response::CompletionResult;
use serde::de::DeserializeOwned;
use std::time::Instant;

/// A parsed JSON completion together with the raw result it came from.
#[derive(Debug, Clone)]
pub struct JsonCompletion<T> {
    /// The deserialized payload.
    pub data: T,

    /// The completion the payload was parsed from.
    pub result: CompletionResult,
}

/// The uniform provider contract.
///
/// Constructors are inherent methods on each provider — never called
/// polymorphically.
pub trait Completion: Send + Sync {
    /// The backend this provider targets.
    fn kind(&self) -> ProviderKind;

    /// The model this provider is configured for.
    fn model(&self) -> &str;

    /// Send a completion request.
    fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<CompletionResult, ProviderError>> + Send;

    /// Send a completion request and parse the response as JSON.
    ///
    /// A single fenced code block around the payload (with or without a
    /// `json` tag) is stripped before parsing. Parse failures surface as
    /// [`JsonError::Parse`], distinct from any transport failure.
    fn complete_json<T>(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<JsonCompletion<T>, JsonError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            let result = self.complete(messages, options).await?;
            let data = serde_json::from_str(strip_code_fences(&result.content))
                .map_err(JsonError::Parse)?;
            Ok(JsonCompletion { data, result })
        }
    }

    /// Probe the backend with a minimal low-token completion.
    ///
    /// Reports success and latency without failing; an unreachable or
    /// misconfigured backend yields `healthy: false` with the error text.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send {
        async move {
            let messages = [Message::user("say ok")];
            let options = CompletionOptions::new(16).with_temperature(0.0);
            let start = Instant::now();
            match self.complete(&messages, &options).await {
                Ok(_) => HealthStatus {
                    healthy: true,
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: None,
                },
                Err(err) => HealthStatus {
                    healthy: false,
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: Some(err.to_string()),
                },
            }
        }
    }
}

/// Strip one fenced code block wrapped around the whole content.
///
/// Models asked for JSON frequently wrap it in ``` or ```json fences;
/// content without a surrounding fence is returned trimmed and
/// otherwise untouched.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let Some(pos) = rest.find('\n') else {
        return trimmed;
    };
    let inner = &rest[pos + 1..];
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
