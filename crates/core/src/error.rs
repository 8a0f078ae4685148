//! The shared provider error taxonomy.
//!
//! Every backend maps its native error and status codes onto the closed
//! `ErrorCode` set; callers reason only about these codes. Native
//! payloads survive as `status_code`/`cause` diagnostics.

use crate::kind::ProviderKind;
use serde::{Deserialize, Serialize};

/// The closed set of backend-independent error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The backend rejected the call for rate or quota reasons.
    RateLimit,
    /// The API key is missing, invalid, or lacks permission.
    InvalidApiKey,
    /// The prompt exceeds the model's context window.
    ContextLengthExceeded,
    /// The backend refused the content.
    ContentFiltered,
    /// The request never reached the backend.
    NetworkError,
    /// The call exceeded its timeout.
    Timeout,
    /// The backend failed server-side.
    ProviderError,
    /// Anything that did not match a known condition.
    UnknownError,
}

impl ErrorCode {
    /// Whether errors of this code are transient by default.
    ///
    /// Rate limits, server failures, network faults, and timeouts are
    /// worth retrying; auth and content-filter rejections would fail
    /// identically on every attempt.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::NetworkError | Self::Timeout | Self::ProviderError
        )
    }

    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "RATE_LIMIT",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::ContextLengthExceeded => "CONTEXT_LENGTH_EXCEEDED",
            Self::ContentFiltered => "CONTENT_FILTERED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized provider failure.
#[derive(Debug, thiserror::Error)]
#[error("{provider}: {message} [{code}]")]
pub struct ProviderError {
    /// Human-readable description.
    pub message: String,

    /// The backend that failed.
    pub provider: ProviderKind,

    /// Normalized error code.
    pub code: ErrorCode,

    /// HTTP status, when the failure came from a response.
    pub status_code: Option<u16>,

    /// Whether the same call is worth retrying on this provider.
    pub retryable: bool,

    /// The native error, kept for diagnostics only.
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Create an error with the code's default retryability.
    pub fn new(provider: ProviderKind, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider,
            code,
            status_code: None,
            retryable: code.retryable(),
            cause: None,
        }
    }

    /// Attach the originating HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Attach the native error as a diagnostic cause.
    pub fn with_cause(
        mut self,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Override the code's default retryability.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Classify an HTTP status into the taxonomy.
    ///
    /// 429 and 5xx are retryable; 401/403 are not. Backends refine this
    /// with their native error payloads before falling back to it.
    pub fn from_status(provider: ProviderKind, status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            429 => ErrorCode::RateLimit,
            401 | 403 => ErrorCode::InvalidApiKey,
            408 => ErrorCode::Timeout,
            500..=599 => ErrorCode::ProviderError,
            _ => ErrorCode::UnknownError,
        };
        Self::new(provider, code, message).with_status(status)
    }
}

/// Error from a JSON-typed completion.
///
/// A parse failure means the model produced malformed output, not that
/// transport failed; it is never retried or fallen back.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// The underlying completion call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The completion succeeded but the content is not valid JSON.
    #[error("model response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
}
