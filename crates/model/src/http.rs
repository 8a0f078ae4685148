//! Shared HTTP transport for remote completion providers.
//!
//! `HttpTransport` wraps a `reqwest::Client` with pre-configured headers
//! and an endpoint URL. Unlike a bare `send().json()` round trip it hands
//! back the status and raw body, so each provider can map non-2xx
//! responses through its own error policy instead of bubbling transport
//! errors as-is.

use pcore::{ErrorCode, ProviderError, ProviderKind};
use reqwest::{
    Client, Method, StatusCode,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;
use std::time::Duration;

/// Pre-configured HTTP transport for one provider endpoint.
#[derive(Clone, Debug)]
pub(crate) struct HttpTransport {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
    log_bodies: bool,
}

impl HttpTransport {
    /// Create a transport with a custom header for authentication.
    ///
    /// Used by providers that don't use Bearer tokens (Anthropic uses
    /// `x-api-key`, Google uses `x-goog-api-key`).
    pub fn custom_header(
        client: Client,
        header_name: &str,
        header_value: &str,
        endpoint: &str,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header_name.parse::<HeaderName>()?,
            header_value.parse::<HeaderValue>()?,
        );
        Ok(Self {
            client,
            headers,
            endpoint: endpoint.to_owned(),
            log_bodies: false,
        })
    }

    /// Enable trace-level logging of request and response bodies.
    ///
    /// Off by default; bodies carry prompt content.
    pub fn with_body_logging(mut self, enabled: bool) -> Self {
        self.log_bodies = enabled;
        self
    }

    /// Add an extra static header to the transport.
    pub fn with_header(mut self, name: &str, value: &str) -> anyhow::Result<Self> {
        self.headers
            .insert(name.parse::<HeaderName>()?, value.parse::<HeaderValue>()?);
        Ok(self)
    }

    /// Send a POST request and return the status with the raw body.
    ///
    /// Only transport-level failures (connect, timeout) error here;
    /// non-2xx responses come back as data for the caller to classify.
    pub async fn post(
        &self,
        provider: ProviderKind,
        body: &impl Serialize,
        timeout: Duration,
    ) -> Result<(StatusCode, String), ProviderError> {
        if self.log_bodies
            && let Ok(json) = serde_json::to_string(body)
        {
            tracing::trace!("request: {json}");
        }
        let response = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers.clone())
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(provider, err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| transport_error(provider, err))?;
        if self.log_bodies {
            tracing::trace!(%status, "response: {text}");
        }
        Ok((status, text))
    }

    /// Get the endpoint URL.
    #[cfg(test)]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Classify a reqwest failure into the shared taxonomy.
///
/// Timeouts and connection failures are transient and retryable;
/// anything else at this level is an unknown fault.
pub(crate) fn transport_error(provider: ProviderKind, err: reqwest::Error) -> ProviderError {
    let code = if err.is_timeout() {
        ErrorCode::Timeout
    } else if err.is_connect() || err.is_request() {
        ErrorCode::NetworkError
    } else {
        ErrorCode::UnknownError
    };
    ProviderError::new(provider, code, err.to_string()).with_cause(err)
}
