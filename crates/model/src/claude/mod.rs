//! Claude (Anthropic) completion provider.
//!
//! Implements the Anthropic Messages API, which differs from
//! OpenAI-style chat completions in message structure, the top-level
//! `system` field, and its error payload shape.

use crate::http::HttpTransport;
use compact_str::CompactString;
use reqwest::Client;

mod provider;
mod request;

pub(crate) use request::Request;

/// The Anthropic Messages API endpoint.
pub const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// The Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

/// The Claude completion provider.
#[derive(Clone, Debug)]
pub struct Claude {
    /// Transport with x-api-key and anthropic-version headers baked in.
    transport: HttpTransport,
    /// Default model for this instance.
    model: CompactString,
}

impl Claude {
    /// Create a provider targeting the Anthropic API.
    ///
    /// Fails fast when the key is empty — a keyless instance could only
    /// ever produce auth errors at call time.
    pub fn anthropic(client: Client, key: &str, model: &str) -> anyhow::Result<Self> {
        Self::custom(client, key, model, ENDPOINT)
    }

    /// Create a provider targeting a custom Anthropic-compatible endpoint.
    pub fn custom(client: Client, key: &str, model: &str, endpoint: &str) -> anyhow::Result<Self> {
        if key.is_empty() {
            anyhow::bail!("claude provider requires an API key");
        }
        let transport = HttpTransport::custom_header(client, "x-api-key", key, endpoint)?
            .with_header("anthropic-version", API_VERSION)?;
        Ok(Self {
            transport,
            model: CompactString::from(model),
        })
    }

    /// Enable trace-level logging of request and response bodies.
    pub fn with_body_logging(mut self, enabled: bool) -> Self {
        self.transport = self.transport.with_body_logging(enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Claude, ENDPOINT};

    #[test]
    fn anthropic_constructor_uses_default_endpoint() {
        let provider =
            Claude::anthropic(reqwest::Client::new(), "test-key", "claude-sonnet-4-5")
                .expect("provider");
        assert_eq!(provider.transport.endpoint(), ENDPOINT);
        assert_eq!(provider.model, "claude-sonnet-4-5");
    }

    #[test]
    fn empty_key_fails_fast() {
        let result = Claude::anthropic(reqwest::Client::new(), "", "claude-sonnet-4-5");
        assert!(result.is_err());
    }

    #[test]
    fn custom_constructor_sets_endpoint() {
        let custom = "http://localhost:9999/v1/messages";
        let provider =
            Claude::custom(reqwest::Client::new(), "test-key", "claude-sonnet-4-5", custom)
                .expect("provider");
        assert_eq!(provider.transport.endpoint(), custom);
    }
}
