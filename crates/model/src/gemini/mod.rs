//! Gemini (Google) completion provider.
//!
//! Implements the Generative Language `generateContent` API. Differs
//! from the Anthropic format in role naming (`model` instead of
//! `assistant`), camelCase wire fields, and safety feedback semantics.

use crate::http::HttpTransport;
use compact_str::CompactString;
use reqwest::Client;

mod provider;
mod request;

pub(crate) use request::Request;

/// Base URL for the Generative Language API.
pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The Gemini completion provider.
#[derive(Clone, Debug)]
pub struct Gemini {
    /// Transport with the x-goog-api-key header baked in. The endpoint
    /// embeds the model name, per the generateContent URL scheme.
    transport: HttpTransport,
    /// Default model for this instance.
    model: CompactString,
}

impl Gemini {
    /// Create a provider targeting the Google API.
    pub fn google(client: Client, key: &str, model: &str) -> anyhow::Result<Self> {
        Self::custom(client, key, model, BASE_URL)
    }

    /// Create a provider targeting a custom Gemini-compatible base URL.
    pub fn custom(client: Client, key: &str, model: &str, base_url: &str) -> anyhow::Result<Self> {
        if key.is_empty() {
            anyhow::bail!("gemini provider requires an API key");
        }
        let endpoint = format!("{base_url}/models/{model}:generateContent");
        let transport = HttpTransport::custom_header(client, "x-goog-api-key", key, &endpoint)?;
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
    use super::Gemini;

    #[test]
    fn endpoint_embeds_model() {
        let provider = Gemini::google(reqwest::Client::new(), "test-key", "gemini-2.0-flash")
            .expect("provider");
        assert_eq!(
            provider.transport.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn empty_key_fails_fast() {
        assert!(Gemini::google(reqwest::Client::new(), "", "gemini-2.0-flash").is_err());
    }
}
