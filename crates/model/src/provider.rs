//! Unified provider dispatch.
//!
//! `Provider` wraps the concrete backends in one enum so call sites
//! select a backend by `ProviderKind` lookup instead of branching.

use crate::claude::Claude;
use crate::config::Settings;
use crate::gemini::Gemini;
use pcore::{
    Completion, CompletionOptions, CompletionResult, Message, ProviderError, ProviderKind,
};

/// Unified completion provider enum.
#[derive(Clone, Debug)]
pub enum Provider {
    /// Anthropic Messages API.
    Claude(Claude),
    /// Google generateContent API.
    Gemini(Gemini),
}

/// Construct a `Provider` from settings and a shared HTTP client.
///
/// The model defaults to the per-provider configured model when not
/// requested explicitly. Fails when no API key is configured for the
/// requested kind.
pub fn build_provider(
    settings: &Settings,
    kind: ProviderKind,
    model: Option<&str>,
    client: reqwest::Client,
) -> anyhow::Result<Provider> {
    let Some(key) = settings.api_key(kind) else {
        anyhow::bail!("no API key configured for provider '{kind}'");
    };
    let model = model.unwrap_or_else(|| settings.model(kind));

    let provider = match kind {
        ProviderKind::Claude => Provider::Claude(
            Claude::anthropic(client, key, model)?.with_body_logging(settings.log_requests),
        ),
        ProviderKind::Gemini => Provider::Gemini(
            Gemini::google(client, key, model)?.with_body_logging(settings.log_requests),
        ),
    };
    Ok(provider)
}

impl Completion for Provider {
    fn kind(&self) -> ProviderKind {
        match self {
            Self::Claude(p) => p.kind(),
            Self::Gemini(p) => p.kind(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Claude(p) => p.model(),
            Self::Gemini(p) => p.model(),
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, ProviderError> {
        match self {
            Self::Claude(p) => p.complete(messages, options).await,
            Self::Gemini(p) => p.complete(messages, options).await,
        }
    }
}
