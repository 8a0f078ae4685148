//! Retry and cross-provider fallback.
//!
//! `FallbackChain` drives a single logical completion over an ordered
//! provider list: each provider gets `max_retries + 1` attempts with
//! linear backoff between retryable failures, then the chain falls
//! through to the next provider. Attempts are strictly sequential —
//! order decides which failure is authoritative and avoids duplicate
//! billed requests.

use crate::config::Settings;
use crate::factory::ProviderFactory;
use crate::provider::Provider;
use anyhow::bail;
use pcore::{
    Completion, CompletionOptions, CompletionResult, ErrorCode, HealthStatus, Message,
    ProviderError, ProviderKind, strip_code_fences,
};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Observer invoked when the chain advances past a failed provider.
///
/// Receives the provider being abandoned, the provider being tried
/// next, and the last error observed.
pub type FallbackHook = Box<dyn Fn(ProviderKind, ProviderKind, &ProviderError) + Send + Sync>;

/// Retry and backoff policy for a chain.
pub struct ChainOptions {
    /// Retries per provider before falling through.
    pub max_retries: u32,
    /// Base backoff delay, scaled linearly by attempt number.
    pub retry_delay: Duration,
    /// Optional fallback observer.
    pub on_fallback: Option<FallbackHook>,
}

impl ChainOptions {
    /// Policy with the given retry count and base delay.
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
            on_fallback: None,
        }
    }

    /// Policy seeded from the configured retry count and base delay.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.fallback_retries, settings.fallback_delay())
    }

    /// Install a fallback observer.
    pub fn with_on_fallback(mut self, hook: FallbackHook) -> Self {
        self.on_fallback = Some(hook);
        self
    }
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1))
    }
}

impl fmt::Debug for ChainOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainOptions")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("on_fallback", &self.on_fallback.is_some())
            .finish()
    }
}

/// One provider's terminal failure within a chain call.
#[derive(Debug)]
pub struct ChainAttempt {
    /// The provider that failed.
    pub provider: ProviderKind,
    /// The last error it produced.
    pub error: ProviderError,
}

/// A successful chain completion with its audit trail.
#[derive(Debug)]
pub struct ChainResult {
    /// The winning completion, annotated with fallback provenance.
    pub result: CompletionResult,
    /// Total completion attempts issued, across all providers.
    pub providers_attempted: usize,
    /// Terminal failure per abandoned provider, in chain order.
    pub errors: Vec<ChainAttempt>,
}

/// Every provider in the chain was exhausted.
///
/// Carries the ordered per-provider attempt history; display and
/// `code()` reflect the last failure, which is the authoritative one.
#[derive(Debug)]
pub struct ChainError {
    /// Total completion attempts issued.
    pub providers_attempted: usize,
    /// Terminal failure per provider, in chain order. Never empty.
    pub attempts: Vec<ChainAttempt>,
}

impl ChainError {
    /// The last failure observed.
    pub fn last(&self) -> &ProviderError {
        &self
            .attempts
            .last()
            .expect("chain error carries at least one attempt")
            .error
    }

    /// The normalized code of the last failure.
    pub fn code(&self) -> ErrorCode {
        self.last().code
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all {} provider(s) exhausted after {} attempt(s); last failure: {}",
            self.attempts.len(),
            self.providers_attempted,
            self.last()
        )
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.last())
    }
}

/// Error from a JSON-typed chain completion.
#[derive(Debug, thiserror::Error)]
pub enum ChainJsonError {
    /// Every provider was exhausted.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// A provider answered but the content is not valid JSON. Never
    /// retried or fallen back; this is a model output problem.
    #[error("model response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
}

/// An ordered provider list with retry and fallback policy.
pub struct FallbackChain<P = Provider> {
    entries: Vec<P>,
    options: ChainOptions,
}

impl FallbackChain<Provider> {
    /// Build a chain from the factory over the requested ordering.
    ///
    /// Kinds without usable configuration are silently skipped; an
    /// empty usable list fails construction immediately. When fallback
    /// is disabled in settings, only the first usable provider is kept.
    pub fn from_factory(
        factory: &ProviderFactory,
        order: &[ProviderKind],
        options: ChainOptions,
    ) -> anyhow::Result<Self> {
        let mut entries = Vec::new();
        for kind in order {
            if !factory.is_available(*kind) {
                tracing::debug!(provider = %kind, "skipping unconfigured provider");
                continue;
            }
            entries.push(factory.get(Some(*kind), None)?);
            if !factory.settings().enable_fallback {
                break;
            }
        }
        Self::new(entries, options)
    }

    /// Build a chain over the configured order with the configured
    /// retry policy (`fallback_retries`, `fallback_delay_ms`).
    pub fn configured(factory: &ProviderFactory) -> anyhow::Result<Self> {
        let settings = factory.settings();
        let order = settings.fallback_order.clone();
        let options = ChainOptions::from_settings(settings);
        Self::from_factory(factory, &order, options)
    }

    /// Accuracy-oriented preset: configured order, patient retries.
    ///
    /// Used for clinical scoring calls where a correct answer is worth
    /// waiting for.
    pub fn clinical(factory: &ProviderFactory) -> anyhow::Result<Self> {
        let order = factory.settings().fallback_order.clone();
        Self::from_factory(
            factory,
            &order,
            ChainOptions::new(2, Duration::from_secs(1)),
        )
    }

    /// Speed-oriented preset: configured order, minimal patience.
    pub fn fast(factory: &ProviderFactory) -> anyhow::Result<Self> {
        let order = factory.settings().fallback_order.clone();
        Self::from_factory(
            factory,
            &order,
            ChainOptions::new(1, Duration::from_millis(250)),
        )
    }
}

impl<P: Completion> FallbackChain<P> {
    /// Build a chain from explicit providers.
    pub fn new(entries: Vec<P>, options: ChainOptions) -> anyhow::Result<Self> {
        if entries.is_empty() {
            bail!("fallback chain requires at least one configured provider");
        }
        Ok(Self { entries, options })
    }

    /// The provider kinds in this chain, in order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        self.entries.iter().map(|p| p.kind()).collect()
    }

    /// The retry and backoff policy this chain runs under.
    pub fn options(&self) -> &ChainOptions {
        &self.options
    }

    /// Run one logical completion over the chain.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<ChainResult, ChainError> {
        let first = self.entries[0].kind();
        let mut attempted = 0usize;
        let mut errors = Vec::new();

        for (index, provider) in self.entries.iter().enumerate() {
            let kind = provider.kind();
            let mut retries = 0u32;

            let terminal = loop {
                attempted += 1;
                match provider.complete(messages, options).await {
                    Ok(mut result) => {
                        if index > 0 {
                            result.is_fallback = true;
                            result.original_provider = Some(first);
                        }
                        return Ok(ChainResult {
                            result,
                            providers_attempted: attempted,
                            errors,
                        });
                    }
                    Err(err) if err.retryable && retries < self.options.max_retries => {
                        retries += 1;
                        let delay = self.options.retry_delay * retries;
                        tracing::warn!(
                            provider = %kind,
                            retry = retries,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after transient failure: {err}"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(err) => break err,
                }
            };

            if let Some(next) = self.entries.get(index + 1) {
                tracing::warn!(
                    from = %kind,
                    to = %next.kind(),
                    "falling back after exhausting provider: {terminal}"
                );
                if let Some(hook) = &self.options.on_fallback {
                    hook(kind, next.kind(), &terminal);
                }
            }
            errors.push(ChainAttempt {
                provider: kind,
                error: terminal,
            });
        }

        Err(ChainError {
            providers_attempted: attempted,
            attempts: errors,
        })
    }

    /// Run a completion and parse the answer as JSON.
    ///
    /// Strips one surrounding fenced code block before parsing. A parse
    /// failure surfaces as [`ChainJsonError::Parse`] immediately.
    pub async fn complete_json<T>(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<(T, ChainResult), ChainJsonError>
    where
        T: DeserializeOwned + Send,
    {
        let chain_result = self.complete(messages, options).await?;
        let data = serde_json::from_str(strip_code_fences(&chain_result.result.content))
            .map_err(ChainJsonError::Parse)?;
        Ok((data, chain_result))
    }

    /// Probe every provider independently.
    ///
    /// Health is a diagnostic; no retry or fallback logic applies.
    pub async fn health_check(&self) -> Vec<(ProviderKind, HealthStatus)> {
        let mut reports = Vec::with_capacity(self.entries.len());
        for provider in &self.entries {
            reports.push((provider.kind(), provider.health_check().await));
        }
        reports
    }
}

impl<P: Completion> fmt::Debug for FallbackChain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("providers", &self.providers())
            .field("options", &self.options)
            .finish()
    }
}
