//! Provider factory with a keyed instance cache.
//!
//! Providers are stateless wrappers around a shared HTTP client, built
//! lazily on first use and cached for the factory's lifetime. Clearing
//! the cache does not affect in-flight calls; they keep the clone they
//! resolved.

use crate::config::Settings;
use crate::provider::{Provider, build_provider};
use compact_str::CompactString;
use pcore::{ErrorCode, ProviderError, ProviderKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Resolves provider requests to cached instances.
pub struct ProviderFactory {
    settings: Arc<Settings>,
    client: reqwest::Client,
    /// Instances keyed by provider kind and model.
    cache: Mutex<HashMap<(ProviderKind, CompactString), Provider>>,
}

impl ProviderFactory {
    /// Create a factory over an explicit settings snapshot.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Create a factory over the process-wide settings snapshot.
    pub fn from_env() -> Self {
        Self::new(Settings::global())
    }

    /// The settings snapshot this factory resolves against.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve a provider instance.
    ///
    /// `kind` defaults to the configured default provider; `model`
    /// defaults to that provider's configured model. Fails with a
    /// non-retryable configuration error when no key is available.
    pub fn get(
        &self,
        kind: Option<ProviderKind>,
        model: Option<&str>,
    ) -> Result<Provider, ProviderError> {
        let kind = kind.unwrap_or(self.settings.default_provider);
        let model = CompactString::from(model.unwrap_or_else(|| self.settings.model(kind)));

        let mut cache = self.cache.lock().expect("provider cache lock poisoned");
        if let Some(provider) = cache.get(&(kind, model.clone())) {
            return Ok(provider.clone());
        }

        let provider = build_provider(&self.settings, kind, Some(&model), self.client.clone())
            .map_err(|err| {
                ProviderError::new(kind, ErrorCode::InvalidApiKey, err.to_string())
            })?;
        tracing::debug!(provider = %kind, %model, "constructed provider");
        cache.insert((kind, model), provider.clone());
        Ok(provider)
    }

    /// Whether a provider kind has usable configuration. Pure predicate,
    /// no network.
    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.settings.api_key(kind).is_some()
    }

    /// The configured provider kinds, in fallback order.
    pub fn available(&self) -> Vec<ProviderKind> {
        self.settings
            .fallback_order
            .iter()
            .copied()
            .filter(|kind| self.is_available(*kind))
            .collect()
    }

    /// Drop all cached instances. Primarily for tests; in-flight calls
    /// keep using their clones.
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .expect("provider cache lock poisoned")
            .clear();
        tracing::debug!("provider cache cleared");
    }

    /// Number of cached instances.
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .expect("provider cache lock poisoned")
            .len()
    }
}

impl std::fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("available", &self.available())
            .field("cached", &self.cached())
            .finish()
    }
}
