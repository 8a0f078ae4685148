//! Environment-derived provider settings.
//!
//! One snapshot of the configuration surface: per-provider API keys and
//! models, the default provider, completion defaults, and fallback
//! policy. The process-wide snapshot is cached until `reload()`.

use compact_str::CompactString;
use pcore::{CompletionOptions, ProviderKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, LazyLock, RwLock};
use std::time::Duration;

/// Provider-layer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Anthropic API key.
    pub anthropic_api_key: Option<String>,
    /// Google API key.
    pub gemini_api_key: Option<String>,
    /// Default Claude model.
    pub claude_model: CompactString,
    /// Default Gemini model.
    pub gemini_model: CompactString,
    /// Provider used when a caller does not request one.
    pub default_provider: ProviderKind,
    /// Default token cap for completion calls.
    pub max_tokens: u32,
    /// Default sampling temperature.
    pub temperature: f32,
    /// Default per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Fallback chain ordering.
    pub fallback_order: Vec<ProviderKind>,
    /// Retries per provider before falling through.
    pub fallback_retries: u32,
    /// Base backoff delay in milliseconds, scaled linearly per attempt.
    pub fallback_delay_ms: u64,
    /// Whether cross-provider fallback is enabled.
    pub enable_fallback: bool,
    /// Whether to log request/response bodies at trace level.
    pub log_requests: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            gemini_api_key: None,
            claude_model: CompactString::const_new("claude-sonnet-4-5"),
            gemini_model: CompactString::const_new("gemini-2.0-flash"),
            default_provider: ProviderKind::Claude,
            max_tokens: 1024,
            temperature: 0.7,
            timeout_ms: 30_000,
            fallback_order: vec![ProviderKind::Claude, ProviderKind::Gemini],
            fallback_retries: 2,
            fallback_delay_ms: 1_000,
            enable_fallback: true,
            log_requests: false,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings from any key/value source.
    ///
    /// Unparsable values keep their defaults and are logged, never
    /// fatal; a broken env var should not take the whole layer down.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            anthropic_api_key: get("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()),
            gemini_api_key: get("GEMINI_API_KEY")
                .or_else(|| get("GOOGLE_API_KEY"))
                .filter(|k| !k.is_empty()),
            claude_model: get("PRAXIS_CLAUDE_MODEL")
                .map(CompactString::from)
                .unwrap_or(defaults.claude_model),
            gemini_model: get("PRAXIS_GEMINI_MODEL")
                .map(CompactString::from)
                .unwrap_or(defaults.gemini_model),
            default_provider: parse_var(&get, "PRAXIS_DEFAULT_PROVIDER", defaults.default_provider),
            max_tokens: parse_var(&get, "PRAXIS_MAX_TOKENS", defaults.max_tokens),
            temperature: parse_var(&get, "PRAXIS_TEMPERATURE", defaults.temperature),
            timeout_ms: parse_var(&get, "PRAXIS_TIMEOUT_MS", defaults.timeout_ms),
            fallback_order: get("PRAXIS_FALLBACK_ORDER")
                .map(|csv| parse_order(&csv))
                .filter(|order| !order.is_empty())
                .unwrap_or(defaults.fallback_order),
            fallback_retries: parse_var(&get, "PRAXIS_FALLBACK_RETRIES", defaults.fallback_retries),
            fallback_delay_ms: parse_var(
                &get,
                "PRAXIS_FALLBACK_DELAY_MS",
                defaults.fallback_delay_ms,
            ),
            enable_fallback: parse_var(&get, "PRAXIS_ENABLE_FALLBACK", defaults.enable_fallback),
            log_requests: parse_var(&get, "PRAXIS_LOG_REQUESTS", defaults.log_requests),
        }
    }

    /// Get the cached process-wide snapshot, reading the environment on
    /// first use.
    pub fn global() -> Arc<Settings> {
        GLOBAL.read().expect("settings lock poisoned").clone()
    }

    /// Re-read the environment and replace the cached snapshot.
    ///
    /// In-flight calls keep the snapshot they started with.
    pub fn reload() -> Arc<Settings> {
        let fresh = Arc::new(Self::from_env());
        *GLOBAL.write().expect("settings lock poisoned") = fresh.clone();
        fresh
    }

    /// The configured API key for a provider, if any.
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Claude => self.anthropic_api_key.as_deref(),
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    /// The configured default model for a provider.
    pub fn model(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::Claude => &self.claude_model,
            ProviderKind::Gemini => &self.gemini_model,
        }
    }

    /// Completion options seeded from the configured defaults.
    pub fn options(&self) -> CompletionOptions {
        CompletionOptions::new(self.max_tokens)
            .with_temperature(self.temperature)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    /// The base backoff delay as a duration.
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }
}

static GLOBAL: LazyLock<RwLock<Arc<Settings>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Settings::from_env())));

/// Parse one variable, keeping the default on absence or parse failure.
fn parse_var<T: FromStr + Copy>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring unparsable value for {key}: {raw}");
            default
        }),
        None => default,
    }
}

/// Parse a comma-separated provider ordering, skipping unknown names.
fn parse_order(csv: &str) -> Vec<ProviderKind> {
    csv.split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| match part.parse::<ProviderKind>() {
            Ok(kind) => Some(kind),
            Err(err) => {
                tracing::warn!("ignoring fallback entry: {err}");
                None
            }
        })
        .collect()
}
