//! Completion call options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options applied to a single completion call.
///
/// Providers translate these into their native request fields. The
/// timeout is passed through to the HTTP client per call; a timed-out
/// call surfaces as a retryable `Timeout` error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionOptions {
    /// Cap on generated tokens.
    pub max_tokens: u32,

    /// Sampling randomness; 0 is deterministic.
    pub temperature: f32,

    /// Per-call network timeout.
    #[serde(with = "timeout_ms")]
    pub timeout: Duration,

    /// System instruction. Overrides any merged system messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Strings that end generation, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl CompletionOptions {
    /// Create options with the given token cap.
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Set the stop sequences.
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            system_prompt: None,
            stop_sequences: None,
        }
    }
}

/// Serialize the timeout as integer milliseconds.
mod timeout_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(de)?))
    }
}
