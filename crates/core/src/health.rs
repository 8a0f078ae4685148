//! Provider health diagnostics.

use serde::{Deserialize, Serialize};

/// The outcome of a provider health probe.
///
/// A probe never fails; an unhealthy provider is reported through the
/// `error` field instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthStatus {
    /// Whether the probe completed successfully.
    pub healthy: bool,

    /// Round-trip latency of the probe in milliseconds.
    pub latency_ms: u64,

    /// The failure description, when unhealthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
