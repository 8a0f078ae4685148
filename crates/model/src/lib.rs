//! LLM provider implementations for the praxis AI completion layer.
//!
//! `Provider` wraps the concrete backends (Claude, Gemini) behind a
//! unified enum implementing the `Completion` contract. `ProviderFactory`
//! resolves configuration into cached instances; `FallbackChain` drives
//! retry and cross-provider fallback over an ordered provider list.

pub use chain::{
    ChainAttempt, ChainError, ChainJsonError, ChainOptions, ChainResult, FallbackChain,
    FallbackHook,
};
pub use claude::Claude;
pub use config::Settings;
pub use factory::ProviderFactory;
pub use gemini::Gemini;
pub use provider::{Provider, build_provider};

pub mod chain;
pub mod claude;
pub mod config;
pub mod factory;
pub mod gemini;
mod http;
mod provider;
