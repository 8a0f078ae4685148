//! Core types and traits for the praxis AI completion layer.
//!
//! Provides the shared vocabulary used by every provider backend:
//! `Message`, `CompletionOptions`, `CompletionResult`, the closed
//! `ProviderError` taxonomy, and the `Completion` trait that concrete
//! providers and the fallback chain both implement.

pub use completion::{Completion, JsonCompletion, strip_code_fences};
pub use error::{ErrorCode, JsonError, ProviderError};
pub use health::HealthStatus;
pub use kind::ProviderKind;
pub use message::{Message, Role, merge_system};
pub use options::CompletionOptions;
pub use response::{CompletionResult, FinishReason, Usage};

mod completion;
mod error;
mod health;
mod kind;
mod message;
mod options;
mod response;
