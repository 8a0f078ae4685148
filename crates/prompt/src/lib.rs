//! Prompt templating and input sanitization for the praxis AI layer.
//!
//! `PromptRegistry` catalogs named templates with required and default
//! variables; `sanitize` defensively cleans externally sourced text
//! before it is interpolated into a template, flagging prompt-injection
//! attempts along the way.

pub use registry::{CompiledPrompt, PromptError, PromptRegistry, PromptTemplate};
pub use sanitize::{
    ObjectSanitizeResult, SanitizeOptions, SanitizeResult, ValidationReport, contains_injection,
    escape_for_prompt, sanitize, sanitize_object, sanitize_user_input, validate_input,
};

mod registry;
mod sanitize;
