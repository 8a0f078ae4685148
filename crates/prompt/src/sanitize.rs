//! Defensive cleaning of externally sourced text.
//!
//! `sanitize` is a total function: any input yields a cleaned string
//! plus a diagnostic record, never an error. The injection rules live
//! in a data table of pattern/category entries so the rule set can be
//! extended and tested independently of the scanning pipeline. Regex
//! detection is inherently incomplete against novel phrasings; callers
//! with a strict threat model should treat any detection as fatal.

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::sync::LazyLock;

/// Default replacement token for matched injection attempts.
const DEFAULT_PLACEHOLDER: &str = "[filtered]";

/// Default cap on sanitized output length.
const DEFAULT_MAX_LENGTH: usize = 10_000;

/// Known prompt-injection phrasings, grouped by intent category.
static INJECTION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"ignore\s+(?:all\s+)?(?:previous|prior|above)\s+(?:instructions|prompts|rules)",
            "instruction-override",
        ),
        (
            r"disregard\s+(?:all\s+)?(?:previous|prior|above|your)\s+(?:instructions|prompts|rules|programming)",
            "instruction-override",
        ),
        (
            r"forget\s+(?:everything|all)\s+(?:you|above|before)",
            "instruction-override",
        ),
        (r"new\s+instructions?\s*:", "instruction-override"),
        (r"you\s+are\s+now\s+(?:a|an|in)\b", "role-reassignment"),
        (r"pretend\s+(?:to\s+be|you\s+are)\b", "role-reassignment"),
        (r"act\s+as\s+(?:if\s+you\s+are|a|an)\b", "role-reassignment"),
        (
            r"(?:reveal|show|print|repeat|output)\s+(?:me\s+)?(?:your|the)\s+(?:system\s+)?prompt",
            "prompt-extraction",
        ),
        (
            r"what\s+(?:are|were)\s+your\s+(?:instructions|rules)",
            "prompt-extraction",
        ),
        (r"jailbreak", "jailbreak"),
        (r"\bDAN\s+mode\b", "jailbreak"),
        (r"do\s+anything\s+now", "jailbreak"),
        (r"developer\s+mode", "jailbreak"),
        (r"<\|im_(?:start|end)\|>", "delimiter-injection"),
        (r"\[/?(?:INST|SYS)\]", "delimiter-injection"),
        (r"^\s*(?:system|assistant)\s*:", "delimiter-injection"),
    ]
    .into_iter()
    .map(|(pattern, category)| {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .expect("injection pattern table is well-formed");
        (regex, category)
    })
    .collect()
});

const DANGEROUS_ELEMENTS: [&str; 6] = ["script", "style", "iframe", "object", "embed", "form"];

/// HTML elements whose content is dropped wholesale. One open/close
/// pair per element name; the regex crate has no backreferences.
static HTML_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = DANGEROUS_ELEMENTS
        .iter()
        .map(|tag| format!(r"<\s*{tag}\b[^>]*>.*?<\s*/\s*{tag}\s*>"))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("html block pattern is well-formed")
});

/// Stray dangerous tags (unclosed or self-closing).
static HTML_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"<\s*/?\s*(script|style|iframe|object|embed|form|link|meta)\b[^>]*>")
        .case_insensitive(true)
        .build()
        .expect("html tag pattern is well-formed")
});

static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+").expect("newline pattern is well-formed"));

/// Sanitization policy for one class of input.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Cap on output length, in characters.
    pub max_length: usize,
    /// Keep newlines instead of collapsing them to spaces.
    pub allow_newlines: bool,
    /// Keep HTML-like markup instead of stripping it.
    pub allow_html: bool,
    /// Replacement token for matched injection attempts. Must not
    /// itself match an injection pattern, or sanitization loses
    /// idempotence.
    pub placeholder: String,
    /// Extra caller-supplied injection patterns, scanned alongside the
    /// built-in table under the category `custom`.
    pub extra_patterns: Vec<Regex>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            allow_newlines: true,
            allow_html: false,
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            extra_patterns: Vec::new(),
        }
    }
}

/// The outcome of sanitizing one input string.
#[derive(Debug, Clone)]
pub struct SanitizeResult {
    /// The cleaned text.
    pub text: String,
    /// Whether any pipeline step altered the input.
    pub was_modified: bool,
    /// Human-readable notes on what was altered.
    pub warnings: Vec<String>,
    /// Categories of injection patterns that matched.
    pub detected_patterns: Vec<String>,
}

/// Sanitize externally sourced text before prompt interpolation.
///
/// Pipeline, in order: strip control characters; collapse newlines
/// (unless allowed); strip dangerous markup (unless allowed); replace
/// injection-pattern matches with a placeholder; truncate; trim.
/// Deterministic and idempotent under fixed options.
pub fn sanitize(input: &str, options: &SanitizeOptions) -> SanitizeResult {
    let mut warnings = Vec::new();
    let mut detected_patterns = Vec::new();

    // 1. Control characters (keep whitespace controls for later steps).
    let mut text: String = input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();
    if text.len() != input.len() {
        warnings.push("control characters removed".to_owned());
    }

    // 2. Newlines.
    if !options.allow_newlines && NEWLINE_RUNS.is_match(&text) {
        text = NEWLINE_RUNS.replace_all(&text, " ").into_owned();
        warnings.push("newlines collapsed".to_owned());
    }

    // 3. Dangerous markup. Stripping runs to a fixpoint: a removal can
    // splice surrounding fragments into a new tag, which the next pass
    // catches.
    if !options.allow_html {
        let mut removed = false;
        loop {
            let stripped = HTML_BLOCKS.replace_all(&text, "");
            let stripped = HTML_TAGS.replace_all(&stripped, "");
            if stripped == text {
                break;
            }
            text = stripped.into_owned();
            removed = true;
        }
        if removed {
            warnings.push("html markup removed".to_owned());
        }
    }

    // 4. Injection patterns.
    for (regex, category) in INJECTION_PATTERNS.iter() {
        if regex.is_match(&text) {
            text = regex
                .replace_all(&text, options.placeholder.as_str())
                .into_owned();
            detected_patterns.push((*category).to_owned());
            warnings.push(format!("possible prompt injection detected: {category}"));
        }
    }
    for regex in &options.extra_patterns {
        if regex.is_match(&text) {
            text = regex
                .replace_all(&text, options.placeholder.as_str())
                .into_owned();
            detected_patterns.push("custom".to_owned());
            warnings.push("possible prompt injection detected: custom".to_owned());
        }
    }

    // 5. Length cap, on a character boundary.
    if text.chars().count() > options.max_length {
        text = text.chars().take(options.max_length).collect();
        warnings.push(format!("input truncated to {} characters", options.max_length));
    }

    // 6. Trim.
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        text = trimmed.to_owned();
    }

    SanitizeResult {
        was_modified: text != input,
        text,
        warnings,
        detected_patterns,
    }
}

/// Sanitize with the default policy for untrusted user input.
pub fn sanitize_user_input(input: &str) -> SanitizeResult {
    sanitize(input, &SanitizeOptions::default())
}

/// Whether the input matches any known injection pattern. Read-only.
pub fn contains_injection(input: &str) -> bool {
    INJECTION_PATTERNS
        .iter()
        .any(|(regex, _)| regex.is_match(input))
}

/// Neutralize template and fence delimiters so untrusted text cannot
/// break out of the prompt section it is embedded in.
pub fn escape_for_prompt(input: &str) -> String {
    input
        .replace("{{", "{ {")
        .replace("}}", "} }")
        .replace("```", "'''")
}

/// A read-only validation report for one input.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the input would pass sanitization unchanged.
    pub valid: bool,
    /// The reasons it would not.
    pub issues: Vec<String>,
}

/// Validate input without modifying it.
///
/// Built on the same detection rules as `sanitize`; callers that prefer
/// rejecting flagged input to degrading it check this first.
pub fn validate_input(input: &str, options: &SanitizeOptions) -> ValidationReport {
    let mut issues = Vec::new();
    if input.trim().is_empty() {
        issues.push("input is empty".to_owned());
    }
    if input.chars().count() > options.max_length {
        issues.push(format!(
            "input exceeds maximum length of {} characters",
            options.max_length
        ));
    }
    if input
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        issues.push("input contains control characters".to_owned());
    }
    for (regex, category) in INJECTION_PATTERNS.iter() {
        if regex.is_match(input) {
            issues.push(format!("possible prompt injection: {category}"));
        }
    }
    ValidationReport {
        valid: issues.is_empty(),
        issues,
    }
}

/// The outcome of sanitizing a nested structure.
#[derive(Debug, Clone)]
pub struct ObjectSanitizeResult {
    /// The structure with every string leaf sanitized.
    pub value: Value,
    /// Whether any leaf was altered.
    pub was_modified: bool,
    /// Aggregated notes across all leaves.
    pub warnings: Vec<String>,
    /// Aggregated injection categories across all leaves.
    pub detected_patterns: Vec<String>,
}

/// Apply the sanitization pipeline to every string leaf of a nested
/// mapping/array structure. Keys and non-string leaves pass through.
pub fn sanitize_object(value: &Value, options: &SanitizeOptions) -> ObjectSanitizeResult {
    let mut result = ObjectSanitizeResult {
        value: Value::Null,
        was_modified: false,
        warnings: Vec::new(),
        detected_patterns: Vec::new(),
    };
    result.value = sanitize_value(value, options, &mut result);
    result
}

fn sanitize_value(
    value: &Value,
    options: &SanitizeOptions,
    result: &mut ObjectSanitizeResult,
) -> Value {
    match value {
        Value::String(text) => {
            let cleaned = sanitize(text, options);
            result.was_modified |= cleaned.was_modified;
            result.warnings.extend(cleaned.warnings);
            result.detected_patterns.extend(cleaned.detected_patterns);
            Value::String(cleaned.text)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(item, options, result))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), sanitize_value(item, options, result)))
                .collect(),
        ),
        other => other.clone(),
    }
}
