//! Tests for `FallbackChain` retry and fallback behavior.

use compact_str::CompactString;
use praxis_model::{ChainJsonError, ChainOptions, FallbackChain};
use pcore::{
    Completion, CompletionOptions, CompletionResult, ErrorCode, Message, ProviderError,
    ProviderKind,
};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A scripted provider: fails `failures` times, then answers.
#[derive(Clone)]
struct Scripted {
    kind: ProviderKind,
    failures: usize,
    code: ErrorCode,
    content: String,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn succeeding(kind: ProviderKind, content: &str) -> Self {
        Self {
            kind,
            failures: 0,
            code: ErrorCode::ProviderError,
            content: content.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing(kind: ProviderKind, code: ErrorCode) -> Self {
        Self {
            kind,
            failures: usize::MAX,
            code,
            content: String::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn flaky(kind: ProviderKind, failures: usize, content: &str) -> Self {
        Self {
            kind,
            failures,
            code: ErrorCode::RateLimit,
            content: content.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Completion for Scripted {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<CompletionResult, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ProviderError::new(self.kind, self.code, "scripted failure"));
        }
        Ok(CompletionResult {
            content: self.content.clone(),
            provider: self.kind,
            model: CompactString::const_new("scripted"),
            usage: None,
            finish_reason: None,
            is_fallback: false,
            original_provider: None,
        })
    }
}

fn options() -> ChainOptions {
    // Zero delay keeps retry tests fast.
    ChainOptions::new(2, Duration::ZERO)
}

fn prompt() -> Vec<Message> {
    vec![Message::user("hello")]
}

#[tokio::test]
async fn falls_back_after_retry_exhaustion() {
    let primary = Scripted::failing(ProviderKind::Claude, ErrorCode::RateLimit);
    let secondary = Scripted::succeeding(ProviderKind::Gemini, "from gemini");
    let chain = FallbackChain::new(vec![primary.clone(), secondary], options()).unwrap();

    let outcome = chain
        .complete(&prompt(), &CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.result.content, "from gemini");
    assert!(outcome.result.is_fallback);
    assert_eq!(outcome.result.original_provider, Some(ProviderKind::Claude));
    // max_retries + 1 attempts on the primary, one on the secondary.
    assert_eq!(outcome.providers_attempted, 4);
    assert_eq!(primary.calls.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].provider, ProviderKind::Claude);
}

#[tokio::test]
async fn first_provider_success_is_not_fallback() {
    let chain = FallbackChain::new(
        vec![Scripted::succeeding(ProviderKind::Claude, "from claude")],
        options(),
    )
    .unwrap();

    let outcome = chain
        .complete(&prompt(), &CompletionOptions::default())
        .await
        .unwrap();
    assert!(!outcome.result.is_fallback);
    assert_eq!(outcome.result.original_provider, None);
    assert_eq!(outcome.providers_attempted, 1);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn retryable_failure_recovers_on_same_provider() {
    let flaky = Scripted::flaky(ProviderKind::Claude, 2, "third time lucky");
    let chain = FallbackChain::new(vec![flaky], options()).unwrap();

    let outcome = chain
        .complete(&prompt(), &CompletionOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.result.content, "third time lucky");
    assert!(!outcome.result.is_fallback);
    assert_eq!(outcome.providers_attempted, 3);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn non_retryable_errors_get_one_attempt_each() {
    let primary = Scripted::failing(ProviderKind::Claude, ErrorCode::InvalidApiKey);
    let secondary = Scripted::failing(ProviderKind::Gemini, ErrorCode::ContentFiltered);
    let chain =
        FallbackChain::new(vec![primary.clone(), secondary.clone()], options()).unwrap();

    let err = chain
        .complete(&prompt(), &CompletionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.providers_attempted, 2);
    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.attempts.len(), 2);
    assert_eq!(err.attempts[0].provider, ProviderKind::Claude);
    assert_eq!(err.attempts[1].provider, ProviderKind::Gemini);
    // The last failure is authoritative.
    assert_eq!(err.code(), ErrorCode::ContentFiltered);
    assert!(err.to_string().contains("2 provider(s) exhausted"));
}

#[tokio::test]
async fn fallback_hook_sees_the_transition() {
    let seen: Arc<std::sync::Mutex<Vec<(ProviderKind, ProviderKind, ErrorCode)>>> =
        Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let options = ChainOptions::new(0, Duration::ZERO).with_on_fallback(Box::new(
        move |from, to, err| {
            sink.lock().unwrap().push((from, to, err.code));
        },
    ));

    let chain = FallbackChain::new(
        vec![
            Scripted::failing(ProviderKind::Claude, ErrorCode::ProviderError),
            Scripted::succeeding(ProviderKind::Gemini, "ok"),
        ],
        options,
    )
    .unwrap();

    chain
        .complete(&prompt(), &CompletionOptions::default())
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![(
            ProviderKind::Claude,
            ProviderKind::Gemini,
            ErrorCode::ProviderError
        )]
    );
}

#[tokio::test]
async fn empty_chain_fails_construction() {
    let result = FallbackChain::<Scripted>::new(Vec::new(), options());
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("at least one configured provider")
    );
}

#[derive(Debug, Deserialize, PartialEq)]
struct Risk {
    level: String,
}

#[tokio::test]
async fn complete_json_strips_fences_and_parses() {
    let chain = FallbackChain::new(
        vec![Scripted::succeeding(
            ProviderKind::Claude,
            "```json\n{\"level\": \"low\"}\n```",
        )],
        options(),
    )
    .unwrap();

    let (risk, outcome) = chain
        .complete_json::<Risk>(&prompt(), &CompletionOptions::default())
        .await
        .unwrap();
    assert_eq!(risk, Risk { level: "low".into() });
    assert_eq!(outcome.providers_attempted, 1);
}

#[tokio::test]
async fn complete_json_parse_failure_is_not_a_provider_error() {
    let chain = FallbackChain::new(
        vec![Scripted::succeeding(ProviderKind::Claude, "not json at all")],
        options(),
    )
    .unwrap();

    let err = chain
        .complete_json::<Risk>(&prompt(), &CompletionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainJsonError::Parse(_)));
}

#[tokio::test]
async fn health_check_reports_every_provider() {
    let chain = FallbackChain::new(
        vec![
            Scripted::failing(ProviderKind::Claude, ErrorCode::NetworkError),
            Scripted::succeeding(ProviderKind::Gemini, "ok"),
        ],
        options(),
    )
    .unwrap();

    let reports = chain.health_check().await;
    assert_eq!(reports.len(), 2);
    assert!(!reports[0].1.healthy);
    assert!(reports[1].1.healthy);
}
