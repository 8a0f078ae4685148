//! Tests for chain construction from the factory.

use pcore::ProviderKind;
use praxis_model::{ChainOptions, FallbackChain, ProviderFactory, Settings};
use std::sync::Arc;
use std::time::Duration;

fn factory(anthropic: Option<&str>, gemini: Option<&str>, enable_fallback: bool) -> ProviderFactory {
    ProviderFactory::new(Arc::new(Settings {
        anthropic_api_key: anthropic.map(Into::into),
        gemini_api_key: gemini.map(Into::into),
        enable_fallback,
        ..Settings::default()
    }))
}

fn options() -> ChainOptions {
    ChainOptions::new(1, Duration::from_millis(10))
}

#[test]
fn unconfigured_providers_are_skipped() {
    let factory = factory(None, Some("key-g"), true);
    let chain = FallbackChain::from_factory(
        &factory,
        &[ProviderKind::Claude, ProviderKind::Gemini],
        options(),
    )
    .unwrap();
    assert_eq!(chain.providers(), vec![ProviderKind::Gemini]);
}

#[test]
fn no_usable_provider_fails_construction() {
    let factory = factory(None, None, true);
    let result = FallbackChain::from_factory(
        &factory,
        &[ProviderKind::Claude, ProviderKind::Gemini],
        options(),
    );
    assert!(result.is_err());
}

#[test]
fn disabled_fallback_keeps_only_the_first_usable_provider() {
    let factory = factory(Some("key-a"), Some("key-g"), false);
    let chain = FallbackChain::from_factory(
        &factory,
        &[ProviderKind::Claude, ProviderKind::Gemini],
        options(),
    )
    .unwrap();
    assert_eq!(chain.providers(), vec![ProviderKind::Claude]);
}

#[test]
fn configured_chain_uses_settings_retry_policy() {
    let factory = ProviderFactory::new(Arc::new(Settings {
        anthropic_api_key: Some("key-a".into()),
        gemini_api_key: Some("key-g".into()),
        fallback_retries: 5,
        fallback_delay_ms: 40,
        ..Settings::default()
    }));
    let chain = FallbackChain::configured(&factory).unwrap();
    assert_eq!(
        chain.providers(),
        vec![ProviderKind::Claude, ProviderKind::Gemini]
    );
    assert_eq!(chain.options().max_retries, 5);
    assert_eq!(chain.options().retry_delay, Duration::from_millis(40));
}

#[test]
fn presets_build_over_the_configured_order() {
    let factory = factory(Some("key-a"), Some("key-g"), true);
    let clinical = FallbackChain::clinical(&factory).unwrap();
    assert_eq!(
        clinical.providers(),
        vec![ProviderKind::Claude, ProviderKind::Gemini]
    );
    let fast = FallbackChain::fast(&factory).unwrap();
    assert_eq!(
        fast.providers(),
        vec![ProviderKind::Claude, ProviderKind::Gemini]
    );
}
