//! Tests for the rate-limited, retrying client using MockBackend.

mod test_utils;

use cvx_error::{ProviderErrorKind, RetryableError};
use cvx_models::{ContentGenerator, GuardedClient, generate_with_optional_system};
use cvx_rate_limit::{RateLimiter, RetryConfig};
use std::time::Duration;
use test_utils::{MockBackend, SeenRequest};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn fast_retry() -> RetryConfig {
    RetryConfig::new(
        3,
        Duration::from_millis(10),
        Duration::from_millis(100),
        2.0,
        0.0,
    )
    .unwrap()
}

fn guarded(backend: MockBackend) -> GuardedClient<MockBackend> {
    GuardedClient::new(backend, RateLimiter::new(1.0).unwrap(), fast_retry())
}

#[tokio::test(start_paused = true)]
async fn test_success_uses_one_token() {
    let client = guarded(MockBackend::new_success("Hello from mock!"));
    let cancel = CancellationToken::new();

    let text = client.generate_content(&cancel, "Say hello").await.unwrap();

    assert_eq!(text, "Hello from mock!");
    assert_eq!(client.backend().call_count(), 1);
    assert!(client.limiter().available().await < 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_are_retried_without_new_tokens() {
    let backend = MockBackend::scripted(
        vec![
            Err(ProviderErrorKind::Overloaded("529".into())),
            Err(ProviderErrorKind::RateLimited("mock-model".into())),
        ],
        "recovered",
    );
    let client = guarded(backend);
    let cancel = CancellationToken::new();
    let start = Instant::now();

    let text = client.generate_content(&cancel, "prompt").await.unwrap();

    assert_eq!(text, "recovered");
    assert_eq!(client.backend().call_count(), 3);
    // 10ms + 20ms of backoff, no waiting on the limiter
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(30), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(40), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_is_not_retried() {
    let client = guarded(MockBackend::always_failing(
        ProviderErrorKind::Authentication("Check MOCK_API_KEY environment variable".into()),
        5,
    ));
    let cancel = CancellationToken::new();

    let err = client.generate_content(&cancel, "prompt").await.unwrap_err();

    assert_eq!(client.backend().call_count(), 1);
    assert!(matches!(err.kind, ProviderErrorKind::Authentication(_)));
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_return_last_error() {
    let client = guarded(MockBackend::always_failing(
        ProviderErrorKind::ServiceUnavailable("HTTP 503".into()),
        10,
    ));
    let cancel = CancellationToken::new();

    let err = client.generate_content(&cancel, "prompt").await.unwrap_err();

    assert_eq!(client.backend().call_count(), 4);
    assert_eq!(
        err.kind,
        ProviderErrorKind::ServiceUnavailable("HTTP 503".into())
    );
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_calls_are_throttled() {
    let client = guarded(MockBackend::new_success("ok"));
    let cancel = CancellationToken::new();
    let start = Instant::now();

    client.generate_content(&cancel, "first").await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(1));

    client.generate_content(&cancel, "second").await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(client.backend().call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_call_never_reaches_backend() {
    let client = guarded(MockBackend::new_success("ok"));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.generate_content(&cancel, "prompt").await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(client.backend().call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_system_prompt_sent_separately_when_supported() {
    let client = guarded(MockBackend::new_success("{}"));
    let cancel = CancellationToken::new();

    assert!(client.system_prompt_support().is_some());
    generate_with_optional_system(&client, &cancel, "You are a recruiter.", "Tailor this")
        .await
        .unwrap();

    assert_eq!(
        client.backend().seen(),
        vec![SeenRequest {
            system_prompt: Some("You are a recruiter.".to_string()),
            user_prompt: "Tailor this".to_string(),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_system_prompt_combined_when_unsupported() {
    let client = guarded(MockBackend::new_success("{}").without_system_prompt());
    let cancel = CancellationToken::new();

    assert!(client.system_prompt_support().is_none());
    generate_with_optional_system(&client, &cancel, "You are a recruiter.", "Tailor this")
        .await
        .unwrap();

    assert_eq!(
        client.backend().seen(),
        vec![SeenRequest {
            system_prompt: None,
            user_prompt: "You are a recruiter.\n\nTailor this".to_string(),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_system_prompt_sends_user_prompt_only() {
    let client = guarded(MockBackend::new_success("{}"));
    let cancel = CancellationToken::new();

    generate_with_optional_system(&client, &cancel, "", "Tailor this")
        .await
        .unwrap();

    assert_eq!(client.backend().seen()[0].system_prompt, None);
    assert_eq!(client.backend().seen()[0].user_prompt, "Tailor this");
}

#[test]
fn test_from_config_uses_provider_rate() {
    let config = cvx_rate_limit::CvxConfig::default();
    let client = GuardedClient::from_config(MockBackend::new_success("ok"), &config).unwrap();

    assert_eq!(client.limiter().rate(), cvx_rate_limit::DEFAULT_REQUESTS_PER_SECOND);
    assert_eq!(*client.retry(), RetryConfig::default());
}
