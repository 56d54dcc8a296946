//! Tests for the token-bucket rate limiter.

use cvx_rate_limit::RateLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_burst_then_throttle() {
    let limiter = RateLimiter::new(5.0).unwrap();
    let cancel = CancellationToken::new();

    let start = std::time::Instant::now();
    for _ in 0..5 {
        limiter.wait(&cancel).await.unwrap();
    }
    assert!(
        start.elapsed() < Duration::from_millis(50),
        "burst took {:?}",
        start.elapsed()
    );

    let blocked = std::time::Instant::now();
    limiter.wait(&cancel).await.unwrap();
    let waited = blocked.elapsed();
    assert!(waited >= Duration::from_millis(150), "waited only {:?}", waited);
    assert!(waited < Duration::from_millis(600), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_next_token_arrives_after_one_over_rate() {
    let limiter = RateLimiter::new(4.0).unwrap();
    let cancel = CancellationToken::new();

    for _ in 0..4 {
        limiter.wait(&cancel).await.unwrap();
    }

    let start = Instant::now();
    limiter.wait(&cancel).await.unwrap();
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(249), "waited {:?}", waited);
    assert!(waited <= Duration::from_millis(260), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_idle_period_refills_to_capacity_only() {
    let limiter = RateLimiter::new(3.0).unwrap();
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        limiter.wait(&cancel).await.unwrap();
    }
    assert!(limiter.available().await < 1.0);

    tokio::time::advance(Duration::from_secs(3600)).await;
    assert_eq!(limiter.available().await, 3.0);
}

#[tokio::test]
async fn test_cancelled_wait_consumes_nothing() {
    let limiter = RateLimiter::new(1.0).unwrap();
    let live = CancellationToken::new();
    limiter.wait(&live).await.unwrap();

    let before = limiter.available().await;
    assert!(before < 1.0);

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = limiter.wait(&cancelled).await.unwrap_err();
    assert!(format!("{}", err).contains("rate limiter wait"));

    let after = limiter.available().await;
    assert!(after >= before, "token was consumed: {} -> {}", before, after);
}

#[tokio::test]
async fn test_cancel_interrupts_pending_wait() {
    let limiter = RateLimiter::new(0.1).unwrap();
    let cancel = CancellationToken::new();
    limiter.wait(&cancel).await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let start = std::time::Instant::now();
    let result = limiter.wait(&cancel).await;
    assert!(result.is_err());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_waiters_never_share_a_token() {
    let limiter = Arc::new(RateLimiter::new(2.0).unwrap());
    let cancel = CancellationToken::new();
    let start = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let limiter = Arc::clone(&limiter);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            limiter.wait(&cancel).await.unwrap();
            Instant::now()
        }));
    }

    let mut granted = Vec::new();
    for handle in handles {
        granted.push(handle.await.unwrap() - start);
    }
    granted.sort();

    // Two free tokens, then one every 500ms.
    assert!(granted[1] < Duration::from_millis(10));
    assert!(granted[2] >= Duration::from_millis(490));
    assert!(granted[5] >= Duration::from_millis(1990));
}
