use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn breaker(failure_threshold: u32, recovery_timeout_secs: u64) -> CircuitBreaker {
    CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold,
        recovery_timeout_secs,
    })
}

async fn fail(breaker: &CircuitBreaker, calls: &AtomicUsize) -> Result<(), CallError<&'static str>> {
    breaker
        .call(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("boom")
        })
        .await
}

async fn succeed(breaker: &CircuitBreaker, calls: &AtomicUsize) -> Result<u32, CallError<&'static str>> {
    breaker
        .call(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &'static str>(42)
        })
        .await
}

#[test]
fn test_default_config() {
    let config = CircuitBreakerConfig::default();
    assert_eq!(config.failure_threshold, 5);
    assert_eq!(config.recovery_timeout(), Duration::from_secs(60));
}

#[tokio::test]
async fn test_opens_after_threshold_and_rejects_without_calling() {
    let breaker = breaker(5, 60);
    let calls = AtomicUsize::new(0);

    for attempt in 1..=5 {
        assert_eq!(fail(&breaker, &calls).await, Err(CallError::Failed("boom")));
        let expected = if attempt < 5 {
            CircuitState::Closed
        } else {
            CircuitState::Open
        };
        assert_eq!(breaker.state().await, expected);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    assert_eq!(succeed(&breaker, &calls).await, Err(CallError::CircuitOpen));
    assert_eq!(fail(&breaker, &calls).await, Err(CallError::CircuitOpen));
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.state, CircuitState::Open);
    assert_eq!(snapshot.failure_count, 5);
    assert!(snapshot.opened_at.is_some());
    assert_eq!(snapshot.total_failures, 5);
    assert_eq!(snapshot.total_rejections, 2);
}

#[tokio::test]
async fn test_success_resets_consecutive_failures() {
    let breaker = breaker(3, 60);
    let calls = AtomicUsize::new(0);

    fail(&breaker, &calls).await.unwrap_err();
    fail(&breaker, &calls).await.unwrap_err();
    assert_eq!(breaker.snapshot().await.failure_count, 2);

    assert_eq!(succeed(&breaker, &calls).await, Ok(42));
    assert_eq!(breaker.snapshot().await.failure_count, 0);

    fail(&breaker, &calls).await.unwrap_err();
    fail(&breaker, &calls).await.unwrap_err();
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn test_half_open_trial_success_closes_circuit() {
    let breaker = breaker(2, 0);
    let calls = AtomicUsize::new(0);

    fail(&breaker, &calls).await.unwrap_err();
    fail(&breaker, &calls).await.unwrap_err();
    assert_eq!(breaker.state().await, CircuitState::Open);

    assert_eq!(succeed(&breaker, &calls).await, Ok(42));

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failure_count, 0);
    assert_eq!(snapshot.opened_at, None);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_half_open_trial_failure_reopens_circuit() {
    let breaker = breaker(1, 1);
    let calls = AtomicUsize::new(0);

    fail(&breaker, &calls).await.unwrap_err();
    let first_opened = breaker.snapshot().await.opened_at.unwrap();

    // Still inside the recovery window
    assert_eq!(succeed(&breaker, &calls).await, Err(CallError::CircuitOpen));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(fail(&breaker, &calls).await, Err(CallError::Failed("boom")));

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.state, CircuitState::Open);
    assert!(snapshot.opened_at.unwrap() > first_opened);
    assert_eq!(succeed(&breaker, &calls).await, Err(CallError::CircuitOpen));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_half_open_admits_single_trial() {
    let breaker = Arc::new(breaker(1, 0));
    let calls = Arc::new(AtomicUsize::new(0));
    fail(&breaker, &calls).await.unwrap_err();

    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

    let trial = {
        let breaker = breaker.clone();
        let calls = calls.clone();
        tokio::spawn(async move {
            breaker
                .call(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Ok::<_, &'static str>(())
                })
                .await
        })
    };

    started_rx.await.unwrap();
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);
    assert_eq!(succeed(&breaker, &calls).await, Err(CallError::CircuitOpen));

    release_tx.send(()).unwrap();
    assert_eq!(trial.await.unwrap(), Ok(()));
    assert_eq!(breaker.state().await, CircuitState::Closed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_abandoned_trial_reopens_circuit() {
    let breaker = breaker(1, 1);
    let calls = AtomicUsize::new(0);

    fail(&breaker, &calls).await.unwrap_err();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        breaker.call(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, &'static str>(())
        }),
    )
    .await;
    assert!(abandoned.is_err());

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.state, CircuitState::Open);
    assert_eq!(snapshot.total_failures, 2);
    assert_eq!(succeed(&breaker, &calls).await, Err(CallError::CircuitOpen));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(succeed(&breaker, &calls).await, Ok(42));
    assert_eq!(breaker.state().await, CircuitState::Closed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

fn panicking_operation() -> Result<(), &'static str> {
    panic!("classifier bug")
}

#[tokio::test]
async fn test_panicking_trial_reopens_circuit() {
    let breaker = Arc::new(breaker(1, 0));
    let calls = AtomicUsize::new(0);
    fail(&breaker, &calls).await.unwrap_err();

    let trial = {
        let breaker = breaker.clone();
        tokio::spawn(async move {
            breaker
                .call(|| async { panicking_operation() })
                .await
        })
    };
    assert!(trial.await.unwrap_err().is_panic());

    assert_eq!(breaker.state().await, CircuitState::Open);
    assert_eq!(succeed(&breaker, &calls).await, Ok(42));
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn test_dropped_normal_call_leaves_circuit_closed() {
    let breaker = breaker(1, 60);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        breaker.call(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, &'static str>(())
        }),
    )
    .await;
    assert!(abandoned.is_err());

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failure_count, 0);
    assert_eq!(snapshot.total_failures, 0);
}

#[tokio::test]
async fn test_concurrent_failures_are_all_counted() {
    let breaker = Arc::new(breaker(50, 60));
    let calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let breaker = breaker.clone();
            let calls = calls.clone();
            tokio::spawn(async move { fail(&breaker, &calls).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap_err();
    }

    let snapshot = breaker.snapshot().await;
    assert_eq!(snapshot.failure_count, 20);
    assert_eq!(snapshot.total_failures, 20);
    assert_eq!(snapshot.state, CircuitState::Closed);
}

#[tokio::test]
async fn test_force_open_and_reset() {
    let breaker = CircuitBreaker::default();
    let calls = AtomicUsize::new(0);

    breaker.force_open().await;
    assert_eq!(succeed(&breaker, &calls).await, Err(CallError::CircuitOpen));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    breaker.reset().await;
    assert_eq!(succeed(&breaker, &calls).await, Ok(42));
    assert_eq!(breaker.snapshot().await.failure_count, 0);
}

#[test]
fn test_snapshot_serializes_state_names() {
    let json = serde_json::to_value(CircuitState::HalfOpen).unwrap();
    assert_eq!(json, "half_open");
}
