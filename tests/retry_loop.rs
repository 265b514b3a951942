//! End-to-end retry-loop behavior through the public API.

use reattempt::stop::{AttemptsExhausted, StopConditionExt, TimeExhausted};
use reattempt::{Backoff, InstantSleeper, RetryPolicy};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum FetchError {
    #[error("value out of range")]
    OutOfRange,
    #[error("connection refused")]
    ConnRefused,
    #[error("unauthorized")]
    Unauthorized,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn recovers_after_two_transient_failures() {
    init_tracing();

    let policy = RetryPolicy::builder()
        .stop(AttemptsExhausted::new(5).unwrap())
        .delay(Backoff::fixed(Duration::ZERO))
        .build()
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let result = policy
        .execute(|| {
            let calls = calls_clone.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::OutOfRange)
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly three invocations");
}

#[tokio::test]
async fn composite_condition_exhausts_on_the_attempts_side() {
    init_tracing();

    let policy = RetryPolicy::builder()
        .stop(
            AttemptsExhausted::new(3)
                .unwrap()
                .or(TimeExhausted::new(Duration::from_secs(60))),
        )
        .delay(Backoff::fixed(Duration::ZERO))
        .build()
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let result: Result<(), FetchError> = policy
        .execute(|| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::ConnRefused)
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly three invocations");
    assert_eq!(result.unwrap_err(), FetchError::ConnRefused, "the original failure surfaces");
}

#[tokio::test]
async fn non_retryable_failure_short_circuits() {
    init_tracing();

    let policy = RetryPolicy::builder()
        .stop(AttemptsExhausted::new(10).unwrap())
        .should_retry(|e: &FetchError| !matches!(e, FetchError::Unauthorized))
        .with_sleeper(InstantSleeper)
        .build()
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let result: Result<(), FetchError> = policy
        .execute(|| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Unauthorized)
            }
        })
        .await;

    assert_eq!(result.unwrap_err(), FetchError::Unauthorized);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "one invocation regardless of the attempt limit");
}

#[test]
fn blocking_loop_matches_the_async_semantics() {
    init_tracing();

    let policy = RetryPolicy::builder()
        .stop(AttemptsExhausted::new(5).unwrap())
        .delay(Backoff::fixed(Duration::ZERO))
        .with_blocking_sleeper(InstantSleeper)
        .build()
        .unwrap();

    let calls = AtomicUsize::new(0);
    let result = policy.execute_blocking(|| {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(FetchError::OutOfRange)
        } else {
            Ok("ok")
        }
    });

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn shared_policy_drives_independent_calls() {
    init_tracing();

    let policy = RetryPolicy::builder()
        .stop(AttemptsExhausted::new(3).unwrap())
        .with_sleeper(InstantSleeper)
        .build()
        .unwrap();

    let first = policy.clone();
    let second = policy;

    let a = tokio::spawn(async move {
        first.execute(|| async { Ok::<_, FetchError>(1) }).await
    });
    let b = tokio::spawn(async move {
        let calls = AtomicUsize::new(0);
        second
            .execute(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(FetchError::ConnRefused)
                } else {
                    Ok(2)
                }
            })
            .await
    });

    assert_eq!(a.await.unwrap().unwrap(), 1);
    assert_eq!(b.await.unwrap().unwrap(), 2);
}
