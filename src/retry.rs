//! Retry policy: the orchestrator binding a stop condition, a delay policy,
//! and the attempt loop that drives a wrapped operation to completion.
//!
//! Semantics:
//! - The operation runs at least once; stop conditions are evaluated only
//!   after an attempt has finalized.
//! - Success always ends the loop and returns the operation's value.
//! - `should_retry` classifies failures; a non-retryable failure is returned
//!   after exactly one invocation without consulting the delay policy.
//! - On exhaustion the final attempt's failure is returned unchanged, never
//!   a wrapper hiding the root cause.
//! - The same decision logic drives two generators: `execute` (async; the
//!   operation future and the sleep are the loop's two suspension points,
//!   and dropping the returned future cancels within one of them) and
//!   `execute_blocking` (sync; the calling thread owns the loop).
//!
//! Invariants:
//! - Attempts for one call run strictly sequentially and never overlap.
//! - Delay policy and jitter are consulted exactly once per retried failure,
//!   never after a final attempt.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use reattempt::stop::{AttemptsExhausted, StopConditionExt, TimeExhausted};
//! use reattempt::{Backoff, Jitter, RetryPolicy};
//!
//! #[derive(Debug)]
//! struct Unreachable;
//! impl std::fmt::Display for Unreachable {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "peer unreachable")
//!     }
//! }
//! impl std::error::Error for Unreachable {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::<Unreachable>::builder()
//!     .stop(AttemptsExhausted::new(3).unwrap().or(TimeExhausted::new(Duration::from_secs(30))))
//!     .delay(Backoff::exponential(Duration::from_millis(100)))
//!     .with_jitter(Jitter::full())
//!     .build()
//!     .unwrap();
//!
//! let result: Result<(), Unreachable> =
//!     policy.execute(|| async { Err(Unreachable) }).await;
//! assert!(result.is_err());
//! # });
//! ```

use crate::attempt::AttemptLog;
use crate::backoff::{Backoff, DelayPolicy};
use crate::clock::{Clock, MonotonicClock};
use crate::error::ConfigError;
use crate::jitter::Jitter;
use crate::sleeper::{BlockingSleeper, Sleeper, ThreadSleeper, TokioSleeper};
use crate::stop::StopCondition;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Retry policy combining a stop condition, delay policy, jitter, failure
/// classification, and injectable clock/sleepers.
///
/// Cloning is cheap (configuration is behind `Arc`) and clones may drive
/// independent orchestrated calls concurrently; each call owns its own
/// attempt log.
pub struct RetryPolicy<E> {
    stop: Arc<dyn StopCondition<E>>,
    delay: Arc<dyn DelayPolicy<E>>,
    jitter: Jitter,
    should_retry: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    blocking_sleeper: Arc<dyn BlockingSleeper>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            stop: self.stop.clone(),
            delay: self.delay.clone(),
            jitter: self.jitter.clone(),
            should_retry: self.should_retry.clone(),
            clock: self.clock.clone(),
            sleeper: self.sleeper.clone(),
            blocking_sleeper: self.blocking_sleeper.clone(),
        }
    }
}

impl<E> std::fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("stop", &"<condition>")
            .field("delay", &"<policy>")
            .field("jitter", &self.jitter)
            .field("should_retry", &"<predicate>")
            .field("clock", &self.clock)
            .finish()
    }
}

/// Decision taken after a failed attempt has been recorded.
enum Verdict<E> {
    GiveUp(E),
    RetryAfter(Duration),
}

impl<E> RetryPolicy<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Construct a new builder with defaults (zero delay, no jitter, retry
    /// every failure). A stop condition must be supplied before `build`.
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new()
    }

    /// Asynchronous attempt generator.
    ///
    /// Invokes `operation` until the stop condition is met; the operation
    /// future and the inter-attempt sleep are the only suspension points.
    /// Dropping the returned future while suspended cancels the call: no
    /// further attempt starts and the delay policy is not consulted again.
    pub async fn execute<T, Fut, Op>(&self, mut operation: Op) -> Result<T, E>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        let mut log = AttemptLog::new();

        loop {
            let attempt = log.begin(self.clock.now());
            match operation().await {
                Ok(value) => {
                    log.finalize_success(self.clock.now());
                    tracing::trace!(attempt, "attempt succeeded");
                    return Ok(value);
                }
                Err(failure) => {
                    log.finalize_failure(failure, self.clock.now());
                    match self.after_failure(&mut log) {
                        Verdict::GiveUp(failure) => return Err(failure),
                        Verdict::RetryAfter(delay) => self.sleeper.sleep(delay).await,
                    }
                }
            }
        }
    }

    /// Synchronous attempt generator.
    ///
    /// Identical decision logic to [`execute`](Self::execute), but the
    /// calling thread blocks for the operation's duration and for every
    /// inter-attempt delay.
    pub fn execute_blocking<T, Op>(&self, mut operation: Op) -> Result<T, E>
    where
        Op: FnMut() -> Result<T, E>,
    {
        let mut log = AttemptLog::new();

        loop {
            let attempt = log.begin(self.clock.now());
            match operation() {
                Ok(value) => {
                    log.finalize_success(self.clock.now());
                    tracing::trace!(attempt, "attempt succeeded");
                    return Ok(value);
                }
                Err(failure) => {
                    log.finalize_failure(failure, self.clock.now());
                    match self.after_failure(&mut log) {
                        Verdict::GiveUp(failure) => return Err(failure),
                        Verdict::RetryAfter(delay) => self.blocking_sleeper.sleep(delay),
                    }
                }
            }
        }
    }

    /// Shared post-failure decision: classify the failure, consult the stop
    /// condition, and either surface the failure or compute the next delay.
    fn after_failure(&self, log: &mut AttemptLog<E>) -> Verdict<E> {
        let attempt = log.len();
        let retryable =
            log.last().and_then(|a| a.failure()).map(|f| (self.should_retry)(f)).unwrap_or(false);

        let give_up = if !retryable {
            tracing::debug!(attempt, "failure is not retryable");
            true
        } else {
            self.stop.is_met(log)
        };

        if give_up {
            match log.take_last_failure() {
                Some(failure) => {
                    tracing::warn!(
                        attempts = attempt,
                        error = %failure,
                        "retries stopped; surfacing last failure"
                    );
                    return Verdict::GiveUp(failure);
                }
                // A failed attempt always records its failure.
                None => unreachable!("finalized failure missing from attempt log"),
            }
        }

        let delay = self.jitter.apply(self.delay.next_delay(log));
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "waiting before next attempt");
        Verdict::RetryAfter(delay)
    }
}

/// Builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder<E> {
    stop: Option<Arc<dyn StopCondition<E>>>,
    delay: Arc<dyn DelayPolicy<E>>,
    jitter: Jitter,
    should_retry: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    blocking_sleeper: Arc<dyn BlockingSleeper>,
}

impl<E> RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            stop: None,
            delay: Arc::new(Backoff::none()),
            jitter: Jitter::None,
            should_retry: Arc::new(|_| true),
            clock: Arc::new(MonotonicClock::default()),
            sleeper: Arc::new(TokioSleeper),
            blocking_sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Set the stop condition. Required; there is no implicit default and
    /// success always stops regardless of the configured condition.
    pub fn stop<C>(mut self, condition: C) -> Self
    where
        C: StopCondition<E> + 'static,
    {
        self.stop = Some(Arc::new(condition));
        self
    }

    /// Set the delay policy. Defaults to zero delay (immediate retry).
    pub fn delay<D>(mut self, policy: D) -> Self
    where
        D: DelayPolicy<E> + 'static,
    {
        self.delay = Arc::new(policy);
        self
    }

    /// Set the jitter strategy applied on top of the computed delay.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Predicate deciding whether a failure is retryable. Failures it
    /// rejects propagate after a single invocation.
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Provide a custom clock (elapsed-time measurement in tests).
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Provide a custom async sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Provide a custom blocking sleeper implementation.
    pub fn with_blocking_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: BlockingSleeper + 'static,
    {
        self.blocking_sleeper = Arc::new(sleeper);
        self
    }

    /// Build the retry policy, validating the configuration eagerly.
    pub fn build(self) -> Result<RetryPolicy<E>, ConfigError> {
        let stop = self.stop.ok_or(ConfigError::MissingStopCondition)?;
        Ok(RetryPolicy {
            stop,
            delay: self.delay,
            jitter: self.jitter,
            should_retry: self.should_retry,
            clock: self.clock,
            sleeper: self.sleeper,
            blocking_sleeper: self.blocking_sleeper,
        })
    }
}

impl<E> Default for RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
