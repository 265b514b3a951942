//! Stop conditions: predicates over the attempt log that end the retry loop.
//!
//! A condition is evaluated strictly after an attempt finalizes, so it always
//! sees complete information about the latest attempt. Conditions are pure
//! functions of the log plus construction-time configuration and compose with
//! [`or`](StopConditionExt::or), [`and`](StopConditionExt::and), and
//! [`not`](StopConditionExt::not) without knowing each other's internals.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use reattempt::stop::{AttemptsExhausted, StopConditionExt, TimeExhausted};
//!
//! // Stop after 3 attempts or once 10 seconds have elapsed, whichever first.
//! let condition = AttemptsExhausted::new(3)
//!     .unwrap()
//!     .or(TimeExhausted::new(Duration::from_secs(10)));
//! # let _ = condition;
//! ```

use crate::attempt::AttemptLog;
use crate::error::ConfigError;
use std::time::Duration;

/// Predicate deciding whether the retry loop should end after the latest
/// finalized attempt.
pub trait StopCondition<E>: Send + Sync {
    /// True if no further attempt should be started.
    ///
    /// Must be deterministic over the log: calling it repeatedly with the
    /// same history returns the same answer.
    fn is_met(&self, log: &AttemptLog<E>) -> bool;
}

/// Combinator methods for composing stop conditions.
///
/// Implemented by every built-in condition and combinator. Custom condition
/// types opt in with `impl StopConditionExt for MyCondition {}`; the operands
/// are checked against [`StopCondition`] where the composite is used.
pub trait StopConditionExt: Sized {
    /// Stop when either condition would stop. Short-circuits left-to-right.
    fn or<C>(self, other: C) -> Or<Self, C> {
        Or { left: self, right: other }
    }

    /// Stop only when both conditions would stop. Short-circuits
    /// left-to-right.
    fn and<C>(self, other: C) -> And<Self, C> {
        And { left: self, right: other }
    }

    /// Invert this condition.
    fn not(self) -> Not<Self> {
        Not { inner: self }
    }
}

impl StopConditionExt for AttemptsExhausted {}
impl StopConditionExt for TimeExhausted {}
impl StopConditionExt for Succeeded {}
impl<F> StopConditionExt for FailureMatches<F> {}
impl<A, B> StopConditionExt for Or<A, B> {}
impl<A, B> StopConditionExt for And<A, B> {}
impl<C> StopConditionExt for Not<C> {}

/// Stop once a fixed number of attempts have been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptsExhausted {
    max_attempts: u32,
}

impl AttemptsExhausted {
    /// `max_attempts` counts total attempts (initial try + retries) and must
    /// be greater than zero.
    pub fn new(max_attempts: u32) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(max_attempts));
        }
        Ok(Self { max_attempts })
    }
}

impl<E> StopCondition<E> for AttemptsExhausted {
    fn is_met(&self, log: &AttemptLog<E>) -> bool {
        log.last().is_some_and(|attempt| attempt.number() >= self.max_attempts)
    }
}

/// Stop once the time elapsed since the first attempt began reaches a budget.
///
/// Elapsed time is measured at attempt finalization with the policy's clock,
/// so once the budget is spent no further attempt is started even if an
/// attempts limit has not been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeExhausted {
    budget: Duration,
}

impl TimeExhausted {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }
}

impl<E> StopCondition<E> for TimeExhausted {
    fn is_met(&self, log: &AttemptLog<E>) -> bool {
        log.last().is_some_and(|attempt| attempt.elapsed_since_first() >= self.budget)
    }
}

/// Stop once the latest attempt has succeeded.
///
/// The retry policy composes this in unconditionally: success always ends the
/// loop. It is exported for explicit composition in custom conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Succeeded;

impl<E> StopCondition<E> for Succeeded {
    fn is_met(&self, log: &AttemptLog<E>) -> bool {
        log.last().is_some_and(|attempt| attempt.succeeded())
    }
}

/// Stop when the latest attempt's failure matches a predicate.
///
/// `FailureMatches::new(pred).not()` keeps retrying only while the failure
/// matches `pred`: the usual way to express a retryable-failure set.
pub struct FailureMatches<F> {
    predicate: F,
}

impl<F> FailureMatches<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> std::fmt::Debug for FailureMatches<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureMatches").field("predicate", &"<predicate>").finish()
    }
}

impl<E, F> StopCondition<E> for FailureMatches<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn is_met(&self, log: &AttemptLog<E>) -> bool {
        log.last().and_then(|attempt| attempt.failure()).is_some_and(|e| (self.predicate)(e))
    }
}

/// Logical OR of two conditions. Built by [`StopConditionExt::or`].
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B> {
    left: A,
    right: B,
}

impl<E, A, B> StopCondition<E> for Or<A, B>
where
    A: StopCondition<E>,
    B: StopCondition<E>,
{
    fn is_met(&self, log: &AttemptLog<E>) -> bool {
        self.left.is_met(log) || self.right.is_met(log)
    }
}

/// Logical AND of two conditions. Built by [`StopConditionExt::and`].
#[derive(Debug, Clone, Copy)]
pub struct And<A, B> {
    left: A,
    right: B,
}

impl<E, A, B> StopCondition<E> for And<A, B>
where
    A: StopCondition<E>,
    B: StopCondition<E>,
{
    fn is_met(&self, log: &AttemptLog<E>) -> bool {
        self.left.is_met(log) && self.right.is_met(log)
    }
}

/// Logical negation of a condition. Built by [`StopConditionExt::not`].
#[derive(Debug, Clone, Copy)]
pub struct Not<C> {
    inner: C,
}

impl<E, C> StopCondition<E> for Not<C>
where
    C: StopCondition<E>,
{
    fn is_met(&self, log: &AttemptLog<E>) -> bool {
        !self.inner.is_met(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Transient,
        Fatal,
    }

    fn log_with_failures(count: u32) -> AttemptLog<TestError> {
        let mut log = AttemptLog::new();
        for i in 0..count {
            let now = Duration::from_millis(i as u64 * 100);
            log.begin(now);
            log.finalize_failure(TestError::Transient, now);
        }
        log
    }

    #[test]
    fn attempts_exhausted_counts_finalized_attempts() {
        let condition = AttemptsExhausted::new(3).unwrap();
        assert!(!StopCondition::<TestError>::is_met(&condition, &log_with_failures(0)));
        assert!(!condition.is_met(&log_with_failures(1)));
        assert!(!condition.is_met(&log_with_failures(2)));
        assert!(condition.is_met(&log_with_failures(3)));
        assert!(condition.is_met(&log_with_failures(4)));
    }

    #[test]
    fn zero_max_attempts_is_a_construction_error() {
        let err = AttemptsExhausted::new(0).unwrap_err();
        assert_eq!(err, ConfigError::InvalidMaxAttempts(0));
    }

    #[test]
    fn time_exhausted_compares_elapsed_at_finalization() {
        let condition = TimeExhausted::new(Duration::from_millis(500));

        let mut log: AttemptLog<TestError> = AttemptLog::new();
        log.begin(Duration::from_millis(0));
        log.finalize_failure(TestError::Transient, Duration::from_millis(499));
        assert!(!condition.is_met(&log));

        log.begin(Duration::from_millis(499));
        log.finalize_failure(TestError::Transient, Duration::from_millis(500));
        assert!(condition.is_met(&log));
    }

    #[test]
    fn zero_budget_stops_after_the_first_attempt() {
        let condition = TimeExhausted::new(Duration::ZERO);
        assert!(condition.is_met(&log_with_failures(1)));
        assert!(!StopCondition::<TestError>::is_met(&condition, &AttemptLog::new()));
    }

    #[test]
    fn succeeded_stops_only_on_success() {
        assert!(!Succeeded.is_met(&log_with_failures(2)));

        let mut log: AttemptLog<TestError> = AttemptLog::new();
        log.begin(Duration::ZERO);
        log.finalize_success(Duration::ZERO);
        assert!(Succeeded.is_met(&log));
    }

    #[test]
    fn failure_matches_classifies_the_latest_failure() {
        let non_retryable = FailureMatches::new(|e: &TestError| *e == TestError::Fatal);

        let mut log: AttemptLog<TestError> = AttemptLog::new();
        log.begin(Duration::ZERO);
        log.finalize_failure(TestError::Transient, Duration::ZERO);
        assert!(!non_retryable.is_met(&log));

        log.begin(Duration::ZERO);
        log.finalize_failure(TestError::Fatal, Duration::ZERO);
        assert!(non_retryable.is_met(&log));
    }

    #[test]
    fn failure_matches_ignores_successful_attempts() {
        let condition = FailureMatches::new(|_: &TestError| true);
        let mut log: AttemptLog<TestError> = AttemptLog::new();
        log.begin(Duration::ZERO);
        log.finalize_success(Duration::ZERO);
        assert!(!condition.is_met(&log));
    }

    #[test]
    fn or_stops_as_soon_as_either_side_would() {
        let attempts = AttemptsExhausted::new(3).unwrap();
        let time = TimeExhausted::new(Duration::from_secs(60));
        let either = attempts.or(time);

        // Attempts side fires first.
        assert!(either.is_met(&log_with_failures(3)));

        // Time side fires first.
        let mut log: AttemptLog<TestError> = AttemptLog::new();
        log.begin(Duration::ZERO);
        log.finalize_failure(TestError::Transient, Duration::from_secs(61));
        assert!(either.is_met(&log));

        // Neither fires.
        assert!(!either.is_met(&log_with_failures(2)));
    }

    #[test]
    fn and_requires_both_sides() {
        let both = AttemptsExhausted::new(2).unwrap().and(TimeExhausted::new(Duration::ZERO));
        assert!(!both.is_met(&log_with_failures(1)));
        assert!(both.is_met(&log_with_failures(2)));
    }

    #[test]
    fn not_inverts_and_expresses_retryable_sets() {
        // Retry only while the failure is transient.
        let stop = FailureMatches::new(|e: &TestError| *e == TestError::Transient).not();

        let mut log: AttemptLog<TestError> = AttemptLog::new();
        log.begin(Duration::ZERO);
        log.finalize_failure(TestError::Transient, Duration::ZERO);
        assert!(!stop.is_met(&log));

        log.begin(Duration::ZERO);
        log.finalize_failure(TestError::Fatal, Duration::ZERO);
        assert!(stop.is_met(&log));
    }

    #[test]
    fn or_short_circuits_left_to_right() {
        struct Counting<'a>(&'a AtomicUsize, bool);
        impl<E> StopCondition<E> for Counting<'_> {
            fn is_met(&self, _log: &AttemptLog<E>) -> bool {
                self.0.fetch_add(1, Ordering::SeqCst);
                self.1
            }
        }
        impl StopConditionExt for Counting<'_> {}

        let left_calls = AtomicUsize::new(0);
        let right_calls = AtomicUsize::new(0);
        let either = Counting(&left_calls, true).or(Counting(&right_calls, true));

        assert!(either.is_met(&log_with_failures(1)));
        assert_eq!(left_calls.load(Ordering::SeqCst), 1);
        assert_eq!(right_calls.load(Ordering::SeqCst), 0, "right side must not be evaluated");
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let condition = AttemptsExhausted::new(2).unwrap();
        let log = log_with_failures(2);
        for _ in 0..5 {
            assert!(condition.is_met(&log));
        }
    }
}
