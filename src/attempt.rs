//! Per-attempt state and the append-only attempt log.
//!
//! One `AttemptState` is created when an attempt begins and finalized as soon
//! as the operation returns or fails. The `AttemptLog` is the ordered sequence
//! of those states for a single orchestrated call; stop conditions and delay
//! policies read it, only the retry loop that owns it may write to it.
//!
//! Invariants:
//! - Attempt numbers are 1-based and strictly increasing with no gaps.
//! - A failure is recorded exactly when the attempt's phase is `Failed`.
//! - Stop conditions are only consulted after the latest attempt has been
//!   finalized; they never observe a `Started` phase.

use std::time::Duration;

/// Lifecycle phase of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The operation has been invoked but its outcome is not yet known.
    Started,
    /// The operation returned a value.
    Succeeded,
    /// The operation failed; the failure is captured in the attempt state.
    Failed,
}

/// Record of one execution attempt.
///
/// Timestamps are clock readings (durations since the clock's origin), so the
/// whole retry loop can run against a fake clock in tests.
#[derive(Debug)]
pub struct AttemptState<E> {
    number: u32,
    started_at: Duration,
    elapsed_since_first: Duration,
    phase: Phase,
    failure: Option<E>,
}

impl<E> AttemptState<E> {
    fn started(number: u32, started_at: Duration, elapsed_since_first: Duration) -> Self {
        Self { number, started_at, elapsed_since_first, phase: Phase::Started, failure: None }
    }

    /// 1-based attempt number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Clock reading taken when this attempt began.
    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    /// Time elapsed since the first attempt of this call began, measured at
    /// this attempt's most recent transition (finalization for terminal
    /// phases). Time-based stop conditions read this.
    pub fn elapsed_since_first(&self) -> Duration {
        self.elapsed_since_first
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The captured failure, present exactly when the attempt failed.
    pub fn failure(&self) -> Option<&E> {
        self.failure.as_ref()
    }

    /// True once the attempt has finalized successfully.
    pub fn succeeded(&self) -> bool {
        self.phase == Phase::Succeeded
    }

    /// True once the attempt has finalized with a failure.
    pub fn failed(&self) -> bool {
        self.phase == Phase::Failed
    }
}

/// Append-only sequence of attempt states for one orchestrated call.
///
/// Owned exclusively by the retry loop driving that call and discarded when
/// the call terminates. The public surface is read-only.
#[derive(Debug)]
pub struct AttemptLog<E> {
    attempts: Vec<AttemptState<E>>,
}

impl<E> AttemptLog<E> {
    pub(crate) fn new() -> Self {
        Self { attempts: Vec::new() }
    }

    /// Number of attempts begun so far.
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// True before the first attempt begins.
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// The most recent attempt, if any.
    pub fn last(&self) -> Option<&AttemptState<E>> {
        self.attempts.last()
    }

    /// Iterate over attempts in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttemptState<E>> {
        self.attempts.iter()
    }

    /// Clock reading at which the first attempt began.
    pub fn first_started_at(&self) -> Option<Duration> {
        self.attempts.first().map(AttemptState::started_at)
    }

    /// Total time elapsed since the first attempt began, as of the latest
    /// recorded transition. Zero before any attempt has run.
    pub fn total_elapsed(&self) -> Duration {
        self.last().map(AttemptState::elapsed_since_first).unwrap_or(Duration::ZERO)
    }

    /// Begin the next attempt at clock reading `now`; returns its number.
    pub(crate) fn begin(&mut self, now: Duration) -> u32 {
        let number = self.attempts.len() as u32 + 1;
        let first = self.first_started_at().unwrap_or(now);
        self.attempts.push(AttemptState::started(number, now, now.saturating_sub(first)));
        number
    }

    /// Finalize the current attempt as succeeded.
    pub(crate) fn finalize_success(&mut self, now: Duration) {
        self.finalize(Phase::Succeeded, None, now);
    }

    /// Finalize the current attempt as failed, capturing the failure.
    pub(crate) fn finalize_failure(&mut self, failure: E, now: Duration) {
        self.finalize(Phase::Failed, Some(failure), now);
    }

    fn finalize(&mut self, phase: Phase, failure: Option<E>, now: Duration) {
        let first = self.first_started_at().unwrap_or(now);
        if let Some(attempt) = self.attempts.last_mut() {
            debug_assert_eq!(attempt.phase, Phase::Started, "attempt finalized twice");
            attempt.phase = phase;
            attempt.failure = failure;
            attempt.elapsed_since_first = now.saturating_sub(first);
        }
    }

    /// Move the latest attempt's failure out of the log so it can be returned
    /// to the caller unchanged.
    pub(crate) fn take_last_failure(&mut self) -> Option<E> {
        self.attempts.last_mut().and_then(|attempt| attempt.failure.take())
    }
}
