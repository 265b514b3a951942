//! Convenient re-exports for common retry-harness types.
pub use crate::{
    attempt::{AttemptLog, AttemptState, Phase},
    backoff::{Backoff, DelayPolicy, MAX_BACKOFF},
    clock::{Clock, MonotonicClock},
    error::ConfigError,
    jitter::Jitter,
    layer::{RetryLayer, RetryService},
    retry::{RetryPolicy, RetryPolicyBuilder},
    sleeper::{BlockingSleeper, InstantSleeper, Sleeper, ThreadSleeper, TokioSleeper},
    stop::{
        AttemptsExhausted, FailureMatches, StopCondition, StopConditionExt, Succeeded,
        TimeExhausted,
    },
};
