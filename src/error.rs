//! Configuration errors raised at construction time.
//!
//! A policy that cannot be built correctly fails in `build()` or in the
//! offending constructor, never on the first attempt. Operation failures are
//! not wrapped: `execute`/`execute_blocking` surface the final attempt's
//! original error value.

use std::time::Duration;
use thiserror::Error;

/// Error produced while constructing a stop condition, delay policy, jitter
/// strategy, or retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_attempts` must be greater than zero.
    #[error("max_attempts must be greater than 0 (got {0})")]
    InvalidMaxAttempts(u32),

    /// A retry policy needs a stop condition; there is no implicit default.
    #[error("no stop condition was configured")]
    MissingStopCondition,

    /// `with_max` only applies to strategies whose delay grows.
    #[error("with_max is only valid for linear or exponential backoff")]
    FixedDoesNotSupportMax,

    /// A maximum delay of zero would suppress the strategy entirely.
    #[error("maximum delay must be greater than zero")]
    MaxDelayMustBePositive,

    /// A cap below the base delay can never be satisfied.
    #[error("maximum delay ({max:?}) must be >= base delay ({base:?})")]
    MaxDelayLessThanBase { base: Duration, max: Duration },

    /// An exponential multiplier below 1 would shrink delays instead of
    /// growing them.
    #[error("exponential multiplier must be at least 1 (got {0})")]
    InvalidMultiplier(u32),

    /// Only exponential backoff has a multiplier.
    #[error("with_multiplier is only valid for exponential backoff")]
    MultiplierRequiresExponential,

    /// Decorrelated jitter needs `base <= max`.
    #[error("decorrelated jitter base ({base:?}) must not exceed max ({max:?})")]
    JitterBoundsInverted { base: Duration, max: Duration },
}
