//! Delay policies: how long to wait before the next attempt.
//!
//! [`Backoff`] provides the built-in strategies (fixed, linear, exponential
//! with a configurable multiplier and cap); the [`DelayPolicy`] trait lets
//! callers supply history-aware policies of their own. Delay index semantics:
//! index `0` is the initial call (no delay), and the delay before attempt
//! `n + 1` uses index `n`. Delays saturate at a documented maximum to avoid
//! overflow.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use reattempt::Backoff;
//!
//! let backoff = Backoff::exponential(Duration::from_millis(100))
//!     .with_max(Duration::from_secs(2))
//!     .unwrap();
//! assert_eq!(backoff.delay(0), Duration::from_millis(0)); // initial call
//! assert_eq!(backoff.delay(1), Duration::from_millis(100));
//! assert_eq!(backoff.delay(2), Duration::from_millis(200));
//! assert_eq!(backoff.delay(6), Duration::from_secs(2)); // capped
//! ```
//!
//! Overflow behavior: computations that would overflow saturate to
//! `MAX_BACKOFF` (1 day). Indexes greater than `u32::MAX` are clamped when
//! computing multipliers.

use crate::attempt::AttemptLog;
use crate::error::ConfigError;
use std::time::Duration;

/// Maximum delay used when calculations overflow (1 day).
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Computes the wait before the next attempt from the attempt log.
///
/// Implementations are stateless apart from construction-time configuration
/// and must never exceed their configured cap. `Duration` is unsigned, so a
/// negative delay is unrepresentable; zero means retry immediately.
pub trait DelayPolicy<E>: Send + Sync {
    fn next_delay(&self, log: &AttemptLog<E>) -> Duration;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BackoffKind {
    Fixed { delay: Duration },
    Linear { base: Duration, max: Option<Duration> },
    Exponential { base: Duration, multiplier: u32, max: Option<Duration> },
}

/// Built-in delay strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    kind: BackoffKind,
}

impl Backoff {
    /// The same delay before every retry.
    pub fn fixed(delay: Duration) -> Self {
        Self { kind: BackoffKind::Fixed { delay } }
    }

    /// Zero delay: retry immediately. The orchestrator default.
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Delay grows as `base * n` for the n-th retry.
    pub fn linear(base: Duration) -> Self {
        Self { kind: BackoffKind::Linear { base, max: None } }
    }

    /// Delay grows as `base * multiplier^(n-1)` for the n-th retry, with a
    /// default multiplier of 2.
    pub fn exponential(base: Duration) -> Self {
        Self { kind: BackoffKind::Exponential { base, multiplier: 2, max: None } }
    }

    /// Set the exponential growth factor. Must be at least 1; only valid for
    /// exponential backoff.
    pub fn with_multiplier(mut self, multiplier: u32) -> Result<Self, ConfigError> {
        if multiplier == 0 {
            return Err(ConfigError::InvalidMultiplier(multiplier));
        }
        match &mut self.kind {
            BackoffKind::Exponential { multiplier: existing, .. } => {
                *existing = multiplier;
                Ok(self)
            }
            BackoffKind::Fixed { .. } | BackoffKind::Linear { .. } => {
                Err(ConfigError::MultiplierRequiresExponential)
            }
        }
    }

    /// Cap every computed delay (linear or exponential). Errors if called on
    /// a fixed strategy, if `max` is zero, or if `max < base`.
    pub fn with_max(mut self, max: Duration) -> Result<Self, ConfigError> {
        if max.is_zero() {
            return Err(ConfigError::MaxDelayMustBePositive);
        }
        match &mut self.kind {
            BackoffKind::Linear { base, max: existing }
            | BackoffKind::Exponential { base, max: existing, .. } => {
                if max < *base {
                    return Err(ConfigError::MaxDelayLessThanBase { base: *base, max });
                }
                *existing = Some(max);
                Ok(self)
            }
            BackoffKind::Fixed { .. } => Err(ConfigError::FixedDoesNotSupportMax),
        }
    }

    /// Delay for a given index (0-based; 0 = initial call, no delay).
    pub fn delay(&self, index: usize) -> Duration {
        if index == 0 {
            return Duration::ZERO;
        }
        match &self.kind {
            BackoffKind::Fixed { delay } => *delay,
            BackoffKind::Linear { base, max } => {
                let index_u32 = index.min(u32::MAX as usize) as u32; // clamp to prevent truncation
                let linear = base.checked_mul(index_u32).unwrap_or(MAX_BACKOFF);
                let capped = max.map(|m| linear.min(m)).unwrap_or(linear);
                capped.min(MAX_BACKOFF)
            }
            BackoffKind::Exponential { base, multiplier, max } => {
                let exponent = index.saturating_sub(1).min(u32::MAX as usize) as u32;
                let factor = (*multiplier as u128).saturating_pow(exponent);
                let nanos = base.as_nanos().saturating_mul(factor);
                let grown = Duration::from_nanos(nanos.min(MAX_BACKOFF.as_nanos()) as u64);
                let capped = max.map(|m| grown.min(m)).unwrap_or(grown);
                capped.min(MAX_BACKOFF)
            }
        }
    }
}

impl<E> DelayPolicy<E> for Backoff {
    fn next_delay(&self, log: &AttemptLog<E>) -> Duration {
        self.delay(log.len())
    }
}
