//! Jitter strategies to prevent thundering herd.
//!
//! When to use which strategy:
//! - `None`: deterministic retries for tests or tightly controlled workflows.
//! - `Full`: uniform in `[0, delay]`, good default to spread load.
//! - `Equal`: uniform in `[delay/2, delay]`, keeps a floor while adding randomness.
//! - `Decorrelated`: AWS-style decorrelated jitter that grows based on the previous sleep.
//!
//! Notes:
//! - RNG: uses `rand`'s thread-local RNG by default; deterministic RNGs can be injected via `apply_with_rng`.
//! - Precision: millisecond conversions saturate to `u64::MAX` to avoid panics on very large durations.
//! - Decorrelated jitter is stateful; it tracks the previous sleep internally to follow the algorithm.

use crate::error::ConfigError;
use rand::{rng, Rng};
use std::time::Duration;

#[derive(Debug)]
/// Internal state for decorrelated jitter; fields are private to enforce validation.
pub struct DecorrelatedConfig {
    base: Duration,
    max: Duration,
    previous: std::sync::Mutex<Duration>,
}

impl Clone for DecorrelatedConfig {
    fn clone(&self) -> Self {
        let prev = *self.previous.lock().unwrap();
        Self { base: self.base, max: self.max, previous: std::sync::Mutex::new(prev) }
    }
}

/// Jitter strategy for randomizing retry delays.
#[derive(Debug, Clone)]
pub enum Jitter {
    /// No jitter - use the exact computed delay
    None,
    /// Full jitter: random between 0 and delay
    Full,
    /// Equal jitter: random between delay/2 and delay
    Equal,
    /// Decorrelated jitter: AWS-style with state
    Decorrelated(DecorrelatedConfig),
}

impl Jitter {
    /// Create a full jitter strategy
    pub fn full() -> Self {
        Jitter::Full
    }

    /// Create an equal jitter strategy
    pub fn equal() -> Self {
        Jitter::Equal
    }

    /// Create a decorrelated jitter strategy. `base` must not exceed `max`.
    pub fn decorrelated(base: Duration, max: Duration) -> Result<Self, ConfigError> {
        if base > max {
            return Err(ConfigError::JitterBoundsInverted { base, max });
        }

        Ok(Jitter::Decorrelated(DecorrelatedConfig {
            base,
            max,
            previous: std::sync::Mutex::new(base),
        }))
    }

    /// Apply jitter to a delay duration
    pub fn apply(&self, delay: Duration) -> Duration {
        let mut rng = rng();
        self.apply_internal(delay, &mut rng)
    }

    /// Apply jitter with a custom RNG (for testing)
    pub fn apply_with_rng<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        self.apply_internal(delay, rng)
    }

    fn as_millis_saturated(duration: Duration) -> u64 {
        duration.as_millis().try_into().unwrap_or(u64::MAX) // Saturate extremely large durations
    }

    fn apply_internal<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Full => {
                let millis = Self::as_millis_saturated(delay);
                if millis == 0 {
                    return Duration::ZERO;
                }
                let jittered = rng.random_range(0..=millis);
                Duration::from_millis(jittered)
            }
            Jitter::Equal => {
                let millis = Self::as_millis_saturated(delay);
                if millis == 0 {
                    return Duration::ZERO;
                }
                let half = millis / 2;
                let jittered = rng.random_range(half..=millis);
                Duration::from_millis(jittered)
            }
            Jitter::Decorrelated(config) => {
                // Decorrelated jitter: sleep = min(max, random(base, prev_sleep * 3))
                let base_millis = Self::as_millis_saturated(config.base);
                let max_millis = Self::as_millis_saturated(config.max);

                let mut prev = config.previous.lock().unwrap();
                let prev_millis = Self::as_millis_saturated(*prev);

                // upper bound grows from previous sleep, capped by max
                let upper = prev_millis.saturating_mul(3).min(max_millis);
                // lower bound keeps floor at base but never exceeds upper (handles tiny prev)
                let lower = base_millis.min(upper);

                let jittered = rng.random_range(lower..=upper);

                *prev = Duration::from_millis(jittered);
                *prev
            }
        }
    }
}
