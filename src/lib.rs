#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # reattempt
//!
//! A retry harness for sync and async Rust: wrap a fallible operation and
//! re-execute it under a composable stop condition and delay policy until it
//! succeeds, the condition fires, or the caller abandons the call.
//!
//! ## Features
//!
//! - **Stop conditions** (attempts-exhausted, time-exhausted, outcome-based)
//!   composable with `or`/`and`/`not`
//! - **Delay policies** (fixed, linear, exponential with multiplier and cap)
//!   plus jitter strategies to avoid thundering herds
//! - **Two attempt generators** sharing one decision engine: a blocking loop
//!   for sync call sites and a suspension-based loop for async ones
//! - **Injectable clock and sleepers** so time-based behavior is testable
//!   without wall-clock waits
//! - **Tower middleware** for service-shaped call sites
//!
//! ## Quick Start
//!
//! ```rust
//! use reattempt::stop::{AttemptsExhausted, StopConditionExt, TimeExhausted};
//! use reattempt::{Backoff, Jitter, RetryPolicy};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct ConnReset;
//! impl std::fmt::Display for ConnReset {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "connection reset")
//!     }
//! }
//! impl std::error::Error for ConnReset {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::<ConnReset>::builder()
//!     // Stop after 5 attempts or 30 seconds, whichever comes first.
//!     .stop(AttemptsExhausted::new(5).unwrap().or(TimeExhausted::new(Duration::from_secs(30))))
//!     .delay(Backoff::exponential(Duration::from_millis(100)))
//!     .with_jitter(Jitter::full())
//!     .build()
//!     .unwrap();
//!
//! let result = policy.execute(|| async { Ok::<_, ConnReset>("payload") }).await;
//! assert_eq!(result.unwrap(), "payload");
//! # });
//! ```
//!
//! Synchronous call sites use the same policy through
//! [`execute_blocking`](RetryPolicy::execute_blocking):
//!
//! ```rust
//! use reattempt::stop::AttemptsExhausted;
//! use reattempt::RetryPolicy;
//!
//! let policy = RetryPolicy::<std::io::Error>::builder()
//!     .stop(AttemptsExhausted::new(3).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let value = policy.execute_blocking(|| Ok::<_, std::io::Error>(7)).unwrap();
//! assert_eq!(value, 7);
//! ```

pub mod attempt;
pub mod backoff;
pub mod clock;
pub mod error;
pub mod jitter;
pub mod layer;
pub mod prelude;
pub mod retry;
pub mod sleeper;
pub mod stop;

// Re-exports
pub use attempt::{AttemptLog, AttemptState, Phase};
pub use backoff::{Backoff, DelayPolicy, MAX_BACKOFF};
pub use clock::{Clock, MonotonicClock};
pub use error::ConfigError;
pub use jitter::Jitter;
pub use layer::{RetryLayer, RetryService};
pub use retry::{RetryPolicy, RetryPolicyBuilder};
pub use sleeper::{
    BlockingSleeper, InstantSleeper, Sleeper, ThreadSleeper, TokioSleeper, TrackingSleeper,
};
pub use stop::{StopCondition, StopConditionExt};
