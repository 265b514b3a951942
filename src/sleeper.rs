//! Abstractions for waiting between attempts.
//!
//! The asynchronous generator suspends via [`Sleeper`]; the synchronous
//! generator blocks via [`BlockingSleeper`]. Both are injectable so tests run
//! without real time delays, and the test doubles implement both traits.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspension-based delay primitive for the asynchronous attempt loop.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Thread-blocking delay primitive for the synchronous attempt loop.
pub trait BlockingSleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper using the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Production blocking sleeper using `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl BlockingSleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Test sleeper that doesn't actually sleep.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async {})
    }
}

impl BlockingSleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) {}
}

/// Test sleeper that records every requested delay without sleeping.
#[derive(Debug, Clone)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self { calls: Arc::new(Mutex::new(Vec::new())) }
    }

    /// All delays requested so far, in order.
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

impl Default for TrackingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.record(duration);
        Box::pin(async {})
    }
}

impl BlockingSleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) {
        self.record(duration);
    }
}
