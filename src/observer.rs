//! Resolution observers.
//!
//! Observers are called synchronously on the resolving thread, once per
//! contract visited (dependencies included), so a single top-level
//! `resolve` may produce several events. Keep implementations cheap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::DiError;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Hook for resolution events.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, DiObserver, Injectable, Key, Lifetime, Resolver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl DiObserver for Counter {
///     fn resolving(&self, _key: &Key) {}
///
///     fn resolved(&self, _key: &Key, _lifetime: Lifetime, _elapsed: Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// struct Clock;
/// impl Injectable for Clock {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         Clock
///     }
/// }
///
/// let counter = Arc::new(Counter::default());
/// let mut container = Container::new();
/// container.transient_self::<Clock>().add_observer(counter.clone());
///
/// container.resolve::<Clock>().unwrap();
/// container.resolve::<Clock>().unwrap();
/// assert_eq!(counter.0.load(Ordering::Relaxed), 2);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a contract is looked up in its cache or constructed.
    fn resolving(&self, key: &Key);

    /// Called after a contract resolved, cached or freshly built.
    fn resolved(&self, key: &Key, lifetime: Lifetime, elapsed: Duration);

    /// Called when resolving a registered contract failed.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, lifetime: Lifetime, elapsed: Duration) {
        for observer in &self.observers {
            observer.resolved(key, lifetime, elapsed);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }
}

/// Forwards resolution events to `tracing`.
///
/// Successful resolutions are `trace` events, or `debug` once they take at
/// least the slow threshold. Failures are `warn` events.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    slow_threshold: Option<Duration>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports resolutions slower than `threshold` at debug level.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key) {
        trace!(contract = key.display_name(), "resolving");
    }

    fn resolved(&self, key: &Key, lifetime: Lifetime, elapsed: Duration) {
        match self.slow_threshold {
            Some(threshold) if elapsed >= threshold => {
                debug!(contract = key.display_name(), %lifetime, ?elapsed, "slow resolution");
            }
            _ => trace!(contract = key.display_name(), %lifetime, ?elapsed, "resolved"),
        }
    }

    fn failed(&self, key: &Key, error: &DiError) {
        warn!(contract = key.display_name(), %error, "resolution failed");
    }
}

/// Counts resolutions and failures.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolutions: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful resolutions observed.
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    /// Failed resolutions observed.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Mean time per successful resolution.
    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / count))
    }

    pub fn reset(&self) {
        self.resolutions.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, _lifetime: Lifetime, elapsed: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn failed(&self, _key: &Key, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}
