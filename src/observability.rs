//! Metrics hooks for cache reads.

use std::time::Duration;

/// Receives hit/miss/error events from the adapter.
///
/// Implement this to forward events to Prometheus, StatsD, etc.
pub trait CacheMetrics: Send + Sync {
    /// A read found content.
    fn record_hit(&self, key: &str, duration: Duration);

    /// A read found nothing.
    fn record_miss(&self, key: &str, duration: Duration);

    /// An operation failed.
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}

    fn record_miss(&self, _key: &str, _duration: Duration) {}
}

/// Writes events to the `log` facade at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("cache hit {} in {:?}", key, duration);
    }

    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("cache miss {} in {:?}", key, duration);
    }

    fn record_error(&self, key: &str, error: &str) {
        warn!("cache error on {}: {}", key, error);
    }
}
