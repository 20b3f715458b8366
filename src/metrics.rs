//! Append-only request timing aggregation.
//!
//! All counters are atomics updated with relaxed ordering after a request
//! completes; nothing here blocks or is read on the dispatch path. Metrics
//! are eventually consistent and extremely cheap to record.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Request counters shared by all connections of a service.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    request_count: AtomicUsize,
    failure_count: AtomicUsize,
    total_latency_ns: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request. 5xx statuses count as failures.
    pub fn record(&self, status: u16, latency: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if status >= 500 {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Mean latency over all recorded requests; zero before the first one.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_counts_and_latency() {
        let m = RequestMetrics::new();
        m.record(200, Duration::from_millis(2));
        m.record(500, Duration::from_millis(4));
        assert_eq!(m.request_count(), 2);
        assert_eq!(m.failure_count(), 1);
        assert_eq!(m.average_latency(), Duration::from_millis(3));
    }
}
