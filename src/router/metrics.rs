use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::router::router_model::EventType;

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    processed: AtomicU64,
    filtered: AtomicU64,
    debounced: AtomicU64,
    throttled: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            debounced: self.debounced.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub received: u64,
    pub processed: u64,
    pub filtered: u64,
    /// Includes throttled events
    pub debounced: u64,
    pub throttled: u64,
    /// Evicted by drop-oldest admission
    pub dropped: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub totals: CounterSnapshot,
    pub per_type: BTreeMap<EventType, CounterSnapshot>,
    pub average_latency_us: u64,
}

impl MetricsSnapshot {
    pub fn for_type(&self, event_type: EventType) -> CounterSnapshot {
        self.per_type.get(&event_type).copied().unwrap_or_default()
    }

    pub fn average_latency(&self) -> Duration {
        Duration::from_micros(self.average_latency_us)
    }
}

/// Lock-free router counters.
///
/// Written by the consumer (and by `submit` for received/dropped), readable
/// from any thread at any time.
#[derive(Debug)]
pub struct RouterMetrics {
    totals: Counters,
    per_type: [Counters; EventType::COUNT],
    latency_total_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl Default for RouterMetrics {
    fn default() -> Self {
        Self {
            totals: Counters::default(),
            per_type: std::array::from_fn(|_| Counters::default()),
            latency_total_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self, event_type: EventType, pick: impl Fn(&Counters) -> &AtomicU64) {
        pick(&self.totals).fetch_add(1, Ordering::Relaxed);
        pick(&self.per_type[event_type.index()]).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self, event_type: EventType) {
        self.bump(event_type, |c| &c.received);
    }

    pub fn record_dropped(&self, event_type: EventType) {
        self.bump(event_type, |c| &c.dropped);
    }

    pub fn record_filtered(&self, event_type: EventType) {
        self.bump(event_type, |c| &c.filtered);
    }

    pub fn record_debounced(&self, event_type: EventType) {
        self.bump(event_type, |c| &c.debounced);
    }

    pub fn record_throttled(&self, event_type: EventType) {
        self.bump(event_type, |c| &c.debounced);
        self.bump(event_type, |c| &c.throttled);
    }

    pub fn record_processed(&self, event_type: EventType, latency: Duration) {
        self.bump(event_type, |c| &c.processed);
        self.latency_total_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        let average_latency_us = if samples == 0 {
            0
        } else {
            self.latency_total_us.load(Ordering::Relaxed) / samples
        };

        MetricsSnapshot {
            totals: self.totals.snapshot(),
            per_type: EventType::ALL
                .iter()
                .map(|t| (*t, self.per_type[t.index()].snapshot()))
                .collect(),
            average_latency_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_counts_as_debounced() {
        let m = RouterMetrics::new();
        m.record_received(EventType::ViewScrolled);
        m.record_throttled(EventType::ViewScrolled);
        m.record_debounced(EventType::ViewClicked);

        let snap = m.snapshot();
        assert_eq!(snap.totals.debounced, 2);
        assert_eq!(snap.totals.throttled, 1);
        assert_eq!(snap.for_type(EventType::ViewScrolled).debounced, 1);
        assert_eq!(snap.for_type(EventType::ViewClicked).throttled, 0);
    }

    #[test]
    fn average_latency() {
        let m = RouterMetrics::new();
        assert_eq!(m.snapshot().average_latency(), Duration::ZERO);
        m.record_processed(EventType::ViewClicked, Duration::from_micros(100));
        m.record_processed(EventType::ViewClicked, Duration::from_micros(300));
        assert_eq!(m.snapshot().average_latency_us, 200);
    }
}
