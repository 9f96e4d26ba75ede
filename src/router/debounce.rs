use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::router::router_model::EventType;

/// Tracked keys above which entries older than every interval are dropped.
const PRUNE_THRESHOLD: usize = 256;

/// Last-accepted timestamp per debounce key.
#[derive(Debug, Default)]
pub struct Debouncer {
    last_accepted: HashMap<String, Instant>,
    /// Longest interval seen; older entries can no longer reject anything
    horizon: Duration,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `key` at `now` unless the previous acceptance is closer than `interval`.
    /// Rejections leave the stored timestamp untouched.
    pub fn accept(&mut self, key: &str, interval: Duration, now: Instant) -> bool {
        if let Some(last) = self.last_accepted.get(key) {
            if now.saturating_duration_since(*last) < interval {
                return false;
            }
        }
        self.horizon = self.horizon.max(interval);
        if self.last_accepted.len() >= PRUNE_THRESHOLD {
            let horizon = self.horizon;
            self.last_accepted
                .retain(|_, last| now.saturating_duration_since(*last) < horizon);
        }
        self.last_accepted.insert(key.to_string(), now);
        true
    }

    /// Forget every key, returning how many were tracked.
    pub fn clear(&mut self) -> usize {
        let n = self.last_accepted.len();
        self.last_accepted.clear();
        n
    }
}

/// Sliding-window rate monitor per event type.
#[derive(Debug)]
pub struct BurstDetector {
    windows: HashMap<EventType, VecDeque<Instant>>,
    window: Duration,
    threshold: usize,
}

impl BurstDetector {
    pub fn new(window: Duration, threshold: usize) -> Self {
        Self {
            windows: HashMap::new(),
            window,
            threshold,
        }
    }

    pub fn configure(&mut self, window: Duration, threshold: usize) {
        self.window = window;
        self.threshold = threshold;
    }

    /// Record one event and report whether the type is now bursting
    /// (more than `threshold` events inside the window).
    pub fn record(&mut self, event_type: EventType, now: Instant) -> bool {
        let window = self.window;
        let stamps = self.windows.entry(event_type).or_default();
        prune(stamps, now, window);
        stamps.push_back(now);
        stamps.len() > self.threshold
    }

    pub fn is_bursting(&self, event_type: EventType, now: Instant) -> bool {
        self.windows.get(&event_type).is_some_and(|stamps| {
            stamps
                .iter()
                .filter(|t| now.saturating_duration_since(**t) < self.window)
                .count()
                > self.threshold
        })
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = stamps.front() {
        if now.saturating_duration_since(*front) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}
