use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::router::router_model::{EventPriority, EventType};

/// Router configuration. Everything except the queue size can also be changed
/// at runtime through the router API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Event types that pass the filter stage (default: all)
    pub enabled_event_types: HashSet<EventType>,

    /// Package allow-list; `com.example.*` matches by prefix. Empty admits every package.
    pub package_filters: Vec<String>,

    /// Debounce interval applied to every type without an override (default 1000)
    pub default_debounce_ms: u64,

    /// Per-type debounce intervals
    pub debounce_overrides_ms: HashMap<EventType, u64>,

    /// Bounded queue capacity; the oldest event is evicted when full (default 100)
    pub max_queue_size: usize,

    /// Events of one type per burst window before throttling kicks in (default 10)
    pub burst_threshold: usize,

    /// Burst sliding window length (default 1000)
    pub burst_window_ms: u64,

    /// Priority overrides on top of the built-in mapping
    pub priority_overrides: HashMap<EventType, EventPriority>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enabled_event_types: EventType::ALL.into_iter().collect(),
            package_filters: Vec::new(),
            default_debounce_ms: 1000,
            debounce_overrides_ms: HashMap::new(),
            max_queue_size: 100,
            burst_threshold: 10,
            burst_window_ms: 1000,
            priority_overrides: HashMap::new(),
        }
    }
}
