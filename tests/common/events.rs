use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use voiceos_core::error::HandlerError;
use voiceos_core::router::handler::EventHandler;
use voiceos_core::router::router_model::PrioritizedEvent;
use voiceos_core::{EventRouter, EventType, RouterConfig, UiEvent};

pub const PKG: &str = "com.example.mail";

pub fn event(event_type: EventType, class: &str) -> UiEvent {
    UiEvent::new(event_type, PKG, class)
}

pub fn click(class: &str) -> UiEvent {
    event(EventType::ViewClicked, class)
}

/// Config that lets every distinct event through: no debounce, no bursts.
pub fn permissive_config() -> RouterConfig {
    RouterConfig {
        default_debounce_ms: 0,
        burst_threshold: 10_000,
        ..Default::default()
    }
}

pub fn started(config: RouterConfig) -> EventRouter {
    let router = EventRouter::new();
    router.initialize(config).expect("initialize");
    router
}

/// Yield to the consumer task until `cond` holds.
pub async fn settle(cond: impl Fn() -> bool) -> bool {
    for _ in 0..10_000 {
        if cond() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    cond()
}

/// Wait until every submitted event reached a final outcome.
pub async fn drained(router: &EventRouter) -> bool {
    settle(|| {
        let t = router.metrics().totals;
        t.processed + t.filtered + t.debounced + t.dropped == t.received
    })
    .await
}

/// Records the sequence numbers it sees.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<u64>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<u64> {
        self.seen.lock().expect("recorder lock").clone()
    }
}

impl EventHandler for Recorder {
    fn handle(&self, event: &PrioritizedEvent) -> Result<(), HandlerError> {
        self.seen.lock().expect("recorder lock").push(event.sequence);
        Ok(())
    }
}

#[derive(Default)]
pub struct Counter(pub AtomicUsize);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl EventHandler for Counter {
    fn handle(&self, _event: &PrioritizedEvent) -> Result<(), HandlerError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
