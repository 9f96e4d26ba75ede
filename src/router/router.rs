//! Priority-aware event routing with backpressure.
//!
//! Producers call [`EventRouter::submit`], which never blocks and never fails
//! on a full queue (the oldest event is evicted). A single consumer task pulls
//! events in FIFO order and runs them through filter, debounce and burst
//! detection before dispatching to the handler set for the event type.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::error::RouterError;
use crate::router::config::RouterConfig;
use crate::router::debounce::{BurstDetector, Debouncer};
use crate::router::handler::{EventHandler, HandlerRegistry};
use crate::router::metrics::{MetricsSnapshot, RouterMetrics};
use crate::router::policy::{RoutingPolicy, resolve_handlers};
use crate::router::queue::EventQueue;
use crate::router::router_model::{
    EventPriority, EventType, HandlerName, PrioritizedEvent, RouteOutcome, RoutedEvent,
    RouterState, UiEvent,
};
use crate::router::stream::{
    BoundedHistory, HISTORY_SIZE, REPLAY_SIZE, RoutedEventStream, RoutedEventSubscription,
};

struct Shared {
    state: RwLock<RouterState>,
    paused: AtomicBool,
    shutdown: AtomicBool,
    queue: EventQueue,
    policy: RwLock<RoutingPolicy>,
    debouncer: Mutex<Debouncer>,
    bursts: Mutex<BurstDetector>,
    metrics: RouterMetrics,
    history: Mutex<BoundedHistory<RoutedEvent>>,
    stream: RoutedEventStream,
    handlers: HandlerRegistry,
    sequence: AtomicU64,
}

pub struct EventRouter {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    /// Create an uninitialized router. Handlers may be registered right away.
    pub fn new() -> Self {
        let defaults = RouterConfig::default();
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(RouterState::Uninitialized),
                paused: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                queue: EventQueue::new(defaults.max_queue_size),
                policy: RwLock::new(RoutingPolicy::from_config(&defaults)),
                debouncer: Mutex::new(Debouncer::new()),
                bursts: Mutex::new(BurstDetector::new(
                    Duration::from_millis(defaults.burst_window_ms),
                    defaults.burst_threshold,
                )),
                metrics: RouterMetrics::new(),
                history: Mutex::new(BoundedHistory::new(HISTORY_SIZE)),
                stream: RoutedEventStream::new(REPLAY_SIZE),
                handlers: HandlerRegistry::new(),
                sequence: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Apply `config` and start the consumer task.
    ///
    /// Only valid from `Uninitialized`; must run inside a tokio runtime.
    pub fn initialize(&self, config: RouterConfig) -> Result<(), RouterError> {
        let mut state = self.shared.state_mut();
        if *state != RouterState::Uninitialized {
            return Err(RouterError::InvalidState {
                operation: "initialize",
                state: *state,
            });
        }
        *state = RouterState::Initializing;

        let Ok(runtime) = Handle::try_current() else {
            *state = RouterState::Uninitialized;
            return Err(RouterError::NoRuntime);
        };

        *self.shared.policy_mut() = RoutingPolicy::from_config(&config);
        self.shared.queue.set_capacity(config.max_queue_size);
        self.shared.bursts().configure(
            Duration::from_millis(config.burst_window_ms),
            config.burst_threshold,
        );
        self.shared.shutdown.store(false, Ordering::Release);
        self.shared.paused.store(false, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let handle = runtime.spawn(consume(shared));
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        *state = RouterState::Ready;
        info!(
            queue = config.max_queue_size,
            debounce_ms = config.default_debounce_ms,
            burst = config.burst_threshold,
            "event router ready"
        );
        Ok(())
    }

    /// Admit an event. Never blocks; evicts the oldest event when the queue is full.
    ///
    /// Events submitted before `initialize` or after `cleanup` are ignored.
    pub fn submit(&self, event: UiEvent) {
        let state = self.state();
        if !matches!(state, RouterState::Ready | RouterState::Paused) {
            trace!(?state, "router not accepting events");
            return;
        }

        let event_type = event.event_type;
        let priority = self.shared.policy().priority_for(event_type);
        let sequence = self.shared.sequence.fetch_add(1, Ordering::Relaxed);

        self.shared.metrics.record_received(event_type);

        let queued = PrioritizedEvent {
            event,
            priority,
            submitted_at: Instant::now(),
            sequence,
        };

        if let Some(evicted) = self.shared.queue.push(queued) {
            self.shared.metrics.record_dropped(evicted.event.event_type);
            debug!(seq = evicted.sequence, "queue full, dropped oldest event");
        }
    }

    /// Stop dequeuing. Queued events stay queued; an event already dequeued is dropped.
    pub fn pause(&self) -> Result<(), RouterError> {
        let mut state = self.shared.state_mut();
        if *state != RouterState::Ready {
            return Err(RouterError::InvalidState {
                operation: "pause",
                state: *state,
            });
        }
        self.shared.paused.store(true, Ordering::Release);
        *state = RouterState::Paused;
        info!("event router paused");
        Ok(())
    }

    pub fn resume(&self) -> Result<(), RouterError> {
        let mut state = self.shared.state_mut();
        if *state != RouterState::Paused {
            return Err(RouterError::InvalidState {
                operation: "resume",
                state: *state,
            });
        }
        self.shared.paused.store(false, Ordering::Release);
        *state = RouterState::Ready;
        self.shared.queue.wake();
        info!("event router resumed");
        Ok(())
    }

    /// Stop the consumer and release all state. Pending events are discarded.
    pub fn cleanup(&self) -> Result<(), RouterError> {
        let mut state = self.shared.state_mut();
        if !matches!(*state, RouterState::Ready | RouterState::Paused) {
            return Err(RouterError::InvalidState {
                operation: "cleanup",
                state: *state,
            });
        }

        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.queue.wake();
        if let Some(worker) = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            worker.abort();
        }

        let discarded = self.shared.queue.clear();
        self.shared.debouncer().clear();
        self.shared.bursts().clear();
        self.shared.history().clear();
        self.shared.stream.clear();
        self.shared.handlers.clear();

        *state = RouterState::Shutdown;
        info!(discarded, "event router shut down");
        Ok(())
    }

    pub fn state(&self) -> RouterState {
        *self
            .shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_handler(&self, name: HandlerName, handler: Arc<dyn EventHandler>) {
        self.shared.handlers.register(name, handler);
        debug!(
            handler = %name,
            registered = self.shared.handlers.count(name),
            "handler registered"
        );
    }

    // ---- runtime configuration ----

    pub fn enable_event_type(&self, event_type: EventType) {
        self.shared.policy_mut().enabled_types.insert(event_type);
    }

    pub fn disable_event_type(&self, event_type: EventType) {
        self.shared.policy_mut().enabled_types.remove(&event_type);
    }

    pub fn is_event_type_enabled(&self, event_type: EventType) -> bool {
        self.shared.policy().enabled_types.contains(&event_type)
    }

    pub fn add_package_filter(&self, pattern: &str) -> bool {
        self.shared.policy_mut().add_package_filter(pattern)
    }

    pub fn remove_package_filter(&self, pattern: &str) -> bool {
        self.shared.policy_mut().remove_package_filter(pattern)
    }

    pub fn package_filters(&self) -> Vec<String> {
        self.shared
            .policy()
            .package_filters
            .iter()
            .map(|f| f.pattern())
            .collect()
    }

    pub fn set_debounce_interval(&self, event_type: EventType, interval: Duration) {
        self.shared
            .policy_mut()
            .debounce_overrides
            .insert(event_type, interval);
    }

    pub fn debounce_interval(&self, event_type: EventType) -> Duration {
        self.shared.policy().debounce_interval(event_type)
    }

    /// Forget every last-accepted timestamp so the next event of each key passes.
    pub fn clear_debounce_state(&self) {
        let keys = self.shared.debouncer().clear();
        self.shared.bursts().clear();
        debug!(keys, "debounce state cleared");
    }

    pub fn priority_for(&self, event_type: EventType) -> EventPriority {
        self.shared.policy().priority_for(event_type)
    }

    // ---- observation ----

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn history(&self) -> Vec<RoutedEvent> {
        self.shared.history().to_vec()
    }

    pub fn subscribe(&self) -> RoutedEventSubscription {
        self.shared.stream.subscribe()
    }

    pub fn queue_len(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.shared.queue.capacity()
    }

    pub fn pending_events(&self) -> Vec<PrioritizedEvent> {
        self.shared.queue.snapshot()
    }

    pub fn is_bursting(&self, event_type: EventType) -> bool {
        self.shared.bursts().is_bursting(event_type, Instant::now())
    }
}

impl Drop for EventRouter {
    fn drop(&mut self) {
        if let Some(worker) = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            worker.abort();
        }
    }
}

async fn consume(shared: Arc<Shared>) {
    loop {
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        if shared.paused.load(Ordering::Acquire) {
            shared.queue.wait().await;
            continue;
        }

        let Some(event) = shared.queue.pop() else {
            shared.queue.wait().await;
            continue;
        };

        if shared.paused.load(Ordering::Acquire) {
            trace!(seq = event.sequence, "router paused, dropping dequeued event");
            continue;
        }

        shared.process(event);
        tokio::task::yield_now().await;
    }
    debug!("event router consumer stopped");
}

impl Shared {
    fn process(&self, event: PrioritizedEvent) {
        let started = std::time::Instant::now();
        let event_type = event.event.event_type;

        let interval = {
            let policy = self.policy();
            if let Err(reason) = policy.admit(&event.event) {
                self.metrics.record_filtered(event_type);
                self.history()
                    .push(RoutedEvent::rejected(&event, RouteOutcome::Filtered(reason)));
                trace!(seq = event.sequence, ?reason, "event filtered");
                return;
            }
            policy.debounce_interval(event_type)
        };

        let key = event.event.debounce_key();
        if !self.debouncer().accept(&key, interval, event.submitted_at) {
            self.metrics.record_debounced(event_type);
            self.history()
                .push(RoutedEvent::rejected(&event, RouteOutcome::Debounced));
            trace!(seq = event.sequence, key = %key, "event debounced");
            return;
        }

        // Window transitions are never throttled.
        if event.priority != EventPriority::Critical
            && self.bursts().record(event_type, event.submitted_at)
        {
            self.metrics.record_throttled(event_type);
            self.history()
                .push(RoutedEvent::rejected(&event, RouteOutcome::Throttled));
            trace!(seq = event.sequence, %event_type, "event throttled by burst detection");
            return;
        }

        let handlers = resolve_handlers(event_type);
        let report = self.handlers.dispatch(handlers, &event);
        let latency = started.elapsed();
        self.metrics.record_processed(event_type, latency);

        let routed = RoutedEvent {
            sequence: event.sequence,
            event_type,
            package_name: event.event.package_name,
            class_name: event.event.class_name,
            priority: event.priority,
            outcome: RouteOutcome::Processed,
            handlers: handlers.to_vec(),
            failed_handlers: report.failed,
            latency,
        };

        self.history().push(routed.clone());
        self.stream.publish(routed);
    }

    fn state_mut(&self) -> std::sync::RwLockWriteGuard<'_, RouterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn policy(&self) -> std::sync::RwLockReadGuard<'_, RoutingPolicy> {
        self.policy.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn policy_mut(&self) -> std::sync::RwLockWriteGuard<'_, RoutingPolicy> {
        self.policy.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn debouncer(&self) -> std::sync::MutexGuard<'_, Debouncer> {
        self.debouncer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bursts(&self) -> std::sync::MutexGuard<'_, BurstDetector> {
        self.bursts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn history(&self) -> std::sync::MutexGuard<'_, BoundedHistory<RoutedEvent>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
