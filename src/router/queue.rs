use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

use crate::router::router_model::PrioritizedEvent;

/// Bounded FIFO with drop-oldest admission.
///
/// `push` never blocks on capacity and never fails: when full, the oldest
/// queued event is evicted and returned. The lock is only held for the
/// deque operation itself.
pub struct EventQueue {
    items: Mutex<VecDeque<PrioritizedEvent>>,
    capacity: AtomicUsize,
    notify: Notify,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: AtomicUsize::new(capacity),
            notify: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Shrinking below the current length evicts the oldest events.
    pub fn set_capacity(&self, capacity: usize) -> Vec<PrioritizedEvent> {
        let capacity = capacity.max(1);
        self.capacity.store(capacity, Ordering::Release);

        let mut items = self.lock();
        let excess = items.len().saturating_sub(capacity);
        items.drain(..excess).collect()
    }

    /// Enqueue, returning the evicted event when the queue was full.
    pub fn push(&self, event: PrioritizedEvent) -> Option<PrioritizedEvent> {
        let evicted = {
            let mut items = self.lock();
            let evicted = if items.len() >= self.capacity() {
                items.pop_front()
            } else {
                None
            };
            items.push_back(event);
            evicted
        };
        self.notify.notify_one();
        evicted
    }

    pub fn pop(&self) -> Option<PrioritizedEvent> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Queued events, oldest first.
    pub fn snapshot(&self) -> Vec<PrioritizedEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) -> usize {
        let mut items = self.lock();
        let n = items.len();
        items.clear();
        n
    }

    /// Wake the consumer (new event, resume or shutdown).
    pub fn wake(&self) {
        self.notify.notify_one();
    }

    /// Wait for the next wake-up. A wake issued while nobody waits is kept.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<PrioritizedEvent>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
