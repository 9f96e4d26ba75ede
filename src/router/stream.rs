use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::warn;

use crate::router::router_model::RoutedEvent;

pub const REPLAY_SIZE: usize = 10;
pub const HISTORY_SIZE: usize = 100;
const CHANNEL_CAPACITY: usize = 256;

/// Fixed-size ring of the most recent records.
#[derive(Debug)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Observable stream of dispatched events with a replay buffer for late subscribers.
pub struct RoutedEventStream {
    tx: broadcast::Sender<RoutedEvent>,
    replay: Mutex<BoundedHistory<RoutedEvent>>,
}

impl RoutedEventStream {
    pub fn new(replay_size: usize) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            replay: Mutex::new(BoundedHistory::new(replay_size)),
        }
    }

    pub fn publish(&self, event: RoutedEvent) {
        // Holding the replay lock while sending keeps subscribe() free of gaps and duplicates.
        let mut replay = self.replay.lock().unwrap_or_else(PoisonError::into_inner);
        replay.push(event.clone());
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> RoutedEventSubscription {
        let replay = self.replay.lock().unwrap_or_else(PoisonError::into_inner);
        RoutedEventSubscription {
            replay: replay.to_vec().into(),
            rx: self.tx.subscribe(),
        }
    }

    pub fn clear(&self) {
        self.replay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for RoutedEventStream {
    fn default() -> Self {
        Self::new(REPLAY_SIZE)
    }
}

pub struct RoutedEventSubscription {
    replay: VecDeque<RoutedEvent>,
    rx: broadcast::Receiver<RoutedEvent>,
}

impl RoutedEventSubscription {
    /// Replayed events first, then live ones. `None` once the router is gone.
    pub async fn next(&mut self) -> Option<RoutedEvent> {
        if let Some(event) = self.replay.pop_front() {
            return Some(event);
        }
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("routed event subscriber lagged, skipped {}", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`next`](Self::next).
    pub fn try_next(&mut self) -> Option<RoutedEvent> {
        if let Some(event) = self.replay.pop_front() {
            return Some(event);
        }
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
