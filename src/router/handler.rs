use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::error::HandlerError;
use crate::router::router_model::{HandlerName, PrioritizedEvent};

/// Dispatch target. Expected to return quickly; no acknowledgement required.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &PrioritizedEvent) -> Result<(), HandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&PrioritizedEvent) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &PrioritizedEvent) -> Result<(), HandlerError> {
        self(event)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub invoked: Vec<HandlerName>,
    pub failed: Vec<HandlerName>,
}

/// Named handler sets.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<HandlerName, Vec<Arc<dyn EventHandler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: HandlerName, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name)
            .or_default()
            .push(handler);
    }

    pub fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn count(&self, name: HandlerName) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
            .map_or(0, Vec::len)
    }

    /// Invoke every handler registered under `names`.
    ///
    /// An error or panic in one handler is logged and recorded; the remaining
    /// handlers still run.
    pub fn dispatch(&self, names: &[HandlerName], event: &PrioritizedEvent) -> DispatchReport {
        let mut report = DispatchReport::default();

        for name in names {
            let targets: Vec<Arc<dyn EventHandler>> = self
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .cloned()
                .unwrap_or_default();

            if targets.is_empty() {
                continue;
            }
            report.invoked.push(*name);

            let mut failed = false;
            for handler in targets {
                match catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(handler = %name, seq = event.sequence, "handler failed: {}", e);
                        failed = true;
                    }
                    Err(_) => {
                        warn!(handler = %name, seq = event.sequence, "handler panicked");
                        failed = true;
                    }
                }
            }
            if failed {
                report.failed.push(*name);
            }
        }

        report
    }
}
