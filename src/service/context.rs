use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::info;

use crate::device::source::ElementSource;
use crate::error::ServiceError;
use crate::explorer::explorer::ExplorationEngine;
use crate::explorer::nav_graph::ExplorerConfig;
use crate::router::config::RouterConfig;
use crate::router::router::EventRouter;
use crate::router::router_model::RouterState;
use crate::store::store::ExplorationStore;

/// Everything one running service owns: the event router, the persistence
/// store, and the lock that keeps exploration sessions exclusive.
///
/// Constructed explicitly and passed by reference; see [`ServiceRegistry`]
/// for the optional "current instance" lookup.
pub struct ServiceContext {
    router: EventRouter,
    store: Arc<dyn ExplorationStore>,
    exploration_lock: Arc<Mutex<()>>,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn ExplorationStore>) -> Self {
        Self {
            router: EventRouter::new(),
            store,
            exploration_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Start the router. Must run inside a tokio runtime.
    pub fn start(&self, config: RouterConfig) -> Result<(), ServiceError> {
        self.router.initialize(config)?;
        info!("service context started");
        Ok(())
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn store(&self) -> Arc<dyn ExplorationStore> {
        self.store.clone()
    }

    /// An engine sharing this context's store and session lock.
    pub fn explorer(&self, source: Arc<dyn ElementSource>, config: ExplorerConfig) -> ExplorationEngine {
        ExplorationEngine::new(source, config)
            .with_store(self.store.clone())
            .with_lock(self.exploration_lock.clone())
    }

    pub fn is_exploring(&self) -> bool {
        self.exploration_lock.try_lock().is_err()
    }

    /// Stop the router; a context that never started is left as is.
    pub fn shutdown(&self) -> Result<(), ServiceError> {
        match self.router.state() {
            RouterState::Ready | RouterState::Paused => {
                self.router.cleanup()?;
                info!("service context shut down");
            }
            _ => {}
        }
        Ok(())
    }
}

/// Holder for the current [`ServiceContext`], with explicit install and
/// teardown. Owned by whoever hosts the service; not a global.
#[derive(Default)]
pub struct ServiceRegistry {
    slot: RwLock<Option<Arc<ServiceContext>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, context: Arc<ServiceContext>) -> Result<(), ServiceError> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(ServiceError::AlreadyInstalled);
        }
        *slot = Some(context);
        Ok(())
    }

    pub fn current(&self) -> Option<Arc<ServiceContext>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove the installed context and shut it down.
    pub fn teardown(&self) -> Result<Option<Arc<ServiceContext>>, ServiceError> {
        let taken = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(context) = &taken {
            context.shutdown()?;
        }
        Ok(taken)
    }
}
