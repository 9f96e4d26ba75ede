use thiserror::Error;

use crate::router::router_model::RouterState;

/// Errors raised at the `EventRouter` API boundary.
///
/// Queue overflow, filtering, debouncing and throttling are not errors; they
/// only show up in metrics.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Operation not allowed from the router's current lifecycle state
    #[error("invalid router state for {operation}: {state:?}")]
    InvalidState {
        operation: &'static str,
        state: RouterState,
    },

    /// `initialize` was called outside a tokio runtime
    #[error("no tokio runtime available to run the router consumer")]
    NoRuntime,
}

/// Failure reported by a dispatch handler. Isolated per dispatch.
#[derive(Debug, Error)]
#[error("handler {handler} failed: {message}")]
pub struct HandlerError {
    pub handler: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

/// Errors from the element source (the accessibility tree stand-in).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("screen unavailable: {0}")]
    ScreenUnavailable(String),
}

/// An element whose properties cannot be used for classification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("element has no identifier")]
    MissingIdentifier,

    #[error("element {0} has degenerate bounds")]
    DegenerateBounds(String),
}

#[derive(Debug, Error)]
pub enum ExplorationError {
    /// Another session holds the global exploration lock
    #[error("an exploration session is already running")]
    AlreadyRunning,

    /// `explore` called on an engine that already finished a session
    #[error("exploration engine is not idle")]
    NotIdle,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialize error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("invalid app description: {0}")]
    InvalidApp(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("a service context is already installed")]
    AlreadyInstalled,

    #[error(transparent)]
    Router(#[from] RouterError),
}
