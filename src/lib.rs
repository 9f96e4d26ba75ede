//! Accessibility event routing and depth-first app exploration.
//!
//! Two cores share one data model: the [`EventRouter`] turns a firehose of
//! UI events into filtered, debounced, prioritized dispatches, and the
//! [`ExplorationEngine`] walks an app's screens, keyed by content
//! fingerprints, to build a navigation graph.

pub mod cli;
pub mod device;
pub mod error;
pub mod explorer;
pub mod report;
pub mod router;
pub mod screen;
pub mod service;
pub mod state;
pub mod store;

pub use device::source::{ElementSource, ScreenAction, ScrollDirection};
pub use error::{
    ClassifyError, ConfigError, ExplorationError, HandlerError, RouterError, ServiceError,
    SourceError, StoreError,
};
pub use explorer::control::{ExplorationHandle, ExplorationState};
pub use explorer::explorer::{ExplorationEngine, ExplorationResult, ExplorationStats, ExplorationStatus};
pub use explorer::nav_graph::{ExplorerConfig, NavigationEdge, NavigationGraph};
pub use router::config::RouterConfig;
pub use router::router::EventRouter;
pub use router::router_model::{EventPriority, EventType, RouteOutcome, RouterState, UiEvent};
pub use screen::screen_model::{Bounds, ElementType, ScreenSignature, UiElement};
pub use service::context::{ServiceContext, ServiceRegistry};
