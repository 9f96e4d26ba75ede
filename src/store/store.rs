use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::explorer::nav_graph::{NavigationEdge, RegisteredElement, ScreenNode};

/// Persistence collaborator for exploration results.
///
/// Called from the background sink task, never from the exploration loop
/// itself, so implementations may block on I/O.
pub trait ExplorationStore: Send + Sync {
    fn save_screen_state(&self, node: &ScreenNode) -> Result<(), StoreError>;

    fn increment_visit_count(&self, fingerprint: &str) -> Result<(), StoreError>;

    fn save_edge(&self, edge: &NavigationEdge) -> Result<(), StoreError>;

    fn save_element(&self, element: &RegisteredElement) -> Result<(), StoreError>;

    fn apply(&self, record: &PersistenceRecord) -> Result<(), StoreError> {
        match record {
            PersistenceRecord::Screen(node) => self.save_screen_state(node),
            PersistenceRecord::Visit { fingerprint } => self.increment_visit_count(fingerprint),
            PersistenceRecord::Edge(edge) => self.save_edge(edge),
            PersistenceRecord::Element(element) => self.save_element(element),
        }
    }
}

/// One write, as queued by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum PersistenceRecord {
    Screen(ScreenNode),
    Visit { fingerprint: String },
    Edge(NavigationEdge),
    Element(RegisteredElement),
}
