use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::explorer::nav_graph::{NavigationEdge, RegisteredElement, ScreenNode};
use crate::store::store::ExplorationStore;

#[derive(Debug, Default)]
struct Tables {
    screens: Vec<ScreenNode>,
    visits: HashMap<String, u32>,
    edges: Vec<NavigationEdge>,
    elements: Vec<RegisteredElement>,
}

/// Store that keeps everything in memory. Rows keyed by fingerprint; a second
/// save of a known screen is ignored.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn screens(&self) -> Vec<ScreenNode> {
        self.lock().map(|t| t.screens.clone()).unwrap_or_default()
    }

    pub fn visit_count(&self, fingerprint: &str) -> u32 {
        self.lock()
            .ok()
            .and_then(|t| t.visits.get(fingerprint).copied())
            .unwrap_or(0)
    }

    pub fn edges(&self) -> Vec<NavigationEdge> {
        self.lock().map(|t| t.edges.clone()).unwrap_or_default()
    }

    pub fn elements(&self) -> Vec<RegisteredElement> {
        self.lock().map(|t| t.elements.clone()).unwrap_or_default()
    }
}

impl ExplorationStore for InMemoryStore {
    fn save_screen_state(&self, node: &ScreenNode) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.visits.contains_key(node.fingerprint()) {
            return Ok(());
        }
        tables
            .visits
            .insert(node.state.fingerprint.clone(), node.visit_count.max(1));
        tables.screens.push(node.clone());
        Ok(())
    }

    fn increment_visit_count(&self, fingerprint: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        *tables.visits.entry(fingerprint.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn save_edge(&self, edge: &NavigationEdge) -> Result<(), StoreError> {
        self.lock()?.edges.push(edge.clone());
        Ok(())
    }

    fn save_element(&self, element: &RegisteredElement) -> Result<(), StoreError> {
        self.lock()?.elements.push(element.clone());
        Ok(())
    }
}
