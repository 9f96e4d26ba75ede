use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::screen::classifier::ElementCategory;
use crate::screen::screen_model::ElementType;
use crate::state::state_model::ScreenState;

// ============================================================================
// Explorer configuration
// ============================================================================

/// Configuration for autonomous exploration.
///
/// Bounds how deep and how long the engine may run, how hard it scrolls, and
/// how long it waits for the device to settle after each action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Maximum DFS depth from the start screen (default 50)
    pub max_depth: usize,

    /// Hard wall-clock ceiling for a session (default 30 min)
    pub max_exploration_time_ms: u64,

    /// Forward scrolls per vertical container (default 50)
    pub max_scroll_attempts: usize,

    /// Swipes per horizontal container (default 20)
    pub max_swipe_attempts: usize,

    /// Time after a click before the click is declared a no-op (default 5000)
    pub screen_transition_timeout_ms: u64,

    /// Settle delay after every click or back press (default 1000)
    pub transition_settle_ms: u64,

    /// Poll interval while waiting for a transition (default 250)
    pub transition_poll_ms: u64,

    /// Settle delay after every scroll (default 300)
    pub scroll_settle_ms: u64,

    /// Significant elements hashed into a fingerprint (default 30)
    pub fingerprint_element_limit: usize,

    /// Minimum element overlap for a back press to count as restoring the
    /// previous screen (default 0.5)
    pub backtrack_similarity: f32,

    /// Package the engine must stay inside; defaults to the start screen's
    pub target_package: Option<String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            max_exploration_time_ms: 30 * 60 * 1000,
            max_scroll_attempts: 50,
            max_swipe_attempts: 20,
            screen_transition_timeout_ms: 5000,
            transition_settle_ms: 1000,
            transition_poll_ms: 250,
            scroll_settle_ms: 300,
            fingerprint_element_limit: 30,
            backtrack_similarity: 0.5,
            target_package: None,
        }
    }
}

impl ExplorerConfig {
    pub fn max_exploration_time(&self) -> Duration {
        Duration::from_millis(self.max_exploration_time_ms)
    }

    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.screen_transition_timeout_ms)
    }

    pub fn transition_settle(&self) -> Duration {
        Duration::from_millis(self.transition_settle_ms)
    }

    pub fn transition_poll(&self) -> Duration {
        Duration::from_millis(self.transition_poll_ms.max(1))
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

// ============================================================================
// Navigation graph data model
// ============================================================================

/// A screen discovered during exploration.
///
/// Node data is fixed at first discovery; later arrivals at the same
/// fingerprint only bump `visit_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenNode {
    pub state: ScreenState,

    /// DFS depth at first discovery
    pub depth: usize,

    pub visit_count: u32,

    /// Milliseconds since session start
    pub discovered_at_ms: u64,

    pub login_screen: bool,
}

impl ScreenNode {
    pub fn fingerprint(&self) -> &str {
        &self.state.fingerprint
    }
}

/// A click that moved the app from one screen to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub from: String,

    /// Stable identity of the clicked element (see `element_identity`)
    pub element: String,

    pub to: String,

    /// Milliseconds since session start
    pub at_ms: u64,
}

/// Inventory entry for an element seen on a newly discovered screen.
///
/// Dangerous, login and text-input elements are registered but never clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredElement {
    pub identity: String,
    pub screen: String,
    pub element_id: String,
    pub element_type: ElementType,
    pub label: Option<String>,
    pub category: ElementCategory,
}

/// Directed graph of discovered screens and click transitions.
///
/// Nodes keep discovery order; edges keep creation order and may repeat
/// endpoints (convergent paths).
#[derive(Debug, Clone, Default, Serialize)]
pub struct NavigationGraph {
    nodes: Vec<ScreenNode>,

    #[serde(skip)]
    index: HashMap<String, usize>,

    edges: Vec<NavigationEdge>,

    elements: Vec<RegisteredElement>,
}

impl NavigationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly discovered screen. Returns `false` (and only counts a
    /// visit) when the fingerprint is already known.
    pub fn add_screen(&mut self, mut node: ScreenNode) -> bool {
        if self.record_visit(node.fingerprint()).is_some() {
            return false;
        }
        node.visit_count = node.visit_count.max(1);
        self.index
            .insert(node.state.fingerprint.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Increment the visit counter of a known screen.
    pub fn record_visit(&mut self, fingerprint: &str) -> Option<u32> {
        let idx = *self.index.get(fingerprint)?;
        let node = &mut self.nodes[idx];
        node.visit_count += 1;
        Some(node.visit_count)
    }

    pub fn add_edge(&mut self, edge: NavigationEdge) {
        self.edges.push(edge);
    }

    pub fn register_element(&mut self, element: RegisteredElement) {
        self.elements.push(element);
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.index.contains_key(fingerprint)
    }

    pub fn node(&self, fingerprint: &str) -> Option<&ScreenNode> {
        self.index.get(fingerprint).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[ScreenNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[NavigationEdge] {
        &self.edges
    }

    pub fn elements(&self) -> &[RegisteredElement] {
        &self.elements
    }

    pub fn screen_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
