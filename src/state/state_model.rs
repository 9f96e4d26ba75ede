use serde::{Deserialize, Serialize};

use crate::screen::screen_model::{ScreenSignature, UiElement};

/// Identity of one screen visit.
///
/// Two screens with the same significant content in the same package and
/// activity share a fingerprint; revisits bump a counter on the stored node
/// instead of creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenState {
    /// 40-char hex SHA-1 over package, activity, title and significant elements
    pub fingerprint: String,

    pub package_name: String,
    pub activity_name: String,
    pub window_title: Option<String>,

    /// Number of significant elements on the screen
    pub element_count: usize,

    /// Content keys of the significant elements, in traversal order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_keys: Vec<String>,
}

/// What the engine saw after settling on a screen.
#[derive(Debug, Clone)]
pub struct Observation {
    pub signature: ScreenSignature,
    pub elements: Vec<UiElement>,
    pub state: ScreenState,
}
