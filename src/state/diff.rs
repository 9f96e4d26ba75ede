use std::collections::HashSet;

use crate::state::state_model::ScreenState;

#[derive(Debug, Default)]
pub struct StateDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl StateDiff {
    /// Jaccard overlap of the two element sets (1.0 when both are empty).
    pub fn similarity(&self) -> f32 {
        let union = self.added.len() + self.removed.len() + self.unchanged.len();
        if union == 0 {
            return 1.0;
        }
        self.unchanged.len() as f32 / union as f32
    }
}

pub fn diff(before: &ScreenState, after: &ScreenState) -> StateDiff {
    let before_keys: HashSet<&String> = before.element_keys.iter().collect();
    let after_keys: HashSet<&String> = after.element_keys.iter().collect();

    StateDiff {
        added: after_keys
            .difference(&before_keys)
            .map(|k| (*k).clone())
            .collect(),
        removed: before_keys
            .difference(&after_keys)
            .map(|k| (*k).clone())
            .collect(),
        unchanged: before_keys
            .intersection(&after_keys)
            .map(|k| (*k).clone())
            .collect(),
    }
}

/// Whether `after` is plausibly the same screen as `before`.
///
/// Live content (feeds, counters) changes fingerprints between visits, so a
/// back navigation counts as restored when package and activity match and most
/// significant elements survived.
pub fn is_similar(before: &ScreenState, after: &ScreenState, min_similarity: f32) -> bool {
    if before.fingerprint == after.fingerprint {
        return true;
    }
    before.package_name == after.package_name
        && before.activity_name == after.activity_name
        && diff(before, after).similarity() >= min_similarity
}
