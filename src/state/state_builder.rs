use crate::screen::screen_model::{ScreenSignature, UiElement};
use crate::state::identity::element_key;
use crate::state::normalize::{is_significant, normalize_text, serialize_element, text_fingerprint};
use crate::state::state_model::{Observation, ScreenState};

/// Number of significant elements folded into the fingerprint.
pub const DEFAULT_FINGERPRINT_ELEMENTS: usize = 30;

const FIELD_SEPARATOR: &str = "\u{1f}";
const ELEMENT_SEPARATOR: &str = "|";

/// Content-inclusive screen fingerprint.
///
/// `sha1(package + activity + title + first N significant elements)` where each
/// element is serialized as `type:text:description:clickable`. Structural
/// attributes alone (class names, resource ids) are deliberately left out:
/// list screens built from the same layout differ only by their content.
pub fn fingerprint(signature: &ScreenSignature, elements: &[UiElement], limit: usize) -> String {
    let content = elements
        .iter()
        .filter(|el| is_significant(el))
        .take(limit)
        .map(serialize_element)
        .collect::<Vec<_>>()
        .join(ELEMENT_SEPARATOR);

    let title = normalize_text(signature.window_title.as_deref());
    let material = [
        signature.package_name.trim(),
        signature.activity_name.trim(),
        title.as_str(),
        content.as_str(),
    ]
    .join(FIELD_SEPARATOR);

    text_fingerprint(&material)
}

pub fn build_state(signature: &ScreenSignature, elements: &[UiElement], limit: usize) -> ScreenState {
    let element_keys: Vec<String> = elements
        .iter()
        .filter(|el| is_significant(el))
        .map(element_key)
        .collect();

    ScreenState {
        fingerprint: fingerprint(signature, elements, limit),
        package_name: signature.package_name.clone(),
        activity_name: signature.activity_name.clone(),
        window_title: signature
            .window_title
            .clone()
            .filter(|t| !t.trim().is_empty()),
        element_count: element_keys.len(),
        element_keys,
    }
}

pub fn observe(signature: ScreenSignature, elements: Vec<UiElement>, limit: usize) -> Observation {
    let state = build_state(&signature, &elements, limit);
    Observation {
        signature,
        elements,
        state,
    }
}
