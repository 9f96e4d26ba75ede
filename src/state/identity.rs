use crate::screen::screen_model::UiElement;
use crate::state::normalize::{normalize_text, text_fingerprint};

/// Content identity of an element.
///
/// Used to tell whether a scroll revealed anything new, where the source may
/// recycle node identifiers. Elements without a label of their own (row
/// containers whose text lives on child nodes) are keyed by node id as well,
/// otherwise every such row would collapse into one.
pub fn element_key(el: &UiElement) -> String {
    let key = format!(
        "{}|{}|{}|{}|{}|{}",
        el.element_type.as_str(),
        normalize_text(el.text.as_deref()),
        normalize_text(el.description.as_deref()),
        normalize_text(el.hint.as_deref()),
        el.resource_id.as_deref().unwrap_or(""),
        el.class_name
    );
    if el.has_content() {
        key
    } else {
        format!("{key}|#{}", el.id)
    }
}

/// Identifier for a registered element, unique per element on a screen:
/// screen fingerprint, content and node id.
pub fn element_identity(screen_fingerprint: &str, el: &UiElement) -> String {
    let label = el
        .label()
        .unwrap_or("unlabeled")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let digest = text_fingerprint(&format!(
        "{screen_fingerprint}|{}|{}",
        element_key(el),
        el.id
    ));

    format!("{}:{}:{}", el.element_type.as_str(), label, &digest[..12])
}
