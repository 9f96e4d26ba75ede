use std::sync::LazyLock;

use regex::Regex;

use crate::screen::screen_model::{ElementType, UiElement};

static CLOCK_TIME: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}:\d{2}(:\d{2})?(\s?[ap]\.?m\.?)?").ok()
});

/// Trim, collapse whitespace and mask clock times.
///
/// Returns an empty string for missing or blank text.
pub fn normalize_text(raw: Option<&str>) -> String {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return String::new();
    };

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match &*CLOCK_TIME {
        Some(re) => re.replace_all(&collapsed, "<time>").into_owned(),
        None => collapsed,
    }
}

/// Significant elements carry content or can be acted on.
///
/// Layout containers and decorative nodes (no text, no description, not
/// clickable, not an input) are noise for screen identity.
pub fn is_significant(el: &UiElement) -> bool {
    if el.clickable || el.scrollable {
        return true;
    }
    if el.element_type.is_layout() {
        return el.has_content();
    }
    el.has_content() || el.element_type == ElementType::Input
}

/// `type:text:description:clickable` with normalized text.
pub fn serialize_element(el: &UiElement) -> String {
    format!(
        "{}:{}:{}:{}",
        el.element_type.as_str(),
        normalize_text(el.text.as_deref()),
        normalize_text(el.description.as_deref()),
        el.clickable
    )
}

pub fn text_fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
