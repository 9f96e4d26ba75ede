//! Element classification policy.
//!
//! Pattern matching here is best-effort: false negatives are possible. Where a
//! label is ambiguous the patterns lean towards skipping a safe element rather
//! than clicking a destructive one.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::screen::intent::{LoginAssessment, assess_login};
use crate::screen::screen_model::{ElementType, UiElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerKind {
    Destructive,
    SignOut,
    Payment,
    Reset,
    Publish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFieldKind {
    Password,
    Email,
    LoginButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "detail", rename_all = "snake_case")]
pub enum ElementCategory {
    SafeClickable,
    Dangerous(DangerKind),
    LoginField(LoginFieldKind),
    EditText,
    NonInteractive,
}

impl ElementCategory {
    pub fn is_safe_clickable(&self) -> bool {
        matches!(self, ElementCategory::SafeClickable)
    }
}

static DANGER_PATTERNS: LazyLock<Vec<(DangerKind, Regex)>> = LazyLock::new(|| {
    [
        (
            DangerKind::Destructive,
            r"\b(delete|remove|erase|discard|uninstall|deactivate|close (my )?account|delete (my )?account|trash)\b",
        ),
        (
            DangerKind::SignOut,
            r"\b(sign ?out|log ?out|logoff|log off|switch account)\b",
        ),
        (
            DangerKind::Payment,
            r"\b(purchase|buy|checkout|check out|pay|payment|place order|subscribe|order now|add card)\b",
        ),
        (
            DangerKind::Reset,
            r"\b(reset|factory reset|clear (all )?(data|storage|cache|history)|wipe|format)\b",
        ),
        (
            DangerKind::Publish,
            r"\b(send|post|share|publish|tweet|reply|upload|submit)\b",
        ),
    ]
    .into_iter()
    .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (kind, re)))
    .collect()
});

static LOGIN_ACTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(log ?in|sign ?in|continue with (google|facebook|apple|email))\b").ok());

static EMAIL_FIELD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(e ?mail|username|user name|user id|login id|phone number)\b").ok());

static PASSWORD_FIELD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(password|passcode|pin)\b").ok());

/// Lowercased text/description/hint/resource-id, resource ids split into words.
pub fn match_text(el: &UiElement) -> String {
    let mut parts: Vec<String> = [&el.text, &el.description, &el.hint]
        .into_iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect();

    if let Some(rid) = &el.resource_id {
        parts.push(split_resource_id(rid));
    }

    parts.join(" ")
}

/// `com.app:id/btnDeleteAccount` -> `btn delete account`
fn split_resource_id(rid: &str) -> String {
    let name = rid.rsplit('/').next().unwrap_or(rid);
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push(' ');
        }
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
    }

    out
}

fn is_match(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(text))
}

pub fn danger_kind(el: &UiElement) -> Option<DangerKind> {
    let text = match_text(el);
    if text.is_empty() {
        return None;
    }

    DANGER_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&text))
        .map(|(kind, _)| *kind)
}

fn is_text_input(el: &UiElement) -> bool {
    el.element_type == ElementType::Input
        || el.class_name.contains("EditText")
        || el.class_name.contains("TextField")
}

/// Classify a single element.
///
/// Fails for elements the engine could not act on or register (no identifier,
/// clickable with zero-size bounds); callers skip those and carry on.
pub fn classify_element(el: &UiElement) -> Result<ElementCategory, ClassifyError> {
    if el.id.trim().is_empty() {
        return Err(ClassifyError::MissingIdentifier);
    }
    if el.clickable && el.bounds.is_empty() {
        return Err(ClassifyError::DegenerateBounds(el.id.clone()));
    }

    let text = match_text(el);

    if is_text_input(el) {
        if el.password || is_match(&PASSWORD_FIELD, &text) {
            return Ok(ElementCategory::LoginField(LoginFieldKind::Password));
        }
        if is_match(&EMAIL_FIELD, &text) {
            return Ok(ElementCategory::LoginField(LoginFieldKind::Email));
        }
        return Ok(ElementCategory::EditText);
    }

    if !el.clickable || !el.enabled {
        return Ok(ElementCategory::NonInteractive);
    }

    if let Some(kind) = danger_kind(el) {
        return Ok(ElementCategory::Dangerous(kind));
    }

    if is_match(&LOGIN_ACTION, &text) {
        return Ok(ElementCategory::LoginField(LoginFieldKind::LoginButton));
    }

    // No type filter: clickable rows, cards and menu containers are explored too.
    Ok(ElementCategory::SafeClickable)
}

#[derive(Debug, Clone)]
pub struct ClassifiedElement {
    pub element: UiElement,
    pub category: ElementCategory,
}

/// Classification of every element on one screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenClassification {
    pub elements: Vec<ClassifiedElement>,
    pub skipped: Vec<(UiElement, ClassifyError)>,
    pub login: LoginAssessment,
}

impl ScreenClassification {
    /// Safe clickables in discovery order.
    pub fn safe_clickable(&self) -> impl Iterator<Item = &UiElement> {
        self.elements
            .iter()
            .filter(|c| c.category.is_safe_clickable())
            .map(|c| &c.element)
    }
}

pub fn classify(elements: &[UiElement]) -> ScreenClassification {
    let mut classified = Vec::with_capacity(elements.len());
    let mut skipped = Vec::new();

    for el in elements {
        match classify_element(el) {
            Ok(category) => classified.push(ClassifiedElement {
                element: el.clone(),
                category,
            }),
            Err(e) => skipped.push((el.clone(), e)),
        }
    }

    let login = assess_login(&classified);

    ScreenClassification {
        elements: classified,
        skipped,
        login,
    }
}
