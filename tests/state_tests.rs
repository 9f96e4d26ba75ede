use voiceos_core::screen::classifier::{ElementCategory, LoginFieldKind, classify};
use voiceos_core::state::diff::{diff, is_similar};
use voiceos_core::state::state_builder::{DEFAULT_FINGERPRINT_ELEMENTS, build_state, fingerprint};
use voiceos_core::{ElementType, ScreenSignature, UiElement};

fn sig(title: Option<&str>) -> ScreenSignature {
    ScreenSignature::new("com.example.mail", ".FolderActivity", title)
}

fn folder(rows: &[&str]) -> Vec<UiElement> {
    let mut elements = vec![
        UiElement::new("root", ElementType::Container).with_children(2),
        UiElement::new("header", ElementType::Text).with_text("Folder"),
        UiElement::new("list", ElementType::List)
            .with_class("androidx.recyclerview.widget.RecyclerView")
            .scrollable(),
    ];
    elements.extend(
        rows.iter()
            .enumerate()
            .map(|(i, text)| UiElement::new(format!("row{i}"), ElementType::Text).with_text(*text)),
    );
    elements
}

// =========================================================================
// Fingerprint determinism
// =========================================================================

#[test]
fn same_content_same_fingerprint() {
    let a = fingerprint(&sig(None), &folder(&["Lunch", "Invoice"]), DEFAULT_FINGERPRINT_ELEMENTS);
    let b = fingerprint(&sig(None), &folder(&["Lunch", "Invoice"]), DEFAULT_FINGERPRINT_ELEMENTS);
    assert_eq!(a, b);
    assert_eq!(a.len(), 40, "hex SHA-1");
}

#[test]
fn blank_title_equals_missing_title() {
    let a = fingerprint(&sig(None), &folder(&["Lunch"]), DEFAULT_FINGERPRINT_ELEMENTS);
    let b = fingerprint(&sig(Some("   ")), &folder(&["Lunch"]), DEFAULT_FINGERPRINT_ELEMENTS);
    assert_eq!(a, b);
}

#[test]
fn node_ids_and_decorative_containers_do_not_matter() {
    let mut noisy = folder(&["Lunch"]);
    for el in &mut noisy {
        el.id = format!("{}-2", el.id);
    }
    noisy.insert(0, UiElement::new("spacer", ElementType::Container));

    assert_eq!(
        fingerprint(&sig(None), &folder(&["Lunch"]), DEFAULT_FINGERPRINT_ELEMENTS),
        fingerprint(&sig(None), &noisy, DEFAULT_FINGERPRINT_ELEMENTS)
    );
}

#[test]
fn clock_text_is_masked() {
    let mut morning = folder(&["Lunch"]);
    morning.push(UiElement::new("clock", ElementType::Text).with_text("9:41 AM"));
    let mut later = folder(&["Lunch"]);
    later.push(UiElement::new("clock", ElementType::Text).with_text("10:02 am"));

    assert_eq!(
        fingerprint(&sig(None), &morning, DEFAULT_FINGERPRINT_ELEMENTS),
        fingerprint(&sig(None), &later, DEFAULT_FINGERPRINT_ELEMENTS)
    );
}

// =========================================================================
// Fingerprint discrimination
// =========================================================================

#[test]
fn same_shape_different_rows_differ() {
    let inbox = fingerprint(&sig(None), &folder(&["Lunch", "Invoice"]), DEFAULT_FINGERPRINT_ELEMENTS);
    let sent = fingerprint(&sig(None), &folder(&["Re: Lunch", "Report"]), DEFAULT_FINGERPRINT_ELEMENTS);
    assert_ne!(inbox, sent);
}

#[test]
fn clickability_and_activity_are_part_of_identity() {
    let plain = folder(&["Lunch"]);
    let mut clickable = folder(&["Lunch"]);
    clickable[3] = clickable[3].clone().clickable();

    assert_ne!(
        fingerprint(&sig(None), &plain, DEFAULT_FINGERPRINT_ELEMENTS),
        fingerprint(&sig(None), &clickable, DEFAULT_FINGERPRINT_ELEMENTS)
    );

    let other = ScreenSignature::new("com.example.mail", ".SearchActivity", None);
    assert_ne!(
        fingerprint(&sig(None), &plain, DEFAULT_FINGERPRINT_ELEMENTS),
        fingerprint(&other, &plain, DEFAULT_FINGERPRINT_ELEMENTS)
    );
}

#[test]
fn elements_past_the_limit_are_ignored() {
    let a = fingerprint(&sig(None), &folder(&["Lunch", "Invoice"]), 3);
    let b = fingerprint(&sig(None), &folder(&["Lunch", "Other"]), 3);
    assert_eq!(a, b, "only header, list and first row are hashed");
}

// =========================================================================
// ScreenState and diff
// =========================================================================

#[test]
fn state_counts_significant_elements() {
    let state = build_state(&sig(Some("Inbox")), &folder(&["Lunch", "Invoice"]), DEFAULT_FINGERPRINT_ELEMENTS);
    assert_eq!(state.window_title.as_deref(), Some("Inbox"));
    assert_eq!(state.element_count, 4, "header, list, two rows");
    assert_eq!(state.element_keys.len(), 4);
}

#[test]
fn similar_screens_tolerate_small_changes() {
    let before = build_state(&sig(None), &folder(&["a", "b", "c", "d"]), DEFAULT_FINGERPRINT_ELEMENTS);
    let after = build_state(&sig(None), &folder(&["a", "b", "c", "e"]), DEFAULT_FINGERPRINT_ELEMENTS);

    let d = diff(&before, &after);
    assert_eq!(d.added.len(), 1);
    assert_eq!(d.removed.len(), 1);
    assert!(is_similar(&before, &after, 0.5));
    assert!(!is_similar(&before, &after, 0.9));
}

// =========================================================================
// Classification
// =========================================================================

#[test]
fn login_screen_is_detected() {
    let elements = vec![
        UiElement::new("login", ElementType::Button).with_text("Login").clickable(),
        UiElement::new("password", ElementType::Input).password(),
        UiElement::new("email", ElementType::Input).with_hint("email"),
    ];
    let c = classify(&elements);

    assert!(c.login.is_login_screen);
    assert_eq!(c.safe_clickable().count(), 0);
    assert_eq!(
        c.elements.iter().map(|e| e.category).collect::<Vec<_>>(),
        vec![
            ElementCategory::LoginField(LoginFieldKind::LoginButton),
            ElementCategory::LoginField(LoginFieldKind::Password),
            ElementCategory::LoginField(LoginFieldKind::Email),
        ]
    );
}

#[test]
fn clickable_containers_are_traversed() {
    let elements = vec![
        UiElement::new("menu", ElementType::Container)
            .with_children(3)
            .clickable(),
        UiElement::new("note", ElementType::Text).with_text("Read me"),
    ];
    let c = classify(&elements);
    let safe: Vec<&str> = c.safe_clickable().map(|e| e.id.as_str()).collect();
    assert_eq!(safe, vec!["menu"]);
}

#[test]
fn unreadable_elements_are_skipped_not_fatal() {
    let elements = vec![
        UiElement::new("", ElementType::Button).with_text("Ghost").clickable(),
        UiElement::new("ok", ElementType::Button).with_text("OK").clickable(),
    ];
    let c = classify(&elements);
    assert_eq!(c.skipped.len(), 1);
    assert_eq!(c.safe_clickable().count(), 1);

    let copy = c.clone();
    assert_eq!(copy.skipped[0].1, c.skipped[0].1);
    assert_eq!(copy.skipped[0].0.text.as_deref(), Some("Ghost"));
}
