use std::sync::Arc;

use voiceos_core::device::scripted::{AppDescription, ScreenDescription, ScriptedApp, ScriptedElement};
use voiceos_core::{Bounds, ElementType, ExplorerConfig, UiElement};

pub const APP: &str = "com.example.mail";

pub fn button(id: &str, text: &str) -> UiElement {
    UiElement::new(id, ElementType::Button).with_text(text).clickable()
}

pub fn label(id: &str, text: &str) -> UiElement {
    UiElement::new(id, ElementType::Text).with_text(text)
}

pub fn row(id: &str, text: &str) -> ScriptedElement {
    ScriptedElement {
        element: label(id, text),
        target: None,
    }
}

pub fn link_row(id: &str, text: &str, target: &str) -> ScriptedElement {
    ScriptedElement {
        element: label(id, text).clickable(),
        target: Some(target.to_string()),
    }
}

pub fn scripted(app: AppDescription) -> Arc<ScriptedApp> {
    Arc::new(ScriptedApp::new(app).expect("valid scripted app"))
}

/// Short waits so no-op clicks don't dominate virtual time.
pub fn fast_config() -> ExplorerConfig {
    ExplorerConfig {
        transition_settle_ms: 100,
        screen_transition_timeout_ms: 500,
        transition_poll_ms: 50,
        scroll_settle_ms: 10,
        ..Default::default()
    }
}

// ============================================================================
// Screen graphs
// ============================================================================

/// home -> {settings -> about, profile}; acyclic, no dangerous elements.
pub fn tree_app() -> AppDescription {
    AppDescription::new(APP, "home")
        .screen(
            "home",
            ScreenDescription::new(".MainActivity")
                .title("Mail")
                .element(label("welcome", "Welcome back"))
                .link(button("open_settings", "Settings"), "settings")
                .link(button("open_profile", "Profile"), "profile"),
        )
        .screen(
            "settings",
            ScreenDescription::new(".SettingsActivity")
                .title("Settings")
                .link(button("open_about", "About"), "about"),
        )
        .screen(
            "profile",
            ScreenDescription::new(".ProfileActivity")
                .title("Profile")
                .element(label("name", "Ada Lovelace")),
        )
        .screen(
            "about",
            ScreenDescription::new(".AboutActivity")
                .title("About")
                .element(label("version", "Version 2.4")),
        )
}

/// a -> b -> a
pub fn cyclic_app() -> AppDescription {
    AppDescription::new(APP, "a")
        .screen(
            "a",
            ScreenDescription::new(".InboxActivity")
                .title("Inbox")
                .link(button("to_b", "Open folder"), "b"),
        )
        .screen(
            "b",
            ScreenDescription::new(".FolderActivity")
                .title("Folder")
                .link(button("to_a", "Inbox"), "a"),
        )
}

/// One screen: three safe buttons that lead nowhere and two destructive ones.
pub fn dangerous_app() -> AppDescription {
    AppDescription::new(APP, "account").screen(
        "account",
        ScreenDescription::new(".AccountActivity")
            .title("Account")
            .element(button("refresh", "Refresh"))
            .element(button("delete_account", "Delete account"))
            .element(button("sort", "Sort by date"))
            .element(button("sign_out", "Sign out"))
            .element(button("help", "Help")),
    )
}

/// Starts on a login screen; `inbox` is reachable once the user logs in.
pub fn login_app() -> AppDescription {
    AppDescription::new(APP, "login")
        .screen(
            "login",
            ScreenDescription::new(".LoginActivity")
                .element(button("login", "Login"))
                .element(UiElement::new("password", ElementType::Input).password())
                .element(UiElement::new("email", ElementType::Input).with_hint("email")),
        )
        .screen(
            "inbox",
            ScreenDescription::new(".InboxActivity")
                .title("Inbox")
                .link(button("compose", "Compose"), "compose"),
        )
        .screen(
            "compose",
            ScreenDescription::new(".ComposeActivity").element(label("draft", "New message")),
        )
}

/// Three folder screens with the same layout (header + list) and different rows.
pub fn lookalike_app() -> AppDescription {
    let folder = |rows: &[&str]| {
        ScreenDescription::new(".FolderActivity")
            .element(label("header", "Folder"))
            .list(
                UiElement::new("rows", ElementType::List)
                    .with_class("androidx.recyclerview.widget.RecyclerView"),
                rows.iter()
                    .enumerate()
                    .map(|(i, text)| row(&format!("row{i}"), text))
                    .collect(),
                10,
            )
    };

    AppDescription::new(APP, "home")
        .screen(
            "home",
            ScreenDescription::new(".MainActivity")
                .link(button("inbox", "Inbox"), "inbox")
                .link(button("sent", "Sent"), "sent")
                .link(button("drafts", "Drafts"), "drafts"),
        )
        .screen("inbox", folder(&["Lunch on Friday?", "Invoice #42"]))
        .screen("sent", folder(&["Re: Lunch", "Quarterly report"]))
        .screen("drafts", folder(&["Unfinished thoughts", "Todo list"]))
}

/// A feed whose rows only become visible after scrolling; each opens a detail screen.
pub fn feed_app(rows: usize, page_size: usize) -> AppDescription {
    let items = (0..rows)
        .map(|i| link_row(&format!("item{i}"), &format!("Story {i}"), &format!("detail{i}")))
        .collect();

    let mut app = AppDescription::new(APP, "feed").screen(
        "feed",
        ScreenDescription::new(".FeedActivity")
            .title("Feed")
            .list(UiElement::new("stories", ElementType::List), items, page_size),
    );
    for i in 0..rows {
        app = app.screen(
            format!("detail{i}"),
            ScreenDescription::new(".StoryActivity")
                .title(format!("Story {i}"))
                .element(label("body", "Lorem ipsum")),
        );
    }
    app
}

/// home links out to a browser (another package) and to settings.
pub fn leaky_app() -> AppDescription {
    AppDescription::new(APP, "home")
        .screen(
            "home",
            ScreenDescription::new(".MainActivity")
                .title("Mail")
                .link(button("open_link", "Open website"), "web")
                .link(button("open_settings", "Settings"), "settings"),
        )
        .screen(
            "web",
            ScreenDescription::new("org.chromium.chrome.browser.ChromeTabbedActivity")
                .in_package("com.android.chrome")
                .element(label("url", "https://example.com")),
        )
        .screen(
            "settings",
            ScreenDescription::new(".SettingsActivity").title("Settings"),
        )
}

/// s0 -> s1 -> ... -> s{n-1}
pub fn chain_app(n: usize) -> AppDescription {
    let mut app = AppDescription::new(APP, "s0");
    for i in 0..n {
        let mut screen = ScreenDescription::new(".StepActivity").title(format!("Step {i}"));
        if i + 1 < n {
            screen = screen.link(button("next", "Next"), format!("s{}", i + 1));
        }
        app = app.screen(format!("s{i}"), screen);
    }
    app
}

/// Contact rows are containers whose names live on child nodes.
pub fn contacts_app() -> AppDescription {
    let mut home = ScreenDescription::new(".ContactsActivity").title("Contacts");
    for i in 1..=3 {
        home = home.link(
            UiElement::new(format!("r{i}"), ElementType::Container).with_children(2),
            format!("contact{i}"),
        );
    }

    let mut app = AppDescription::new(APP, "home").screen("home", home);
    for i in 1..=3 {
        app = app.screen(
            format!("contact{i}"),
            ScreenDescription::new(".ContactActivity")
                .title(format!("Contact {i}"))
                .element(label("phone", "Mobile")),
        );
    }
    app
}

/// Back from `promo` lands on `news` rather than on `home`.
pub fn redirect_app() -> AppDescription {
    AppDescription::new(APP, "home")
        .screen(
            "home",
            ScreenDescription::new(".MainActivity")
                .title("Mail")
                .link(button("open_promo", "See offer"), "promo")
                .link(button("open_settings", "Settings"), "settings"),
        )
        .screen(
            "promo",
            ScreenDescription::new(".PromoActivity")
                .title("Offer")
                .back_to("news"),
        )
        .screen(
            "news",
            ScreenDescription::new(".NewsActivity")
                .title("News")
                .link(button("open_settings", "Settings"), "settings"),
        )
        .screen(
            "settings",
            ScreenDescription::new(".SettingsActivity").title("Settings"),
        )
}

/// A horizontal pager showing `page_size` cards at a time.
pub fn carousel_app(cards: usize, page_size: usize) -> AppDescription {
    let items = (0..cards)
        .map(|i| link_row(&format!("card{i}"), &format!("Card {i}"), &format!("detail{i}")))
        .collect();

    let mut app = AppDescription::new(APP, "home").screen(
        "home",
        ScreenDescription::new(".MainActivity").title("Highlights").list(
            UiElement::new("pager", ElementType::List).with_class("androidx.viewpager.widget.ViewPager"),
            items,
            page_size,
        ),
    );
    for i in 0..cards {
        app = app.screen(
            format!("detail{i}"),
            ScreenDescription::new(".CardActivity")
                .title(format!("Card {i}"))
                .element(label("body", "Lorem ipsum")),
        );
    }
    app
}

/// One clickable element with zero-size bounds next to a working link.
pub fn ghost_app() -> AppDescription {
    let mut ghost = button("ghost", "Ghost");
    ghost.bounds = Bounds::new(0, 0, 0, 0);

    AppDescription::new(APP, "home")
        .screen(
            "home",
            ScreenDescription::new(".MainActivity")
                .title("Mail")
                .element(ghost)
                .link(button("open_settings", "Settings"), "settings"),
        )
        .screen(
            "settings",
            ScreenDescription::new(".SettingsActivity").title("Settings"),
        )
}
