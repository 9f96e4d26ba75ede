//! A scripted app described in YAML: screens, their elements, and which
//! screen each element leads to.
//!
//! ```yaml
//! package: com.example.notes
//! start: home
//! screens:
//!   home:
//!     activity: .MainActivity
//!     title: Notes
//!     elements:
//!       - { id: open_settings, type: button, text: Settings, clickable: true, target: settings }
//!   settings:
//!     activity: .SettingsActivity
//!     elements:
//!       - { id: sign_out, type: button, text: Sign out, clickable: true, target: home }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::device::source::{ElementSource, ScreenAction, ScrollDirection};
use crate::error::{ConfigError, SourceError};
use crate::screen::screen_model::{ElementType, ScreenSignature, UiElement};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedElement {
    #[serde(flatten)]
    pub element: UiElement,

    /// Screen id reached by clicking this element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Scrollable list revealing `page_size` items at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedList {
    pub container: UiElement,
    #[serde(default)]
    pub items: Vec<ScriptedElement>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenDescription {
    /// Defaults to the app package; set it to model screens of other apps
    #[serde(default)]
    pub package: Option<String>,
    pub activity: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub elements: Vec<ScriptedElement>,
    #[serde(default)]
    pub list: Option<ScriptedList>,
    /// Screen shown when back is pressed here, instead of the previous one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

impl ScreenDescription {
    pub fn new(activity: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn in_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn element(mut self, element: UiElement) -> Self {
        self.elements.push(ScriptedElement {
            element,
            target: None,
        });
        self
    }

    pub fn link(mut self, element: UiElement, target: impl Into<String>) -> Self {
        self.elements.push(ScriptedElement {
            element: element.clickable(),
            target: Some(target.into()),
        });
        self
    }

    pub fn back_to(mut self, screen: impl Into<String>) -> Self {
        self.back = Some(screen.into());
        self
    }

    pub fn list(mut self, container: UiElement, items: Vec<ScriptedElement>, page_size: usize) -> Self {
        self.list = Some(ScriptedList {
            container: container.scrollable(),
            items,
            page_size: page_size.max(1),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDescription {
    pub package: String,
    pub start: String,
    pub screens: BTreeMap<String, ScreenDescription>,
}

impl AppDescription {
    pub fn new(package: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            start: start.into(),
            screens: BTreeMap::new(),
        }
    }

    pub fn screen(mut self, id: impl Into<String>, screen: ScreenDescription) -> Self {
        self.screens.insert(id.into(), screen);
        self
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: "<inline>".into(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Every click target and the start screen must exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.screens.contains_key(&self.start) {
            return Err(ConfigError::InvalidApp(format!(
                "start screen '{}' is not defined",
                self.start
            )));
        }
        for (id, screen) in &self.screens {
            if let Some(back) = &screen.back {
                if !self.screens.contains_key(back) {
                    return Err(ConfigError::InvalidApp(format!(
                        "screen '{id}': back leads to unknown screen '{back}'"
                    )));
                }
            }
            let items = screen.list.iter().flat_map(|l| l.items.iter());
            for el in screen.elements.iter().chain(items) {
                if let Some(target) = &el.target {
                    if !self.screens.contains_key(target) {
                        return Err(ConfigError::InvalidApp(format!(
                            "screen '{id}': element '{}' targets unknown screen '{target}'",
                            el.element.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    back_stack: Vec<String>,
    list_offsets: HashMap<String, usize>,
    actions: Vec<ScreenAction>,
    unavailable: Vec<String>,
}

/// In-process [`ElementSource`] driven by an [`AppDescription`].
pub struct ScriptedApp {
    app: AppDescription,
    state: Mutex<DeviceState>,
}

impl ScriptedApp {
    pub fn new(app: AppDescription) -> Result<Self, ConfigError> {
        app.validate()?;
        let start = app.start.clone();
        Ok(Self {
            app,
            state: Mutex::new(DeviceState {
                back_stack: vec![start],
                ..Default::default()
            }),
        })
    }

    pub fn package(&self) -> &str {
        &self.app.package
    }

    pub fn current_screen_id(&self) -> String {
        self.lock().back_stack.last().cloned().unwrap_or_default()
    }

    /// Jump to a screen the way a user would (e.g. after logging in manually).
    pub fn navigate_to(&self, screen_id: &str) -> bool {
        if !self.app.screens.contains_key(screen_id) {
            return false;
        }
        let mut state = self.lock();
        state.back_stack.clear();
        state.back_stack.push(screen_id.to_string());
        true
    }

    /// Make scraping fail while the given screen is showing.
    pub fn set_unavailable(&self, screen_id: &str) {
        self.lock().unavailable.push(screen_id.to_string());
    }

    /// Every action performed so far, in order.
    pub fn actions(&self) -> Vec<ScreenAction> {
        self.lock().actions.clone()
    }

    /// Element ids clicked so far, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                ScreenAction::Click { element_id } => Some(element_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn back_presses(&self) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| matches!(a, ScreenAction::Back))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn screen(&self, id: &str) -> Result<&ScreenDescription, SourceError> {
        self.app
            .screens
            .get(id)
            .ok_or_else(|| SourceError::ScreenUnavailable(id.to_string()))
    }

    fn package_of<'a>(&'a self, screen: &'a ScreenDescription) -> &'a str {
        screen.package.as_deref().unwrap_or(&self.app.package)
    }

    fn materialize(&self, el: &UiElement, package: &str, activity: &str) -> UiElement {
        let mut el = el.clone();
        if el.package_name.is_empty() {
            el.package_name = package.to_string();
        }
        if el.class_name.is_empty() {
            el.class_name = default_class(el.element_type, activity);
        }
        el
    }

    fn scrape(&self, screen_id: &str, offset: usize) -> Result<Vec<UiElement>, SourceError> {
        let screen = self.screen(screen_id)?;
        let package = self.package_of(screen);

        let mut elements: Vec<UiElement> = screen
            .elements
            .iter()
            .map(|e| self.materialize(&e.element, package, &screen.activity))
            .collect();

        if let Some(list) = &screen.list {
            let mut container = self.materialize(&list.container, package, &screen.activity);
            container.child_count = list.items.len().min(list.page_size) as u32;
            elements.push(container);
            elements.extend(
                list.items
                    .iter()
                    .skip(offset)
                    .take(list.page_size)
                    .map(|e| {
                        self.materialize(&e.element, package, &screen.activity)
                            .at_depth(list.container.depth + 1)
                    }),
            );
        }

        Ok(elements)
    }

    fn find_target(&self, screen: &ScreenDescription, element_id: &str) -> Option<Option<String>> {
        let items = screen.list.iter().flat_map(|l| l.items.iter());
        screen
            .elements
            .iter()
            .chain(items)
            .find(|e| e.element.id == element_id)
            .map(|e| e.target.clone())
    }
}

fn default_class(element_type: ElementType, _activity: &str) -> String {
    match element_type {
        ElementType::Button => "android.widget.Button",
        ElementType::ImageButton => "android.widget.ImageButton",
        ElementType::Input => "android.widget.EditText",
        ElementType::Text => "android.widget.TextView",
        ElementType::Image => "android.widget.ImageView",
        ElementType::Checkbox => "android.widget.CheckBox",
        ElementType::Switch => "android.widget.Switch",
        ElementType::RadioButton => "android.widget.RadioButton",
        ElementType::Container => "android.widget.FrameLayout",
        ElementType::List => "androidx.recyclerview.widget.RecyclerView",
        ElementType::Unknown => "android.view.View",
    }
    .to_string()
}

#[async_trait]
impl ElementSource for ScriptedApp {
    async fn scrape_current_screen(&self) -> Result<Vec<UiElement>, SourceError> {
        let (screen_id, offset) = {
            let state = self.lock();
            let id = state.back_stack.last().cloned().unwrap_or_default();
            if state.unavailable.contains(&id) {
                return Err(SourceError::ScreenUnavailable(id));
            }
            let offset = state.list_offsets.get(&id).copied().unwrap_or(0);
            (id, offset)
        };
        self.scrape(&screen_id, offset)
    }

    async fn current_screen_signature(&self) -> Result<ScreenSignature, SourceError> {
        let screen_id = self.current_screen_id();
        let screen = self.screen(&screen_id)?;
        Ok(ScreenSignature::new(
            self.package_of(screen),
            screen.activity.clone(),
            screen.title.as_deref(),
        ))
    }

    async fn perform(&self, action: &ScreenAction) -> Result<bool, SourceError> {
        let mut state = self.lock();
        state.actions.push(action.clone());
        let current = state.back_stack.last().cloned().unwrap_or_default();
        let screen = self.screen(&current)?;

        match action {
            ScreenAction::Click { element_id } => match self.find_target(screen, element_id) {
                None => Ok(false),
                Some(None) => Ok(true),
                Some(Some(target)) => {
                    if target != current {
                        state.list_offsets.remove(&target);
                        state.back_stack.push(target);
                    }
                    Ok(true)
                }
            },
            ScreenAction::Back => {
                if state.back_stack.len() > 1 {
                    state.back_stack.pop();
                    if let Some(redirect) = &screen.back {
                        if let Some(top) = state.back_stack.last_mut() {
                            *top = redirect.clone();
                        }
                        state.list_offsets.remove(redirect);
                    }
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            ScreenAction::Scroll {
                container_id,
                direction,
            } => {
                let Some(list) = screen.list.as_ref().filter(|l| &l.container.id == container_id)
                else {
                    return Ok(false);
                };
                let horizontal = list.container.is_horizontal_container();
                let forward = match direction {
                    ScrollDirection::Forward if !horizontal => true,
                    ScrollDirection::Backward if !horizontal => false,
                    ScrollDirection::Left if horizontal => true,
                    ScrollDirection::Right if horizontal => false,
                    _ => return Ok(false),
                };

                let offset = state.list_offsets.entry(current).or_insert(0);
                if forward {
                    if *offset + list.page_size < list.items.len() {
                        *offset += list.page_size;
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                } else if *offset > 0 {
                    *offset = offset.saturating_sub(list.page_size);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES: &str = r#"
package: com.example.notes
start: home
screens:
  home:
    activity: .MainActivity
    title: Notes
    elements:
      - { id: open_settings, type: button, text: Settings, clickable: true, target: settings }
      - { id: banner, type: text, text: Welcome }
  settings:
    activity: .SettingsActivity
    elements:
      - { id: about, type: button, text: About, clickable: true }
"#;

    #[test]
    fn parses_yaml_description() {
        let app = AppDescription::from_yaml(NOTES).expect("valid yaml");
        assert_eq!(app.package, "com.example.notes");
        assert_eq!(app.screens.len(), 2);
        let home = &app.screens["home"];
        assert_eq!(home.elements[0].target.as_deref(), Some("settings"));
        assert_eq!(home.elements[0].element.element_type, ElementType::Button);
        assert!(home.elements[0].element.clickable);
        assert!(home.elements[1].element.enabled);
    }

    #[test]
    fn rejects_unknown_targets() {
        let app = AppDescription::new("p", "a")
            .screen("a", ScreenDescription::new(".A").link(UiElement::new("x", ElementType::Button), "nowhere"));
        assert!(matches!(app.validate(), Err(ConfigError::InvalidApp(_))));
    }

    #[tokio::test]
    async fn click_and_back_walk_the_stack() {
        let app = ScriptedApp::new(AppDescription::from_yaml(NOTES).expect("valid yaml"))
            .expect("valid app");

        assert!(app.click("open_settings").await.expect("click"));
        assert_eq!(app.current_screen_id(), "settings");
        let sig = app.current_screen_signature().await.expect("signature");
        assert_eq!(sig.activity_name, ".SettingsActivity");

        assert!(app.navigate_back().await.expect("back"));
        assert_eq!(app.current_screen_id(), "home");
        assert!(!app.navigate_back().await.expect("back at root"));
        assert!(!app.click("missing").await.expect("click missing"));
        assert_eq!(app.clicks(), vec!["open_settings", "missing"]);
    }

    #[tokio::test]
    async fn back_redirect_replaces_the_previous_screen() {
        let app = ScriptedApp::new(
            AppDescription::new("p", "home")
                .screen(
                    "home",
                    ScreenDescription::new(".Home").link(UiElement::new("promo", ElementType::Button), "promo"),
                )
                .screen("promo", ScreenDescription::new(".Promo").back_to("news"))
                .screen("news", ScreenDescription::new(".News")),
        )
        .expect("valid app");

        assert!(app.click("promo").await.expect("click"));
        assert!(app.navigate_back().await.expect("back"));
        assert_eq!(app.current_screen_id(), "news");
        assert!(!app.navigate_back().await.expect("back at root"));
    }

    #[test]
    fn rejects_unknown_back_redirect() {
        let app = AppDescription::new("p", "a").screen("a", ScreenDescription::new(".A").back_to("nowhere"));
        assert!(matches!(app.validate(), Err(ConfigError::InvalidApp(_))));
    }

    #[tokio::test]
    async fn list_scrolls_in_pages() {
        let items = (0..7)
            .map(|i| ScriptedElement {
                element: UiElement::new(format!("item{i}"), ElementType::Text).with_text(format!("Item {i}")),
                target: None,
            })
            .collect();
        let app = ScriptedApp::new(AppDescription::new("p", "a").screen(
            "a",
            ScreenDescription::new(".A").list(UiElement::new("list", ElementType::List), items, 3),
        ))
        .expect("valid app");

        let first = app.scrape_current_screen().await.expect("scrape");
        assert_eq!(first.len(), 4);

        let fwd = ScreenAction::scroll("list", ScrollDirection::Forward);
        assert!(app.perform(&fwd).await.expect("scroll"));
        assert!(app.perform(&fwd).await.expect("scroll"));
        assert!(!app.perform(&fwd).await.expect("scroll at end"));

        let last = app.scrape_current_screen().await.expect("scrape");
        assert_eq!(last.iter().filter(|e| e.id.starts_with("item")).count(), 1);
    }
}
