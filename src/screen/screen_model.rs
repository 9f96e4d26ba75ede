use serde::{Deserialize, Serialize};

/// Kind of UI element as reported by the accessibility tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Button,
    ImageButton,
    Input,
    Text,
    Image,
    Checkbox,
    Switch,
    RadioButton,
    Container,
    List,
    #[default]
    Unknown,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Button => "button",
            ElementType::ImageButton => "image_button",
            ElementType::Input => "input",
            ElementType::Text => "text",
            ElementType::Image => "image",
            ElementType::Checkbox => "checkbox",
            ElementType::Switch => "switch",
            ElementType::RadioButton => "radio_button",
            ElementType::Container => "container",
            ElementType::List => "list",
            ElementType::Unknown => "unknown",
        }
    }

    /// Pure layout types: only significant when they carry content or are clickable.
    pub fn is_layout(&self) -> bool {
        matches!(self, ElementType::Container | ElementType::List)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Immutable snapshot of one accessibility node.
///
/// A new scrape produces new instances; nothing mutates an element after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiElement {
    /// Opaque identifier assigned by the element source
    pub id: String,

    #[serde(rename = "type")]
    pub element_type: ElementType,

    pub text: Option<String>,
    pub description: Option<String>,
    pub hint: Option<String>,
    pub resource_id: Option<String>,

    pub bounds: Bounds,

    pub clickable: bool,
    pub scrollable: bool,
    pub enabled: bool,
    pub checked: bool,
    pub focused: bool,
    pub password: bool,

    pub package_name: String,
    pub class_name: String,

    /// Position in the containment tree (root = 0)
    pub depth: u32,
    pub child_count: u32,
}

impl Default for UiElement {
    fn default() -> Self {
        Self {
            id: String::new(),
            element_type: ElementType::Unknown,
            text: None,
            description: None,
            hint: None,
            resource_id: None,
            bounds: Bounds::new(0, 0, 100, 48),
            clickable: false,
            scrollable: false,
            enabled: true,
            checked: false,
            focused: false,
            password: false,
            package_name: String::new(),
            class_name: String::new(),
            depth: 0,
            child_count: 0,
        }
    }
}

impl UiElement {
    pub fn new(id: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            id: id.into(),
            element_type,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn password(mut self) -> Self {
        self.password = true;
        self
    }

    pub fn with_children(mut self, child_count: u32) -> Self {
        self.child_count = child_count;
        self
    }

    pub fn at_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Best human-readable label: text, then description, then hint.
    pub fn label(&self) -> Option<&str> {
        [&self.text, &self.description, &self.hint]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    pub fn has_content(&self) -> bool {
        self.label().is_some()
    }

    /// Scroll containers that page sideways (pagers, carousels, tab strips).
    pub fn is_horizontal_container(&self) -> bool {
        let class = self.class_name.as_str();
        class.contains("HorizontalScrollView")
            || class.contains("ViewPager")
            || class.contains("TabLayout")
            || (self.element_type == ElementType::List
                && self.bounds.width > self.bounds.height * 3)
    }
}

/// Package, activity and window title of whatever is currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScreenSignature {
    pub package_name: String,
    pub activity_name: String,
    pub window_title: Option<String>,
}

impl ScreenSignature {
    pub fn new(
        package_name: impl Into<String>,
        activity_name: impl Into<String>,
        window_title: Option<&str>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            activity_name: activity_name.into(),
            window_title: window_title.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_text_then_description() {
        let el = UiElement::new("a", ElementType::Button)
            .with_text("  ")
            .with_description("Settings");
        assert_eq!(el.label(), Some("Settings"));

        let el = el.with_text("Open");
        assert_eq!(el.label(), Some("Open"));
    }

    #[test]
    fn horizontal_container_detection() {
        let pager = UiElement::new("p", ElementType::Container)
            .with_class("androidx.viewpager.widget.ViewPager");
        assert!(pager.is_horizontal_container());

        let list = UiElement::new("l", ElementType::List)
            .with_class("androidx.recyclerview.widget.RecyclerView");
        assert!(!list.is_horizontal_container());
    }
}
