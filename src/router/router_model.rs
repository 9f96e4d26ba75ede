use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Accessibility event kinds the router understands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    WindowStateChanged,
    WindowContentChanged,
    ViewClicked,
    ViewLongClicked,
    ViewFocused,
    ViewSelected,
    ViewScrolled,
    ViewTextChanged,
    NotificationStateChanged,
    Announcement,
    Other,
}

impl EventType {
    pub const COUNT: usize = 11;

    pub const ALL: [EventType; EventType::COUNT] = [
        EventType::WindowStateChanged,
        EventType::WindowContentChanged,
        EventType::ViewClicked,
        EventType::ViewLongClicked,
        EventType::ViewFocused,
        EventType::ViewSelected,
        EventType::ViewScrolled,
        EventType::ViewTextChanged,
        EventType::NotificationStateChanged,
        EventType::Announcement,
        EventType::Other,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::WindowStateChanged => "window_state_changed",
            EventType::WindowContentChanged => "window_content_changed",
            EventType::ViewClicked => "view_clicked",
            EventType::ViewLongClicked => "view_long_clicked",
            EventType::ViewFocused => "view_focused",
            EventType::ViewSelected => "view_selected",
            EventType::ViewScrolled => "view_scrolled",
            EventType::ViewTextChanged => "view_text_changed",
            EventType::NotificationStateChanged => "notification_state_changed",
            EventType::Announcement => "announcement",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventPriority {
    Critical,
    High,
    Normal,
    Low,
}

/// Raw event as handed over by the platform adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    pub event_type: EventType,
    pub package_name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
}

impl UiEvent {
    pub fn new(
        event_type: EventType,
        package_name: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            package_name: package_name.into(),
            class_name: class_name.into(),
            text: None,
            source_id: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// `package:class:type`, the identity used for debouncing.
    pub fn debounce_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.package_name,
            self.class_name,
            self.event_type.as_str()
        )
    }
}

/// An event admitted to the queue. Priority is fixed at submission.
#[derive(Debug, Clone)]
pub struct PrioritizedEvent {
    pub event: UiEvent,
    pub priority: EventPriority,
    pub submitted_at: Instant,
    /// Monotonic submission counter
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerName {
    Scrape,
    Command,
    Monitor,
}

impl fmt::Display for HandlerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerName::Scrape => "scrape",
            HandlerName::Command => "command",
            HandlerName::Monitor => "monitor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    TypeDisabled,
    PackageExcluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum RouteOutcome {
    Processed,
    Filtered(FilterReason),
    Debounced,
    /// Rejected by burst detection; counted as debounced
    Throttled,
}

/// Record of one routing decision.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedEvent {
    pub sequence: u64,
    pub event_type: EventType,
    pub package_name: String,
    pub class_name: String,
    pub priority: EventPriority,
    pub outcome: RouteOutcome,
    pub handlers: Vec<HandlerName>,
    pub failed_handlers: Vec<HandlerName>,
    #[serde(with = "duration_micros")]
    pub latency: Duration,
}

impl RoutedEvent {
    pub fn rejected(event: &PrioritizedEvent, outcome: RouteOutcome) -> Self {
        Self {
            sequence: event.sequence,
            event_type: event.event.event_type,
            package_name: event.event.package_name.clone(),
            class_name: event.event.class_name.clone(),
            priority: event.priority,
            outcome,
            handlers: Vec::new(),
            failed_handlers: Vec::new(),
            latency: Duration::ZERO,
        }
    }
}

mod duration_micros {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_micros() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterState {
    Uninitialized,
    Initializing,
    Ready,
    Paused,
    Shutdown,
}
