//! Static routing tables and the runtime-mutable filter/debounce settings.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::router::config::RouterConfig;
use crate::router::router_model::{EventPriority, EventType, FilterReason, HandlerName, UiEvent};

/// Built-in priority mapping.
pub fn default_priority(event_type: EventType) -> EventPriority {
    match event_type {
        EventType::WindowStateChanged => EventPriority::Critical,
        EventType::WindowContentChanged | EventType::ViewClicked | EventType::ViewLongClicked => {
            EventPriority::High
        }
        EventType::ViewFocused
        | EventType::ViewSelected
        | EventType::ViewTextChanged
        | EventType::NotificationStateChanged => EventPriority::Normal,
        EventType::ViewScrolled | EventType::Announcement | EventType::Other => EventPriority::Low,
    }
}

/// Handler set per event type.
pub fn resolve_handlers(event_type: EventType) -> &'static [HandlerName] {
    use HandlerName::*;

    match event_type {
        EventType::WindowStateChanged | EventType::WindowContentChanged => {
            &[Scrape, Command, Monitor]
        }
        EventType::ViewClicked | EventType::ViewLongClicked => &[Scrape, Monitor],
        _ => &[Monitor],
    }
}

/// Package filter: exact name, or prefix when written as `prefix.*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageFilter {
    Exact(String),
    Prefix(String),
    Any,
}

impl PackageFilter {
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern == "*" {
            PackageFilter::Any
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            PackageFilter::Prefix(prefix.to_string())
        } else {
            PackageFilter::Exact(pattern.to_string())
        }
    }

    pub fn matches(&self, package: &str) -> bool {
        match self {
            PackageFilter::Exact(name) => name == package,
            // `com.example.*` also admits the bare `com.example` package
            PackageFilter::Prefix(prefix) => {
                package.starts_with(prefix.as_str())
                    || prefix.strip_suffix('.').is_some_and(|p| p == package)
            }
            PackageFilter::Any => true,
        }
    }

    pub fn pattern(&self) -> String {
        match self {
            PackageFilter::Exact(name) => name.clone(),
            PackageFilter::Prefix(prefix) => format!("{prefix}*"),
            PackageFilter::Any => "*".to_string(),
        }
    }
}

/// Runtime-mutable routing settings, guarded by the router.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    pub enabled_types: HashSet<EventType>,
    pub package_filters: Vec<PackageFilter>,
    pub default_debounce: Duration,
    pub debounce_overrides: HashMap<EventType, Duration>,
    pub priority_overrides: HashMap<EventType, EventPriority>,
}

impl RoutingPolicy {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            enabled_types: config.enabled_event_types.clone(),
            package_filters: config
                .package_filters
                .iter()
                .map(|p| PackageFilter::parse(p))
                .collect(),
            default_debounce: Duration::from_millis(config.default_debounce_ms),
            debounce_overrides: config
                .debounce_overrides_ms
                .iter()
                .map(|(t, ms)| (*t, Duration::from_millis(*ms)))
                .collect(),
            priority_overrides: config.priority_overrides.clone(),
        }
    }

    pub fn priority_for(&self, event_type: EventType) -> EventPriority {
        self.priority_overrides
            .get(&event_type)
            .copied()
            .unwrap_or_else(|| default_priority(event_type))
    }

    pub fn debounce_interval(&self, event_type: EventType) -> Duration {
        self.debounce_overrides
            .get(&event_type)
            .copied()
            .unwrap_or(self.default_debounce)
    }

    /// Filter stage predicate.
    pub fn admit(&self, event: &UiEvent) -> Result<(), FilterReason> {
        if !self.enabled_types.contains(&event.event_type) {
            return Err(FilterReason::TypeDisabled);
        }
        if !self.package_filters.is_empty()
            && !self
                .package_filters
                .iter()
                .any(|f| f.matches(&event.package_name))
        {
            return Err(FilterReason::PackageExcluded);
        }
        Ok(())
    }

    /// Returns false when the filter was already present.
    pub fn add_package_filter(&mut self, pattern: &str) -> bool {
        let filter = PackageFilter::parse(pattern);
        if self.package_filters.contains(&filter) {
            return false;
        }
        self.package_filters.push(filter);
        true
    }

    pub fn remove_package_filter(&mut self, pattern: &str) -> bool {
        let filter = PackageFilter::parse(pattern);
        let before = self.package_filters.len();
        self.package_filters.retain(|f| f != &filter);
        self.package_filters.len() != before
    }
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_suffix_matches_by_prefix() {
        let f = PackageFilter::parse("com.example.*");
        assert!(f.matches("com.example.mail"));
        assert!(f.matches("com.example"));
        assert!(!f.matches("com.examples"));
        assert!(!f.matches("org.example.mail"));
        assert_eq!(f.pattern(), "com.example.*");
    }

    #[test]
    fn exact_filter_matches_only_itself() {
        let f = PackageFilter::parse("com.android.settings");
        assert!(f.matches("com.android.settings"));
        assert!(!f.matches("com.android.settings.intelligence"));
    }

    #[test]
    fn handler_table() {
        assert_eq!(
            resolve_handlers(EventType::WindowContentChanged),
            &[HandlerName::Scrape, HandlerName::Command, HandlerName::Monitor]
        );
        assert_eq!(
            resolve_handlers(EventType::ViewClicked),
            &[HandlerName::Scrape, HandlerName::Monitor]
        );
        for t in [
            EventType::ViewFocused,
            EventType::ViewScrolled,
            EventType::ViewTextChanged,
        ] {
            assert_eq!(resolve_handlers(t), &[HandlerName::Monitor]);
        }
    }

    #[test]
    fn filter_rejects_disabled_types_and_foreign_packages() {
        let mut policy = RoutingPolicy::default();
        let ev = UiEvent::new(EventType::ViewClicked, "com.example.app", "Button");
        assert_eq!(policy.admit(&ev), Ok(()));

        policy.add_package_filter("org.other.*");
        assert_eq!(policy.admit(&ev), Err(FilterReason::PackageExcluded));

        policy.add_package_filter("com.example.*");
        assert_eq!(policy.admit(&ev), Ok(()));

        policy.enabled_types.remove(&EventType::ViewClicked);
        assert_eq!(policy.admit(&ev), Err(FilterReason::TypeDisabled));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut policy = RoutingPolicy::default();
        assert_eq!(policy.debounce_interval(EventType::ViewScrolled), Duration::from_millis(1000));
        policy
            .debounce_overrides
            .insert(EventType::ViewScrolled, Duration::from_millis(250));
        assert_eq!(policy.debounce_interval(EventType::ViewScrolled), Duration::from_millis(250));

        assert_eq!(policy.priority_for(EventType::ViewScrolled), EventPriority::Low);
        policy
            .priority_overrides
            .insert(EventType::ViewScrolled, EventPriority::High);
        assert_eq!(policy.priority_for(EventType::ViewScrolled), EventPriority::High);
    }
}
