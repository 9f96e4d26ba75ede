use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};

use crate::cli::config::AppConfig;
use crate::device::scripted::{AppDescription, ScriptedApp};
use crate::error::ConfigError;
use crate::report::console::{format_exploration_report, format_metrics_report};
use crate::router::handler::EventHandler;
use crate::router::router::EventRouter;
use crate::router::router_model::{HandlerName, PrioritizedEvent, UiEvent};
use crate::service::context::ServiceContext;
use crate::store::jsonl::JsonlStore;
use crate::store::memory::InMemoryStore;
use crate::store::store::ExplorationStore;

/// How long `route` waits for the queue to drain after the last event.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// explore subcommand
// ============================================================================

pub async fn cmd_explore(
    config: &AppConfig,
    app_path: &str,
    output: Option<&str>,
    store_path: Option<&str>,
    max_depth: Option<usize>,
    max_time_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let description = AppDescription::load(Path::new(app_path))?;
    let app = Arc::new(ScriptedApp::new(description)?);

    let mut explore = config.explore.clone();
    if let Some(depth) = max_depth {
        explore.max_depth = depth;
    }
    if let Some(ms) = max_time_ms {
        explore.max_exploration_time_ms = ms;
    }

    let store: Arc<dyn ExplorationStore> = match store_path {
        Some(path) => Arc::new(JsonlStore::open(path)?),
        None => Arc::new(InMemoryStore::new()),
    };
    let context = ServiceContext::new(store);

    info!(app = app_path, package = app.package(), "exploring");
    let engine = context.explorer(app.clone(), explore);
    let result = engine.explore().await?;

    print!("{}", format_exploration_report(&result));

    if let Some(path) = output {
        std::fs::write(path, result.graph.to_json()?)?;
        println!("Navigation graph written to {}", path);
    }
    if let (Some(path), Some(report)) = (store_path, result.persistence) {
        println!("{} records appended to {} ({} failed)", report.written, path, report.failed);
    }

    Ok(())
}

// ============================================================================
// route subcommand
// ============================================================================

/// One scripted event, submitted `at_ms` after the replay starts.
#[derive(Debug, Clone, Deserialize)]
pub struct TimedEvent {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: UiEvent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventScript {
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

impl EventScript {
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
}

struct LogHandler(HandlerName);

impl EventHandler for LogHandler {
    fn handle(&self, event: &PrioritizedEvent) -> Result<(), crate::error::HandlerError> {
        debug!(
            handler = %self.0,
            seq = event.sequence,
            event_type = %event.event.event_type,
            package = %event.event.package_name,
            "dispatched"
        );
        Ok(())
    }
}

pub async fn cmd_route(
    config: &AppConfig,
    events_path: &str,
    max_queue_size: Option<usize>,
    debounce_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let script = EventScript::load(Path::new(events_path))?;

    let mut router_config = config.router.clone();
    if let Some(size) = max_queue_size {
        router_config.max_queue_size = size;
    }
    if let Some(ms) = debounce_ms {
        router_config.default_debounce_ms = ms;
    }

    let router = EventRouter::new();
    for name in [HandlerName::Scrape, HandlerName::Command, HandlerName::Monitor] {
        router.register_handler(name, Arc::new(LogHandler(name)));
    }
    router.initialize(router_config)?;

    let mut events = script.events;
    events.sort_by_key(|e| e.at_ms);
    info!(events = events.len(), "replaying event script");

    let start = Instant::now();
    for timed in events {
        sleep_until(start + Duration::from_millis(timed.at_ms)).await;
        router.submit(timed.event);
    }

    if !drain(&router).await {
        warn!("router did not drain within {:?}", DRAIN_TIMEOUT);
    }
    let metrics = router.metrics();
    router.cleanup()?;

    print!("{}", format_metrics_report(&metrics));
    Ok(())
}

/// Wait until every received event has reached a final outcome.
async fn drain(router: &EventRouter) -> bool {
    let give_up = Instant::now() + DRAIN_TIMEOUT;
    loop {
        let t = router.metrics().totals;
        if t.processed + t.filtered + t.debounced + t.dropped >= t.received {
            return true;
        }
        if Instant::now() >= give_up {
            return false;
        }
        sleep(Duration::from_millis(5)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::router_model::EventType;

    #[test]
    fn parses_event_script() {
        let yaml = r#"
events:
  - { at_ms: 0, event_type: view_clicked, package_name: com.example, class_name: android.widget.Button }
  - { at_ms: 1500, event_type: window_state_changed, package_name: com.example, text: Home }
"#;
        let script: EventScript = serde_yaml::from_str(yaml).expect("valid script");
        assert_eq!(script.events.len(), 2);
        assert_eq!(script.events[0].event.event_type, EventType::ViewClicked);
        assert_eq!(script.events[1].at_ms, 1500);
        assert_eq!(script.events[1].event.class_name, "");
        assert_eq!(script.events[1].event.text.as_deref(), Some("Home"));
    }
}
