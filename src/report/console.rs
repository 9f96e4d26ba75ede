use crate::explorer::explorer::{ExplorationResult, ExplorationStatus};
use crate::router::metrics::MetricsSnapshot;
use crate::router::router_model::EventType;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format an exploration result for terminal output.
///
/// Produces output like:
/// ```text
/// === Exploration: completed ===
///
///   [0] .MainActivity "Notes" (6 elements, 2 visits)
///     [1] .SettingsActivity (4 elements, 1 visit)
///
/// 2 screens, 1 edges, 3 clicks (1 no-op), 1 dangerous skipped
/// ```
pub fn format_exploration_report(result: &ExplorationResult) -> String {
    let mut out = String::new();

    let status = match &result.status {
        ExplorationStatus::Completed if result.stats.time_limit_reached => {
            "completed (time limit reached)".to_string()
        }
        ExplorationStatus::Completed => "completed".to_string(),
        ExplorationStatus::Stopped => "stopped".to_string(),
        ExplorationStatus::Failed(e) => format!("failed: {}", e),
    };
    out.push_str(&format!("=== Exploration: {} ===\n\n", status));

    for node in result.graph.nodes() {
        let indent = "  ".repeat(node.depth + 1);
        let title = node
            .state
            .window_title
            .as_deref()
            .map(|t| format!(" \"{}\"", t))
            .unwrap_or_default();
        let visits = if node.visit_count == 1 { "visit" } else { "visits" };
        let login = if node.login_screen { " [login]" } else { "" };
        out.push_str(&format!(
            "{}[{}] {}{} ({} elements, {} {}){}\n",
            indent,
            node.depth,
            node.state.activity_name,
            title,
            node.state.element_count,
            node.visit_count,
            visits,
            login
        ));
    }

    let s = &result.stats;
    out.push_str(&format!(
        "\n{} screens, {} edges, {} clicks ({} no-op), {} dangerous skipped\n",
        s.screens, s.edges, s.clicks, s.no_op_clicks, s.dangerous_skipped
    ));
    if s.navigation_anomalies > 0 || s.package_exits > 0 {
        out.push_str(&format!(
            "{} navigation anomalies, {} package exits\n",
            s.navigation_anomalies, s.package_exits
        ));
    }
    if result.is_partial() {
        out.push_str("(partial result)\n");
    }

    out
}

/// Format router metrics as a per-type table, skipping idle types.
pub fn format_metrics_report(metrics: &MetricsSnapshot) -> String {
    let mut out = String::new();
    let t = &metrics.totals;

    out.push_str(&format!(
        "=== Router: {} received, {} processed, {} filtered, {} debounced ({} throttled), {} dropped ===\n",
        t.received, t.processed, t.filtered, t.debounced, t.throttled, t.dropped
    ));

    for event_type in EventType::ALL {
        let c = metrics.for_type(event_type);
        if c.received == 0 {
            continue;
        }
        out.push_str(&format!(
            "  {:<28} recv {:>5}  proc {:>5}  filt {:>5}  deb {:>5}\n",
            event_type.as_str(),
            c.received,
            c.processed,
            c.filtered,
            c.debounced
        ));
    }

    out.push_str(&format!(
        "average latency: {}us\n",
        metrics.average_latency().as_micros()
    ));
    out
}
