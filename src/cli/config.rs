use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::explorer::nav_graph::ExplorerConfig;
use crate::router::config::RouterConfig;

pub const DEFAULT_CONFIG_PATH: &str = "voiceos.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "voiceos",
    version,
    about = "Accessibility event routing and app exploration"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: voiceos.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore a scripted app depth-first and print its navigation graph
    Explore {
        /// YAML app description
        #[arg(long)]
        app: String,

        /// Write the navigation graph as JSON
        #[arg(short, long)]
        output: Option<String>,

        /// Append persistence records to a JSONL file
        #[arg(long)]
        store: Option<String>,

        /// Maximum DFS depth (overrides config)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Session time limit in milliseconds (overrides config)
        #[arg(long)]
        max_time_ms: Option<u64>,
    },

    /// Replay a timed event script through the router and print metrics
    Route {
        /// YAML event script
        #[arg(long)]
        events: String,

        /// Queue capacity (overrides config)
        #[arg(long)]
        max_queue_size: Option<usize>,

        /// Default debounce interval in milliseconds (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `voiceos.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub explore: ExplorerConfig,
}

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed config {}: {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Install the global subscriber. `RUST_LOG` wins over the `-v` count.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Some("/nonexistent/voiceos.yaml"));
        assert_eq!(config.router.max_queue_size, 100);
        assert_eq!(config.explore.max_depth, 50);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "router:\n  max_queue_size: 25\nexplore:\n  max_depth: 4").expect("write");

        let config = load_config(file.path().to_str());
        assert_eq!(config.router.max_queue_size, 25);
        assert_eq!(config.router.default_debounce_ms, 1000);
        assert_eq!(config.explore.max_depth, 4);
        assert_eq!(config.explore.max_scroll_attempts, 50);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "router: [not, a, map").expect("write");

        let config = load_config(file.path().to_str());
        assert_eq!(config.router.max_queue_size, 100);
    }

    #[test]
    fn parses_explore_subcommand() {
        let cli = Cli::parse_from(["voiceos", "-vv", "explore", "--app", "app.yaml", "--max-depth", "3"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Explore { app, max_depth, .. } => {
                assert_eq!(app, "app.yaml");
                assert_eq!(max_depth, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
