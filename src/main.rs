use clap::Parser;
use voiceos_core::cli::commands::{cmd_explore, cmd_route};
use voiceos_core::cli::config::{Cli, Commands, init_logging, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Explore {
            app,
            output,
            store,
            max_depth,
            max_time_ms,
        } => {
            cmd_explore(
                &config,
                &app,
                output.as_deref(),
                store.as_deref(),
                max_depth,
                max_time_ms,
            )
            .await?;
        }
        Commands::Route {
            events,
            max_queue_size,
            debounce_ms,
        } => {
            cmd_route(&config, &events, max_queue_size, debounce_ms).await?;
        }
    }

    Ok(())
}
