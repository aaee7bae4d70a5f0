//! CLI entry point - the composition root.
//!
//! Loads settings, builds the controller with a stdout observer, then runs
//! it until `:quit`, Ctrl-C or a fatal error.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use hearth_cli::presentation::print_help;
use hearth_cli::{
    Cli, CliContext, ConsoleObserver, bootstrap, init_tracing, load_settings, spawn_stdin_reader,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    if cli.print_settings {
        let json = serde_json::to_string_pretty(&settings.clone().or_defaults())
            .context("Failed to serialize settings")?;
        println!("{json}");
        return Ok(());
    }

    let observer = Arc::new(ConsoleObserver::stdout(settings.effective_max_players()));
    let CliContext {
        settings,
        controller,
        handle,
    } = match bootstrap(settings, observer) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    println!(
        "hearth {} - server directory {}",
        env!("CARGO_PKG_VERSION"),
        settings.effective_server_dir().display()
    );
    print_help();

    let _input = spawn_stdin_reader(handle.clone());

    let ctrl_c_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            if ctrl_c_handle.shutdown().is_err() {
                warn!("Controller already stopped");
            }
        }
    });

    if cli.start {
        handle.start().context("Controller stopped before start")?;
    }

    controller.run().await;
    Ok(())
}
