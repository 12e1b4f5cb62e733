//! droplet - install an uploaded application archive into a web root.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use droplet_install::InstallConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::app::{App, Commands};

mod cli;

fn main() -> Result<ExitCode> {
    let app = App::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(app.log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = if app.config.exists() {
        InstallConfig::from_file(&app.config)
            .with_context(|| format!("Failed to load '{}'", app.config.display()))?
    } else {
        InstallConfig::default()
    };

    match app.cmd {
        Commands::Install(arg) => cli::install::install(arg, config),
        Commands::Inspect(arg) => cli::inspect::inspect(arg, &config),
    }
}
