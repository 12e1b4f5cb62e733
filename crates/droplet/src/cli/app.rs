use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::inspect::InspectArg;
use super::install::InstallArg;

#[derive(Clone, Debug, Parser)]
#[command(name = "droplet", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file, read only if it exists
    #[arg(short, long, global = true, default_value = "droplet.toml")]
    pub config: PathBuf,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Install an archive into the target directory
    #[command(alias = "i", name = "install")]
    Install(InstallArg),
    /// List an archive and report its project root without writing anything
    #[command(alias = "ls", name = "inspect")]
    Inspect(InspectArg),
}

impl App {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }
}
