use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use droplet_archive::{Archive, locate_root};
use droplet_install::InstallConfig;

#[derive(Args, Clone, Debug)]
pub struct InspectArg {
    /// ZIP archive to inspect
    pub archive: PathBuf,
    /// File name that marks the project root
    #[arg(long)]
    pub marker: Option<String>,
}

pub fn inspect(arg: InspectArg, config: &InstallConfig) -> Result<ExitCode> {
    let marker = arg.marker.as_deref().unwrap_or(&config.marker);
    let archive = Archive::open(&arg.archive)
        .with_context(|| format!("Failed to read '{}'", arg.archive.display()))?;

    for entry in archive.entries() {
        println!("{:>12}  {}", entry.size, entry.path);
    }
    println!("{} entries", archive.len());

    match locate_root(archive.entries(), marker) {
        Some(root) => {
            println!("root: {root}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("root: not found (no '{marker}' within one directory of the top)");
            Ok(ExitCode::FAILURE)
        }
    }
}
