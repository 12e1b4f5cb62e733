use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use droplet_fs::OwnerSpec;
use droplet_install::{InstallConfig, Outcome, Pipeline, UploadFailure, UploadedArchive};

#[derive(Args, Clone, Debug)]
pub struct InstallArg {
    /// ZIP archive to install
    pub archive: PathBuf,
    /// Directory to install into
    #[arg(long)]
    pub target: Option<PathBuf>,
    /// File name that marks the project root
    #[arg(long)]
    pub marker: Option<String>,
    /// Script made executable and checked after install
    #[arg(long)]
    pub entry_point: Option<PathBuf>,
    /// Owner as USER:GROUP
    #[arg(long)]
    pub owner: Option<OwnerSpec>,
    /// Group-writable directory, relative to the target (repeatable)
    #[arg(long)]
    pub writable: Vec<PathBuf>,
    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl InstallArg {
    /// Command line values win over the file.
    pub fn apply(&self, config: &mut InstallConfig) {
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(marker) = &self.marker {
            config.marker = marker.clone();
        }
        if let Some(entry_point) = &self.entry_point {
            config.entry_point = entry_point.clone();
        }
        if let Some(owner) = &self.owner {
            config.owner = owner.clone();
        }
        if !self.writable.is_empty() {
            config.writable_dirs = self.writable.clone();
        }
    }
}

pub fn install(arg: InstallArg, mut config: InstallConfig) -> Result<ExitCode> {
    arg.apply(&mut config);
    config.validate().context("Invalid install settings")?;

    let outcome = run(&arg, config);

    if arg.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.message);
        for warning in &outcome.warnings {
            println!("warning: {warning}");
        }
    }

    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// An archive that cannot be opened is reported like an upload that never arrived.
fn run(arg: &InstallArg, config: InstallConfig) -> Outcome {
    let pipeline = Pipeline::new(config);
    let filename = arg
        .archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let opened = File::open(&arg.archive).and_then(|file| {
        let size = file.metadata()?.len();
        Ok((file, size))
    });
    let result = match opened {
        Ok((file, size)) => pipeline.run(UploadedArchive::new(file, filename, size)),
        Err(e) => {
            tracing::warn!(path = %arg.archive.display(), error = %e, "cannot read archive");
            pipeline.run(UploadedArchive::failed(UploadFailure::NoFile))
        }
    };

    if let Err(e) = &result {
        tracing::error!(category = %e.category(), "{e}");
    }
    Outcome::from_result(&result)
}

#[cfg(test)]
mod tests {
    use droplet_install::ErrorCategory;

    use super::*;

    fn arg() -> InstallArg {
        InstallArg {
            archive: PathBuf::from("site.zip"),
            target: None,
            marker: None,
            entry_point: None,
            owner: None,
            writable: Vec::new(),
            json: false,
        }
    }

    #[test]
    fn no_overrides_keeps_config() {
        let mut config = InstallConfig::default();
        arg().apply(&mut config);
        assert_eq!(config, InstallConfig::default());
    }

    #[test]
    fn overrides_replace_values() {
        let mut config = InstallConfig::default();
        let arg = InstallArg {
            target: Some(PathBuf::from("/srv/app")),
            marker: Some("wp-config.php".into()),
            entry_point: Some(PathBuf::from("wp-cron.php")),
            owner: Some(OwnerSpec::new("nginx", "nginx")),
            writable: vec![PathBuf::from("wp-content/uploads")],
            ..arg()
        };

        arg.apply(&mut config);

        assert_eq!(config.target, PathBuf::from("/srv/app"));
        assert_eq!(config.marker, "wp-config.php");
        assert_eq!(config.entry_point, PathBuf::from("wp-cron.php"));
        assert_eq!(config.owner, OwnerSpec::new("nginx", "nginx"));
        assert_eq!(config.writable_dirs, [PathBuf::from("wp-content/uploads")]);
        assert_eq!(config.max_upload_bytes, droplet_install::DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn missing_archive_is_no_file_uploaded() {
        let arg = InstallArg {
            archive: PathBuf::from("/nonexistent/droplet/absent.zip"),
            ..arg()
        };

        let outcome = run(&arg, InstallConfig::default());

        assert!(!outcome.success);
        assert_eq!(outcome.message, "No file uploaded");
        assert_eq!(outcome.category, Some(ErrorCategory::UploadInvalid));
        assert!(!outcome.message.contains("absent.zip"));
    }

    #[test]
    fn invalid_settings_are_an_error() {
        let arg = InstallArg {
            writable: vec![PathBuf::from("../..")],
            ..arg()
        };
        assert!(install(arg, InstallConfig::default()).is_err());
    }
}
