//! Pipeline - upload to verified install, one stage after another.
//!
//! Stages run strictly in order and the first failure ends the run. The
//! stored upload and any staging directory are removed on every exit path.

use std::io::Read;
use std::path::PathBuf;

use droplet_archive::{Archive, ProjectRoot, locate_root};
use droplet_fs::{NativeOps, PermissionOps};

use crate::config::InstallConfig;
use crate::error::PipelineError;
use crate::installer::{InstallReport, install};
use crate::normalize::{NormalizePlan, NormalizeReport, normalize};
use crate::upload::UploadedArchive;
use crate::verify::verify;

/// Everything a successful run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallSummary {
    pub target: PathBuf,
    /// Hex SHA-256 of the uploaded archive.
    pub digest: String,
    pub bytes: u64,
    pub root: ProjectRoot,
    pub install: InstallReport,
    pub normalize: NormalizeReport,
    pub entry_point: PathBuf,
}

/// The install pipeline.
pub struct Pipeline<O = NativeOps> {
    config: InstallConfig,
    ops: O,
}

impl Pipeline {
    pub fn new(config: InstallConfig) -> Self {
        Self::with_ops(config, NativeOps)
    }
}

impl<O: PermissionOps> Pipeline<O> {
    /// Build a pipeline that changes owners and modes through `ops`.
    pub fn with_ops(config: InstallConfig, ops: O) -> Self {
        Self { config, ops }
    }

    /// Run every stage against `upload`.
    ///
    /// validate, store, open, locate root, install, normalize, verify.
    pub fn run<R: Read>(&self, upload: UploadedArchive<R>) -> Result<InstallSummary, PipelineError> {
        let config = &self.config;

        upload.validate(config)?;
        let stored = upload.persist(config.staging_root.as_deref(), config.max_upload_bytes)?;

        let mut archive = Archive::open(stored.path())?;
        let root = locate_root(archive.entries(), &config.marker).ok_or_else(|| {
            PipelineError::RootNotFound {
                marker: config.marker.clone(),
            }
        })?;
        tracing::info!(root = %root, marker = %config.marker, "located project root");

        let placed = install(
            &mut archive,
            &root,
            &config.target,
            config.staging_root.as_deref(),
        )?;

        let normalized = normalize(
            &config.target,
            &NormalizePlan::from_config(config),
            &self.ops,
        )?;

        let verified = verify(&config.target, &config.entry_point)?;

        Ok(InstallSummary {
            target: config.target.clone(),
            digest: stored.sha256().to_string(),
            bytes: stored.bytes(),
            root,
            install: placed,
            normalize: normalized,
            entry_point: verified.entry_point,
        })
    }
}
