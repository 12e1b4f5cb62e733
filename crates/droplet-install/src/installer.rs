use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

use droplet_archive::{Archive, ProjectRoot};
use droplet_fs::{Workspace, copy_tree, probe_writable};

use crate::error::{InstallError, WritePhase};

/// How the application tree reached the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Marker at the archive top level; extracted straight into the target.
    Direct,
    /// Extracted into staging, then `root` was copied into the target.
    Relocated { root: ProjectRoot },
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Relocated { root } => write!(f, "relocated from {root}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallReport {
    pub placement: Placement,
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

/// Lay the tree below `root` into `target`.
///
/// `target` must already exist and be writable; that is checked before
/// anything is written. Existing files at the same relative paths are
/// overwritten, everything else in `target` is left alone. On failure the
/// target may hold part of the tree.
pub fn install<R: Read + Seek>(
    archive: &mut Archive<R>,
    root: &ProjectRoot,
    target: &Path,
    staging_root: Option<&Path>,
) -> Result<InstallReport, InstallError> {
    probe_writable(target).map_err(|source| InstallError::TargetUnwritable {
        path: target.to_path_buf(),
        source,
    })?;

    let report = if root.is_archive_root() {
        extract_direct(archive, target)?
    } else {
        relocate(archive, root, target, staging_root)?
    };

    tracing::info!(
        target = %target.display(),
        placement = %report.placement,
        files = report.files,
        bytes = report.bytes,
        "installed application tree"
    );
    Ok(report)
}

fn extract_direct<R: Read + Seek>(
    archive: &mut Archive<R>,
    target: &Path,
) -> Result<InstallReport, InstallError> {
    let extracted = archive
        .extract_all(target)
        .map_err(|e| InstallError::write(WritePhase::ExtractTarget, e))?;

    Ok(InstallReport {
        placement: Placement::Direct,
        directories: extracted.directories,
        files: extracted.files,
        symlinks: extracted.symlinks,
        bytes: extracted.bytes,
    })
}

fn relocate<R: Read + Seek>(
    archive: &mut Archive<R>,
    root: &ProjectRoot,
    target: &Path,
    staging_root: Option<&Path>,
) -> Result<InstallReport, InstallError> {
    // dropping the workspace removes it, whichever return below is taken
    let workspace =
        Workspace::create(staging_root).map_err(|e| InstallError::write(WritePhase::Stage, e))?;

    archive
        .extract_all(workspace.path())
        .map_err(|e| InstallError::write(WritePhase::Stage, e))?;

    let staged_root = root.join_under(workspace.path());
    if !staged_root.is_dir() {
        return Err(InstallError::RootMissing(root.as_str().to_string()));
    }

    tracing::debug!(
        from = %staged_root.display(),
        to = %target.display(),
        "copying staged project root"
    );
    let copied =
        copy_tree(&staged_root, target).map_err(|e| InstallError::write(WritePhase::Copy, e))?;

    if let Err(e) = workspace.close() {
        tracing::warn!(error = %e, "staging workspace was not fully removed");
    }

    Ok(InstallReport {
        placement: Placement::Relocated { root: root.clone() },
        directories: copied.directories,
        files: copied.files,
        symlinks: copied.symlinks,
        bytes: copied.bytes,
    })
}
