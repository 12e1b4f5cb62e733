use std::fmt;
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};

use droplet_fs::{Owner, OwnerSpec, PermissionMode, PermissionOps};
use walkdir::WalkDir;

use crate::config::InstallConfig;
use crate::error::NormalizeError;

/// One pass of the normalizer, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NormalizeStep {
    ResolveOwner,
    Owner,
    DirectoryModes,
    FileModes,
    EntryPoint,
    WritableDirs,
    FinalOwner,
}

impl fmt::Display for NormalizeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ResolveOwner => "resolve owner",
            Self::Owner => "set owner",
            Self::DirectoryModes => "set directory modes",
            Self::FileModes => "set file modes",
            Self::EntryPoint => "set entry point mode",
            Self::WritableDirs => "set writable modes",
            Self::FinalOwner => "final owner pass",
        })
    }
}

/// A primitive that failed on a path that exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizeWarning {
    pub step: NormalizeStep,
    pub path: PathBuf,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Paths found under the target, the target included.
    pub visited: usize,
    pub warnings: Vec<NormalizeWarning>,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// What the normalizer applies to a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizePlan {
    pub entry_point: PathBuf,
    pub writable_dirs: Vec<PathBuf>,
    pub owner: OwnerSpec,
}

impl NormalizePlan {
    pub fn from_config(config: &InstallConfig) -> Self {
        Self {
            entry_point: config.entry_point.clone(),
            writable_dirs: config.writable_dirs.clone(),
            owner: config.owner.clone(),
        }
    }
}

/// Apply ownership and modes to everything under `target`.
///
/// Steps run in a fixed order:
/// 1. owner on the whole tree
/// 2. `755` on directories
/// 3. `644` on regular files
/// 4. `755` on the entry point
/// 5. `775` on everything inside each writable directory
/// 6. owner on the whole tree again
///
/// Missing paths are skipped. A failing primitive becomes a warning and the
/// remaining paths and steps still run. Only a missing `target` is fatal.
pub fn normalize<O: PermissionOps>(
    target: &Path,
    plan: &NormalizePlan,
    ops: &O,
) -> Result<NormalizeReport, NormalizeError> {
    if !target.is_dir() {
        return Err(NormalizeError::TargetMissing(target.to_path_buf()));
    }

    let mut run = Run {
        ops,
        report: NormalizeReport::default(),
    };

    let owner = match plan.owner.resolve() {
        Ok(owner) => Some(owner),
        Err(e) => {
            run.warn(NormalizeStep::ResolveOwner, target, e.to_string());
            None
        }
    };

    if let Some(owner) = owner {
        run.set_owner_tree(target, NormalizeStep::Owner, owner);
    }

    let entries = run.walk(target, NormalizeStep::DirectoryModes);
    run.report.visited = entries.len();
    for (path, file_type) in &entries {
        if file_type.is_dir() {
            run.apply(NormalizeStep::DirectoryModes, path, |ops, p| {
                ops.set_mode(p, PermissionMode::Directory)
            });
        }
    }
    for (path, file_type) in &entries {
        if file_type.is_file() {
            run.apply(NormalizeStep::FileModes, path, |ops, p| {
                ops.set_mode(p, PermissionMode::File)
            });
        }
    }

    let entry_point = target.join(&plan.entry_point);
    if entry_point
        .symlink_metadata()
        .is_ok_and(|m| !m.file_type().is_symlink())
    {
        run.apply(NormalizeStep::EntryPoint, &entry_point, |ops, p| {
            ops.set_mode(p, PermissionMode::Executable)
        });
    }

    for dir in &plan.writable_dirs {
        let dir = target.join(dir);
        if !dir.symlink_metadata().is_ok_and(|m| m.is_dir()) {
            continue;
        }
        for (path, file_type) in run.walk(&dir, NormalizeStep::WritableDirs) {
            if !file_type.is_symlink() {
                run.apply(NormalizeStep::WritableDirs, &path, |ops, p| {
                    ops.set_mode(p, PermissionMode::GroupWritable)
                });
            }
        }
    }

    if let Some(owner) = owner {
        run.set_owner_tree(target, NormalizeStep::FinalOwner, owner);
    }

    let report = run.report;
    tracing::info!(
        target = %target.display(),
        visited = report.visited,
        warnings = report.warnings.len(),
        "normalized permissions"
    );
    Ok(report)
}

struct Run<'a, O> {
    ops: &'a O,
    report: NormalizeReport,
}

impl<O: PermissionOps> Run<'_, O> {
    fn set_owner_tree(&mut self, root: &Path, step: NormalizeStep, owner: Owner) {
        for (path, _) in self.walk(root, step) {
            self.apply(step, &path, |ops, p| ops.set_owner(p, owner));
        }
    }

    /// Everything under `root`, `root` first. Unreadable subtrees become warnings.
    fn walk(&mut self, root: &Path, step: NormalizeStep) -> Vec<(PathBuf, FileType)> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root) {
            match entry {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    entries.push((entry.into_path(), file_type));
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    self.warn(step, &path, e.to_string());
                }
            }
        }
        entries
    }

    fn apply(&mut self, step: NormalizeStep, path: &Path, op: impl FnOnce(&O, &Path) -> io::Result<()>) {
        match op(self.ops, path) {
            Ok(()) => {}
            // vanished since the walk
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.warn(step, path, e.to_string()),
        }
    }

    fn warn(&mut self, step: NormalizeStep, path: &Path, message: String) {
        tracing::warn!(%step, path = %path.display(), %message, "permission change failed");
        self.report.warnings.push(NormalizeWarning {
            step,
            path: path.to_path_buf(),
            message,
        });
    }
}
