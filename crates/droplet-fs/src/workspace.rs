use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Error, Result};

const STAGING_PREFIX: &str = "droplet-staging-";

/// A scratch directory that is removed when dropped.
///
/// Used to stage an archive before its project root is copied into place.
/// Cleanup runs on every exit path, including early `?` returns.
pub struct Workspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a fresh staging directory under `parent`, or under the system
    /// temporary directory when `parent` is `None`.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);

        let dir = match parent {
            Some(parent) => builder
                .tempdir_in(parent)
                .map_err(|e| Error::write(parent, e))?,
            None => builder
                .tempdir()
                .map_err(|e| Error::write(std::env::temp_dir(), e))?,
        };
        tracing::debug!(path = %dir.path().display(), "created staging workspace");

        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace now and report a failed removal.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => {
                dir.close().map_err(|e| Error::write(&self.path, e))?;
                tracing::debug!(path = %self.path.display(), "removed staging workspace");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staging workspace");
            }
        }
    }
}

/// Fail unless a file can be created in `dir`.
///
/// The probe file is removed again before returning.
pub fn probe_writable(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();

    let meta = std::fs::metadata(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(dir.to_path_buf()),
        _ => Error::read(dir, e),
    })?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    let probe = tempfile::Builder::new()
        .prefix(".droplet-probe-")
        .tempfile_in(dir)
        .map_err(|e| Error::write(dir, e))?;
    probe.close().map_err(|e| Error::write(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn workspace_lives_under_parent() {
        let parent = tempdir().unwrap();
        let workspace = Workspace::create(Some(parent.path())).unwrap();
        assert!(workspace.path().starts_with(parent.path()));
        assert!(workspace.path().is_dir());
        assert!(
            workspace
                .path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(STAGING_PREFIX)
        );
    }

    #[test]
    fn workspace_cleanup_on_drop() {
        let parent = tempdir().unwrap();
        let staged;
        {
            let workspace = Workspace::create(Some(parent.path())).unwrap();
            std::fs::create_dir_all(workspace.path().join("app/storage")).unwrap();
            std::fs::write(workspace.path().join("app/artisan"), "").unwrap();
            staged = workspace.path().to_path_buf();
        }
        assert!(!staged.exists());
        assert_eq!(entries(parent.path()), 0);
    }

    #[test]
    fn workspace_cleanup_on_error_path() {
        fn failing(parent: &Path) -> Result<()> {
            let workspace = Workspace::create(Some(parent))?;
            std::fs::write(workspace.path().join("file"), "data").unwrap();
            Err(Error::NotFound(workspace.path().join("missing")))
        }

        let parent = tempdir().unwrap();
        assert!(failing(parent.path()).is_err());
        assert_eq!(entries(parent.path()), 0);
    }

    #[test]
    fn workspace_close() {
        let parent = tempdir().unwrap();
        let workspace = Workspace::create(Some(parent.path())).unwrap();
        workspace.close().unwrap();
        assert_eq!(entries(parent.path()), 0);
    }

    #[test]
    fn probe_writable_leaves_no_trace() {
        let dir = tempdir().unwrap();
        probe_writable(dir.path()).unwrap();
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn probe_writable_rejects_missing_and_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            probe_writable(dir.path().join("missing")),
            Err(Error::NotFound(_))
        ));

        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(probe_writable(&file), Err(Error::NotADirectory(_))));
    }
}
