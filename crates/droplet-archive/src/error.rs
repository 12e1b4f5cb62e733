use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive is unreadable: {reason}")]
    Unreadable { reason: String },

    #[error("failed to open '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("unsafe entry path '{entry}'")]
    UnsafePath { entry: String },

    #[error("symlink '{entry}' points outside the destination: '{target}'")]
    UnsafeSymlink { entry: String, target: PathBuf },

    #[error("entry '{entry}' is below a symlink")]
    LinkedParent { entry: String },

    #[error("entry index {index} out of range")]
    NoSuchEntry { index: usize },

    #[error("failed to extract '{path}': {source}")]
    ExtractFailed { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unreadable(err: zip::result::ZipError) -> Self {
        Self::Unreadable {
            reason: err.to_string(),
        }
    }

    pub(crate) fn extract(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ExtractFailed {
            path: path.into(),
            source,
        }
    }

    /// Whether the archive itself could not be parsed, as opposed to a
    /// failure writing its contents.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable { .. } | Self::Open { .. })
    }
}
