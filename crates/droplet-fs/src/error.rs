use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("'{0}' does not exist")]
    NotFound(PathBuf),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("invalid owner '{0}': expected USER:GROUP")]
    InvalidOwner(String),

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    #[error("failed to look up '{name}': {source}")]
    Lookup { name: String, source: nix::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read { path: path.into(), source }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write { path: path.into(), source }
    }

    /// The path the failing operation touched, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::NotFound(path)
            | Self::NotADirectory(path) => Some(path),
            _ => None,
        }
    }
}

pub(crate) fn from_walk(err: walkdir::Error) -> Error {
    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
    Error::read(path, io::Error::from(err))
}
