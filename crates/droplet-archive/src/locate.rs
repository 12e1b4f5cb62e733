use std::fmt;
use std::path::{Path, PathBuf};

use crate::entry::ArchiveEntry;

/// Archive-relative directory holding the application tree.
///
/// Empty when the marker sits at the top of the archive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProjectRoot(String);

impl ProjectRoot {
    pub fn archive_root() -> Self {
        Self(String::new())
    }

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_archive_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Where this root lands once the whole archive is extracted into `base`.
    pub fn join_under(&self, base: &Path) -> PathBuf {
        if self.is_archive_root() {
            base.to_path_buf()
        } else {
            base.join(&self.0)
        }
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_archive_root() {
            f.write_str("<archive root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Find the project root by its marker file.
///
/// The first non-directory entry, in the order given, whose file name equals
/// `marker` and which sits at most one directory deep wins. Its containing
/// directory is the root. `None` when no entry qualifies.
pub fn locate_root<'a, I>(entries: I, marker: &str) -> Option<ProjectRoot>
where
    I: IntoIterator<Item = &'a ArchiveEntry>,
{
    entries
        .into_iter()
        .filter(|entry| !entry.is_directory)
        .find(|entry| entry.file_name() == marker && entry.depth() <= 1)
        .map(|entry| ProjectRoot::new(entry.parent()))
}
