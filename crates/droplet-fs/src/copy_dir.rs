use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::from_walk;
use crate::{Error, Result};

/// What a tree copy wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

/// Copy everything below `src` into `dest`, merging with what is already there.
///
/// Entries are visited in file-name order. Files are copied, never moved, so
/// `src` and `dest` may live on different filesystems. Existing files are
/// overwritten and links in `dest` at a copied path are replaced, never
/// followed; nothing else in `dest` is removed. The first failure stops the
/// copy and leaves whatever was already written in place.
pub fn copy_tree(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<CopyReport> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if !src.is_dir() {
        return Err(Error::NotADirectory(src.to_path_buf()));
    }
    if !dest.exists() {
        fs::create_dir_all(dest).map_err(|e| Error::write(dest, e))?;
    }

    let mut report = CopyReport::default();

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(from_walk)?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let dest_path = dest.join(relative);
        let file_type = entry.file_type();

        // never write through a link already sitting at the destination;
        // parents are visited first, so every ancestor is a real directory
        if dest_path
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
        {
            fs::remove_file(&dest_path).map_err(|e| Error::write(&dest_path, e))?;
        }

        if file_type.is_dir() {
            if !dest_path.is_dir() {
                fs::create_dir_all(&dest_path).map_err(|e| Error::write(&dest_path, e))?;
            }
            report.directories += 1;
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path()).map_err(|e| Error::read(entry.path(), e))?;
            copy_symlink(&target, &dest_path)?;
            report.symlinks += 1;
        } else {
            let bytes = fs::copy(entry.path(), &dest_path).map_err(|e| Error::write(&dest_path, e))?;
            report.files += 1;
            report.bytes += bytes;
        }
    }

    tracing::debug!(
        src = %src.display(),
        dest = %dest.display(),
        files = report.files,
        directories = report.directories,
        "copied tree"
    );

    Ok(report)
}

#[cfg(unix)]
fn copy_symlink(target: &Path, link: &Path) -> Result<()> {
    if link.symlink_metadata().is_ok_and(|m| !m.is_dir()) {
        fs::remove_file(link).map_err(|e| Error::write(link, e))?;
    }
    std::os::unix::fs::symlink(target, link).map_err(|e| Error::write(link, e))
}

#[cfg(not(unix))]
fn copy_symlink(target: &Path, link: &Path) -> Result<()> {
    let resolved = link.parent().map(|p| p.join(target)).unwrap_or_else(|| target.to_path_buf());
    fs::copy(&resolved, link)
        .map(|_| ())
        .map_err(|e| Error::write(link, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_tree_rebases_paths() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(src.join("storage/logs")).unwrap();
        fs::write(src.join("index.php"), "<?php").unwrap();
        fs::write(src.join("storage/logs/.gitkeep"), "").unwrap();

        let report = copy_tree(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("index.php")).unwrap(), "<?php");
        assert!(dest.join("storage/logs/.gitkeep").is_file());
        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 2);
        assert_eq!(report.bytes, 5);
        assert!(src.join("index.php").exists(), "source is copied, not moved");
    }

    #[test]
    fn copy_tree_overwrites_and_merges() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("a.txt"), "new").unwrap();
        fs::write(dest.join("a.txt"), "old").unwrap();
        fs::write(dest.join("keep.txt"), "kept").unwrap();

        copy_tree(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dest.join("keep.txt")).unwrap(), "kept");
    }

    #[test]
    fn copy_tree_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            fs::write(src.join(name), name).unwrap();
        }
        // a directory where the third file should go
        fs::create_dir_all(dest.join("c")).unwrap();

        let err = copy_tree(&src, &dest).unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(err.path(), Some(dest.join("c").as_path()));
        assert!(dest.join("a").is_file());
        assert!(dest.join("b").is_file());
        assert!(!dest.join("d").exists());
    }

    #[test]
    fn copy_tree_rejects_missing_source() {
        let dir = tempdir().unwrap();
        let err = copy_tree(dir.path().join("missing"), dir.path().join("dest")).unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_recreates_symlinks() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("real.txt"), "data").unwrap();
        std::os::unix::fs::symlink("real.txt", src.join("link.txt")).unwrap();

        let report = copy_tree(&src, &dest).unwrap();

        assert_eq!(report.symlinks, 1);
        assert_eq!(fs::read_link(dest.join("link.txt")).unwrap(), Path::new("real.txt"));
        assert_eq!(fs::read_to_string(dest.join("link.txt")).unwrap(), "data");
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_replaces_destination_symlinks() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        let outside = dir.path().join("outside.txt");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("config.php"), "new").unwrap();
        fs::write(&outside, "untouched").unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("config.php")).unwrap();

        copy_tree(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(&outside).unwrap(), "untouched");
        assert!(!dest.join("config.php").symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(dest.join("config.php")).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_replaces_destination_directory_links() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        let outside = dir.path().join("outside");
        fs::create_dir_all(src.join("storage")).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(src.join("storage/app.log"), "log").unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("storage")).unwrap();

        copy_tree(&src, &dest).unwrap();

        assert!(dest.join("storage").symlink_metadata().unwrap().is_dir());
        assert!(dest.join("storage/app.log").is_file());
        assert!(!outside.join("app.log").exists());
    }
}
