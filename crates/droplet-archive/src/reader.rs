use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use crate::entry::ArchiveEntry;
use crate::error::{Error, Result};
use crate::sanitize::{check_no_linked_parent, check_symlink_target, sanitize_entry_path};

/// What a full extraction wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

enum Written {
    Directory,
    File(u64),
    Symlink,
}

/// An opened ZIP archive.
///
/// The entry list is read from the central directory once, at open time,
/// without decompressing any entry.
pub struct Archive<R = File> {
    zip: zip::ZipArchive<R>,
    entries: Vec<ArchiveEntry>,
    /// Relative paths of every symlink entry, whether extracted yet or not.
    links: HashSet<PathBuf>,
}

impl Archive<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> Archive<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut zip = zip::ZipArchive::new(reader).map_err(Error::unreadable)?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let file = zip.by_index_raw(index).map_err(Error::unreadable)?;
            let mut entry =
                ArchiveEntry::new(index, file.name(), file.is_dir()).with_size(file.size());
            if let Some(mode) = file.unix_mode() {
                entry = entry.with_mode(mode);
            }
            entries.push(entry);
        }

        let links = entries
            .iter()
            .filter(|entry| entry.is_symlink())
            .filter_map(|entry| sanitize_entry_path(&entry.path).ok())
            .collect();

        tracing::debug!(entries = entries.len(), "opened archive");
        Ok(Self {
            zip,
            entries,
            links,
        })
    }

    /// Entries in central-directory order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every entry below `destination`, in archive order.
    ///
    /// Stops at the first failing entry; entries written before it stay on disk.
    pub fn extract_all(&mut self, destination: impl AsRef<Path>) -> Result<ExtractReport> {
        let destination = destination.as_ref();
        if !destination.exists() {
            fs::create_dir_all(destination).map_err(|e| Error::extract(destination, e))?;
        }

        let mut report = ExtractReport::default();
        for position in 0..self.entries.len() {
            let entry = self.entries[position].clone();
            match self.write_entry(&entry, destination)?.1 {
                Written::Directory => report.directories += 1,
                Written::File(bytes) => {
                    report.files += 1;
                    report.bytes += bytes;
                }
                Written::Symlink => report.symlinks += 1,
            }
        }

        tracing::debug!(
            destination = %destination.display(),
            files = report.files,
            directories = report.directories,
            bytes = report.bytes,
            "extracted archive"
        );
        Ok(report)
    }

    /// Write a single entry below `destination` and return where it landed.
    pub fn extract_entry(
        &mut self,
        entry: &ArchiveEntry,
        destination: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        self.write_entry(entry, destination.as_ref())
            .map(|(path, _)| path)
    }

    fn write_entry(&mut self, entry: &ArchiveEntry, destination: &Path) -> Result<(PathBuf, Written)> {
        if entry.index >= self.zip.len() {
            return Err(Error::NoSuchEntry { index: entry.index });
        }

        let relative = sanitize_entry_path(&entry.path)?;
        let target = destination.join(&relative);

        let links = &self.links;
        let is_link = |path: &Path| {
            links.contains(path)
                || destination
                    .join(path)
                    .symlink_metadata()
                    .is_ok_and(|m| m.file_type().is_symlink())
        };
        check_no_linked_parent(&entry.path, &relative, is_link)?;

        if entry.is_directory {
            fs::create_dir_all(&target).map_err(|e| Error::extract(&target, e))?;
            return Ok((target, Written::Directory));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::extract(parent, e))?;
        }
        // never write through a link left by an earlier entry or install
        if target
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
        {
            fs::remove_file(&target).map_err(|e| Error::extract(&target, e))?;
        }

        let mut file = self.zip.by_index(entry.index).map_err(Error::unreadable)?;

        if entry.is_symlink() {
            let mut link = String::new();
            file.read_to_string(&mut link)
                .map_err(|e| Error::extract(&target, e))?;
            let link_target =
                check_symlink_target(&entry.path, &relative, link.trim_end(), is_link)?;
            write_symlink(&link_target, &target)?;
            return Ok((target, Written::Symlink));
        }

        let mut out = File::create(&target).map_err(|e| Error::extract(&target, e))?;
        let bytes = io::copy(&mut file, &mut out).map_err(|e| Error::extract(&target, e))?;
        Ok((target, Written::File(bytes)))
    }
}

#[cfg(unix)]
fn write_symlink(link_target: &Path, link: &Path) -> Result<()> {
    if link.exists() && !link.is_dir() {
        fs::remove_file(link).map_err(|e| Error::extract(link, e))?;
    }
    std::os::unix::fs::symlink(link_target, link).map_err(|e| Error::extract(link, e))
}

#[cfg(not(unix))]
fn write_symlink(link_target: &Path, link: &Path) -> Result<()> {
    fs::write(link, link_target.to_string_lossy().as_bytes()).map_err(|e| Error::extract(link, e))
}
