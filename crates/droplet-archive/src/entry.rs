/// One record of the archive's central directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub index: usize,
    /// Raw entry name, forward-slash separated. Directory names keep their
    /// trailing `/`.
    pub path: String,
    pub is_directory: bool,
    pub size: u64,
    pub mode: Option<u32>,
}

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

impl ArchiveEntry {
    pub fn new(index: usize, path: impl Into<String>, is_directory: bool) -> Self {
        Self {
            index,
            path: path.into(),
            is_directory,
            size: 0,
            mode: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    fn trimmed(&self) -> &str {
        self.path.trim_end_matches('/')
    }

    /// Last path component.
    pub fn file_name(&self) -> &str {
        let path = self.trimmed();
        path.rsplit_once('/').map_or(path, |(_, name)| name)
    }

    /// Containing directory, empty at the archive top level.
    pub fn parent(&self) -> &str {
        self.trimmed().rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// Number of separators between the archive root and this entry.
    pub fn depth(&self) -> usize {
        self.trimmed().matches('/').count()
    }

    /// Whether the packer recorded this entry as a unix symlink.
    pub fn is_symlink(&self) -> bool {
        !self.is_directory && self.mode.is_some_and(|m| m & S_IFMT == S_IFLNK)
    }
}
