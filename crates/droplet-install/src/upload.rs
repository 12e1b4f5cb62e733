use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::path::Path;

use sha2::Digest;
use tempfile::NamedTempFile;

use crate::config::InstallConfig;
use crate::error::UploadError;

const STORE_PREFIX: &str = "droplet-upload-";

/// Transport-level failures reported by whatever received the upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadFailure {
    /// The server's own request size limit was hit.
    ServerLimit,
    /// The form's declared size limit was hit.
    FormLimit,
    Partial,
    NoFile,
    NoTempDir,
    CannotWrite,
    Other,
}

impl UploadFailure {
    pub fn message(self) -> &'static str {
        match self {
            Self::ServerLimit => "File exceeds server limit",
            Self::FormLimit => "File exceeds form limit",
            Self::Partial => "File partially uploaded",
            Self::NoFile => "No file uploaded",
            Self::NoTempDir => "No temp directory",
            Self::CannotWrite => "Cannot write to disk",
            Self::Other => "Upload error",
        }
    }
}

enum Body<R> {
    Stream(R),
    Failed(UploadFailure),
}

/// An upload as handed over by the outer layer.
///
/// Consumed once by [`UploadedArchive::persist`].
pub struct UploadedArchive<R> {
    body: Body<R>,
    filename: String,
    declared_size: u64,
}

impl<R: Read> UploadedArchive<R> {
    pub fn new(reader: R, filename: impl Into<String>, declared_size: u64) -> Self {
        Self {
            body: Body::Stream(reader),
            filename: filename.into(),
            declared_size,
        }
    }

    /// Check the declared metadata; nothing is read from the stream.
    pub fn validate(&self, config: &InstallConfig) -> Result<(), UploadError> {
        if let Body::Failed(failure) = self.body {
            return Err(UploadError::Failed(failure));
        }

        if self.declared_size > config.max_upload_bytes {
            return Err(UploadError::TooLarge {
                size: self.declared_size,
                max: config.max_upload_bytes,
            });
        }

        let extension = Path::new(&self.filename)
            .extension()
            .and_then(OsStr::to_str);
        if extension != Some(config.accepted_extension.as_str()) {
            return Err(UploadError::WrongExtension {
                filename: self.filename.clone(),
                expected: config.accepted_extension.clone(),
            });
        }

        Ok(())
    }

    /// Stream the body into a temporary file below `dir`, hashing it on the way.
    ///
    /// More than `max` bytes is `TooLarge` whatever the declared size said;
    /// the partial file is removed before returning.
    pub fn persist(self, dir: Option<&Path>, max: u64) -> Result<StoredUpload, UploadError> {
        let reader = match self.body {
            Body::Stream(reader) => reader,
            Body::Failed(failure) => return Err(UploadError::Failed(failure)),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(STORE_PREFIX);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(UploadError::Store)?;

        let mut limited = reader.take(max.saturating_add(1));
        let mut hasher = sha2::Sha256::new();
        let mut buffer = [0u8; 8192];
        let mut bytes = 0u64;

        loop {
            let n = match limited.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(UploadError::Store(e)),
            };
            bytes += n as u64;
            if bytes > max {
                return Err(UploadError::TooLarge { size: bytes, max });
            }
            hasher.update(&buffer[..n]);
            file.write_all(&buffer[..n]).map_err(UploadError::Store)?;
        }
        file.flush().map_err(UploadError::Store)?;

        let sha256 = hex::encode(hasher.finalize());
        tracing::info!(
            filename = %self.filename,
            bytes,
            sha256 = %sha256,
            "stored upload"
        );

        Ok(StoredUpload { file, sha256, bytes })
    }
}

impl UploadedArchive<io::Empty> {
    /// An upload the transport layer already gave up on.
    pub fn failed(failure: UploadFailure) -> Self {
        Self {
            body: Body::Failed(failure),
            filename: String::new(),
            declared_size: 0,
        }
    }
}

/// The upload on disk. The file is deleted when this is dropped.
#[derive(Debug)]
pub struct StoredUpload {
    file: NamedTempFile,
    sha256: String,
    bytes: u64,
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Lowercase hex SHA-256 of the stored bytes.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}
