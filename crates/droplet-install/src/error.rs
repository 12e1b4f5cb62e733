use std::io;
use std::path::PathBuf;

use serde::Serialize;

use crate::upload::UploadFailure;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload failed: {}", .0.message())]
    Failed(UploadFailure),

    #[error("upload is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("'{filename}' does not have the .{expected} extension")]
    WrongExtension { filename: String, expected: String },

    #[error("failed to store upload: {0}")]
    Store(#[source] io::Error),
}

/// Which part of placement failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritePhase {
    /// Extracting straight into the target.
    ExtractTarget,
    /// Creating the staging directory or extracting into it.
    Stage,
    /// Copying the staged project root into the target.
    Copy,
}

impl std::fmt::Display for WritePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ExtractTarget => "extract into target",
            Self::Stage => "stage archive",
            Self::Copy => "copy into target",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("target '{path}' is not writable: {source}")]
    TargetUnwritable {
        path: PathBuf,
        source: droplet_fs::Error,
    },

    #[error("install failed during {phase}: {source}")]
    WriteFailed {
        phase: WritePhase,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("project root '{0}' is missing from the staged archive")]
    RootMissing(String),
}

impl InstallError {
    pub(crate) fn write(
        phase: WritePhase,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::WriteFailed {
            phase,
            source: Box::new(source),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("install target '{0}' is missing or not a directory")]
    TargetMissing(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("entry point '{0}' is missing after install")]
    EntryPointMissing(PathBuf),
}

/// The fixed failure taxonomy surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    UploadInvalid,
    ArchiveUnreadable,
    RootNotFound,
    InstallWriteFailed,
    TargetUnwritable,
    VerificationFailed,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UploadInvalid => "upload_invalid",
            Self::ArchiveUnreadable => "archive_unreadable",
            Self::RootNotFound => "root_not_found",
            Self::InstallWriteFailed => "install_write_failed",
            Self::TargetUnwritable => "target_unwritable",
            Self::VerificationFailed => "verification_failed",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First failure of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Archive(#[from] droplet_archive::Error),

    #[error("no '{marker}' found within one directory of the archive root")]
    RootNotFound { marker: String },

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Upload(_) => ErrorCategory::UploadInvalid,
            Self::Archive(e) if e.is_unreadable() => ErrorCategory::ArchiveUnreadable,
            Self::Archive(_) => ErrorCategory::InstallWriteFailed,
            Self::RootNotFound { .. } => ErrorCategory::RootNotFound,
            Self::Install(InstallError::TargetUnwritable { .. }) => ErrorCategory::TargetUnwritable,
            Self::Install(_) => ErrorCategory::InstallWriteFailed,
            Self::Normalize(_) | Self::Verification(_) => ErrorCategory::VerificationFailed,
        }
    }

    /// Message safe to show the uploader: no paths, no internals.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upload(UploadError::Failed(failure)) => failure.message().to_string(),
            Self::Upload(UploadError::TooLarge { max, .. }) => {
                format!("File too large (max {})", upload_limit(*max))
            }
            Self::Upload(UploadError::WrongExtension { expected, .. }) => {
                format!("Only .{expected} files allowed")
            }
            Self::Upload(UploadError::Store(_)) => "Failed to save uploaded file".to_string(),
            _ => match self.category() {
                ErrorCategory::ArchiveUnreadable => "Cannot open zip file",
                ErrorCategory::RootNotFound => {
                    "No application root found in archive (missing marker file)"
                }
                ErrorCategory::InstallWriteFailed => "Extraction failed while writing files",
                ErrorCategory::TargetUnwritable => "Install directory is not writable",
                ErrorCategory::VerificationFailed => {
                    "Extraction complete but the application entry point was not found"
                }
                ErrorCategory::UploadInvalid => "Upload error",
            }
            .to_string(),
        }
    }
}

const MIB: u64 = 1024 * 1024;

/// Whole megabytes when the cap is one, exact bytes otherwise.
fn upload_limit(max: u64) -> String {
    if max >= MIB && max % MIB == 0 {
        format!("{}MB", max / MIB)
    } else {
        format!("{max} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let cases: Vec<(PipelineError, ErrorCategory)> = vec![
            (
                UploadError::TooLarge { size: 2, max: 1 }.into(),
                ErrorCategory::UploadInvalid,
            ),
            (
                droplet_archive::Error::Unreadable {
                    reason: "bad".into(),
                }
                .into(),
                ErrorCategory::ArchiveUnreadable,
            ),
            (
                droplet_archive::Error::UnsafePath {
                    entry: "../x".into(),
                }
                .into(),
                ErrorCategory::InstallWriteFailed,
            ),
            (
                PipelineError::RootNotFound {
                    marker: "artisan".into(),
                },
                ErrorCategory::RootNotFound,
            ),
            (
                InstallError::TargetUnwritable {
                    path: "/srv".into(),
                    source: droplet_fs::Error::NotFound("/srv".into()),
                }
                .into(),
                ErrorCategory::TargetUnwritable,
            ),
            (
                InstallError::write(WritePhase::Copy, io::Error::other("disk full")).into(),
                ErrorCategory::InstallWriteFailed,
            ),
            (
                VerificationError::EntryPointMissing("artisan".into()).into(),
                ErrorCategory::VerificationFailed,
            ),
            (
                NormalizeError::TargetMissing("/srv".into()).into(),
                ErrorCategory::VerificationFailed,
            ),
        ];

        for (error, category) in cases {
            assert_eq!(error.category(), category, "{error}");
        }
    }

    #[test]
    fn user_messages_hide_paths() {
        let error: PipelineError = InstallError::TargetUnwritable {
            path: "/var/www/html".into(),
            source: droplet_fs::Error::NotFound("/var/www/html".into()),
        }
        .into();
        assert_eq!(error.user_message(), "Install directory is not writable");
        assert!(error.to_string().contains("/var/www/html"));

        let error: PipelineError = UploadError::TooLarge {
            size: 300 * 1024 * 1024,
            max: 200 * 1024 * 1024,
        }
        .into();
        assert_eq!(error.user_message(), "File too large (max 200MB)");

        for (max, shown) in [(MIB * 3 / 2, "1572864 bytes"), (64, "64 bytes")] {
            let error: PipelineError = UploadError::TooLarge { size: max + 1, max }.into();
            assert_eq!(error.user_message(), format!("File too large (max {shown})"));
        }

        let error: PipelineError = UploadError::WrongExtension {
            filename: "app.tar.gz".into(),
            expected: "zip".into(),
        }
        .into();
        assert_eq!(error.user_message(), "Only .zip files allowed");

        let error: PipelineError = UploadError::Failed(UploadFailure::Partial).into();
        assert_eq!(error.user_message(), "File partially uploaded");
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::InstallWriteFailed).unwrap();
        assert_eq!(json, "\"install_write_failed\"");
        assert_eq!(ErrorCategory::RootNotFound.to_string(), "root_not_found");
    }
}
