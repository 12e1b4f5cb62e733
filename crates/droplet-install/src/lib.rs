//! Install an uploaded application archive into a fixed web root.
//!
//! # Architecture
//!
//! ```text
//! UploadedArchive -> StoredUpload -> Archive -> ProjectRoot
//!     -> install -> normalize -> verify -> Outcome
//! ```
//!
//! - `upload.rs` - Declared metadata checks and hashed temporary storage
//! - `installer.rs` - Direct or staged placement into the target
//! - `normalize.rs` - Best-effort owner and mode rules
//! - `verify.rs` - Entry point presence check
//! - `pipeline.rs` - Stage sequencing
//! - `outcome.rs` - Caller-facing result

pub mod config;
pub mod error;
pub mod installer;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod upload;
pub mod verify;

pub use config::{DEFAULT_MAX_UPLOAD_BYTES, InstallConfig};
pub use error::{
    ConfigError, ErrorCategory, InstallError, NormalizeError, PipelineError, UploadError,
    VerificationError, WritePhase,
};
pub use installer::{InstallReport, Placement, install};
pub use normalize::{NormalizePlan, NormalizeReport, NormalizeStep, NormalizeWarning, normalize};
pub use outcome::{Outcome, SUCCESS_MESSAGE};
pub use pipeline::{InstallSummary, Pipeline};
pub use upload::{StoredUpload, UploadFailure, UploadedArchive};
pub use verify::{Verified, verify};
