use std::path::{Path, PathBuf};

use crate::error::VerificationError;

/// Proof that the entry point is in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
    pub entry_point: PathBuf,
}

/// Succeed iff `target/entry_point` exists. Contents are not inspected.
pub fn verify(target: &Path, entry_point: &Path) -> Result<Verified, VerificationError> {
    let path = target.join(entry_point);
    if !path.exists() {
        return Err(VerificationError::EntryPointMissing(path));
    }

    tracing::info!(entry_point = %path.display(), "verified install");
    Ok(Verified { entry_point: path })
}
