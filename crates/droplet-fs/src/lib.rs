//! Filesystem primitives used to lay an application tree into place.
//!
//! - `workspace.rs` - Self-removing staging directories and the writability probe
//! - `copy_dir.rs` - Ordered, merge-style tree copy
//! - `permissions.rs` - Owner/mode types and the chown/chmod seam

mod copy_dir;
mod error;
mod permissions;
mod workspace;

pub use copy_dir::{CopyReport, copy_tree};
pub use error::{Error, Result};
pub use permissions::{NativeOps, Owner, OwnerSpec, PermissionMode, PermissionOps};
pub use workspace::{Workspace, probe_writable};
