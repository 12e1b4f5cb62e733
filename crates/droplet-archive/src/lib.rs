//! ZIP reading with path sanitization and project root discovery.
//!
//! # Architecture
//!
//! - `reader.rs` - Opening, listing and extracting archives
//! - `entry.rs` - Central-directory records
//! - `sanitize.rs` - Path sanitization (zip-slip prevention)
//! - `locate.rs` - Marker-file root discovery, independent of the reader

pub use entry::ArchiveEntry;
pub use error::{Error, Result};
pub use locate::{ProjectRoot, locate_root};
pub use reader::{Archive, ExtractReport};
pub use sanitize::{check_no_linked_parent, check_symlink_target, sanitize_entry_path};

mod entry;
mod error;
mod locate;
mod reader;
mod sanitize;
