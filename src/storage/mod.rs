//! Local filesystem publishing.
//!
//! - [`atomic`]: two-rename directory swap with rollback
//! - [`local`]: staging trees that are built next to their target and promoted at once

pub mod atomic;
pub mod local;

// Re-export for convenience
pub use atomic::{StagingPaths, replace_dir};
pub use local::StagingDir;
