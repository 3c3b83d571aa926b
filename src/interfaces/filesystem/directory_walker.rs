// Directory Walker Interface
//
// Seam over filesystem traversal so discovery can be tested without a
// real directory tree.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::shared::error::FilesystemError;

/// One regular file found by a walk
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub file_size: u64,
    /// Last modification time; drives the import hold
    pub modified: SystemTime,
    pub extension: Option<String>,
}

/// Directory walker interface
///
/// Walks recursively, yields regular files only and never follows
/// symlinks.
#[async_trait]
pub trait DirectoryWalker: Send + Sync {
    async fn walk_files(&self, root: &std::path::Path) -> Result<Vec<WalkEntry>, FilesystemError>;
}
