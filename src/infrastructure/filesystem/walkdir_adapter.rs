//! WalkDir Adapter Implementation
//!
//! DirectoryWalker backed by walkdir. Symlinks are not followed; only
//! regular files are yielded.

use async_trait::async_trait;
use std::path::Path;

use crate::interfaces::filesystem::{DirectoryWalker, WalkEntry};
use crate::shared::error::FilesystemError;

pub struct WalkDirAdapter;

impl WalkDirAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WalkDirAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryWalker for WalkDirAdapter {
    async fn walk_files(&self, root: &Path) -> Result<Vec<WalkEntry>, FilesystemError> {
        if !root.exists() {
            return Err(FilesystemError::PathNotFound(
                root.to_string_lossy().to_string(),
            ));
        }

        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| FilesystemError::WalkError(e.to_string()))?;

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| FilesystemError::WalkError(e.to_string()))?;
            let modified = metadata.modified()?;

            entries.push(WalkEntry {
                path: entry.path().to_path_buf(),
                file_size: metadata.len(),
                modified,
                extension: entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|s| s.to_string()),
            });
        }

        Ok(entries)
    }
}
