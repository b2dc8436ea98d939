//! Directory operations

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

use crate::errors::DeployError;
use crate::filesys::file::File;

/// A file found while listing a directory
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub created: SystemTime,
}

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Create the directory (and parents)
    pub async fn create(&self) -> Result<(), DeployError> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// List regular files with their creation time
    ///
    /// Falls back to the modification time where the platform does not
    /// record creation time.
    pub async fn list_files(&self) -> Result<Vec<DirEntry>, DeployError> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let created = metadata.created().or_else(|_| metadata.modified())?;
            files.push(DirEntry { name, created });
        }

        Ok(files)
    }

    /// Get a file within this directory
    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }
}
