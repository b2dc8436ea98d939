//! File operations

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;

use crate::errors::DeployError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    /// Create a new file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Read file contents as string
    pub async fn read_string(&self) -> Result<String, DeployError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    /// Read file contents as bytes, `NotFound` when missing
    pub async fn read_bytes(&self) -> Result<Vec<u8>, DeployError> {
        match fs::read(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DeployError::NotFound(
                self.path.display().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Read file as JSON
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, DeployError> {
        let contents = self.read_string().await?;
        let value = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Open a new file for appending, failing if it already exists
    pub async fn create_new_append(&self) -> Result<fs::File, DeployError> {
        let file = fs::OpenOptions::new()
            .write(true)
            .append(true)
            .create_new(true)
            .open(&self.path)
            .await?;
        Ok(file)
    }
}
