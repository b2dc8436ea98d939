//! Storage layout configuration

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::DeployError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Where packages, scripts, session logs and tokens live
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory relative paths are resolved against
    pub base_dir: PathBuf,

    /// Archive pickup directory
    pub package_dir: PathBuf,

    /// Deploy script directory
    pub script_dir: PathBuf,

    /// Session log directory
    pub log_dir: PathBuf,

    /// Token file, one token per line
    pub token_file: PathBuf,
}

impl StorageLayout {
    /// Create a layout rooted at `base_dir` with the default relative paths
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            package_dir: PathBuf::from("deployment_packages"),
            script_dir: PathBuf::from("deployment_scripts"),
            log_dir: PathBuf::from("deployment_scripts/log"),
            token_file: PathBuf::from("token.txt"),
        }
    }

    /// Anchor a path to the base directory if it is still relative
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Path of an archive named in a manifest
    pub fn package_path(&self, archive: &str) -> PathBuf {
        self.resolve(&self.package_dir.join(archive))
    }

    /// Path of a deploy script named in a manifest
    pub fn script_path(&self, script: &str) -> PathBuf {
        self.resolve(&self.script_dir.join(script))
    }

    /// Get the session log directory
    pub fn logs_dir(&self) -> Dir {
        Dir::new(self.resolve(&self.log_dir))
    }

    /// Get the token file
    pub fn tokens_file(&self) -> File {
        File::new(self.resolve(&self.token_file))
    }

    /// Setup the storage layout (create directories)
    pub async fn setup(&self) -> Result<(), DeployError> {
        Dir::new(self.resolve(&self.package_dir)).create().await?;
        Dir::new(self.resolve(&self.script_dir)).create().await?;
        self.logs_dir().create().await?;

        let tokens = self.tokens_file();
        if !tokens.exists().await {
            warn!(
                "Token file {} does not exist, every session will fail to load tokens",
                tokens.path().display()
            );
        }
        Ok(())
    }
}
