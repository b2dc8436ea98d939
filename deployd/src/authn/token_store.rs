//! Token file access for manifest authentication

use std::collections::HashSet;

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::DeployError;
use crate::filesys::file::File;

/// Tokens accepted for a deployment
///
/// An empty set means authentication is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: HashSet<String>,
}

impl TokenSet {
    /// Parse a token file: one token per line, blank lines ignored
    pub fn parse(contents: &str) -> Self {
        Self {
            tokens: contents
                .lines()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check a manifest token against the set
    pub fn authenticate(&self, token: &str) -> Result<(), DeployError> {
        if self.is_disabled() || self.tokens.contains(token) {
            Ok(())
        } else {
            Err(DeployError::AuthenticationFailed)
        }
    }
}

/// Reads the token file on demand
///
/// Loads are serialized so a reader never races another load of a file that
/// is being rewritten. Nothing is cached: every session sees the file as it
/// is when the session starts.
pub struct TokenStore {
    file: File,
    gate: Mutex<()>,
}

impl TokenStore {
    pub fn new(file: File) -> Self {
        Self {
            file,
            gate: Mutex::new(()),
        }
    }

    /// Read the current token set
    pub async fn load(&self) -> Result<TokenSet, DeployError> {
        let _guard = self.gate.lock().await;
        let contents = self.file.read_string().await.map_err(|e| {
            DeployError::TokenLoadError(format!("{}: {}", self.file.path().display(), e))
        })?;
        let tokens = TokenSet::parse(&contents);
        debug!("Loaded token file {}", self.file.path().display());
        Ok(tokens)
    }
}
