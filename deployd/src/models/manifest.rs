//! Deployment manifest models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::utils::sha256_hex;

/// Namespace used when a manifest does not name one
pub const FALLBACK_NAMESPACE: &str = "namespace";

/// A deployment request posted by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Deployment namespace, falls back to [`FALLBACK_NAMESPACE`]
    #[serde(default)]
    pub namespace: String,

    /// Token checked against the token file
    #[serde(default)]
    pub auth_token: String,

    /// Packages to deploy, keyed by name
    ///
    /// A sorted map keeps the serialized form canonical for fingerprinting.
    #[serde(default)]
    pub deploy: BTreeMap<String, PackageSpec>,
}

/// One package of a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Archive path, relative to the package directory unless absolute
    #[serde(rename = "package", default)]
    pub archive: String,

    /// Deploy script path, relative to the script directory unless absolute
    #[serde(default)]
    pub script: String,

    /// Record the package but do not run it
    #[serde(default)]
    pub skip: bool,
}

impl Manifest {
    /// Decode and validate a YAML manifest
    pub fn from_yaml(body: &str) -> Result<Self, DeployError> {
        let manifest: Manifest = serde_yaml::from_str(body)
            .map_err(|e| DeployError::InvalidManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the manifest is deployable
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.deploy.is_empty() {
            return Err(DeployError::InvalidManifest(
                "no packages under 'deploy'".to_string(),
            ));
        }
        if !self.namespace.is_empty() && !is_valid_namespace(&self.namespace) {
            return Err(DeployError::InvalidManifest(format!(
                "invalid namespace '{}'",
                self.namespace
            )));
        }
        Ok(())
    }

    /// Namespace with the fallback applied
    pub fn resolved_namespace(&self) -> &str {
        if self.namespace.is_empty() {
            FALLBACK_NAMESPACE
        } else {
            &self.namespace
        }
    }

    /// Deterministic hash of the manifest content
    pub fn fingerprint(&self) -> Result<String, DeployError> {
        let canonical = serde_json::to_vec(self)?;
        Ok(sha256_hex(&canonical))
    }
}

/// Namespaces end up in log file names, so keep them to a safe charset
pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && !namespace.starts_with('.')
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Example manifest returned to clients that post something unusable
pub fn sample_manifest() -> Manifest {
    let mut deploy = BTreeMap::new();
    deploy.insert(
        "front-end-app".to_string(),
        PackageSpec {
            archive: "front-ui.tar".to_string(),
            script: "deploy-ui.sh".to_string(),
            skip: false,
        },
    );
    deploy.insert(
        "back-end-app".to_string(),
        PackageSpec {
            archive: "api-backend.tar".to_string(),
            script: "deploy-backend.sh".to_string(),
            skip: false,
        },
    );
    Manifest {
        namespace: "prod".to_string(),
        auth_token: "<token>".to_string(),
        deploy,
    }
}

pub fn sample_manifest_yaml() -> String {
    serde_yaml::to_string(&sample_manifest()).unwrap_or_default()
}
