//! Authorization manifest
//!
//! A ledger carries a JSON manifest that pins, for each partition, the runtime
//! (engine + policy language) its artifacts are written for. Language backends
//! add their own runtime entry and check that a manifest can be served by them.

use crate::error::{PolicyError, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engine identity recorded in runtimes built by this crate
pub const ENGINE_NAME: &str = "ztauth-pdp";
pub const ENGINE_DISTRIBUTION: &str = "ztauth";

/// Version of this engine
pub fn engine_version() -> Version {
    Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| Version::new(0, 0, 0))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engine {
    pub name: String,
    pub version: Version,
    pub distribution: String,
}

/// Policy language of a runtime
///
/// `version` is a syntax requirement such as `"0.0+"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pub engine: Engine,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Key into `Manifest::runtimes`
    pub runtime: String,
    #[serde(default)]
    pub schema: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub metadata: Metadata,
    #[serde(default)]
    pub runtimes: BTreeMap<String, Runtime>,
    #[serde(default)]
    pub partitions: BTreeMap<String, Partition>,
}

impl Manifest {
    /// Create an empty manifest
    ///
    /// ```
    /// use ztauth_pdp::core::manifest::Manifest;
    ///
    /// let manifest = Manifest::new("ztauth", "magicfarmacia", "pharmacy ledger").unwrap();
    /// assert!(manifest.runtimes.is_empty());
    /// ```
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self> {
        let manifest = Manifest {
            metadata: Metadata {
                kind: kind.into(),
                name: name.into(),
                description: description.into(),
            },
            runtimes: BTreeMap::new(),
            partitions: BTreeMap::new(),
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate language-independent fields
    ///
    /// Every partition must point at a declared runtime.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.name.replace(' ', "").is_empty() {
            return Err(PolicyError::Manifest("manifest name is empty".to_string()));
        }
        for (key, partition) in &self.partitions {
            if !self.runtimes.contains_key(&partition.runtime) {
                return Err(PolicyError::Manifest(format!(
                    "partition '{}' references unknown runtime '{}'",
                    key, partition.runtime
                )));
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self, indent: bool) -> Result<Vec<u8>> {
        let bytes = if indent {
            serde_json::to_vec_pretty(self)?
        } else {
            serde_json::to_vec(self)?
        };
        Ok(bytes)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(PolicyError::Manifest("manifest data is empty".to_string()));
        }
        let manifest: Manifest = serde_json::from_slice(data)?;
        manifest.validate()?;
        Ok(manifest)
    }
}
