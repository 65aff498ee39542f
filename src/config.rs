//! Engine configuration
//!
//! ```toml
//! language = "cedar"
//! share_admin_reason = false
//! max_commit_history = 1024
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default backend language name
pub const DEFAULT_LANGUAGE: &str = "cedar";

/// Default bound on commit history walks
pub const DEFAULT_MAX_COMMIT_HISTORY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Registry name of the language backend used for decisions
    #[serde(default = "default_language")]
    pub language: String,

    /// Copy the admin reason into the user channel of error decisions.
    /// Off by default so diagnostics never reach the requesting principal.
    #[serde(default)]
    pub share_admin_reason: bool,

    #[serde(default = "default_max_commit_history")]
    pub max_commit_history: usize,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_max_commit_history() -> usize {
    DEFAULT_MAX_COMMIT_HISTORY
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            language: default_language(),
            share_admin_reason: false,
            max_commit_history: default_max_commit_history(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(PolicyError::BadRequest(
                "config: language cannot be empty".to_string(),
            ));
        }
        if self.max_commit_history == 0 {
            return Err(PolicyError::BadRequest(
                "config: max_commit_history must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
