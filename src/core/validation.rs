//! Validation for policy names and the reserved platform namespace
//!
//! Policy names end up as code ids and tree entry names, so they follow a
//! strict lowercase format. The reserved namespace guards platform-owned
//! entity kinds from being forged by callers.

use crate::error::{PolicyError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Namespace owned by the platform
pub const RESERVED_NAMESPACE: &str = "ZTAuth";

/// Separator between namespace segments of an entity kind
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Validated policy name
///
/// # Rules
/// - Lowercase letters (a-z), numbers (0-9), hyphens (-) and underscores (_)
/// - Must start and end with a letter or number
/// - Must not start with the reserved namespace
/// - Length: 1-254 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyName(String);

impl PolicyName {
    const PATTERN: &'static str = r"^[a-z0-9]([a-z0-9_-]*[a-z0-9])?$";

    const MAX_LENGTH: usize = 254;

    /// Create a new validated name
    ///
    /// ```
    /// use ztauth_pdp::core::validation::PolicyName;
    ///
    /// assert!(PolicyName::new("view-inventory").is_ok());
    /// assert!(PolicyName::new("View-Inventory").is_err());
    /// assert!(PolicyName::new("ztauth-admin").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(PolicyName(name))
    }

    fn pattern() -> Result<&'static Regex> {
        static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
        PATTERN
            .get_or_init(|| Regex::new(Self::PATTERN))
            .as_ref()
            .map_err(|e| PolicyError::InvalidName(format!("name pattern: {}", e)))
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(PolicyError::InvalidName("name cannot be empty".to_string()));
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(PolicyError::InvalidName(format!(
                "name too long (max {} characters)",
                Self::MAX_LENGTH
            )));
        }

        if name.to_lowercase().starts_with(&RESERVED_NAMESPACE.to_lowercase()) {
            return Err(PolicyError::InvalidName(format!(
                "name '{}' cannot use the reserved '{}' prefix",
                name,
                RESERVED_NAMESPACE.to_lowercase()
            )));
        }

        if !Self::pattern()?.is_match(name) {
            return Err(PolicyError::InvalidName(format!(
                "name '{}' must be lowercase letters, numbers, hyphens or underscores",
                name
            )));
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for PolicyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PolicyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn normalize(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// True when `identifier` is, or lives under, the reserved namespace
///
/// Comparison ignores case and whitespace, so `" ztauth "` and
/// `"ZTAuth::IAM::User"` are both reserved.
pub fn is_reserved(identifier: &str) -> bool {
    let normalized = normalize(identifier);
    let reserved = RESERVED_NAMESPACE.to_lowercase();
    normalized == reserved
        || normalized.starts_with(&format!("{}{}", reserved, NAMESPACE_SEPARATOR))
}

/// Reject an externally supplied identifier that uses the reserved namespace
pub fn ensure_not_reserved(what: &str, identifier: &str) -> Result<()> {
    if is_reserved(identifier) {
        return Err(PolicyError::ReservedNamespaceViolation(format!(
            "{} '{}' uses the reserved {} namespace",
            what, identifier, RESERVED_NAMESPACE
        )));
    }
    Ok(())
}
