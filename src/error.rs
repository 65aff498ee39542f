//! Error types for the policy decision engine

use thiserror::Error;

/// Coarse error classes used to decide how a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad policy/schema input; reported per section
    MalformedInput,
    /// Caller broke an operation contract; fatal to that operation
    ContractViolation,
    /// Reserved namespace abuse; always fail-closed
    Security,
    /// Storage, configuration or engine failures
    Internal,
}

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Unsupported frontend language: {0}")]
    UnsupportedFrontendLanguage(String),

    #[error("Syntax error: {0}")]
    SyntaxError(String),

    #[error("Reserved namespace violation: {0}")]
    ReservedNamespaceViolation(String),

    #[error("Schema cannot be empty")]
    SchemaEmpty,

    #[error("Language mismatch: expected {expected}, found {found}")]
    LanguageMismatch { expected: String, found: String },

    #[error("Object encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Object is not a tree (found {0})")]
    NotATree(String),

    #[error("Object is not a commit (found {0})")]
    NotACommit(String),

    #[error("Object is not a blob (found {0})")]
    NotABlob(String),

    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid tree entry: {0}")]
    InvalidTreeEntry(String),

    #[error("Section index {index} out of range (declared {len})")]
    SectionOutOfRange { index: usize, len: usize },

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unsupported subject kind: {0}")]
    UnsupportedSubjectKind(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Manifest validation failed: {0}")]
    Manifest(String),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PolicyError {
    /// Class of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            PolicyError::SyntaxError(_)
            | PolicyError::SchemaEmpty
            | PolicyError::InvalidName(_)
            | PolicyError::InvalidTreeEntry(_)
            | PolicyError::Manifest(_)
            | PolicyError::BadRequest(_) => ErrorClass::MalformedInput,
            PolicyError::UnsupportedFrontendLanguage(_)
            | PolicyError::LanguageMismatch { .. }
            | PolicyError::EncodingFailed(_)
            | PolicyError::NotATree(_)
            | PolicyError::NotACommit(_)
            | PolicyError::NotABlob(_)
            | PolicyError::InvalidObject(_)
            | PolicyError::SectionOutOfRange { .. }
            | PolicyError::UnknownLanguage(_)
            | PolicyError::UnsupportedSubjectKind(_) => ErrorClass::ContractViolation,
            PolicyError::ReservedNamespaceViolation(_) => ErrorClass::Security,
            PolicyError::ObjectNotFound(_)
            | PolicyError::Evaluation(_)
            | PolicyError::Config(_)
            | PolicyError::Io(_)
            | PolicyError::Serialization(_) => ErrorClass::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, PolicyError>;
