//! Static description of a policy language

use serde::Serialize;

/// Identity and file conventions of one policy language
///
/// The frontend language is what users author; the backend language is what
/// blobs store. Version ids are compared instead of version strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageSpecification {
    pub language: String,
    pub language_version: String,
    pub language_version_id: u32,
    pub frontend_language: String,
    pub frontend_language_id: u32,
    pub backend_language: String,
    pub backend_language_id: u32,
    pub supported_policy_file_extensions: Vec<String>,
    pub supported_schema_file_names: Vec<String>,
}
