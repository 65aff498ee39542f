//! Cedar language backend
//!
//! Users author Cedar text; blobs store each policy in Cedar's JSON form, one
//! blob per policy, keyed by its `@id` annotation.

mod abstraction;
mod request;
pub mod statements;

pub use abstraction::CedarLanguageAbstraction;

pub const LANGUAGE_CEDAR: &str = "cedar";
pub const LANGUAGE_CEDAR_ID: u32 = 1;

pub const LANGUAGE_CEDAR_JSON: &str = "cedar-json";
pub const LANGUAGE_CEDAR_JSON_ID: u32 = 2;

pub const LANGUAGE_SYNTAX_VERSION: &str = "0.0";
pub const LANGUAGE_SYNTAX_VERSION_ID: u32 = 0;

pub const LANGUAGE_SCHEMA_TYPE: &str = "schema";
pub const LANGUAGE_SCHEMA_TYPE_ID: u32 = 1;
pub const LANGUAGE_POLICY_TYPE: &str = "policy";
pub const LANGUAGE_POLICY_TYPE_ID: u32 = 2;

pub const LANGUAGE_FILE_EXTENSION: &str = ".cedar";
pub const LANGUAGE_SCHEMA_FILE_NAME: &str = "schema.json";

/// Annotation holding a policy's id
pub const POLICY_ID_ANNOTATION: &str = "id";

/// Code id and name of the single schema section
pub const SCHEMA_CODE_ID: &str = "schema";

// Entity types of the platform principals
pub const SUBJECT_TYPE_USER: &str = "ZTAuth::IAM::User";
pub const SUBJECT_TYPE_ROLE_ACTOR: &str = "ZTAuth::IAM::RoleActor";
pub const SUBJECT_TYPE_TWIN_ACTOR: &str = "ZTAuth::IAM::TwinActor";

/// Last path segment of every Cedar action entity type
pub const ACTION_ENTITY_TYPE: &str = "Action";

/// Manifest runtime key, e.g. `cedar[0.0+]`
pub fn runtime_key() -> String {
    format!("{}[{}+]", LANGUAGE_CEDAR, LANGUAGE_SYNTAX_VERSION)
}
