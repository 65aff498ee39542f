//! Pluggable policy languages
//!
//! Every language backend implements [`LanguageAbstraction`]: it turns source
//! files into blob objects, turns blobs back into source, and evaluates
//! requests against a loaded [`PolicyStore`]. Backends are looked up by name
//! in an immutable [`LanguageRegistry`] built once at startup.

pub mod cedar;
pub mod registry;
pub mod specification;

pub use registry::{LanguageRegistry, LanguageRegistryBuilder};
pub use specification::LanguageSpecification;

use crate::authz::decision::AuthorizationDecision;
use crate::authz::model::AuthorizationContext;
use crate::authz::store::PolicyStore;
use crate::core::commit::Commit;
use crate::core::manager::ObjectManager;
use crate::core::manifest::Manifest;
use crate::core::object::Object;
use crate::core::sections::MultiSectionObject;
use crate::core::tree::Tree;
use crate::error::Result;

/// Contract every policy language backend satisfies
pub trait LanguageAbstraction: Send + Sync {
    fn language_specification(&self) -> &LanguageSpecification;

    /// Register this language's runtime and root partition in a manifest
    fn build_manifest(&self, manifest: Manifest) -> Result<Manifest>;

    /// Check that a manifest can be served by this language
    fn validate_manifest(&self, manifest: &Manifest) -> Result<()>;

    fn create_commit_object(&self, commit: &Commit) -> Result<Object> {
        ObjectManager::new().create_commit_object(commit)
    }

    fn convert_object_to_commit(&self, object: &Object) -> Result<Commit> {
        ObjectManager::new().convert_object_to_commit(object)
    }

    fn create_tree_object(&self, tree: &Tree) -> Result<Object> {
        ObjectManager::new().create_tree_object(tree)
    }

    fn convert_object_to_tree(&self, object: &Object) -> Result<Tree> {
        ObjectManager::new().convert_object_to_tree(object)
    }

    /// Parse a policy file into one section per declared policy
    ///
    /// A malformed policy becomes an error section; only problems with the
    /// file as a whole are returned as `Err`.
    fn create_policy_blob_objects(
        &self,
        partition: &str,
        file_path: &str,
        data: &[u8],
    ) -> Result<MultiSectionObject>;

    /// Reassemble stored policy blobs into one source file
    ///
    /// Returns the file content and the extension to save it with.
    fn create_multi_policy_content_bytes(&self, objects: &[Object]) -> Result<(Vec<u8>, String)>;

    /// Parse a schema file into a single section at index 0
    ///
    /// Empty content fails with `SchemaEmpty`.
    fn create_schema_blob_objects(
        &self,
        partition: &str,
        file_path: &str,
        data: &[u8],
    ) -> Result<MultiSectionObject>;

    /// Returns the schema content and the file name to save it as
    fn create_schema_content_bytes(&self, data: &[u8]) -> Result<(Vec<u8>, String)>;

    /// Translate stored backend bytes into the frontend language
    ///
    /// Fails with `LanguageMismatch` when the ids are not this backend's.
    fn convert_bytes_to_frontend_language(
        &self,
        language_id: u32,
        language_version_id: u32,
        artifact_type_id: u32,
        content: &[u8],
    ) -> Result<Vec<u8>>;

    /// Evaluate one request against a loaded policy store
    fn authorization_check(
        &self,
        request_id: &str,
        store: &PolicyStore,
        ctx: &AuthorizationContext,
    ) -> Result<AuthorizationDecision>;
}
