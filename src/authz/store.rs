//! Policy store: the artifacts one decision is evaluated against

use crate::core::header::{ArtifactType, ObjectHeader};
use crate::core::manager::ObjectManager;
use crate::core::object::{ObjectId, ObjectInfo, ObjectKind};
use crate::core::store::ObjectStore;
use crate::core::tree::Tree;
use crate::error::{PolicyError, Result};
use crate::languages::LanguageRegistry;
use tracing::{debug, info};

/// A decoded blob held by a policy store
#[derive(Debug, Clone)]
pub struct StoreItem {
    object_info: ObjectInfo,
    header: ObjectHeader,
}

impl StoreItem {
    /// Wrap a decoded blob; trees and commits are rejected
    pub fn new(object_info: ObjectInfo) -> Result<Self> {
        let header = object_info
            .header()
            .cloned()
            .ok_or_else(|| PolicyError::NotABlob(object_info.kind().to_string()))?;
        Ok(StoreItem {
            object_info,
            header,
        })
    }

    pub fn object_info(&self) -> &ObjectInfo {
        &self.object_info
    }

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    pub fn code_id(&self) -> &str {
        &self.header.code_id
    }

    pub fn content(&self) -> &[u8] {
        self.object_info.blob_content().unwrap_or_default()
    }
}

/// Schemas and policies loaded for evaluation
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    version: String,
    schemas: Vec<StoreItem>,
    policies: Vec<StoreItem>,
}

impl PolicyStore {
    pub fn new(version: impl Into<String>) -> Self {
        PolicyStore {
            version: version.into(),
            schemas: Vec::new(),
            policies: Vec::new(),
        }
    }

    /// Id of the commit this store was loaded from
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn schemas(&self) -> &[StoreItem] {
        &self.schemas
    }

    pub fn policies(&self) -> &[StoreItem] {
        &self.policies
    }

    /// Add a blob, sorted by its header's artifact type
    pub fn add_object(&mut self, object_info: ObjectInfo) -> Result<()> {
        let item = StoreItem::new(object_info)?;
        match item.header().artifact_type() {
            Some(ArtifactType::Policy) => self.policies.push(item),
            Some(ArtifactType::Schema) => self.schemas.push(item),
            _ => {
                return Err(PolicyError::InvalidObject(format!(
                    "blob '{}' has artifact type {} which cannot be evaluated",
                    item.code_id(),
                    item.header().artifact_type_id
                )))
            }
        }
        Ok(())
    }

    /// Resolve commit, tree and blobs from `store`
    ///
    /// Each blob is checked against the registry using its own header's
    /// language ids.
    pub fn load(
        store: &dyn ObjectStore,
        registry: &LanguageRegistry,
        commit_id: &ObjectId,
    ) -> Result<Self> {
        let objects = ObjectManager::new();
        let commit = objects.convert_object_to_commit(&store.get(commit_id)?)?;
        let tree = objects.convert_object_to_tree(&store.get(commit.tree())?)?;

        let mut policy_store = PolicyStore::new(commit_id.as_str());
        policy_store.load_tree(store, registry, &objects, &tree)?;

        info!(
            version = %commit_id,
            policies = policy_store.policies.len(),
            schemas = policy_store.schemas.len(),
            "loaded policy store"
        );
        Ok(policy_store)
    }

    fn load_tree(
        &mut self,
        store: &dyn ObjectStore,
        registry: &LanguageRegistry,
        objects: &ObjectManager,
        tree: &Tree,
    ) -> Result<()> {
        for entry in tree.entries() {
            let object = store.get(entry.oid())?;
            match entry.kind() {
                ObjectKind::Tree => {
                    let subtree = objects.convert_object_to_tree(&object)?;
                    self.load_tree(store, registry, objects, &subtree)?;
                }
                ObjectKind::Blob => {
                    let object_info = objects.object_info(&object)?;
                    let header = object_info
                        .header()
                        .ok_or_else(|| PolicyError::NotABlob(object_info.kind().to_string()))?;
                    if header.code_id != entry.code_id() {
                        return Err(PolicyError::InvalidTreeEntry(format!(
                            "entry '{}' points at blob with code id '{}'",
                            entry.code_id(),
                            header.code_id
                        )));
                    }
                    if registry
                        .find_by_backend(header.language_id, header.language_version_id)
                        .is_none()
                    {
                        return Err(PolicyError::UnknownLanguage(format!(
                            "language id {} version id {}",
                            header.language_id, header.language_version_id
                        )));
                    }
                    debug!(code_id = %header.code_id, oid = %entry.oid(), "loaded blob");
                    self.add_object(object_info)?;
                }
                ObjectKind::Commit => {
                    return Err(PolicyError::InvalidTreeEntry(format!(
                        "entry '{}' points at a commit",
                        entry.name()
                    )))
                }
            }
        }
        Ok(())
    }
}
