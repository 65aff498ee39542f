//! Object creation and type-checked decoding

use super::commit::Commit;
use super::header::{CodeType, ObjectHeader};
use super::object::{Object, ObjectId, ObjectInfo, ObjectInstance, ObjectKind};
use super::store::ObjectStore;
use super::tree::Tree;
use crate::error::{PolicyError, Result};
use tracing::debug;

/// Stateless factory and decoder for objects
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectManager;

impl ObjectManager {
    pub fn new() -> Self {
        ObjectManager
    }

    /// Create a blob from a header and its content
    ///
    /// Fails with `EncodingFailed` when the content is empty or the header's
    /// artifact type disagrees with its code type.
    pub fn create_blob_object(&self, header: &ObjectHeader, data: &[u8]) -> Result<Object> {
        if data.is_empty() {
            return Err(PolicyError::EncodingFailed("blob data is empty".to_string()));
        }
        header.validate_for_blob()?;

        let mut payload = header.to_bytes();
        payload.extend_from_slice(data);
        let object = Object::frame(ObjectKind::Blob, &payload)?;

        debug!(oid = %object.oid(), code_id = %header.code_id, "created blob object");
        Ok(object)
    }

    pub fn create_tree_object(&self, tree: &Tree) -> Result<Object> {
        let object = Object::frame(ObjectKind::Tree, &tree.to_bytes()?)?;
        debug!(oid = %object.oid(), entries = tree.len(), "created tree object");
        Ok(object)
    }

    pub fn create_commit_object(&self, commit: &Commit) -> Result<Object> {
        let object = Object::frame(ObjectKind::Commit, &commit.to_bytes())?;
        debug!(oid = %object.oid(), tree = %commit.tree(), "created commit object");
        Ok(object)
    }

    /// Decode any object into its typed instance
    pub fn object_info(&self, object: &Object) -> Result<ObjectInfo> {
        let kind = object.kind()?;
        let payload = object.payload()?;
        let (header, instance) = match kind {
            ObjectKind::Blob => {
                let (header, consumed) = ObjectHeader::from_bytes(payload)?;
                (Some(header), ObjectInstance::Blob(payload[consumed..].to_vec()))
            }
            ObjectKind::Tree => (None, ObjectInstance::Tree(Tree::from_bytes(payload)?)),
            ObjectKind::Commit => (None, ObjectInstance::Commit(Commit::from_bytes(payload)?)),
        };
        Ok(ObjectInfo::new(header, object.clone(), kind, instance))
    }

    /// Decode a tree, failing with `NotATree` for any other kind
    pub fn convert_object_to_tree(&self, object: &Object) -> Result<Tree> {
        let kind = object.kind()?;
        if kind != ObjectKind::Tree {
            return Err(PolicyError::NotATree(kind.to_string()));
        }
        Tree::from_bytes(object.payload()?)
    }

    /// Decode a commit, failing with `NotACommit` for any other kind
    pub fn convert_object_to_commit(&self, object: &Object) -> Result<Commit> {
        let kind = object.kind()?;
        if kind != ObjectKind::Commit {
            return Err(PolicyError::NotACommit(kind.to_string()));
        }
        Commit::from_bytes(object.payload()?)
    }

    /// Decode a blob into its header and content
    pub fn convert_object_to_blob(&self, object: &Object) -> Result<(ObjectHeader, Vec<u8>)> {
        let kind = object.kind()?;
        if kind != ObjectKind::Blob {
            return Err(PolicyError::NotABlob(kind.to_string()));
        }
        let payload = object.payload()?;
        let (header, consumed) = ObjectHeader::from_bytes(payload)?;
        Ok((header, payload[consumed..].to_vec()))
    }

    /// Content of a native-language blob with its code type
    pub fn read_object_content_bytes(&self, object: &Object) -> Result<(CodeType, Vec<u8>)> {
        let (header, content) = self.convert_object_to_blob(object)?;
        if !header.is_native_language {
            return Err(PolicyError::UnsupportedFrontendLanguage(
                "object is not in a native language".to_string(),
            ));
        }
        let code_type = header.code_type().ok_or_else(|| {
            PolicyError::InvalidObject(format!("unknown code type id {}", header.code_type_id))
        })?;
        Ok((code_type, content))
    }

    /// Walk parent links from `from` looking for `to`
    ///
    /// Returns whether `to` was reached and the commits visited (including
    /// `from` and `to`), newest first unless `reverse` is set. A zero `to`
    /// walks to the root. The walk visits at most `limit` commits.
    pub fn build_commit_history(
        &self,
        store: &dyn ObjectStore,
        from: &ObjectId,
        to: &ObjectId,
        reverse: bool,
        limit: usize,
    ) -> Result<(bool, Vec<Commit>)> {
        if from.is_zero() {
            if to.is_zero() {
                return Ok((true, Vec::new()));
            }
            return Err(PolicyError::BadRequest("invalid from commit id".to_string()));
        }

        let mut history = Vec::new();
        let mut matched = false;
        let mut current = Some(from.clone());

        while let Some(oid) = current {
            if history.len() >= limit {
                return Err(PolicyError::BadRequest(format!(
                    "commit history exceeds {} entries",
                    limit
                )));
            }
            let object = store.get(&oid)?;
            let commit = self.convert_object_to_commit(&object)?;
            current = commit.parent().cloned();
            history.push(commit);
            if &oid == to {
                matched = true;
                break;
            }
        }
        if to.is_zero() {
            matched = true;
        }

        if reverse {
            history.reverse();
        }
        Ok((matched, history))
    }
}
