//! Tree objects: snapshots of a policy/schema set

use super::object::{ObjectId, ObjectKind};
use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};

/// Default partition path
pub const ROOT_PARTITION: &str = "/";

/// A single entry in a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    path: String,
    kind: ObjectKind,
    oid: ObjectId,
    name: String,
    code_id: String,
    code_type: String,
    language: String,
    language_version: String,
    language_type: String,
}

impl TreeEntry {
    /// Create a validated tree entry
    ///
    /// Every text field must be non-empty and free of whitespace, since the
    /// encoded tree is space separated. An empty path maps to the root partition.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: &str,
        kind: ObjectKind,
        oid: ObjectId,
        name: &str,
        code_id: &str,
        code_type: &str,
        language: &str,
        language_version: &str,
        language_type: &str,
    ) -> Result<Self> {
        let path = if path.is_empty() { ROOT_PARTITION } else { path };
        for (field, value) in [
            ("path", path),
            ("name", name),
            ("code id", code_id),
            ("code type", code_type),
            ("language", language),
            ("language version", language_version),
            ("language type", language_type),
        ] {
            check_field(field, value)?;
        }
        Ok(TreeEntry {
            path: path.to_string(),
            kind,
            oid,
            name: name.to_string(),
            code_id: code_id.to_string(),
            code_type: code_type.to_string(),
            language: language.to_string(),
            language_version: language_version.to_string(),
            language_type: language_type.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code_id(&self) -> &str {
        &self.code_id
    }

    pub fn code_type(&self) -> &str {
        &self.code_type
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn language_version(&self) -> &str {
        &self.language_version
    }

    pub fn language_type(&self) -> &str {
        &self.language_type
    }

    fn encode(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {}",
            self.kind,
            self.path,
            self.oid,
            self.name,
            self.code_id,
            self.code_type,
            self.language,
            self.language_version,
            self.language_type
        )
    }

    fn decode(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() != 9 {
            return Err(PolicyError::InvalidObject(format!(
                "invalid tree entry format: {}",
                line
            )));
        }
        let kind = ObjectKind::parse(parts[0]).ok_or_else(|| {
            PolicyError::InvalidObject(format!("invalid tree entry kind: {}", parts[0]))
        })?;
        let oid = ObjectId::parse(parts[2])?;
        TreeEntry::new(
            parts[1], kind, oid, parts[3], parts[4], parts[5], parts[6], parts[7], parts[8],
        )
    }
}

fn check_field(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(PolicyError::InvalidTreeEntry(format!("{} is empty", field)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(PolicyError::InvalidTreeEntry(format!(
            "{} '{}' contains whitespace",
            field, value
        )));
    }
    Ok(())
}

/// Ordered list of tree entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry
    ///
    /// Names are unique, and so are `(code_id, code_type)` pairs.
    pub fn add_entry(&mut self, entry: TreeEntry) -> Result<()> {
        for existing in &self.entries {
            if existing.name == entry.name {
                return Err(PolicyError::InvalidTreeEntry(format!(
                    "entry '{}' already exists",
                    entry.name
                )));
            }
            if existing.code_id == entry.code_id && existing.code_type == entry.code_type {
                return Err(PolicyError::InvalidTreeEntry(format!(
                    "code id '{}' of type '{}' already exists",
                    entry.code_id, entry.code_type
                )));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.entries.is_empty() {
            return Err(PolicyError::EncodingFailed(
                "tree has no entries".to_string(),
            ));
        }
        let lines: Vec<String> = self.entries.iter().map(TreeEntry::encode).collect();
        Ok(lines.join("\n").into_bytes())
    }

    pub(crate) fn from_bytes(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| PolicyError::InvalidObject(format!("tree is not UTF-8: {}", e)))?;
        let mut tree = Tree::new();
        for line in text.split('\n') {
            tree.add_entry(TreeEntry::decode(line)?)?;
        }
        Ok(tree)
    }
}
