//! Content-addressed objects
//!
//! Every object is a framed byte buffer whose identity is the SHA-256 of the
//! whole frame. Objects are never mutated; a change produces a new object.
//!
//! # Frame layout (little-endian)
//!
//! ```text
//! magic        b"ZTOB"
//! version      u16
//! kind         u8   (1 = blob, 2 = tree, 3 = commit)
//! payload_len  u32
//! payload      [u8; payload_len]
//! ```

use super::commit::Commit;
use super::header::{read_u32, ObjectHeader};
use super::tree::Tree;
use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const OBJECT_MAGIC: [u8; 4] = *b"ZTOB";
pub const OBJECT_FORMAT_VERSION: u16 = 1;

/// Length of the frame preceding the payload
pub const FRAME_LEN: usize = 4 + 2 + 1 + 4;

/// Hex SHA-256 identifier of an object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    /// Identifier used for "no object" (e.g. the parent of a root commit on the wire)
    pub const ZERO: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// Parse and validate a 64 character lowercase hex id
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.len() != 64 || !id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(PolicyError::InvalidObject(format!(
                "'{}' is not a valid object id",
                id
            )));
        }
        Ok(ObjectId(id))
    }

    /// Compute the id of raw bytes
    pub fn of(bytes: &[u8]) -> Self {
        ObjectId(format!("{:x}", Sha256::digest(bytes)))
    }

    pub fn zero() -> Self {
        ObjectId(Self::ZERO.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of object stored in the frame
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Blob = 1,
    Tree = 2,
    Commit = 3,
}

impl ObjectKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Blob),
            2 => Some(Self::Tree),
            3 => Some(Self::Commit),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable framed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    oid: ObjectId,
    content: Vec<u8>,
}

impl Object {
    /// Frame a payload of the given kind
    pub(crate) fn frame(kind: ObjectKind, payload: &[u8]) -> Result<Self> {
        if payload.len() > u32::MAX as usize {
            return Err(PolicyError::EncodingFailed(format!(
                "payload too large ({} bytes)",
                payload.len()
            )));
        }

        let mut content = Vec::with_capacity(FRAME_LEN + payload.len());
        content.extend_from_slice(&OBJECT_MAGIC);
        content.extend_from_slice(&OBJECT_FORMAT_VERSION.to_le_bytes());
        content.push(kind as u8);
        content.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        content.extend_from_slice(payload);

        Ok(Object {
            oid: ObjectId::of(&content),
            content,
        })
    }

    /// Wrap raw bytes received from storage
    ///
    /// The frame is validated so a corrupted object is rejected on entry.
    pub fn from_bytes(content: Vec<u8>) -> Result<Self> {
        Self::split_frame(&content)?;
        Ok(Object {
            oid: ObjectId::of(&content),
            content,
        })
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    /// Full framed bytes
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn kind(&self) -> Result<ObjectKind> {
        Ok(Self::split_frame(&self.content)?.0)
    }

    /// Payload without the frame
    pub fn payload(&self) -> Result<&[u8]> {
        Ok(Self::split_frame(&self.content)?.1)
    }

    fn split_frame(content: &[u8]) -> Result<(ObjectKind, &[u8])> {
        if content.len() < FRAME_LEN {
            return Err(PolicyError::InvalidObject(
                "insufficient bytes for object frame".to_string(),
            ));
        }
        if content[0..4] != OBJECT_MAGIC {
            return Err(PolicyError::InvalidObject("invalid magic".to_string()));
        }
        let version = u16::from_le_bytes([content[4], content[5]]);
        if version != OBJECT_FORMAT_VERSION {
            return Err(PolicyError::InvalidObject(format!(
                "unsupported object format version {}",
                version
            )));
        }
        let kind = ObjectKind::from_u8(content[6]).ok_or_else(|| {
            PolicyError::InvalidObject(format!("unknown object kind {}", content[6]))
        })?;
        let len = read_u32(content, 7) as usize;
        let payload = &content[FRAME_LEN..];
        if payload.len() != len {
            return Err(PolicyError::InvalidObject(format!(
                "content length mismatch: expected {}, got {}",
                len,
                payload.len()
            )));
        }
        Ok((kind, payload))
    }
}

/// Decoded instance of an object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectInstance {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Commit),
}

/// Decoded view over an object
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    header: Option<ObjectHeader>,
    object: Object,
    kind: ObjectKind,
    instance: ObjectInstance,
}

impl ObjectInfo {
    pub(crate) fn new(
        header: Option<ObjectHeader>,
        object: Object,
        kind: ObjectKind,
        instance: ObjectInstance,
    ) -> Self {
        ObjectInfo {
            header,
            object,
            kind,
            instance,
        }
    }

    pub fn oid(&self) -> &ObjectId {
        self.object.oid()
    }

    /// Header of a blob; `None` for trees and commits
    pub fn header(&self) -> Option<&ObjectHeader> {
        self.header.as_ref()
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn instance(&self) -> &ObjectInstance {
        &self.instance
    }

    /// Blob content, if this is a blob
    pub fn blob_content(&self) -> Option<&[u8]> {
        match &self.instance {
            ObjectInstance::Blob(data) => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_and_identity() {
        let a = Object::frame(ObjectKind::Blob, b"payload").unwrap();
        let b = Object::frame(ObjectKind::Blob, b"payload").unwrap();
        let c = Object::frame(ObjectKind::Tree, b"payload").unwrap();

        assert_eq!(a.oid(), b.oid());
        assert_ne!(a.oid(), c.oid());
        assert_eq!(a.oid().as_str().len(), 64);
        assert_eq!(a.kind().unwrap(), ObjectKind::Blob);
        assert_eq!(a.payload().unwrap(), b"payload");
    }

    #[test]
    fn test_from_bytes_rejects_corruption() {
        let obj = Object::frame(ObjectKind::Commit, b"tree x").unwrap();

        let mut bad_magic = obj.content().to_vec();
        bad_magic[0] = b'X';
        assert!(Object::from_bytes(bad_magic).is_err());

        let mut truncated = obj.content().to_vec();
        truncated.pop();
        assert!(Object::from_bytes(truncated).is_err());

        let mut bad_kind = obj.content().to_vec();
        bad_kind[6] = 9;
        assert!(Object::from_bytes(bad_kind).is_err());

        let restored = Object::from_bytes(obj.content().to_vec()).unwrap();
        assert_eq!(restored, obj);
    }

    #[test]
    fn test_object_id_parse() {
        assert!(ObjectId::parse(ObjectId::ZERO).unwrap().is_zero());
        assert!(ObjectId::parse("abc").is_err());
        assert!(ObjectId::parse("G".repeat(64)).is_err());
        assert!(ObjectId::parse("A".repeat(64)).is_err());
    }
}
