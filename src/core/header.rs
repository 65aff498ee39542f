use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};

/// Fixed-width prefix of an encoded header (flags + four u32 ids + code id length)
pub const HEADER_FIXED_LEN: usize = 1 + 4 * 4 + 2;

/// Longest code id that fits the u16 length prefix
pub const MAX_CODE_ID_LEN: usize = u16::MAX as usize;

const FLAG_NATIVE_LANGUAGE: u8 = 0b0000_0001;

/// Artifact type carried by an object header
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Schema = 1,
    Policy = 2,
    Commit = 3,
    Tree = 4,
}

impl ArtifactType {
    /// Parse an artifact type id
    ///
    /// Unknown ids are rejected.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Schema),
            2 => Some(Self::Policy),
            3 => Some(Self::Commit),
            4 => Some(Self::Tree),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Policy => "policy",
            Self::Commit => "commit",
            Self::Tree => "tree",
        }
    }
}

/// Language-neutral class of the code stored in a blob
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    Schema = 1,
    Policy = 2,
}

impl CodeType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Schema),
            2 => Some(Self::Policy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Policy => "policy",
        }
    }

    /// Artifact type a blob of this code type must declare
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Self::Schema => ArtifactType::Schema,
            Self::Policy => ArtifactType::Policy,
        }
    }
}

/// Typed header stored in front of every blob payload
///
/// # Layout (little-endian)
///
/// ```text
/// flags             u8   (bit 0 = native language)
/// language_id       u32
/// language_version  u32
/// artifact_type_id  u32
/// code_type_id      u32
/// code_id_len       u16
/// code_id           [u8; code_id_len] UTF-8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHeader {
    pub is_native_language: bool,
    pub language_id: u32,
    pub language_version_id: u32,
    pub artifact_type_id: u32,
    pub code_id: String,
    pub code_type_id: u32,
}

impl ObjectHeader {
    pub fn new(
        is_native_language: bool,
        language_id: u32,
        language_version_id: u32,
        artifact_type_id: u32,
        code_id: impl Into<String>,
        code_type_id: u32,
    ) -> Self {
        ObjectHeader {
            is_native_language,
            language_id,
            language_version_id,
            artifact_type_id,
            code_id: code_id.into(),
            code_type_id,
        }
    }

    pub fn artifact_type(&self) -> Option<ArtifactType> {
        ArtifactType::from_u32(self.artifact_type_id)
    }

    pub fn code_type(&self) -> Option<CodeType> {
        CodeType::from_u32(self.code_type_id)
    }

    /// Check that the header can describe a blob
    ///
    /// The artifact type must be schema or policy and agree with the code type.
    pub fn validate_for_blob(&self) -> Result<()> {
        let code_type = self.code_type().ok_or_else(|| {
            PolicyError::EncodingFailed(format!("unknown code type id {}", self.code_type_id))
        })?;
        let artifact = self.artifact_type().ok_or_else(|| {
            PolicyError::EncodingFailed(format!(
                "unknown artifact type id {}",
                self.artifact_type_id
            ))
        })?;
        if code_type.artifact_type() != artifact {
            return Err(PolicyError::EncodingFailed(format!(
                "artifact type {} is inconsistent with code type {}",
                artifact.as_str(),
                code_type.as_str()
            )));
        }
        if self.code_id.trim().is_empty() {
            return Err(PolicyError::EncodingFailed("code id is empty".to_string()));
        }
        if self.code_id.len() > MAX_CODE_ID_LEN {
            return Err(PolicyError::EncodingFailed(format!(
                "code id too long ({} bytes)",
                self.code_id.len()
            )));
        }
        Ok(())
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_FIXED_LEN + self.code_id.len());

        let flags = if self.is_native_language {
            FLAG_NATIVE_LANGUAGE
        } else {
            0
        };
        bytes.push(flags);
        bytes.extend_from_slice(&self.language_id.to_le_bytes());
        bytes.extend_from_slice(&self.language_version_id.to_le_bytes());
        bytes.extend_from_slice(&self.artifact_type_id.to_le_bytes());
        bytes.extend_from_slice(&self.code_type_id.to_le_bytes());
        bytes.extend_from_slice(&(self.code_id.len() as u16).to_le_bytes());
        bytes.extend_from_slice(self.code_id.as_bytes());

        bytes
    }

    /// Deserialize a header, returning it with the number of bytes consumed
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < HEADER_FIXED_LEN {
            return Err(PolicyError::InvalidObject(
                "insufficient bytes for object header".to_string(),
            ));
        }

        let mut offset = 0;

        let flags = bytes[offset];
        offset += 1;

        let language_id = read_u32(bytes, offset);
        offset += 4;
        let language_version_id = read_u32(bytes, offset);
        offset += 4;
        let artifact_type_id = read_u32(bytes, offset);
        offset += 4;
        let code_type_id = read_u32(bytes, offset);
        offset += 4;

        let code_id_len = u16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as usize;
        offset += 2;

        if bytes.len() < offset + code_id_len {
            return Err(PolicyError::InvalidObject(
                "code id exceeds header bounds".to_string(),
            ));
        }
        let code_id = std::str::from_utf8(&bytes[offset..offset + code_id_len])
            .map_err(|e| PolicyError::InvalidObject(format!("code id is not UTF-8: {}", e)))?
            .to_string();
        offset += code_id_len;

        let header = ObjectHeader {
            is_native_language: flags & FLAG_NATIVE_LANGUAGE != 0,
            language_id,
            language_version_id,
            artifact_type_id,
            code_id,
            code_type_id,
        };

        Ok((header, offset))
    }
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_header() -> ObjectHeader {
        ObjectHeader::new(
            true,
            2,
            0,
            ArtifactType::Policy as u32,
            "read-documents",
            CodeType::Policy as u32,
        )
    }

    #[test]
    fn test_header_serialization() {
        let header = policy_header();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_FIXED_LEN + "read-documents".len());

        let (decoded, consumed) = ObjectHeader::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_header_layout_is_little_endian() {
        let bytes = policy_header().to_bytes();
        assert_eq!(bytes[0], 1); // native flag
        assert_eq!(&bytes[1..5], &[2, 0, 0, 0]); // language id
        assert_eq!(&bytes[9..13], &[2, 0, 0, 0]); // artifact type: policy
        assert_eq!(&bytes[17..19], &[14, 0]); // code id length
    }

    #[test]
    fn test_truncated_header() {
        let bytes = policy_header().to_bytes();
        assert!(matches!(
            ObjectHeader::from_bytes(&bytes[..10]),
            Err(PolicyError::InvalidObject(_))
        ));
        assert!(matches!(
            ObjectHeader::from_bytes(&bytes[..bytes.len() - 1]),
            Err(PolicyError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_blob_validation() {
        assert!(policy_header().validate_for_blob().is_ok());

        let mut mismatched = policy_header();
        mismatched.code_type_id = CodeType::Schema as u32;
        assert!(matches!(
            mismatched.validate_for_blob(),
            Err(PolicyError::EncodingFailed(_))
        ));

        let mut commit = policy_header();
        commit.artifact_type_id = ArtifactType::Commit as u32;
        assert!(commit.validate_for_blob().is_err());

        let mut unknown = policy_header();
        unknown.artifact_type_id = 99;
        assert!(unknown.validate_for_blob().is_err());
    }

    #[test]
    fn test_artifact_type_from_u32() {
        assert_eq!(ArtifactType::from_u32(1), Some(ArtifactType::Schema));
        assert_eq!(ArtifactType::from_u32(4), Some(ArtifactType::Tree));
        assert_eq!(ArtifactType::from_u32(0), None);
        assert_eq!(CodeType::from_u32(2), Some(CodeType::Policy));
        assert_eq!(CodeType::from_u32(3), None);
    }
}
