//! Commit objects
//!
//! Commits form a singly-linked history through their parent id. Timestamps
//! are kept at second precision (RFC 3339, UTC) so a commit decodes back to
//! exactly the value that was encoded. RFC 3339 only has four-digit years, so
//! timestamps outside years 0000-9999 are rejected.

use super::object::ObjectId;
use crate::error::{PolicyError, Result};
use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Identity used when an author or committer name is missing
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Year range a commit timestamp can be encoded in
pub const MIN_TIMESTAMP_YEAR: i32 = 0;
pub const MAX_TIMESTAMP_YEAR: i32 = 9999;

/// Authorship metadata of a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMetaData {
    author: String,
    author_timestamp: DateTime<Utc>,
    committer: String,
    committer_timestamp: DateTime<Utc>,
}

impl CommitMetaData {
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn author_timestamp(&self) -> DateTime<Utc> {
        self.author_timestamp
    }

    pub fn committer(&self) -> &str {
        &self.committer
    }

    pub fn committer_timestamp(&self) -> DateTime<Utc> {
        self.committer_timestamp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    tree: ObjectId,
    parent: Option<ObjectId>,
    meta: CommitMetaData,
    message: String,
}

impl Commit {
    /// Create a commit
    ///
    /// Sub-second parts of both timestamps are dropped, and timestamps outside
    /// [`MIN_TIMESTAMP_YEAR`]..=[`MAX_TIMESTAMP_YEAR`] are rejected. Blank
    /// identities become [`UNKNOWN_IDENTITY`]; identities spanning several
    /// lines are rejected.
    pub fn new(
        tree: ObjectId,
        parent: Option<ObjectId>,
        author: &str,
        author_timestamp: DateTime<Utc>,
        committer: &str,
        committer_timestamp: DateTime<Utc>,
        message: &str,
    ) -> Result<Self> {
        let parent = parent.filter(|p| !p.is_zero());
        Ok(Commit {
            tree,
            parent,
            meta: CommitMetaData {
                author: identity(author)?,
                author_timestamp: commit_timestamp(author_timestamp)?,
                committer: identity(committer)?,
                committer_timestamp: commit_timestamp(committer_timestamp)?,
            },
            message: message.to_string(),
        })
    }

    pub fn tree(&self) -> &ObjectId {
        &self.tree
    }

    /// Parent commit; `None` for root commits
    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn meta(&self) -> &CommitMetaData {
        &self.meta
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut text = String::new();
        text.push_str(&format!("tree {}\n", self.tree));
        if let Some(parent) = &self.parent {
            text.push_str(&format!("parent {}\n", parent));
        }
        text.push_str(&format!(
            "author {} {}\n",
            format_timestamp(self.meta.author_timestamp),
            self.meta.author
        ));
        text.push_str(&format!(
            "committer {} {}\n",
            format_timestamp(self.meta.committer_timestamp),
            self.meta.committer
        ));
        text.push('\n');
        text.push_str(&self.message);
        text.into_bytes()
    }

    pub(crate) fn from_bytes(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| PolicyError::InvalidObject(format!("commit is not UTF-8: {}", e)))?;
        let (head, message) = text
            .split_once("\n\n")
            .ok_or_else(|| PolicyError::InvalidObject("commit has no message separator".into()))?;

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;

        for line in head.split('\n') {
            if let Some(value) = line.strip_prefix("tree ") {
                tree = Some(ObjectId::parse(value)?);
            } else if let Some(value) = line.strip_prefix("parent ") {
                parent = Some(ObjectId::parse(value)?);
            } else if let Some(value) = line.strip_prefix("author ") {
                author = Some(parse_identity(value)?);
            } else if let Some(value) = line.strip_prefix("committer ") {
                committer = Some(parse_identity(value)?);
            } else {
                return Err(PolicyError::InvalidObject(format!(
                    "unexpected commit line: {}",
                    line
                )));
            }
        }

        let tree = tree.ok_or_else(|| PolicyError::InvalidObject("commit has no tree".into()))?;
        let (author, author_timestamp) =
            author.ok_or_else(|| PolicyError::InvalidObject("commit has no author".into()))?;
        let (committer, committer_timestamp) = committer
            .ok_or_else(|| PolicyError::InvalidObject("commit has no committer".into()))?;

        Ok(Commit {
            tree,
            parent,
            meta: CommitMetaData {
                author,
                author_timestamp,
                committer,
                committer_timestamp,
            },
            message: message.to_string(),
        })
    }
}

fn identity(name: &str) -> Result<String> {
    if name.contains('\n') || name.contains('\r') {
        return Err(PolicyError::EncodingFailed(
            "identity cannot span multiple lines".to_string(),
        ));
    }
    let name = name.trim();
    if name.is_empty() {
        Ok(UNKNOWN_IDENTITY.to_string())
    } else {
        Ok(name.to_string())
    }
}

fn commit_timestamp(timestamp: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if !(MIN_TIMESTAMP_YEAR..=MAX_TIMESTAMP_YEAR).contains(&timestamp.year()) {
        return Err(PolicyError::EncodingFailed(format!(
            "timestamp {} is outside years {:04}-{:04}",
            timestamp, MIN_TIMESTAMP_YEAR, MAX_TIMESTAMP_YEAR
        )));
    }
    Ok(timestamp.with_nanosecond(0).unwrap_or(timestamp))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_identity(value: &str) -> Result<(String, DateTime<Utc>)> {
    let (date, name) = value
        .split_once(' ')
        .ok_or_else(|| PolicyError::InvalidObject(format!("invalid identity line: {}", value)))?;
    let timestamp = DateTime::parse_from_rfc3339(date)
        .map_err(|e| PolicyError::InvalidObject(format!("invalid timestamp '{}': {}", date, e)))?
        .with_timezone(&Utc);
    Ok((name.to_string(), timestamp))
}
