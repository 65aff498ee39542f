//! Content-addressed object model
//!
//! Blobs, trees and commits are immutable framed byte buffers identified by
//! their SHA-256. Blobs carry a typed header naming the policy language they
//! were written in.

pub mod commit;
pub mod header;
pub mod manager;
pub mod manifest;
pub mod object;
pub mod sections;
pub mod store;
pub mod tree;
pub mod validation;

pub use commit::{Commit, CommitMetaData};
pub use header::{ArtifactType, CodeType, ObjectHeader};
pub use manager::ObjectManager;
pub use manifest::Manifest;
pub use object::{Object, ObjectId, ObjectInfo, ObjectInstance, ObjectKind};
pub use sections::{MultiSectionObject, Section, SectionMeta, SectionObject};
pub use store::{MemoryObjectStore, ObjectStore};
pub use tree::{Tree, TreeEntry};
