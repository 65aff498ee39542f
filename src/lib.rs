//! # ZTAuth PDP - Policy Decision Engine
//!
//! `ztauth-pdp` stores authorization policies as content-addressed objects and
//! evaluates requests against them through pluggable policy languages:
//!
//! - **Object model**: immutable blobs, trees and commits identified by SHA-256
//! - **Partial-failure parsing**: one broken policy in a file never hides the others
//! - **Language backends**: a single contract, with Cedar shipped by default
//! - **Fail-closed decisions**: every error becomes a deny with separate admin
//!   and user reasons
//!
//! ## Quick Start
//!
//! ```rust
//! use ztauth_pdp::languages::{LanguageAbstraction, LanguageRegistry};
//! use ztauth_pdp::{
//!     Action, AuthorizationContext, EngineConfig, PolicyDecisionPoint, PolicyStore, Resource,
//!     Result, Subject,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let registry = Arc::new(LanguageRegistry::with_defaults()?);
//! let cedar = registry.get("cedar")?;
//!
//! let source = r#"
//!     @id("allow-alice-read")
//!     permit(
//!         principal == ZTAuth::IAM::User::"alice",
//!         action == Document::Action::"Read",
//!         resource is Document
//!     );
//! "#;
//! let sections = cedar.create_policy_blob_objects("/", "access.cedar", source.as_bytes())?;
//! assert!(!sections.has_errors());
//!
//! let objects = ztauth_pdp::ObjectManager::new();
//! let mut store = PolicyStore::new("draft");
//! for section in sections.objects() {
//!     store.add_object(objects.object_info(section.object())?)?;
//! }
//!
//! let pdp = PolicyDecisionPoint::new(EngineConfig::default(), registry)?;
//! let request = AuthorizationContext::new(
//!     Subject::user("alice"),
//!     Resource::new("Document", "42"),
//!     Action::new("Document::Read"),
//! );
//! assert!(pdp.authorize_with_store("req-1", &store, &request).decision());
//! # Ok(())
//! # }
//! ```

pub mod authz;
pub mod config;
pub mod core;
pub mod error;
pub mod languages;

pub use crate::authz::{
    Action, AuthorizationContext, AuthorizationDecision, AuthorizationError,
    AuthorizationRequest, Entities, PolicyDecisionPoint, PolicyStore, PolicyStoreRef, Resource,
    StoreItem, Subject,
};
pub use crate::config::EngineConfig;
pub use crate::core::{
    ArtifactType, CodeType, Commit, MemoryObjectStore, MultiSectionObject, Object,
    ObjectHeader, ObjectId, ObjectInfo, ObjectKind, ObjectManager, ObjectStore, Tree,
    TreeEntry,
};
pub use crate::error::{ErrorClass, PolicyError, Result};
pub use crate::languages::{LanguageAbstraction, LanguageRegistry, LanguageSpecification};
