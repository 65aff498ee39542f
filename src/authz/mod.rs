//! Authorization data model and decision pipeline

pub mod decision;
pub mod guard;
pub mod model;
pub mod pdp;
pub mod store;

pub use decision::{AuthorizationDecision, AuthorizationError};
pub use model::{
    Action, AuthorizationContext, AuthorizationRequest, Entities, PolicyStoreRef, Resource,
    Subject,
};
pub use pdp::PolicyDecisionPoint;
pub use store::{PolicyStore, StoreItem};
