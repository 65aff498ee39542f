//! Language-neutral authorization request model

use crate::core::object::ObjectId;
use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Subject kind of an end user
pub const SUBJECT_KIND_USER: &str = "USER";
/// Subject kind of an actor acting through a role
pub const SUBJECT_KIND_ROLE_ACTOR: &str = "ROLE-ACTOR";
/// Subject kind of an actor acting as a twin of an identity
pub const SUBJECT_KIND_TWIN_ACTOR: &str = "TWIN-ACTOR";

fn ensure_present(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PolicyError::BadRequest(format!("{} is required", what)));
    }
    Ok(())
}

/// Principal requesting access
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Subject {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Subject {
            kind: kind.into(),
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(SUBJECT_KIND_USER, id)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Resource {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Resource {
            kind: kind.into(),
            id: id.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Requested action
///
/// The id is namespaced, e.g. `Document::Read`; the backend decides how to
/// split it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "name")]
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Action {
    pub fn new(id: impl Into<String>) -> Self {
        Action {
            id: id.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Attribute graph supplied with a request
///
/// Items are in the backend's native entity shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl Entities {
    pub fn new(schema: impl Into<String>, items: Vec<Value>) -> Self {
        Entities {
            schema: schema.into(),
            items,
        }
    }
}

/// One access request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthorizationContext {
    pub subject: Subject,
    pub resource: Resource,
    pub action: Action,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Entities>,
}

impl AuthorizationContext {
    pub fn new(subject: Subject, resource: Resource, action: Action) -> Self {
        AuthorizationContext {
            subject,
            resource,
            action,
            context: Map::new(),
            entities: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_entities(mut self, entities: Entities) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        ensure_present("subject type", &self.subject.kind)?;
        ensure_present("subject id", &self.subject.id)?;
        ensure_present("resource type", &self.resource.kind)?;
        ensure_present("resource id", &self.resource.id)?;
        ensure_present("action name", &self.action.id)?;
        Ok(())
    }
}

/// Pointer to the policy state a request is evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyStoreRef {
    pub account_id: u64,
    pub ledger_id: String,
    pub commit_id: String,
}

impl PolicyStoreRef {
    pub fn new(account_id: u64, ledger_id: impl Into<String>, commit_id: impl Into<String>) -> Self {
        PolicyStoreRef {
            account_id,
            ledger_id: ledger_id.into(),
            commit_id: commit_id.into(),
        }
    }

    /// Check the shape of the reference and return the commit id
    ///
    /// Existence of the account and ledger is not checked here.
    pub fn validate(&self) -> Result<ObjectId> {
        if self.account_id == 0 {
            return Err(PolicyError::BadRequest("account id is required".to_string()));
        }
        ensure_present("ledger id", &self.ledger_id)?;
        let commit = ObjectId::parse(self.commit_id.trim())
            .map_err(|e| PolicyError::BadRequest(format!("commit id: {}", e)))?;
        if commit.is_zero() {
            return Err(PolicyError::BadRequest(
                "commit id cannot be the zero id".to_string(),
            ));
        }
        Ok(commit)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(default)]
    pub request_id: String,
    pub policy_store: PolicyStoreRef,
    #[serde(flatten)]
    pub context: AuthorizationContext,
}

impl AuthorizationRequest {
    pub fn new(
        request_id: impl Into<String>,
        policy_store: PolicyStoreRef,
        context: AuthorizationContext,
    ) -> Self {
        AuthorizationRequest {
            request_id: request_id.into(),
            policy_store,
            context,
        }
    }
}
