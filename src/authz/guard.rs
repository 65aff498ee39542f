//! Reserved namespace guard for incoming requests
//!
//! Runs before any backend evaluation. Callers may never name a kind, action
//! type, entity type, parent or attribute key inside the platform namespace,
//! otherwise they could forge built-in principals or memberships.

use super::model::AuthorizationContext;
use crate::core::validation::ensure_not_reserved;
use crate::error::Result;
use serde_json::{Map, Value};

fn verify_keys(what: &str, map: &Map<String, Value>) -> Result<()> {
    for key in map.keys() {
        ensure_not_reserved(what, key)?;
    }
    Ok(())
}

fn verify_values(what: &str, map: &Map<String, Value>) -> Result<()> {
    for value in map.values() {
        verify_value(what, value)?;
    }
    Ok(())
}

/// Entity type named by an entity reference
///
/// Accepts both the escaped form `{"__entity": {"type": .., "id": ..}}` and
/// the bare form `{"type": .., "id": ..}`.
fn entity_ref_type(value: &Value) -> Option<&str> {
    let reference = value.get("__entity").unwrap_or(value);
    let fields = reference.as_object()?;
    if !fields.get("id")?.is_string() {
        return None;
    }
    fields.get("type")?.as_str()
}

/// Check every entity reference nested anywhere in an attribute value
fn verify_value(what: &str, value: &Value) -> Result<()> {
    match value {
        Value::Object(fields) => {
            if let Some(kind) = entity_ref_type(value) {
                ensure_not_reserved(what, kind)?;
            }
            for nested in fields.values() {
                verify_value(what, nested)?;
            }
        }
        Value::Array(items) => {
            for nested in items {
                verify_value(what, nested)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Check the uid, parents, attributes and tags of one entity item
fn verify_entity(item: &Value) -> Result<()> {
    if let Some(kind) = item.get("uid").and_then(entity_ref_type) {
        ensure_not_reserved("entity type", kind)?;
    }
    if let Some(parents) = item.get("parents").and_then(Value::as_array) {
        for parent in parents {
            if let Some(kind) = entity_ref_type(parent) {
                ensure_not_reserved("entity parent type", kind)?;
            }
        }
    }
    for section in ["attrs", "tags"] {
        if let Some(Value::Object(fields)) = item.get(section) {
            verify_keys("entity attribute", fields)?;
            verify_values("entity reference", fields)?;
        }
    }
    Ok(())
}

/// Reject any caller supplied identifier inside the reserved namespace
pub fn verify_request(ctx: &AuthorizationContext) -> Result<()> {
    ensure_not_reserved("subject type", &ctx.subject.kind)?;
    verify_keys("subject property", &ctx.subject.properties)?;
    verify_values("subject property", &ctx.subject.properties)?;

    ensure_not_reserved("resource type", &ctx.resource.kind)?;
    verify_keys("resource property", &ctx.resource.properties)?;
    verify_values("resource property", &ctx.resource.properties)?;

    // Covers the action type too, since it is the id's prefix
    ensure_not_reserved("action", &ctx.action.id)?;
    verify_keys("action property", &ctx.action.properties)?;
    verify_values("action property", &ctx.action.properties)?;

    verify_keys("context key", &ctx.context)?;
    verify_values("context value", &ctx.context)?;

    if let Some(entities) = &ctx.entities {
        for item in &entities.items {
            verify_entity(item)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::model::{Action, Entities, Resource, Subject};
    use crate::error::PolicyError;
    use serde_json::json;

    fn context() -> AuthorizationContext {
        AuthorizationContext::new(
            Subject::user("alice"),
            Resource::new("Document", "42"),
            Action::new("Document::Read"),
        )
    }

    fn is_violation(result: Result<()>) -> bool {
        matches!(result, Err(PolicyError::ReservedNamespaceViolation(_)))
    }

    #[test]
    fn test_clean_request() {
        let ctx = context()
            .with_context("ip", json!("10.0.0.1"))
            .with_entities(Entities::new(
                "",
                vec![json!({"uid": {"type": "Document", "id": "42"}, "attrs": {}, "parents": []})],
            ));
        assert!(verify_request(&ctx).is_ok());
    }

    #[test]
    fn test_reserved_subject_kind() {
        for kind in ["ZTAuth", "ztauth", " ZTAUTH ", "ZTAuth::IAM::User"] {
            let mut ctx = context();
            ctx.subject.kind = kind.to_string();
            assert!(is_violation(verify_request(&ctx)), "{kind}");
        }
    }

    #[test]
    fn test_reserved_resource_and_action() {
        let mut ctx = context();
        ctx.resource.kind = "ZTAuth::IAM::Identity".into();
        assert!(is_violation(verify_request(&ctx)));

        let mut ctx = context();
        ctx.action.id = "ZTAuth::Admin::Delete".into();
        assert!(is_violation(verify_request(&ctx)));
    }

    #[test]
    fn test_reserved_keys_and_entities() {
        let ctx = context().with_context("ZTAuth", json!(true));
        assert!(is_violation(verify_request(&ctx)));

        let mut ctx = context();
        ctx.subject = Subject::user("alice").with_property("ztauth", json!("root"));
        assert!(is_violation(verify_request(&ctx)));

        let ctx = context().with_entities(Entities::new(
            "",
            vec![json!({"uid": {"type": "ZTAuth::IAM::User", "id": "mallory"}, "attrs": {}, "parents": []})],
        ));
        assert!(is_violation(verify_request(&ctx)));
    }

    #[test]
    fn test_reserved_entity_parents() {
        for parent in [
            json!({"type": "ZTAuth::IAM::Role", "id": "admin"}),
            json!({"__entity": {"type": "ZTAuth::IAM::Role", "id": "admin"}}),
        ] {
            let ctx = context().with_entities(Entities::new(
                "",
                vec![json!({"uid": {"type": "Document", "id": "42"}, "attrs": {}, "parents": [parent]})],
            ));
            assert!(is_violation(verify_request(&ctx)));
        }
    }

    #[test]
    fn test_reserved_nested_entity_references() {
        let ctx = context().with_entities(Entities::new(
            "",
            vec![json!({
                "uid": {"type": "Document", "id": "42"},
                "attrs": {"owners": [{"__entity": {"type": "ZTAuth::IAM::User", "id": "root"}}]},
                "parents": []
            })],
        ));
        assert!(is_violation(verify_request(&ctx)));

        let ctx = context().with_context(
            "delegate",
            json!({"__entity": {"type": "ZTAuth::IAM::TwinActor", "id": "t1"}}),
        );
        assert!(is_violation(verify_request(&ctx)));

        let mut ctx = context();
        ctx.resource = Resource::new("Document", "42")
            .with_property("owner", json!({"__entity": {"type": "ZTAuth::IAM::User", "id": "root"}}));
        assert!(is_violation(verify_request(&ctx)));
    }

    #[test]
    fn test_plain_records_and_parents_pass() {
        let ctx = context()
            .with_context("meta", json!({"kind": "ZTAuth", "tags": ["a", "b"]}))
            .with_entities(Entities::new(
                "",
                vec![json!({
                    "uid": {"type": "Document", "id": "42"},
                    "attrs": {"folder": {"__entity": {"type": "Folder", "id": "f1"}}},
                    "parents": [{"type": "Folder", "id": "f1"}]
                })],
            ));
        assert!(verify_request(&ctx).is_ok());
    }
}
