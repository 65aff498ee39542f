//! Translation of a language-neutral request into a Cedar request

use super::{
    ACTION_ENTITY_TYPE, SUBJECT_TYPE_ROLE_ACTOR, SUBJECT_TYPE_TWIN_ACTOR, SUBJECT_TYPE_USER,
};
use crate::authz::model::{
    AuthorizationContext, SUBJECT_KIND_ROLE_ACTOR, SUBJECT_KIND_TWIN_ACTOR, SUBJECT_KIND_USER,
};
use crate::core::validation::NAMESPACE_SEPARATOR;
use crate::error::{PolicyError, Result};
use cedar_policy::{Context, Entities, EntityId, EntityTypeName, EntityUid, Request};
use serde_json::{json, Map, Value};
use std::str::FromStr;

/// Request and entity graph ready for the authorizer
pub(crate) struct CedarRequest {
    pub request: Request,
    pub entities: Entities,
}

/// Cedar entity type of an abstract subject kind
pub(crate) fn subject_entity_type(kind: &str) -> Result<&'static str> {
    let normalized = kind.trim().to_uppercase();
    match normalized.as_str() {
        SUBJECT_KIND_USER => Ok(SUBJECT_TYPE_USER),
        SUBJECT_KIND_ROLE_ACTOR => Ok(SUBJECT_TYPE_ROLE_ACTOR),
        SUBJECT_KIND_TWIN_ACTOR => Ok(SUBJECT_TYPE_TWIN_ACTOR),
        _ => Err(PolicyError::UnsupportedSubjectKind(kind.to_string())),
    }
}

/// Split `Type::Name` on the last separator into a Cedar action type and id
///
/// `Document::Read` becomes (`Document::Action`, `Read`).
pub(crate) fn split_action(action: &str) -> Result<(String, String)> {
    let (action_type, action_id) = action
        .rsplit_once(NAMESPACE_SEPARATOR)
        .ok_or_else(|| PolicyError::BadRequest(format!("invalid action format '{}'", action)))?;
    let action_type = action_type.trim();
    let action_id = action_id.trim();
    if action_type.is_empty() {
        return Err(PolicyError::BadRequest(format!(
            "action '{}' has no type",
            action
        )));
    }
    if action_id.is_empty() {
        return Err(PolicyError::BadRequest(format!("action '{}' has no id", action)));
    }

    let action_type = if action_type == ACTION_ENTITY_TYPE
        || action_type.ends_with(&format!("{}{}", NAMESPACE_SEPARATOR, ACTION_ENTITY_TYPE))
    {
        action_type.to_string()
    } else {
        format!("{}{}{}", action_type, NAMESPACE_SEPARATOR, ACTION_ENTITY_TYPE)
    };
    Ok((action_type, action_id.to_string()))
}

fn entity_uid(type_name: &str, id: &str) -> Result<EntityUid> {
    let type_name = EntityTypeName::from_str(type_name).map_err(|e| {
        PolicyError::BadRequest(format!("invalid entity type '{}': {}", type_name, e))
    })?;
    Ok(EntityUid::from_type_name_and_id(type_name, EntityId::new(id)))
}

fn entity_json(type_name: &str, id: &str, attrs: &Map<String, Value>) -> Value {
    json!({
        "uid": { "type": type_name, "id": id },
        "attrs": attrs,
        "parents": []
    })
}

fn same_uid(item: &Value, type_name: &str, id: &str) -> bool {
    let uid = item.get("uid");
    uid.and_then(|u| u.get("type")).and_then(Value::as_str) == Some(type_name)
        && uid.and_then(|u| u.get("id")).and_then(Value::as_str) == Some(id)
}

/// Append an entity unless the caller already supplied one with the same uid
fn push_entity(items: &mut Vec<Value>, type_name: &str, id: &str, attrs: &Map<String, Value>) {
    if !items.iter().any(|item| same_uid(item, type_name, id)) {
        items.push(entity_json(type_name, id, attrs));
    }
}

/// Build the Cedar request for `ctx`
///
/// Subject, action and resource become entities in the graph next to the
/// caller supplied items, carrying their properties as attributes.
pub(crate) fn translate(ctx: &AuthorizationContext) -> Result<CedarRequest> {
    ctx.validate()?;

    let subject_type = subject_entity_type(&ctx.subject.kind)?;
    let subject_id = ctx.subject.id.as_str();
    let resource_type = ctx.resource.kind.trim();
    let resource_id = ctx.resource.id.as_str();
    let (action_type, action_id) = split_action(&ctx.action.id)?;

    let mut items = ctx
        .entities
        .as_ref()
        .map(|e| e.items.clone())
        .unwrap_or_default();
    push_entity(&mut items, subject_type, subject_id, &ctx.subject.properties);
    push_entity(&mut items, &action_type, &action_id, &ctx.action.properties);
    push_entity(&mut items, resource_type, resource_id, &ctx.resource.properties);

    let entities = Entities::from_json_value(Value::Array(items), None)
        .map_err(|e| PolicyError::BadRequest(format!("invalid entities: {}", e)))?;
    let context = Context::from_json_value(Value::Object(ctx.context.clone()), None)
        .map_err(|e| PolicyError::BadRequest(format!("invalid context: {}", e)))?;

    let request = Request::new(
        entity_uid(subject_type, subject_id)?,
        entity_uid(&action_type, &action_id)?,
        entity_uid(resource_type, resource_id)?,
        context,
        None,
    )
    .map_err(|e| PolicyError::BadRequest(format!("invalid request: {}", e)))?;

    Ok(CedarRequest { request, entities })
}
