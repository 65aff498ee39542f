//! End-to-end authorization: publish policies as a commit, then decide requests

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use ztauth_pdp::authz::decision::{AUTHZ_ERR_BAD_REQUEST_MESSAGE, AUTHZ_ERR_FORBIDDEN_CODE};
use ztauth_pdp::authz::model::Entities;
use ztauth_pdp::{
    Action, AuthorizationContext, AuthorizationRequest, Commit, EngineConfig, LanguageAbstraction,
    LanguageRegistry, MemoryObjectStore, ObjectId, ObjectKind, ObjectStore, PolicyDecisionPoint,
    PolicyStore, PolicyStoreRef, Resource, Subject, Tree, TreeEntry,
};

const POLICIES: &str = r#"
@id("allow-alice-read-documents")
permit(
    principal == ZTAuth::IAM::User::"alice",
    action == Document::Action::"Read",
    resource is Document
);

@id("allow-owners-update")
permit(
    principal is ZTAuth::IAM::User,
    action == Document::Action::"Update",
    resource is Document
)
when { resource.owner == principal.name };
"#;

const SCHEMA: &str = r#"{"": {"entityTypes": {"Document": {}}, "actions": {}}}"#;

struct Ledger {
    store: MemoryObjectStore,
    registry: Arc<LanguageRegistry>,
    commit: ObjectId,
}

/// Parse the policies and schema, and publish them as a single commit
fn publish(policies: &str) -> Ledger {
    let registry = Arc::new(LanguageRegistry::with_defaults().unwrap());
    let cedar = registry.get("cedar").unwrap();
    let store = MemoryObjectStore::new();

    let mut tree = Tree::new();
    let policy_sections = cedar
        .create_policy_blob_objects("/", "documents.cedar", policies.as_bytes())
        .unwrap();
    let schema_sections = cedar
        .create_schema_blob_objects("/", "schema.json", SCHEMA.as_bytes())
        .unwrap();
    assert!(!policy_sections.has_errors());

    for section in policy_sections.objects().chain(schema_sections.objects()) {
        let oid = store.put(section.object().clone()).unwrap();
        let meta = section.meta();
        tree.add_entry(
            TreeEntry::new(
                &meta.partition,
                meta.kind,
                oid,
                &meta.name,
                &meta.code_id,
                &meta.code_type,
                &meta.language,
                &meta.language_version,
                &meta.language_type,
            )
            .unwrap(),
        )
        .unwrap();
    }

    let tree_obj = cedar.create_tree_object(&tree).unwrap();
    let tree_id = store.put(tree_obj).unwrap();
    let now = Utc::now();
    let commit = Commit::new(tree_id, None, "alice", now, "alice", now, "publish").unwrap();
    let commit = store.put(cedar.create_commit_object(&commit).unwrap()).unwrap();

    Ledger {
        store,
        registry,
        commit,
    }
}

fn request(ledger: &Ledger, subject: &str, action: &str) -> AuthorizationRequest {
    AuthorizationRequest::new(
        format!("{}-{}", subject, action),
        PolicyStoreRef::new(581616507495, "documents", ledger.commit.as_str()),
        AuthorizationContext::new(
            Subject::user(subject),
            Resource::new("Document", "42"),
            Action::new(action),
        ),
    )
}

fn pdp(ledger: &Ledger, config: EngineConfig) -> PolicyDecisionPoint {
    PolicyDecisionPoint::new(config, ledger.registry.clone()).unwrap()
}

#[test]
fn test_policy_store_loads_schema_and_policies() {
    let ledger = publish(POLICIES);
    let store = PolicyStore::load(&ledger.store, &ledger.registry, &ledger.commit).unwrap();
    assert_eq!(store.policies().len(), 2);
    assert_eq!(store.schemas().len(), 1);
    assert_eq!(store.version(), ledger.commit.as_str());
}

#[test]
fn test_alice_is_permitted() {
    let ledger = publish(POLICIES);
    let decision = pdp(&ledger, EngineConfig::default())
        .authorize(&ledger.store, &request(&ledger, "alice", "Document::Read"));

    assert!(decision.decision());
    assert_eq!(decision.id(), "alice-Document::Read");
    assert!(decision.admin_error().is_none());
    assert!(decision.user_error().is_none());
}

#[test]
fn test_bob_is_denied_without_error() {
    let ledger = publish(POLICIES);
    let cedar = ledger.registry.get("cedar").unwrap();
    let store = PolicyStore::load(&ledger.store, &ledger.registry, &ledger.commit).unwrap();
    let request = request(&ledger, "bob", "Document::Read");

    // The backend returns a decision, not an error
    let decision = cedar
        .authorization_check(&request.request_id, &store, &request.context)
        .unwrap();
    assert!(!decision.decision());
    assert_eq!(decision.user_error().unwrap().code(), AUTHZ_ERR_FORBIDDEN_CODE);
}

#[test]
fn test_attribute_based_policy_uses_entities() {
    let ledger = publish(POLICIES);
    let pdp = pdp(&ledger, EngineConfig::default());

    let mut owner = request(&ledger, "carol", "Document::Update");
    owner.context.subject = Subject::user("carol").with_property("name", json!("carol"));
    owner.context.entities = Some(Entities::new(
        "",
        vec![json!({
            "uid": { "type": "Document", "id": "42" },
            "attrs": { "owner": "carol" },
            "parents": []
        })],
    ));
    assert!(pdp.authorize(&ledger.store, &owner).decision());

    let mut stranger = owner.clone();
    stranger.context.subject = Subject::user("dave").with_property("name", json!("dave"));
    assert!(!pdp.authorize(&ledger.store, &stranger).decision());
}

#[test]
fn test_reserved_subject_kind_is_rejected() {
    let ledger = publish(POLICIES);
    let cedar = ledger.registry.get("cedar").unwrap();
    let store = PolicyStore::load(&ledger.store, &ledger.registry, &ledger.commit).unwrap();

    for kind in ["ZTAuth", " ztauth ", "ZTAUTH"] {
        let mut request = request(&ledger, "alice", "Document::Read");
        request.context.subject.kind = kind.to_string();

        let result = cedar.authorization_check("r", &store, &request.context);
        assert!(matches!(
            result,
            Err(ztauth_pdp::PolicyError::ReservedNamespaceViolation(_))
        ));

        let decision = pdp(&ledger, EngineConfig::default()).authorize(&ledger.store, &request);
        assert!(!decision.decision());
        assert!(decision.admin_error().unwrap().message().contains("reserved"));
        assert_eq!(decision.user_error().unwrap().message(), AUTHZ_ERR_BAD_REQUEST_MESSAGE);
    }
}

#[test]
fn test_forged_platform_parent_is_rejected() {
    let ledger = publish(
        r#"@id("admins-only") permit(principal, action, resource in ZTAuth::IAM::Role::"admin");"#,
    );
    let cedar = ledger.registry.get("cedar").unwrap();
    let store = PolicyStore::load(&ledger.store, &ledger.registry, &ledger.commit).unwrap();

    let mut forged = request(&ledger, "mallory", "Document::Read");
    forged.context.entities = Some(Entities::new(
        "",
        vec![json!({
            "uid": { "type": "Document", "id": "42" },
            "attrs": {},
            "parents": [{ "type": "ZTAuth::IAM::Role", "id": "admin" }]
        })],
    ));

    let result = cedar.authorization_check(&forged.request_id, &store, &forged.context);
    assert!(matches!(
        result,
        Err(ztauth_pdp::PolicyError::ReservedNamespaceViolation(_))
    ));

    let decision = pdp(&ledger, EngineConfig::default()).authorize(&ledger.store, &forged);
    assert!(!decision.decision());
    assert_eq!(decision.user_error().unwrap().message(), AUTHZ_ERR_BAD_REQUEST_MESSAGE);
}

#[test]
fn test_failures_are_fail_closed() {
    let ledger = publish(POLICIES);
    let pdp = pdp(&ledger, EngineConfig::default());

    let mut unknown_kind = request(&ledger, "alice", "Document::Read");
    unknown_kind.context.subject.kind = "WORKLOAD".into();

    let mut bad_action = request(&ledger, "alice", "Read");
    bad_action.request_id = "bad-action".into();

    let mut missing_commit = request(&ledger, "alice", "Document::Read");
    missing_commit.policy_store.commit_id = ObjectId::of(b"missing").to_string();

    let mut bad_context = request(&ledger, "alice", "Document::Read");
    bad_context.context.context.insert("ZTAuth".into(), json!(true));

    for request in [unknown_kind, bad_action, missing_commit, bad_context] {
        let decision = pdp.authorize(&ledger.store, &request);
        assert!(!decision.decision(), "{}", request.request_id);
        assert!(decision.admin_error().is_some());
        assert!(decision.user_error().is_some());
    }
}

#[test]
fn test_shared_admin_reason() {
    let ledger = publish(POLICIES);
    let config = EngineConfig {
        share_admin_reason: true,
        ..Default::default()
    };
    let mut request = request(&ledger, "alice", "Document::Read");
    request.context.subject.kind = "ZTAuth".into();

    let decision = pdp(&ledger, config).authorize(&ledger.store, &request);
    assert_eq!(
        decision.user_error().unwrap().message(),
        decision.admin_error().unwrap().message()
    );
}

#[test]
fn test_concurrent_decisions_share_objects() {
    let ledger = Arc::new(publish(POLICIES));
    let pdp = Arc::new(pdp(&ledger, EngineConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            let pdp = Arc::clone(&pdp);
            thread::spawn(move || {
                let subject = if i % 2 == 0 { "alice" } else { "bob" };
                let decision = pdp.authorize(&ledger.store, &request(&ledger, subject, "Document::Read"));
                (subject, decision.decision())
            })
        })
        .collect();

    for handle in handles {
        let (subject, allowed) = handle.join().unwrap();
        assert_eq!(allowed, subject == "alice");
    }
}

#[test]
fn test_tree_entries_reference_blobs() {
    let ledger = publish(POLICIES);
    let commit = ledger
        .registry
        .get("cedar")
        .unwrap()
        .convert_object_to_commit(&ledger.store.get(&ledger.commit).unwrap())
        .unwrap();
    let tree = ztauth_pdp::ObjectManager::new()
        .convert_object_to_tree(&ledger.store.get(commit.tree()).unwrap())
        .unwrap();

    assert_eq!(tree.len(), 3);
    assert!(tree.entries().iter().all(|e| e.kind() == ObjectKind::Blob));
    assert!(tree.entries().iter().any(|e| e.code_type() == "schema"));
}
