//! Property-based tests for object encoding
//!
//! decode(create(v)) == v for commits and trees, with timestamps kept at
//! second precision.

use chrono::{DateTime, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use ztauth_pdp::{Commit, ObjectId, ObjectKind, ObjectManager, PolicyError, Tree, TreeEntry};

/// 0000-01-01T00:00:00Z
const FIRST_ENCODABLE_SECS: i64 = -62_167_219_200;
/// 9999-12-31T23:59:59Z
const LAST_ENCODABLE_SECS: i64 = 253_402_300_799;

fn timestamp(secs: i64, nanos: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, nanos).unwrap()
}

proptest! {
    #[test]
    fn prop_commit_roundtrip(
        tree_seed in any::<u64>(),
        parent_seed in proptest::option::of(any::<u64>()),
        author in "[A-Za-z][A-Za-z0-9 ._@-]{0,24}",
        committer in "[A-Za-z0-9._@-]{0,16}",
        author_secs in FIRST_ENCODABLE_SECS..=LAST_ENCODABLE_SECS,
        committer_secs in FIRST_ENCODABLE_SECS..=LAST_ENCODABLE_SECS,
        nanos in 0u32..1_000_000_000,
        message in any::<String>(),
    ) {
        let mng = ObjectManager::new();
        let tree = ObjectId::of(&tree_seed.to_le_bytes());
        let parent = parent_seed.map(|p| ObjectId::of(&p.to_le_bytes()));

        let commit = Commit::new(
            tree.clone(),
            parent.clone(),
            &author,
            timestamp(author_secs, nanos),
            &committer,
            timestamp(committer_secs, nanos),
            &message,
        ).unwrap();

        let object = mng.create_commit_object(&commit).unwrap();
        prop_assert_eq!(object.kind().unwrap(), ObjectKind::Commit);

        let decoded = mng.convert_object_to_commit(&object).unwrap();
        prop_assert_eq!(&decoded, &commit);
        prop_assert_eq!(decoded.tree(), &tree);
        prop_assert_eq!(decoded.parent(), parent.as_ref());
        prop_assert_eq!(decoded.message(), message.as_str());
        prop_assert_eq!(decoded.meta().author_timestamp().nanosecond(), 0);
        prop_assert_eq!(decoded.meta().author_timestamp().timestamp(), author_secs);
    }

    #[test]
    fn prop_unencodable_years_are_rejected(
        secs in prop_oneof![
            (LAST_ENCODABLE_SECS + 1)..(LAST_ENCODABLE_SECS * 4),
            (FIRST_ENCODABLE_SECS * 4)..FIRST_ENCODABLE_SECS,
        ],
    ) {
        let ok = timestamp(0, 0);
        let result = Commit::new(ObjectId::of(b"tree"), None, "a", timestamp(secs, 0), "c", ok, "m");
        let rejected = matches!(result, Err(PolicyError::EncodingFailed(_)));
        prop_assert!(rejected);
    }

    #[test]
    fn prop_tree_roundtrip(
        fields in prop::collection::vec(
            ("[a-z0-9_-]{1,12}", any::<u64>(), prop::bool::ANY),
            1..20,
        )
    ) {
        let mng = ObjectManager::new();
        let mut tree = Tree::new();
        for (i, (name, seed, is_schema)) in fields.iter().enumerate() {
            let unique = format!("{}-{}", i, name);
            let code_type = if *is_schema { "schema" } else { "policy" };
            tree.add_entry(TreeEntry::new(
                "/",
                ObjectKind::Blob,
                ObjectId::of(&seed.to_le_bytes()),
                &unique,
                &unique,
                code_type,
                "cedar-json",
                "0.0",
                code_type,
            ).unwrap()).unwrap();
        }

        let object = mng.create_tree_object(&tree).unwrap();
        let decoded = mng.convert_object_to_tree(&object).unwrap();
        prop_assert_eq!(&decoded, &tree);
        prop_assert_eq!(decoded.len(), fields.len());

        // Identical content always hashes to the same id
        let again = mng.create_tree_object(&decoded).unwrap();
        prop_assert_eq!(again.oid(), object.oid());
    }
}

#[test]
fn test_commit_subsecond_precision_is_dropped() {
    let mng = ObjectManager::new();
    let precise = timestamp(1_700_000_000, 987_654_321);
    let commit = Commit::new(
        ObjectId::of(b"tree"),
        None,
        "alice",
        precise,
        "",
        precise,
        "initial",
    )
    .unwrap();

    assert_eq!(commit.meta().author_timestamp(), timestamp(1_700_000_000, 0));
    assert_eq!(commit.meta().committer(), "unknown");

    let decoded = mng
        .convert_object_to_commit(&mng.create_commit_object(&commit).unwrap())
        .unwrap();
    assert_eq!(decoded, commit);
    assert!(decoded.parent().is_none());
}

#[test]
fn test_zero_parent_is_a_root_commit() {
    let commit = Commit::new(
        ObjectId::of(b"tree"),
        Some(ObjectId::zero()),
        "alice",
        Utc::now(),
        "alice",
        Utc::now(),
        "root",
    )
    .unwrap();
    assert!(commit.parent().is_none());
}

#[test]
fn test_empty_tree_cannot_be_encoded() {
    assert!(ObjectManager::new().create_tree_object(&Tree::new()).is_err());
}
