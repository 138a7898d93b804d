//! Schema Invariant Tests
//!
//! Binding, resolution and validation through a fully wired catalog:
//! - A type's schema is exactly its bindings, in binding order
//! - Required attributes must be present and non-blank
//! - Values must parse as the attribute's data type
//! - Unknown attribute codes are rejected on create
//! - Catalog rows referenced elsewhere cannot be deleted

use channel_registry::errors::{ErrorKind, IssueKind};
use channel_registry::model::DataType;
use channel_registry::registry::{AttributePatch, NewAttribute, NewChannelType};
use channel_registry::schema::ValidationMode;
use channel_registry::{Catalog, CatalogError};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    catalog: Catalog,
    discord: i64,
    url: i64,
    members: i64,
    memo: i64,
}

fn attribute(catalog: &Catalog, code: &str, data_type: DataType) -> i64 {
    catalog
        .attributes
        .create(NewAttribute {
            code: code.to_string(),
            name: code.to_uppercase(),
            data_type,
            display_order: None,
        })
        .unwrap()
        .id
}

/// `discord` binds url (required), member_count, memo in that order.
fn setup() -> Fixture {
    let catalog = Catalog::in_memory();
    let discord = catalog
        .types
        .create(NewChannelType {
            code: "discord".to_string(),
            name: "Discord".to_string(),
            ..Default::default()
        })
        .unwrap()
        .id;

    let memo = attribute(&catalog, "memo", DataType::Text);
    let url = attribute(&catalog, "url", DataType::Url);
    let members = attribute(&catalog, "member_count", DataType::Number);

    catalog.binder.attach(discord, url, true, None).unwrap();
    catalog.binder.attach(discord, members, false, None).unwrap();
    catalog.binder.attach(discord, memo, false, None).unwrap();

    Fixture {
        catalog,
        discord,
        url,
        members,
        memo,
    }
}

fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

fn issue_kinds(err: &CatalogError) -> Vec<(IssueKind, String)> {
    err.issues()
        .iter()
        .map(|issue| (issue.kind, issue.field.clone()))
        .collect()
}

// =============================================================================
// Resolution Tests
// =============================================================================

/// Fields come back in binding order, not attribute order.
#[test]
fn test_schema_follows_binding_order() {
    let f = setup();
    let schema = f.catalog.resolver.resolve(f.discord).unwrap();
    assert_eq!(schema.codes(), vec!["url", "member_count", "memo"]);
    assert!(schema.field("url").unwrap().is_required);
    assert!(!schema.field("memo").unwrap().is_required);
}

/// Reordering rewrites positions and the resolver follows.
#[test]
fn test_reorder_changes_resolved_order() {
    let f = setup();
    f.catalog
        .binder
        .reorder(f.discord, &[f.memo, f.url, f.members])
        .unwrap();

    let schema = f.catalog.resolver.resolve(f.discord).unwrap();
    assert_eq!(schema.codes(), vec!["memo", "url", "member_count"]);
}

/// A partial order is refused and leaves positions untouched.
#[test]
fn test_partial_reorder_is_rejected() {
    let f = setup();
    let err = f
        .catalog
        .binder
        .reorder(f.discord, &[f.memo, f.url])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let schema = f.catalog.resolver.resolve(f.discord).unwrap();
    assert_eq!(schema.codes(), vec!["url", "member_count", "memo"]);
}

/// Detaching removes the field from the schema only.
#[test]
fn test_detach_removes_field_but_keeps_attribute() {
    let f = setup();
    f.catalog.binder.detach(f.discord, f.memo).unwrap();

    let schema = f.catalog.resolver.resolve(f.discord).unwrap();
    assert!(!schema.contains("memo"));
    assert!(f.catalog.attributes.get(f.memo).is_ok());
}

/// Binding the same attribute twice conflicts.
#[test]
fn test_duplicate_binding_conflicts() {
    let f = setup();
    let err = f
        .catalog
        .binder
        .attach(f.discord, f.url, false, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniquenessConflict);
}

/// Resolving an unknown type is NotFound, not an empty schema.
#[test]
fn test_unknown_type_is_not_found() {
    let f = setup();
    let err = f.catalog.resolver.resolve(999).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Validation Tests
// =============================================================================

/// A conforming record validates the same way every time.
#[test]
fn test_validation_is_deterministic() {
    let f = setup();
    let input = attrs(json!({"url": "https://discord.gg/abc", "member_count": "1200"}));

    for _ in 0..50 {
        let record = f
            .catalog
            .validator
            .validate(f.discord, "Team chat", &input, ValidationMode::Create)
            .unwrap();
        assert_eq!(record.attributes.len(), 2);
    }
}

/// Missing, blank and null all count as absent for a required field.
#[test]
fn test_required_field_blank_variants() {
    let f = setup();
    for input in [json!({}), json!({"url": ""}), json!({"url": "   "}), json!({"url": null})] {
        let err = f
            .catalog
            .validator
            .validate(f.discord, "Team chat", &attrs(input), ValidationMode::Create)
            .unwrap_err();
        assert_eq!(
            issue_kinds(&err),
            vec![(IssueKind::MissingRequired, "url".to_string())]
        );
    }
}

/// Every bad field is reported, none are merged.
#[test]
fn test_all_issues_are_reported() {
    let f = setup();
    let input = attrs(json!({
        "url": "ftp://files.example.com",
        "member_count": "12abc",
        "nickname": "x"
    }));
    let err = f
        .catalog
        .validator
        .validate(f.discord, "", &input, ValidationMode::Create)
        .unwrap_err();

    let kinds = issue_kinds(&err);
    assert_eq!(kinds.len(), 4);
    assert!(kinds.contains(&(IssueKind::MissingRequired, "name".to_string())));
    assert!(kinds.contains(&(IssueKind::TypeMismatch, "url".to_string())));
    assert!(kinds.contains(&(IssueKind::TypeMismatch, "member_count".to_string())));
    assert!(kinds.contains(&(IssueKind::UnknownField, "nickname".to_string())));
}

/// Unknown codes pass through on update so detached data survives edits.
#[test]
fn test_unknown_field_is_carried_on_update() {
    let f = setup();
    let input = attrs(json!({"url": "https://discord.gg/abc", "nickname": "x"}));
    let record = f
        .catalog
        .validator
        .validate(f.discord, "Team chat", &input, ValidationMode::Update)
        .unwrap();
    assert!(record.attributes.contains_key("nickname"));
}

/// Making a binding optional relaxes validation immediately.
#[test]
fn test_set_required_takes_effect() {
    let f = setup();
    f.catalog.binder.set_required(f.discord, f.url, false).unwrap();

    let record = f
        .catalog
        .validator
        .validate(f.discord, "Team chat", &Map::new(), ValidationMode::Create)
        .unwrap();
    assert!(record.attributes.is_empty());
}

// =============================================================================
// Referential Integrity Tests
// =============================================================================

/// Bound attributes and types with bindings cannot be deleted.
#[test]
fn test_referenced_catalog_rows_survive_delete() {
    let f = setup();

    let err = f.catalog.attributes.delete(f.url).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);

    let err = f.catalog.types.delete(f.discord).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);

    f.catalog.binder.detach(f.discord, f.url).unwrap();
    f.catalog.attributes.delete(f.url).unwrap();
}

/// Renaming is free; changing the data type is refused once values exist.
#[test]
fn test_data_type_is_frozen_by_stored_values() {
    let f = setup();
    f.catalog
        .channels
        .create(channel_registry::records::NewChannel {
            channel_type_id: f.discord,
            name: "Team chat".to_string(),
            attributes: attrs(json!({"url": "https://discord.gg/abc", "member_count": 40})),
            is_active: true,
        })
        .unwrap();

    let renamed = f
        .catalog
        .attributes
        .update(
            f.members,
            AttributePatch {
                name: Some("Members".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Members");

    let err = f
        .catalog
        .attributes
        .update(
            f.members,
            AttributePatch {
                data_type: Some(DataType::Text),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImmutableField);

    f.catalog
        .attributes
        .update(
            f.memo,
            AttributePatch {
                data_type: Some(DataType::Email),
                ..Default::default()
            },
        )
        .unwrap();
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// A type built from nothing: bind url and member_count, validate, then detach.
#[test]
fn test_discord_schema_from_scratch() {
    let catalog = Catalog::in_memory();
    let discord = catalog
        .types
        .create(NewChannelType {
            code: "discord".to_string(),
            name: "Discord".to_string(),
            ..Default::default()
        })
        .unwrap()
        .id;
    let url = attribute(&catalog, "url", DataType::Url);
    let members = attribute(&catalog, "member_count", DataType::Number);

    catalog.binder.attach(discord, url, true, None).unwrap();
    catalog.binder.attach(discord, members, false, None).unwrap();

    let err = catalog
        .validator
        .validate(discord, "AI Korea", &Map::new(), ValidationMode::Create)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        issue_kinds(&err),
        vec![(IssueKind::MissingRequired, "url".to_string())]
    );

    let record = catalog
        .validator
        .validate(
            discord,
            "AI Korea",
            &attrs(json!({"url": "https://discord.gg/aikorea"})),
            ValidationMode::Create,
        )
        .unwrap();
    assert_eq!(record.attributes.len(), 1);
    assert!(record.attributes.contains_key("url"));

    catalog.binder.detach(discord, members).unwrap();
    let schema = catalog.resolver.resolve(discord).unwrap();
    assert_eq!(schema.codes(), vec!["url"]);
}
