//! File Store Tests
//!
//! The snapshot-backed row store survives reopen and refuses corrupted files.

use std::fs;
use std::sync::Arc;

use channel_registry::errors::ErrorKind;
use channel_registry::model::DataType;
use channel_registry::records::{ChannelFilter, LegacyConfig, NewChannel};
use channel_registry::registry::{NewAttribute, NewChannelType};
use channel_registry::store::{FileRowStore, StoreError};
use channel_registry::Catalog;
use serde_json::json;
use tempfile::TempDir;

fn open_catalog(path: &std::path::Path) -> Catalog {
    let store = FileRowStore::open(path).unwrap();
    Catalog::new(Arc::new(store), LegacyConfig::default())
}

/// Catalog and records written through one handle are visible after reopen.
#[test]
fn test_catalog_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.json");

    let (type_id, record_id) = {
        let catalog = open_catalog(&path);
        let type_id = catalog
            .types
            .create(NewChannelType {
                code: "open_chat".to_string(),
                name: "Open chat".to_string(),
                ..Default::default()
            })
            .unwrap()
            .id;
        let members = catalog
            .attributes
            .create(NewAttribute {
                code: "member_count".to_string(),
                name: "Members".to_string(),
                data_type: DataType::Number,
                display_order: None,
            })
            .unwrap()
            .id;
        catalog.binder.attach(type_id, members, true, None).unwrap();

        let record = catalog
            .channels
            .create(NewChannel {
                channel_type_id: type_id,
                name: "Study group".to_string(),
                attributes: json!({"member_count": 85}).as_object().unwrap().clone(),
                is_active: true,
            })
            .unwrap();
        (type_id, record.id)
    };

    let catalog = open_catalog(&path);
    let schema = catalog.resolver.resolve(type_id).unwrap();
    assert_eq!(schema.codes(), vec!["member_count"]);

    let record = catalog.channels.get(record_id).unwrap();
    assert_eq!(record.name, "Study group");
    assert_eq!(
        catalog.channels.list(ChannelFilter::default()).unwrap().len(),
        1
    );

    // Unique codes are still enforced after reopen
    let err = catalog
        .types
        .create(NewChannelType {
            code: "open_chat".to_string(),
            name: "Again".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniquenessConflict);
}

/// A tampered snapshot is reported, never silently repaired.
#[test]
fn test_corrupted_snapshot_is_refused() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.json");
    {
        let catalog = open_catalog(&path);
        catalog
            .types
            .create(NewChannelType {
                code: "discord".to_string(),
                name: "Discord".to_string(),
                ..Default::default()
            })
            .unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, content.replace("discord", "dizcord")).unwrap();

    match FileRowStore::open(&path) {
        Err(StoreError::Corrupted(_)) => {}
        other => panic!("expected corruption, got {:?}", other.map(|_| ())),
    }
}
