mod common;

use common::{
    parse_definition, persisted, store_with_tenant, types_and_positions, GLOBALS_DEF,
    HOMEPAGE_DEF, PRODUCT_DEF, TENANT, THEME,
};
use futures::future::join_all;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use storefront_engine::{SyncCoordinator, SyncOutcome, SyncStats};
use storefront_store::CustomizationStore;
use storefront_types::{SettingValue, Settings};
use tempfile::TempDir;

fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
    items.iter().map(|(t, p)| (t.to_string(), *p)).collect()
}

#[tokio::test]
async fn bootstrap_writes_dense_positions() {
    common::init_tracing();
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));

    let outcome = coordinator
        .sync(TENANT, THEME, "homepage", parse_definition("homepage", HOMEPAGE_DEF))
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Replaced { sections: 5 });
    assert_eq!(
        types_and_positions(&persisted(&store, "homepage")),
        pairs(&[
            ("announcement-bar", 0),
            ("header", 1),
            ("hero", 2),
            ("featured-collection", 3),
            ("footer", 4),
        ])
    );
}

#[tokio::test]
async fn second_sync_is_a_no_op() {
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", PRODUCT_DEF);

    let first = coordinator
        .sync(TENANT, THEME, "product", Arc::clone(&definition))
        .await
        .unwrap();
    let ids_before: Vec<_> = persisted(&store, "product").iter().map(|s| s.id).collect();

    let second = coordinator
        .sync(TENANT, THEME, "product", definition)
        .await
        .unwrap();
    let ids_after: Vec<_> = persisted(&store, "product").iter().map(|s| s.id).collect();

    assert_eq!(first, SyncOutcome::Replaced { sections: 2 });
    assert_eq!(second, SyncOutcome::Unchanged);
    assert_eq!(ids_before, ids_after);
    assert_eq!(
        coordinator.stats(),
        SyncStats {
            runs: 2,
            joins: 0,
            replacements: 1
        }
    );
}

#[tokio::test]
async fn globals_are_persisted_only_for_homepage() {
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", GLOBALS_DEF);

    coordinator
        .sync(TENANT, THEME, "product", Arc::clone(&definition))
        .await
        .unwrap();
    coordinator
        .sync(TENANT, THEME, "homepage", definition)
        .await
        .unwrap();

    assert_eq!(
        types_and_positions(&persisted(&store, "product")),
        pairs(&[("hero", 0)])
    );
    assert_eq!(
        types_and_positions(&persisted(&store, "homepage")),
        pairs(&[("header", 0), ("hero", 1), ("footer", 2)])
    );
}

#[tokio::test]
async fn blocks_are_written_with_container_children_folded() {
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));

    coordinator
        .sync(TENANT, THEME, "product", parse_definition("product", PRODUCT_DEF))
        .await
        .unwrap();

    let sections = persisted(&store, "product");
    let product = &sections[0];
    let block_types: Vec<_> = product.blocks.iter().map(|b| b.block_type.as_str()).collect();
    assert_eq!(block_types, vec!["title", "price", "container"]);
    let positions: Vec<_> = product.blocks.iter().map(|b| b.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    let children = product.blocks[2]
        .settings
        .get("_blocks")
        .and_then(SettingValue::as_list)
        .unwrap();
    assert_eq!(children.len(), 2);
    let first = children[0].as_map().unwrap();
    assert_eq!(first.get("type").and_then(SettingValue::as_str), Some("text"));
}

#[tokio::test]
async fn duplicate_positions_are_healed() {
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", PRODUCT_DEF);
    coordinator
        .sync(TENANT, THEME, "product", Arc::clone(&definition))
        .await
        .unwrap();

    let tenant = store.resolve_tenant(TENANT).unwrap().unwrap();
    store
        .transaction(|tx| {
            let record = tx.find_or_create_default_record(&tenant, "product")?;
            tx.insert_section(&record.id, "related-products", 1, &Settings::new())?;
            Ok(())
        })
        .unwrap();
    assert_eq!(persisted(&store, "product").len(), 3);

    let outcome = coordinator
        .sync(TENANT, THEME, "product", definition)
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Replaced { sections: 2 });
    let sections = persisted(&store, "product");
    let unique: HashSet<_> = sections
        .iter()
        .map(|s| (s.section_type.clone(), s.position))
        .collect();
    assert_eq!(unique.len(), sections.len());
    assert_eq!(
        types_and_positions(&sections),
        pairs(&[("product", 0), ("related-products", 1)])
    );
}

#[tokio::test]
async fn product_section_without_blocks_is_restored() {
    let store = store_with_tenant();
    let tenant = store.resolve_tenant(TENANT).unwrap().unwrap();
    store
        .transaction(|tx| {
            let record = tx.find_or_create_default_record(&tenant, "product")?;
            tx.insert_section(&record.id, "product", 0, &Settings::new())?;
            Ok(())
        })
        .unwrap();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));

    let outcome = coordinator
        .sync(TENANT, THEME, "product", parse_definition("product", PRODUCT_DEF))
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Replaced { sections: 2 });
    assert_eq!(persisted(&store, "product")[0].blocks.len(), 3);
}

#[tokio::test]
async fn tenant_edits_survive_later_syncs() {
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", PRODUCT_DEF);
    coordinator
        .sync(TENANT, THEME, "product", Arc::clone(&definition))
        .await
        .unwrap();

    let related = persisted(&store, "product")[1].clone();
    let mut edited = Settings::new();
    edited.insert("count".into(), SettingValue::Int(8));
    store
        .transaction(|tx| {
            tx.update_section_settings(&related.id, &edited)?;
            tx.set_section_enabled(&related.id, false)?;
            Ok(())
        })
        .unwrap();

    let outcome = coordinator
        .sync(TENANT, THEME, "product", definition)
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Unchanged);
    let after = persisted(&store, "product");
    assert_eq!(after[1].id, related.id);
    assert!(!after[1].enabled);
    assert_eq!(after[1].settings, edited);
}

#[tokio::test]
async fn unknown_tenant_is_not_an_error() {
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));

    let outcome = coordinator
        .sync("ghost", THEME, "product", parse_definition("product", PRODUCT_DEF))
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::TenantMissing);
    assert_eq!(coordinator.in_flight(), 0);
}

#[tokio::test]
async fn concurrent_calls_for_one_key_share_one_run() {
    let store = store_with_tenant();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", PRODUCT_DEF);

    let calls = (0..8).map(|_| coordinator.sync(TENANT, THEME, "product", Arc::clone(&definition)));
    let outcomes = join_all(calls).await;

    for outcome in &outcomes {
        assert_eq!(*outcome.as_ref().unwrap(), SyncOutcome::Replaced { sections: 2 });
    }
    assert_eq!(
        coordinator.stats(),
        SyncStats {
            runs: 1,
            joins: 7,
            replacements: 1
        }
    );
    assert_eq!(coordinator.in_flight(), 0);
    assert_eq!(persisted(&store, "product").len(), 2);
}

#[tokio::test]
async fn different_keys_do_not_coordinate() {
    let store = store_with_tenant();
    store.register_tenant("globex").unwrap();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", PRODUCT_DEF);

    let (a, b, c) = tokio::join!(
        coordinator.sync(TENANT, THEME, "product", Arc::clone(&definition)),
        coordinator.sync(TENANT, THEME, "homepage", Arc::clone(&definition)),
        coordinator.sync("globex", THEME, "product", Arc::clone(&definition)),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(coordinator.stats().runs, 3);
    assert_eq!(coordinator.stats().joins, 0);
}

#[tokio::test]
async fn failed_transaction_rolls_back_and_releases_key() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("layouts.db");
    let store = Arc::new(CustomizationStore::open(&path).unwrap());
    store.register_tenant(TENANT).unwrap();

    let raw = rusqlite::Connection::open(&path).unwrap();
    raw.execute_batch(
        "CREATE TRIGGER reject_sections BEFORE INSERT ON section_instances
         BEGIN SELECT RAISE(ABORT, 'rejected by test'); END;",
    )
    .unwrap();

    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", PRODUCT_DEF);

    let calls = (0..3).map(|_| coordinator.sync(TENANT, THEME, "product", Arc::clone(&definition)));
    let outcomes = join_all(calls).await;
    for outcome in &outcomes {
        let err = outcome.as_ref().unwrap_err();
        assert!(err.is_transaction_failure(), "unexpected error: {err}");
    }
    assert_eq!(coordinator.in_flight(), 0);

    // The record created inside the failed transaction was rolled back too.
    let tenant = store.resolve_tenant(TENANT).unwrap().unwrap();
    assert!(store.find_default_record(&tenant, "product").unwrap().is_none());

    raw.execute_batch("DROP TRIGGER reject_sections;").unwrap();
    let outcome = coordinator
        .sync(TENANT, THEME, "product", definition)
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Replaced { sections: 2 });
    assert_eq!(coordinator.stats().runs, 2);
}

#[tokio::test]
async fn dropped_caller_does_not_leave_key_in_flight() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("layouts.db");
    let store = Arc::new(CustomizationStore::open(&path).unwrap());
    store.register_tenant(TENANT).unwrap();
    let coordinator = SyncCoordinator::new(Arc::clone(&store));
    let definition = parse_definition("product", PRODUCT_DEF);

    // Another writer holds the database so the sync stalls in its transaction.
    let writer = rusqlite::Connection::open(&path).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        coordinator.sync(TENANT, THEME, "product", Arc::clone(&definition)),
    )
    .await;
    assert!(timed_out.is_err());
    assert_eq!(coordinator.in_flight(), 1);

    writer.execute_batch("COMMIT;").unwrap();
    for _ in 0..200 {
        if coordinator.in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(coordinator.in_flight(), 0);
    assert_eq!(coordinator.stats().replacements, 1);
    assert_eq!(persisted(&store, "product").len(), 2);

    // A later call runs its own decision and heals new damage.
    let tenant = store.resolve_tenant(TENANT).unwrap().unwrap();
    store
        .transaction(|tx| {
            let record = tx.find_or_create_default_record(&tenant, "product")?;
            tx.insert_section(&record.id, "related-products", 1, &Settings::new())?;
            Ok(())
        })
        .unwrap();

    let outcome = coordinator
        .sync(TENANT, THEME, "product", definition)
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Replaced { sections: 2 });
    assert_eq!(
        coordinator.stats(),
        SyncStats {
            runs: 2,
            joins: 0,
            replacements: 2
        }
    );
    assert_eq!(persisted(&store, "product").len(), 2);
}
