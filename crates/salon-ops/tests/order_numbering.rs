//! Sequencer passes against a real store.

mod common;

use common::*;
use salon_core::sequence::{is_fallback_id, OrderCategory};
use salon_core::OrderCategory::{SalonConsumption as C, Sales as S};
use salon_ops::OrderSequencer;

#[tokio::test]
async fn test_bulk_renumber_partitions_interleaved_orders() {
    let db = test_db().await;
    let ids = seed_orders(&db, &[(S, 0), (C, 1), (S, 2), (S, 3), (C, 4), (S, 5), (S, 6)]).await;

    let report = OrderSequencer::new(db.clone()).renumber_all().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.total_orders(), 7);
    assert_eq!(report.total_changed(), 7);

    let expected = [
        "RNG0001/2526",
        "SC0001/2526",
        "RNG0002/2526",
        "RNG0003/2526",
        "SC0002/2526",
        "RNG0004/2526",
        "RNG0005/2526",
    ];
    for (id, number) in ids.iter().zip(expected) {
        assert_eq!(number_of(&db, id).await, number);
    }
}

#[tokio::test]
async fn test_renumber_twice_changes_nothing() {
    let db = test_db().await;
    seed_orders(&db, &[(S, 0), (C, 1), (S, 2)]).await;

    let sequencer = OrderSequencer::new(db.clone());
    sequencer.renumber_all().await.unwrap();
    let second = sequencer.renumber_all().await.unwrap();

    assert_eq!(second.total_orders(), 3);
    assert_eq!(second.total_changed(), 0);
}

#[tokio::test]
async fn test_year_code_follows_creation_date() {
    let db = test_db().await;
    let old = bare_order(Some(S), "Walk-in", day(1) - chrono::Duration::days(400));
    db.orders().insert(&old).await.unwrap();

    OrderSequencer::new(db.clone()).renumber_all().await.unwrap();
    assert_eq!(number_of(&db, &old.id).await, "RNG0001/2420");
}

#[tokio::test]
async fn test_renumber_after_middle_deletion() {
    let db = test_db().await;
    let ids = seed_orders(&db, &[(S, 0), (S, 1), (S, 2), (S, 3), (S, 4), (C, 5)]).await;
    let sequencer = OrderSequencer::new(db.clone());
    sequencer.renumber_all().await.unwrap();

    let deleted = db.orders().get_by_id(&ids[2]).await.unwrap().unwrap();
    let mut tx = db.begin().await.unwrap();
    salon_db::OrderRepository::delete(&mut tx, &deleted.id).await.unwrap();
    salon_db::commit(tx).await.unwrap();

    let outcome = sequencer
        .renumber_after_deletion(&deleted.sequenced())
        .await
        .unwrap();
    assert_eq!(outcome.category, OrderCategory::Sales);
    assert_eq!(outcome.orders, 2);
    assert_eq!(outcome.changed, 2);

    assert_eq!(number_of(&db, &ids[0]).await, "RNG0001/2526");
    assert_eq!(number_of(&db, &ids[1]).await, "RNG0002/2526");
    assert_eq!(number_of(&db, &ids[3]).await, "RNG0003/2526");
    assert_eq!(number_of(&db, &ids[4]).await, "RNG0004/2526");
    assert_eq!(number_of(&db, &ids[5]).await, "SC0001/2526");
}

#[tokio::test]
async fn test_next_order_id_counts_partition() {
    let db = test_db().await;
    seed_orders(&db, &[(S, 0), (S, 1), (C, 2)]).await;
    let sequencer = OrderSequencer::new(db.clone());

    assert_eq!(sequencer.next_order_id(S).await, "RNG0003/2526");
    assert_eq!(sequencer.next_order_id(C).await, "SC0002/2526");
}

#[tokio::test]
async fn test_next_order_id_falls_back_when_unreadable() {
    let db = test_db().await;
    sqlx::query("DROP TABLE pos_order_items")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("DROP TABLE pos_orders")
        .execute(db.pool())
        .await
        .unwrap();

    let id = OrderSequencer::new(db).next_order_id(C).await;
    assert!(id.starts_with("SC"));
    assert!(id.ends_with("/2526"));
    assert!(is_fallback_id(&id));
}

#[tokio::test]
async fn test_migration_backfills_legacy_categories() {
    let db = test_db().await;

    let sale = bare_order(None, "Anita", minute(0));
    let by_client = bare_order(None, "Salon Consumption", minute(1));
    let mut by_purpose = bare_order(None, "Front desk", minute(2));
    by_purpose.consumption_purpose = Some("Hair wash station".to_string());
    let mut blank_purpose = bare_order(None, "Ravi", minute(3));
    blank_purpose.consumption_purpose = Some("   ".to_string());
    let mut by_type = bare_order(None, "Back office", minute(4));
    by_type.order_type = Some("salon-consumption".to_string());

    for order in [&sale, &by_client, &by_purpose, &blank_purpose, &by_type] {
        db.orders().insert(order).await.unwrap();
    }

    let report = OrderSequencer::new(db.clone()).migrate_order_ids().await.unwrap();
    assert_eq!(report.categorized, 5);
    assert!(report.renumber.is_clean());
    assert!(db.orders().list_uncategorized().await.unwrap().is_empty());

    assert_eq!(number_of(&db, &sale.id).await, "RNG0001/2526");
    assert_eq!(number_of(&db, &blank_purpose.id).await, "RNG0002/2526");
    assert_eq!(number_of(&db, &by_client.id).await, "SC0001/2526");
    assert_eq!(number_of(&db, &by_purpose.id).await, "SC0002/2526");
    assert_eq!(number_of(&db, &by_type.id).await, "SC0003/2526");

    let stored = db.orders().get_by_id(&by_client.id).await.unwrap().unwrap();
    assert_eq!(stored.order_category, Some(OrderCategory::SalonConsumption));
}

#[tokio::test]
async fn test_repair_only_touches_broken_partition() {
    let db = test_db().await;
    let ids = seed_orders(&db, &[(S, 0), (S, 1), (C, 2)]).await;
    let sequencer = OrderSequencer::new(db.clone());
    sequencer.renumber_all().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    salon_db::OrderRepository::set_number(&mut tx, &ids[1], "RNG17345678/2526")
        .await
        .unwrap();
    salon_db::commit(tx).await.unwrap();

    let report = sequencer.repair_order_ids().await.unwrap();
    assert_eq!(report.flagged, 1);
    assert_eq!(report.renumber.partitions.len(), 1);
    assert_eq!(report.renumber.partitions[0].category, OrderCategory::Sales);
    assert_eq!(report.renumber.total_changed(), 1);

    assert_eq!(number_of(&db, &ids[1]).await, "RNG0002/2526");

    let clean = sequencer.repair_order_ids().await.unwrap();
    assert_eq!(clean.flagged, 0);
    assert!(clean.renumber.partitions.is_empty());
}

#[tokio::test]
async fn test_failed_partition_rolls_back_alone() {
    let db = test_db().await;
    let ids = seed_orders(&db, &[(S, 0), (C, 1), (S, 2), (C, 3)]).await;

    sqlx::query(
        "CREATE TRIGGER reject_second_sc BEFORE UPDATE ON pos_orders
         WHEN NEW.order_id = 'SC0002/2526'
         BEGIN SELECT RAISE(ABORT, 'numbering rejected'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let sequencer = OrderSequencer::new(db.clone());
    let report = sequencer.renumber_all().await.unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].category, OrderCategory::SalonConsumption);
    assert_eq!(report.partitions.len(), 1);
    assert_eq!(report.partitions[0].category, OrderCategory::Sales);

    assert_eq!(number_of(&db, &ids[0]).await, "RNG0001/2526");
    assert_eq!(number_of(&db, &ids[2]).await, "RNG0002/2526");

    // SC0001 was written before the failure and rolled back with it
    for id in [&ids[1], &ids[3]] {
        let order = db.orders().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(order.order_id, None);
        assert_eq!(order.invoice_number, None);
    }

    sqlx::query("DROP TRIGGER reject_second_sc")
        .execute(db.pool())
        .await
        .unwrap();
    let retry = sequencer.renumber_all().await.unwrap();
    assert!(retry.is_clean());
    assert_eq!(number_of(&db, &ids[1]).await, "SC0001/2526");
    assert_eq!(number_of(&db, &ids[3]).await, "SC0002/2526");
}
