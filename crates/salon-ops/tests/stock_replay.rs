//! Aggregation and replay against a real store.

mod common;

use common::*;
use salon_core::ledger::{TransactionKind, TransactionRef};
use salon_ops::{OpsError, StockReplayer, TransactionAggregator};

#[tokio::test]
async fn test_running_balances_written_back() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();

    let p1 = db.purchases().insert(SHAMPOO, 50, day(1)).await.unwrap();
    let p2 = db.purchases().insert(SHAMPOO, 30, day(3)).await.unwrap();
    let s1 = db.sales().insert(SHAMPOO, 20, day(2)).await.unwrap();
    let c1 = db.consumption().insert(SHAMPOO, 5, day(4)).await.unwrap();

    let result = StockReplayer::new(db.clone())
        .recalculate_product(SHAMPOO)
        .await
        .unwrap();

    assert_eq!(result.final_stock, 55);
    assert_eq!(result.transactions, 4);
    assert!(result.degraded.is_empty());
    assert!(result.product_found);
    assert_eq!(result.totals.purchased, 80);
    assert_eq!(result.totals.sold, 20);
    assert_eq!(result.totals.consumed, 5);

    let purchase = db.purchases().get_by_id(&p1.purchase_id).await.unwrap().unwrap();
    assert_eq!(purchase.stock_after_purchase, Some(50));
    let sale = db.sales().get_by_id(&s1.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.current_stock, Some(30));
    assert_eq!(sale.remaining_stock, Some(30));
    let purchase = db.purchases().get_by_id(&p2.purchase_id).await.unwrap().unwrap();
    assert_eq!(purchase.stock_after_purchase, Some(60));
    let usage = db.consumption().get_by_id(&c1.id).await.unwrap().unwrap();
    assert_eq!(usage.stock_after_consumption, Some(55));

    let product = db.products().get_by_name(SHAMPOO).await.unwrap().unwrap();
    assert_eq!(product.stock_quantity, 55);
}

#[tokio::test]
async fn test_final_stock_equals_ledger_sum() {
    let db = test_db().await;
    db.products().insert(SERUM, 999).await.unwrap();

    for (d, qty) in [(1, 12), (5, 8), (9, 40)] {
        db.purchases().insert(SERUM, qty, day(d)).await.unwrap();
    }
    for (d, qty) in [(2, 3), (6, 30), (10, 1)] {
        db.sales().insert(SERUM, qty, day(d)).await.unwrap();
    }
    db.consumption().insert(SERUM, 2, day(7)).await.unwrap();

    let result = StockReplayer::new(db.clone())
        .recalculate_product(SERUM)
        .await
        .unwrap();

    // 60 in, 34 sold, 2 used
    assert_eq!(result.final_stock, 24);
    assert_eq!(result.totals.net(), result.final_stock);
}

#[tokio::test]
async fn test_negative_balances_are_kept() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    let sale = db.sales().insert(SHAMPOO, 4, day(1)).await.unwrap();
    db.purchases().insert(SHAMPOO, 10, day(2)).await.unwrap();

    let result = StockReplayer::new(db.clone())
        .recalculate_product(SHAMPOO)
        .await
        .unwrap();
    assert_eq!(result.final_stock, 6);

    let sale = db.sales().get_by_id(&sale.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.current_stock, Some(-4));
    assert_eq!(sale.remaining_stock, Some(-4));
}

#[tokio::test]
async fn test_recalculation_is_idempotent() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    db.purchases().insert(SHAMPOO, 50, day(1)).await.unwrap();
    db.sales().insert(SHAMPOO, 20, day(2)).await.unwrap();

    let replayer = StockReplayer::new(db.clone());
    let first = replayer.recalculate_product(SHAMPOO).await.unwrap();
    let second = replayer.recalculate_product(SHAMPOO).await.unwrap();

    assert_eq!(first.final_stock, second.final_stock);
    assert_eq!(first.totals, second.totals);
}

#[tokio::test]
async fn test_unreadable_consumption_degrades() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    db.purchases().insert(SHAMPOO, 50, day(1)).await.unwrap();
    db.sales().insert(SHAMPOO, 20, day(2)).await.unwrap();

    sqlx::query("DROP TABLE salon_consumption")
        .execute(db.pool())
        .await
        .unwrap();

    let ledger = TransactionAggregator::new(db.clone())
        .aggregate(SHAMPOO)
        .await
        .unwrap();
    assert_eq!(ledger.transactions.len(), 2);
    assert_eq!(ledger.degraded, vec![TransactionKind::Consumption]);
    assert!(!ledger.is_complete());

    let result = StockReplayer::new(db.clone())
        .recalculate_product(SHAMPOO)
        .await
        .unwrap();
    assert_eq!(result.final_stock, 30);
    assert_eq!(result.degraded, vec![TransactionKind::Consumption]);
}

#[tokio::test]
async fn test_blank_product_name_rejected() {
    let db = test_db().await;
    let err = StockReplayer::new(db).recalculate_product("  ").await.unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn test_recalculate_all_covers_active_products() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    db.products().insert(SERUM, 0).await.unwrap();
    db.products().insert("Hair Spray", 7).await.unwrap();
    db.products().set_active("Hair Spray", false).await.unwrap();

    db.purchases().insert(SHAMPOO, 10, day(1)).await.unwrap();
    db.purchases().insert(SERUM, 4, day(1)).await.unwrap();
    db.consumption().insert(SERUM, 1, day(2)).await.unwrap();

    let summary = StockReplayer::new(db.clone()).recalculate_all().await.unwrap();

    assert!(summary.is_clean());
    assert_eq!(summary.updated.len(), 2);
    assert_eq!(summary.stock_of(SHAMPOO), Some(10));
    assert_eq!(summary.stock_of(SERUM), Some(3));
    assert_eq!(summary.stock_of("Hair Spray"), None);

    let inactive = db.products().get_by_name("Hair Spray").await.unwrap().unwrap();
    assert_eq!(inactive.stock_quantity, 7);
}

#[tokio::test]
async fn test_remove_transaction_recalculates_without_it() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    db.purchases().insert(SHAMPOO, 50, day(1)).await.unwrap();
    let sale = db.sales().insert(SHAMPOO, 20, day(2)).await.unwrap();

    let replayer = StockReplayer::new(db.clone());
    assert_eq!(replayer.recalculate_product(SHAMPOO).await.unwrap().final_stock, 30);

    let target = TransactionRef::new(TransactionKind::Sale, sale.sale_id.clone());
    let result = replayer.remove_transaction(&target).await.unwrap();

    assert_eq!(result.final_stock, 50);
    assert!(db.sales().get_by_id(&sale.sale_id).await.unwrap().is_none());
    let product = db.products().get_by_name(SHAMPOO).await.unwrap().unwrap();
    assert_eq!(product.stock_quantity, 50);
}

#[tokio::test]
async fn test_remove_unknown_transaction() {
    let db = test_db().await;
    let target = TransactionRef::new(TransactionKind::Purchase, "missing");
    let err = StockReplayer::new(db).remove_transaction(&target).await.unwrap_err();
    assert!(matches!(err, OpsError::TransactionNotFound { .. }));
}

#[tokio::test]
async fn test_recalculate_all_continues_past_failed_product() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    db.products().insert(SERUM, 0).await.unwrap();
    db.purchases().insert(SHAMPOO, 10, day(1)).await.unwrap();
    let serum_in = db.purchases().insert(SERUM, 4, day(1)).await.unwrap();

    sqlx::query(
        "CREATE TRIGGER freeze_serum BEFORE UPDATE ON product_master
         WHEN NEW.name = 'Keratin Serum'
         BEGIN SELECT RAISE(ABORT, 'product locked'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let summary = StockReplayer::new(db.clone()).recalculate_all().await.unwrap();

    assert!(!summary.is_clean());
    assert_eq!(summary.stock_of(SHAMPOO), Some(10));
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].product_name, SERUM);

    // the failed product's snapshot writes rolled back with it
    let purchase = db.purchases().get_by_id(&serum_in.purchase_id).await.unwrap().unwrap();
    assert_eq!(purchase.stock_after_purchase, None);
    let serum = db.products().get_by_name(SERUM).await.unwrap().unwrap();
    assert_eq!(serum.stock_quantity, 0);
    let shampoo = db.products().get_by_name(SHAMPOO).await.unwrap().unwrap();
    assert_eq!(shampoo.stock_quantity, 10);
}

#[tokio::test]
async fn test_full_recalculation_is_idempotent() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 3).await.unwrap();
    db.products().insert(SERUM, 0).await.unwrap();
    db.purchases().insert(SHAMPOO, 50, day(1)).await.unwrap();
    let sale = db.sales().insert(SHAMPOO, 20, day(2)).await.unwrap();
    db.purchases().insert(SERUM, 6, day(1)).await.unwrap();
    let usage = db.consumption().insert(SERUM, 2, day(3)).await.unwrap();

    let replayer = StockReplayer::new(db.clone());
    let first = replayer.recalculate_all().await.unwrap();
    let sale_after_first = db.sales().get_by_id(&sale.sale_id).await.unwrap().unwrap();
    let usage_after_first = db.consumption().get_by_id(&usage.id).await.unwrap().unwrap();

    let second = replayer.recalculate_all().await.unwrap();
    let sale_after_second = db.sales().get_by_id(&sale.sale_id).await.unwrap().unwrap();
    let usage_after_second = db.consumption().get_by_id(&usage.id).await.unwrap().unwrap();

    assert!(first.is_clean() && second.is_clean());
    for name in [SHAMPOO, SERUM] {
        assert_eq!(first.stock_of(name), second.stock_of(name));
    }
    assert_eq!(second.stock_of(SHAMPOO), Some(30));
    assert_eq!(second.stock_of(SERUM), Some(4));
    assert_eq!(sale_after_first.remaining_stock, sale_after_second.remaining_stock);
    assert_eq!(sale_after_first.current_stock, sale_after_second.current_stock);
    assert_eq!(
        usage_after_first.stock_after_consumption,
        usage_after_second.stock_after_consumption
    );
}

#[tokio::test]
async fn test_concurrent_recalculations_agree() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    db.purchases().insert(SHAMPOO, 50, day(1)).await.unwrap();
    db.sales().insert(SHAMPOO, 20, day(2)).await.unwrap();

    let replayer = StockReplayer::new(db.clone());
    let (a, b, c) = tokio::join!(
        replayer.recalculate_product(SHAMPOO),
        replayer.recalculate_product(SHAMPOO),
        replayer.recalculate_all(),
    );

    assert_eq!(a.unwrap().final_stock, 30);
    assert_eq!(b.unwrap().final_stock, 30);
    assert_eq!(c.unwrap().stock_of(SHAMPOO), Some(30));
    let product = db.products().get_by_name(SHAMPOO).await.unwrap().unwrap();
    assert_eq!(product.stock_quantity, 30);
}
