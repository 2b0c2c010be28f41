mod common;

use common::*;
use salon_ops::{self_test, OpsError};

#[tokio::test]
async fn test_self_test_on_empty_store() {
    let db = test_db().await;
    let report = self_test(&db).await.unwrap();

    assert!(report.success);
    assert_eq!(report.purchase_records, 0);
    assert_eq!(report.product_records, 0);
}

#[tokio::test]
async fn test_self_test_samples_one_row() {
    let db = test_db().await;
    db.products().insert(SHAMPOO, 0).await.unwrap();
    db.purchases().insert(SHAMPOO, 10, day(1)).await.unwrap();
    db.purchases().insert(SHAMPOO, 10, day(2)).await.unwrap();
    db.sales().insert(SHAMPOO, 1, day(3)).await.unwrap();

    let report = self_test(&db).await.unwrap();
    assert_eq!(report.purchase_records, 1);
    assert_eq!(report.sales_records, 1);
    assert_eq!(report.consumption_records, 0);
    assert_eq!(report.product_records, 1);
}

#[tokio::test]
async fn test_self_test_names_missing_table() {
    let db = test_db().await;
    sqlx::query("DROP TABLE salon_consumption")
        .execute(db.pool())
        .await
        .unwrap();

    match self_test(&db).await {
        Err(OpsError::SelfTestFailed { table, .. }) => assert_eq!(table, "salon_consumption"),
        other => panic!("expected self-test failure, got {other:?}"),
    }
}
