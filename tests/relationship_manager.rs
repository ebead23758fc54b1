//! Relation mutations against a scripted executor: statement order, bound
//! values and kind checks.

mod common;

use common::*;
use lifeline::test_helpers::MockExecutor;
use lifeline::{LifeError, LifelineConfig, ModelTrait, RelationError, RelationType, RelationshipManager};
use sea_query::Value;

fn label_link(customer_id: i64, label_id: i64) -> lifeline::Row {
    link_row(
        ("customer_id", Value::BigInt(Some(customer_id))),
        ("label_id", Value::BigInt(Some(label_id))),
    )
}

#[test]
fn test_sync_with_configured_timestamp_columns() {
    let mut config = LifelineConfig::default();
    config.pivot.created_at_column = "inserted_at".to_string();
    config.pivot.updated_at_column = "modified_at".to_string();
    let manager = RelationshipManager::from_config(&config);

    let executor = MockExecutor::new()
        .on_query(r#"FROM "customer_label""#, vec![label_link(1, 5), label_link(1, 7)])
        .on_execute("DELETE", 1)
        .on_execute("INSERT", 1);
    let changes = manager
        .sync(&executor, &customer(1, None), &CUSTOMER_LABELS, [5i64, 6])
        .unwrap();
    assert_eq!(changes.attached, vec![Value::BigInt(Some(6))]);
    assert_eq!(changes.detached, vec![Value::BigInt(Some(7))]);

    let statements = executor.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(
        statements[1].sql,
        r#"DELETE FROM "customer_label" WHERE "customer_id" = $1 AND "label_id" IN ($2)"#
    );
    assert!(
        statements[2].sql.starts_with(
            r#"INSERT INTO "customer_label" ("customer_id", "label_id", "inserted_at", "modified_at") VALUES ($1, $2, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)"#
        ),
        "{}",
        statements[2].sql
    );
}

#[test]
fn test_sync_to_empty_detaches_everything() {
    let executor = MockExecutor::new().on_query(r#"FROM "customer_label""#, vec![label_link(1, 5), label_link(1, 7)]);
    let changes = RelationshipManager::new()
        .sync(&executor, &customer(1, None), &CUSTOMER_LABELS, Vec::<i64>::new())
        .unwrap();
    assert!(changes.attached.is_empty());
    assert_eq!(changes.detached.len(), 2);
    assert!(executor.statements().iter().all(|s| !s.sql.starts_with("INSERT")));
}

#[test]
fn test_toggle_then_toggle_again_restores_membership() {
    let manager = RelationshipManager::new();
    let owner = customer(1, None);

    let before = MockExecutor::new().on_query(r#"FROM "customer_label""#, vec![label_link(1, 5)]);
    let first = manager.toggle(&before, &owner, &CUSTOMER_LABELS, [5i64, 8]).unwrap();
    assert_eq!(first.attached, vec![Value::BigInt(Some(8))]);
    assert_eq!(first.detached, vec![Value::BigInt(Some(5))]);

    let after = MockExecutor::new().on_query(r#"FROM "customer_label""#, vec![label_link(1, 8)]);
    let second = manager.toggle(&after, &owner, &CUSTOMER_LABELS, [5i64, 8]).unwrap();
    assert_eq!(second.attached, first.detached);
    assert_eq!(second.detached, first.attached);
}

#[test]
fn test_attach_many_with_text_keys() {
    let executor = MockExecutor::new().on_execute(r#"INSERT INTO "order_product""#, 2);
    let order = Order {
        id: 100,
        ..Order::default()
    };
    let inserted = RelationshipManager::new()
        .attach_many(&executor, &order, &ORDER_PRODUCTS, ["A", "B", "A"])
        .unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(
        executor.statements()[0].values,
        vec![
            Value::BigInt(Some(100)),
            Value::from("A"),
            Value::BigInt(Some(100)),
            Value::from("B")
        ]
    );
}

#[test]
fn test_save_many_inserts_each_child() {
    let executor = MockExecutor::new().on_query(r#"INSERT INTO "orders""#, vec![order_row(200, 1, 10)]);
    let drafts = vec![
        Order {
            total: 10,
            ..Order::default()
        },
        Order {
            total: 20,
            ..Order::default()
        },
    ];
    let saved = RelationshipManager::new()
        .save_many(&executor, &customer(1, None), &CUSTOMER_ORDERS, drafts)
        .unwrap();
    assert_eq!(saved.len(), 2);

    let statements = executor.statements();
    assert_eq!(statements.len(), 2);
    for statement in &statements {
        assert!(
            statement.sql.starts_with(r#"INSERT INTO "orders" ("customer_id", "total", "placed_at")"#),
            "{}",
            statement.sql
        );
        assert_eq!(statement.values[0], Value::BigInt(Some(1)));
    }
}

#[test]
fn test_associate_region() {
    let executor = MockExecutor::new().on_execute("UPDATE", 1);
    let mut buyer = customer(4, None);
    RelationshipManager::new()
        .associate(&executor, &mut buyer, &CUSTOMER_REGION, &region(3))
        .unwrap();
    assert_eq!(buyer.region_id, Some(3));
    assert_eq!(buyer.get_by_column_name("region_id"), Some(Value::BigInt(Some(3))));
    assert_eq!(
        executor.statements()[0].sql,
        r#"UPDATE "customers" SET "region_id" = $1 WHERE "id" = $2"#
    );
}

#[test]
fn test_failed_update_leaves_entity_untouched() {
    let executor = MockExecutor::new().fail_on("UPDATE", "serialization failure");
    let mut buyer = customer(4, Some(1));
    let err = RelationshipManager::new()
        .associate(&executor, &mut buyer, &CUSTOMER_REGION, &region(3))
        .unwrap_err();
    assert!(matches!(err, LifeError::QueryError(_)));
    assert_eq!(buyer.region_id, Some(1));
}

#[test]
fn test_through_relations_are_read_only() {
    let executor = MockExecutor::new();
    let manager = RelationshipManager::new();
    let err = manager
        .attach(&executor, &region(3), &REGION_ORDERS, 1, &[])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Relation error: attach requires a belongs_to_many relation, `orders` is has_many_through"
    );
    let err = manager
        .create::<_, _, Order>(&executor, &region(3), &REGION_FIRST_ORDER, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        LifeError::Relation(RelationError::WrongKind { actual: RelationType::HasOneThrough, .. })
    ));
    assert!(executor.statements().is_empty());
}

#[test]
fn test_definition_applied_to_wrong_entity() {
    let executor = MockExecutor::new();
    let err = RelationshipManager::new()
        .attach(&executor, &Order::default(), &CUSTOMER_LABELS, 1, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        LifeError::Relation(RelationError::TableMismatch { expected: "customers", actual: "orders", .. })
    ));
}
