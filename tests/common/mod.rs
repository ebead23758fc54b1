//! Shop schema shared by the integration tests.
//!
//! Regions contain customers, customers place orders, orders have lines and
//! reference products through `order_product`, customers carry labels through
//! the timestamped `customer_label` pivot.
#![allow(dead_code)]

use lifeline::{Aggregate, LifeModel, PivotDef, RelationDef, Row, ThroughDef};
use sea_query::Value;
use std::collections::HashSet;

pub const REGION_CUSTOMERS: RelationDef =
    RelationDef::has_many("customers", "regions", "customers", "region_id", "id");
pub const REGION_ORDERS: RelationDef = RelationDef::has_many_through(
    "orders",
    "regions",
    "orders",
    ThroughDef::new("customers", "region_id", "customer_id"),
);
pub const REGION_FIRST_ORDER: RelationDef = RelationDef::has_one_through(
    "first_order",
    "regions",
    "orders",
    ThroughDef::new("customers", "region_id", "customer_id"),
);

pub const CUSTOMER_REGION: RelationDef = RelationDef::belongs_to("region", "customers", "regions", "region_id", "id");
pub const CUSTOMER_ORDERS: RelationDef = RelationDef::has_many("orders", "customers", "orders", "customer_id", "id");
pub const CUSTOMER_LAST_ORDER: RelationDef =
    RelationDef::latest_of_many("last_order", "customers", "orders", "customer_id", "id", "placed_at");
pub const CUSTOMER_FIRST_ORDER: RelationDef =
    RelationDef::oldest_of_many("first_order", "customers", "orders", "customer_id", "id", "placed_at");
pub const CUSTOMER_BIGGEST_ORDER: RelationDef = RelationDef::of_many(
    "biggest_order",
    "customers",
    "orders",
    "customer_id",
    "id",
    "total",
    Aggregate::Max,
);
pub const CUSTOMER_LABELS: RelationDef = RelationDef::belongs_to_many(
    "labels",
    "customers",
    "labels",
    PivotDef::new("customer_label", "customer_id", "label_id").with_timestamps(),
);

pub const ORDER_CUSTOMER: RelationDef = RelationDef::belongs_to("customer", "orders", "customers", "customer_id", "id");
pub const ORDER_LINES: RelationDef = RelationDef::has_many("lines", "orders", "order_lines", "order_id", "id");
pub const ORDER_PRODUCTS: RelationDef = RelationDef::belongs_to_many(
    "products",
    "orders",
    "products",
    PivotDef::new("order_product", "order_id", "product_sku").related_key("sku"),
);

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "regions"]
pub struct Region {
    #[primary_key]
    pub id: i64,
    pub name: String,
    #[relation = "REGION_CUSTOMERS"]
    pub customers: Vec<Customer>,
    #[relation = "REGION_ORDERS"]
    pub orders: Vec<Order>,
    #[relation = "REGION_FIRST_ORDER"]
    pub first_order: Option<Order>,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "customers"]
pub struct Customer {
    #[primary_key]
    #[auto_increment]
    pub id: i64,
    pub name: String,
    pub region_id: Option<i64>,
    #[relation = "CUSTOMER_REGION"]
    pub region: Option<Box<Region>>,
    #[relation = "CUSTOMER_ORDERS"]
    pub orders: Vec<Order>,
    #[relation = "CUSTOMER_LAST_ORDER"]
    pub last_order: Option<Order>,
    #[relation = "CUSTOMER_FIRST_ORDER"]
    pub first_order: Option<Order>,
    #[relation = "CUSTOMER_BIGGEST_ORDER"]
    pub biggest_order: Option<Order>,
    #[relation = "CUSTOMER_LABELS"]
    pub labels: HashSet<Label>,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "orders"]
pub struct Order {
    #[primary_key]
    #[auto_increment]
    pub id: i64,
    pub customer_id: i64,
    pub total: i64,
    #[column_name = "placed_at"]
    pub placed: String,
    #[relation = "ORDER_CUSTOMER"]
    pub customer: Option<Box<Customer>>,
    #[relation = "ORDER_LINES"]
    pub lines: Vec<OrderLine>,
    #[relation = "ORDER_PRODUCTS"]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "order_lines"]
pub struct OrderLine {
    #[primary_key]
    #[auto_increment]
    pub id: i64,
    pub order_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, LifeModel)]
#[table_name = "products"]
pub struct Product {
    #[primary_key]
    pub sku: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, LifeModel)]
#[table_name = "labels"]
pub struct Label {
    #[primary_key]
    pub id: i64,
    pub name: String,
}

pub fn customer(id: i64, region_id: Option<i64>) -> Customer {
    Customer {
        id,
        name: format!("customer{id}"),
        region_id,
        ..Customer::default()
    }
}

pub fn region(id: i64) -> Region {
    Region {
        id,
        name: format!("region{id}"),
        ..Region::default()
    }
}

pub fn customer_row(id: i64, region_id: Option<i64>) -> Row {
    Row::new()
        .with("id", id)
        .with("name", format!("customer{id}"))
        .with("region_id", region_id)
}

pub fn region_row(id: i64) -> Row {
    Row::new().with("id", id).with("name", format!("region{id}"))
}

pub fn order_row(id: i64, customer_id: i64, total: i64) -> Row {
    Row::new()
        .with("id", id)
        .with("customer_id", customer_id)
        .with("total", total)
        .with("placed_at", format!("2024-01-{:02}", id % 28 + 1))
}

pub fn line_row(id: i64, order_id: i64, quantity: i32) -> Row {
    Row::new()
        .with("id", id)
        .with("order_id", order_id)
        .with("quantity", quantity)
}

pub fn product_row(sku: &str) -> Row {
    Row::new().with("sku", sku).with("name", format!("product {sku}"))
}

pub fn label_row(id: i64, name: &str) -> Row {
    Row::new().with("id", id).with("name", name)
}

pub fn link_row(left: (&str, Value), right: (&str, Value)) -> Row {
    Row::new().with(left.0, left.1).with(right.0, right.1)
}
