//! Batch query builders for eager loading.
//!
//! One statement per relation (two for pivot/through kinds), whatever the
//! number of owners: keys are always collected first and bound into a single
//! `IN (...)` list.

use crate::model::ModelTrait;
use crate::query::{Ident, SelectQuery};
use crate::relation::def::Bridge;
use crate::relation::keys::KeySet;
use crate::relation::request::Constraint;
use sea_query::{Expr, ExprTrait, Order, Query, SelectStatement};

/// `SELECT <related columns> FROM related WHERE column IN (keys)`
pub fn direct_query<R: ModelTrait>(column: &'static str, keys: &KeySet) -> SelectQuery<R> {
    SelectQuery::<R>::new().filter_in(column, keys.values().iter().cloned())
}

/// One related row per distinct `foreign_key`, picked by `column` in `order`.
///
/// `SELECT DISTINCT ON (fk) <related columns> FROM related WHERE fk IN (keys) ORDER BY fk ASC, column <order>`
pub fn one_of_many_query<R: ModelTrait>(
    foreign_key: &'static str,
    column: &'static str,
    order: Order,
    keys: &KeySet,
) -> SelectQuery<R> {
    direct_query::<R>(foreign_key, keys)
        .distinct_on(foreign_key)
        .order_by(foreign_key, Order::Asc)
        .order_by(column, order)
}

/// Phase one of a two-phase load:
/// `SELECT owner_column, related_column FROM bridge WHERE owner_column IN (keys)`
pub fn bridge_query(bridge: &Bridge, keys: &KeySet) -> SelectStatement {
    Query::select()
        .columns([Ident::new(bridge.owner_column), Ident::new(bridge.related_column)])
        .from(Ident::new(bridge.table))
        .and_where(Expr::col(Ident::new(bridge.owner_column)).is_in(keys.values().iter().cloned()))
        .to_owned()
}

/// Apply the caller's constraint, if any.
pub fn constrained<R: ModelTrait>(
    query: SelectQuery<R>,
    constraint: Option<&Constraint<R>>,
) -> SelectQuery<R> {
    match constraint {
        Some(constraint) => constraint(query),
        None => query,
    }
}
