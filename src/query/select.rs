//! Select query builder.
//!
//! Query building methods live here; execution methods are in the execution module.

use crate::model::ModelTrait;
use crate::query::{model_columns, Ident};
use sea_query::{
    Expr, ExprTrait, IntoCondition, Order, PostgresQueryBuilder, SelectStatement, Value, Values,
};
use std::fmt;
use std::marker::PhantomData;

/// `SELECT <M's columns> FROM <M::table_name()>` plus whatever the caller
/// layers on.
///
/// Relation constraints receive and return this type, so a constraint can
/// add filters, ordering or limits but never change the table.
pub struct SelectQuery<M> {
    pub(crate) query: SelectStatement,
    _phantom: PhantomData<fn() -> M>,
}

impl<M: ModelTrait> SelectQuery<M> {
    pub fn new() -> Self {
        let mut query = SelectStatement::default();
        query.columns(model_columns::<M>()).from(Ident::new(M::table_name()));
        Self {
            query,
            _phantom: PhantomData,
        }
    }

    pub fn filter<F>(mut self, condition: F) -> Self
    where
        F: IntoCondition,
    {
        self.query.cond_where(condition.into_condition());
        self
    }

    /// `WHERE column = value`
    pub fn filter_eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filter(Expr::col(Ident::new(column)).eq(value.into()))
    }

    /// `WHERE column IN (values)`
    pub fn filter_in<I>(self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.filter(Expr::col(Ident::new(column)).is_in(values))
    }

    pub fn order_by(mut self, column: &'static str, order: Order) -> Self {
        self.query.order_by(Ident::new(column), order);
        self
    }

    /// PostgreSQL `DISTINCT ON (column)`. Pair with an `order_by` on the same column first.
    pub fn distinct_on(mut self, column: &'static str) -> Self {
        self.query.distinct_on([Ident::new(column)]);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset(offset);
        self
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.query
    }

    pub fn build(&self) -> (String, Values) {
        self.query.build(PostgresQueryBuilder)
    }
}

impl<M: ModelTrait> Default for SelectQuery<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for SelectQuery<M> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M> fmt::Debug for SelectQuery<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQuery")
            .field("query", &self.query.to_string(PostgresQueryBuilder))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_cfg::Post;

    #[test]
    fn test_new_selects_mapped_columns_from_model_table() {
        let (sql, values) = SelectQuery::<Post>::new().build();
        assert_eq!(
            sql,
            r#"SELECT "id", "user_id", "editor_id", "title", "published" FROM "posts""#
        );
        assert!(values.0.is_empty());
    }

    #[test]
    fn test_filters_bind_values() {
        let (sql, values) = SelectQuery::<Post>::new()
            .filter_eq("published", true)
            .filter_in("user_id", vec![Value::from(1), Value::from(2)])
            .build();
        assert!(sql.contains(r#""published" = $1"#), "{sql}");
        assert!(sql.contains(r#""user_id" IN ($2, $3)"#), "{sql}");
        assert_eq!(values.0.len(), 3);
    }

    #[test]
    fn test_order_limit_offset() {
        let (sql, _) = SelectQuery::<Post>::new()
            .order_by("created_at", Order::Desc)
            .limit(5)
            .offset(10)
            .build();
        assert!(sql.contains(r#"ORDER BY "created_at" DESC"#), "{sql}");
        assert!(sql.contains("LIMIT"), "{sql}");
        assert!(sql.contains("OFFSET"), "{sql}");
    }

    #[test]
    fn test_distinct_on() {
        let (sql, _) = SelectQuery::<Post>::new()
            .distinct_on("user_id")
            .order_by("user_id", Order::Asc)
            .build();
        assert!(sql.starts_with(r#"SELECT DISTINCT ON ("user_id") "id", "user_id""#), "{sql}");
    }
}
