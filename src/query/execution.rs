//! Query execution methods for `SelectQuery`.

use crate::executor::{LifeError, LifeExecutor};
use crate::model::ModelTrait;
use crate::query::select::SelectQuery;

impl<M: ModelTrait> SelectQuery<M> {
    /// Run the query and map every row through `FromRow`.
    ///
    /// # Errors
    ///
    /// Propagates executor failures and row decoding errors.
    pub fn all<Ex: LifeExecutor + ?Sized>(self, executor: &Ex) -> Result<Vec<M>, LifeError> {
        let (sql, values) = self.build();
        let rows = executor.query_all(&sql, &values)?;
        rows.iter().map(M::from_row).collect()
    }

    /// Run the query with `LIMIT 1`; `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Propagates executor failures and row decoding errors.
    pub fn find_one<Ex: LifeExecutor + ?Sized>(self, executor: &Ex) -> Result<Option<M>, LifeError> {
        let (sql, values) = self.limit(1).build();
        let rows = executor.query_all(&sql, &values)?;
        rows.first().map(M::from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::MockExecutor;
    use crate::tests_cfg::{post_row, Post};
    use crate::SelectQuery;

    #[test]
    fn test_all_maps_rows() {
        let executor = MockExecutor::new().on_query(r#"FROM "posts""#, vec![post_row(1, 7), post_row(2, 7)]);
        let posts = SelectQuery::<Post>::new().filter_eq("user_id", 7).all(&executor).unwrap();
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(executor.query_count(), 1);
    }

    #[test]
    fn test_find_one_limits_and_handles_empty() {
        let executor = MockExecutor::new();
        let post = SelectQuery::<Post>::new().find_one(&executor).unwrap();
        assert!(post.is_none());
        let statements = executor.statements();
        assert!(statements[0].sql.contains("LIMIT"), "{}", statements[0].sql);
    }
}
