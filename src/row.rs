//! Decoded result rows.
//!
//! `Row` is an ordered list of `(column, Value)` pairs. `MayPostgresExecutor`
//! decodes `may_postgres` rows into it, and `MockExecutor` hands out rows
//! built by hand, so everything above the executor is testable without a
//! server.

use crate::executor::LifeError;
use crate::value::TryGetable;
use sea_query::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Row::push`].
    ///
    /// ```
    /// use lifeline::Row;
    ///
    /// let row = Row::new().with("id", 1).with("name", "Alice");
    /// assert_eq!(row.try_get::<i32>("id").unwrap(), 1);
    /// ```
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Look up a column by name.
    ///
    /// An exact match wins; otherwise `user_id`, `userId` and `UserId` are
    /// treated as the same column.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|(name, _)| same_column_name(name, column))
            })
            .map(|(_, value)| value)
    }

    /// Extract a typed column value.
    ///
    /// # Errors
    ///
    /// Returns `LifeError::ParseError` when the column is missing or the value
    /// does not convert to `T`.
    pub fn try_get<T: TryGetable>(&self, column: &str) -> Result<T, LifeError> {
        let value = self
            .get_value(column)
            .ok_or_else(|| LifeError::ParseError(format!("column `{column}` not found in row")))?;
        T::try_get(value.clone())
            .map_err(|e| LifeError::ParseError(format!("column `{column}`: {e}")))
    }
}

/// Build a value from a decoded row.
///
/// Implemented by `#[derive(LifeModel)]`; relation fields start out empty.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, LifeError>;
}

/// Case-insensitive comparison that ignores underscores (`user_id` == `userId`).
pub fn same_column_name(a: &str, b: &str) -> bool {
    let mut left = a.chars().filter(|c| *c != '_');
    let mut right = b.chars().filter(|c| *c != '_');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if l.eq_ignore_ascii_case(&r) => {}
            _ => return false,
        }
    }
}
