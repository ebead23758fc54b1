//! Model trait: the per-entity surface the relationship layer needs.
//!
//! Implemented by `#[derive(LifeModel)]`. Relation code never touches struct
//! fields directly; it reads and writes key columns by name through
//! [`ModelTrait::get_by_column_name`] and [`ModelTrait::set_by_column_name`].

use crate::row::FromRow;
use sea_query::Value;
use std::fmt;

/// Error returned by the name-based column accessors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The model has no column with this name
    ColumnNotFound { table: &'static str, column: String },
    /// The value could not be converted to the field's type
    InvalidValue { column: String, reason: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::ColumnNotFound { table, column } => {
                write!(f, "column `{column}` not found on `{table}`")
            }
            ModelError::InvalidValue { column, reason } => {
                write!(f, "invalid value for column `{column}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub trait ModelTrait: FromRow + Clone + fmt::Debug + 'static {
    /// Database table backing this model
    fn table_name() -> &'static str;

    /// Primary key column
    fn primary_key() -> &'static str;

    /// Every persisted column, in declaration order
    fn column_names() -> &'static [&'static str];

    /// Read a column by name (`snake_case` or `camelCase`).
    ///
    /// Returns `None` when the model has no such column; a null column is
    /// `Some` of the variant's `None` form.
    fn get_by_column_name(&self, column_name: &str) -> Option<Value>;

    /// Write a column by name (`snake_case` or `camelCase`).
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for an unknown column or an unconvertible value.
    fn set_by_column_name(&mut self, column_name: &str, value: Value) -> Result<(), ModelError>;

    /// Column/value pairs for an `INSERT`, auto-increment columns excluded.
    fn insert_values(&self) -> Vec<(&'static str, Value)>;

    fn get_primary_key_value(&self) -> Value {
        self.get_by_column_name(Self::primary_key())
            .unwrap_or(Value::Int(None))
    }
}
