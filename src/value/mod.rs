//! Value layer for Lifeline
//!
//! Everything that crosses the database boundary is a `sea_query::Value`:
//! bound parameters, decoded row columns and relation keys. This module holds
//! the helpers shared by those paths.
//!
//! - **`TryGetable`** - typed extraction from a `Value` (integer widening, `Option<T>` for nulls)
//! - **`format_sql_literal`** - SQL literal rendering for diagnostics

pub mod format;
pub mod try_getable;

pub use format::format_sql_literal;
pub use try_getable::{TryGetable, ValueExtractionError};

use sea_query::Value;

/// Returns `true` when `value` is the `None` form of its variant.
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTimeLocal(None)
            | Value::ChronoDateTimeWithTimeZone(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
    )
}
