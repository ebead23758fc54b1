//! SQL literal rendering.
//!
//! Queries built by this crate always bind their values. The literal form is
//! only used where a human reads it: relation keys in log lines, error
//! messages and `Key`'s `Display`.

use crate::value::is_null;
use sea_query::Value;

/// Render a `Value` as a PostgreSQL literal.
///
/// Numbers are unquoted, strings are single-quoted with embedded quotes
/// doubled, nulls render as `NULL` and bytes use the `'\x..'` hex form.
///
/// ```
/// use sea_query::Value;
/// use lifeline::value::format_sql_literal;
///
/// assert_eq!(format_sql_literal(&Value::Int(Some(42))), "42");
/// assert_eq!(format_sql_literal(&Value::from("it's")), "'it''s'");
/// assert_eq!(format_sql_literal(&Value::Int(None)), "NULL");
/// ```
pub fn format_sql_literal(value: &Value) -> String {
    if is_null(value) {
        return "NULL".to_string();
    }

    match value {
        Value::Bool(Some(b)) => b.to_string(),

        Value::TinyInt(Some(i)) => i.to_string(),
        Value::SmallInt(Some(i)) => i.to_string(),
        Value::Int(Some(i)) => i.to_string(),
        Value::BigInt(Some(i)) => i.to_string(),
        Value::TinyUnsigned(Some(u)) => u.to_string(),
        Value::SmallUnsigned(Some(u)) => u.to_string(),
        Value::Unsigned(Some(u)) => u.to_string(),
        Value::BigUnsigned(Some(u)) => u.to_string(),

        Value::Float(Some(f)) => f.to_string(),
        Value::Double(Some(d)) => d.to_string(),
        Value::Decimal(Some(d)) => d.to_string(),

        Value::String(Some(s)) => quote(s),
        Value::Char(Some(c)) => quote(&c.to_string()),

        // PostgreSQL hex format: '\x...'
        Value::Bytes(Some(b)) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
            format!("'\\x{hex}'")
        }

        Value::Json(Some(j)) => quote(&j.to_string()),
        Value::Uuid(Some(u)) => quote(&u.to_string()),
        Value::ChronoDateTimeUtc(Some(d)) => quote(&d.to_rfc3339()),
        Value::ChronoDateTime(Some(d)) => quote(&d.to_string()),
        Value::ChronoDate(Some(d)) => quote(&d.to_string()),

        other => quote(&format!("{other:?}")),
    }
}

/// Escape single quotes by doubling them (SQL standard) and wrap in quotes.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
