//! Value conversion between SeaQuery and may_postgres.
//!
//! Outbound, each bound `sea_query::Value` becomes a boxed `ToSql` parameter,
//! in order. Inbound, each `may_postgres` row is decoded column by column into
//! a [`Row`] of `sea_query::Value`s.
//!
//! Integers are bound through [`SqlInteger`], which writes whatever width the
//! server inferred for the placeholder (`INT2`, `INT4` or `INT8`). Relation keys
//! pass through several models before they are bound, so an `i32` key can end
//! up compared against a `BIGINT` column. Nulls are bound through [`SqlNull`],
//! which accepts any parameter type.

use crate::executor::LifeError;
use crate::row::Row;
use bytes::BytesMut;
use may_postgres::Row as PgRow;
use postgres_types::{IsNull, ToSql, Type};
use sea_query::{Value, Values};
use std::error::Error;

type BoxError = Box<dyn Error + Sync + Send>;

/// Convert SeaQuery values to may_postgres parameters and run `f` with them.
///
/// # Errors
///
/// Returns `LifeError::Other` if a value cannot be bound.
pub fn with_converted_params<F, R>(values: &Values, f: F) -> Result<R, LifeError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, LifeError>,
{
    let owned = values
        .iter()
        .map(to_sql_param)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| &**p as &dyn ToSql).collect();
    f(&params)
}

fn to_sql_param(value: &Value) -> Result<Box<dyn ToSql>, LifeError> {
    if crate::value::is_null(value) {
        return Ok(Box::new(SqlNull));
    }
    let param: Box<dyn ToSql> = match value {
        Value::Bool(Some(b)) => Box::new(*b),
        Value::TinyInt(Some(i)) => Box::new(SqlInteger(i64::from(*i))),
        Value::SmallInt(Some(i)) => Box::new(SqlInteger(i64::from(*i))),
        Value::Int(Some(i)) => Box::new(SqlInteger(i64::from(*i))),
        Value::BigInt(Some(i)) => Box::new(SqlInteger(*i)),
        Value::TinyUnsigned(Some(u)) => Box::new(SqlInteger(i64::from(*u))),
        Value::SmallUnsigned(Some(u)) => Box::new(SqlInteger(i64::from(*u))),
        Value::Unsigned(Some(u)) => Box::new(SqlInteger(i64::from(*u))),
        Value::BigUnsigned(Some(u)) => {
            let signed = i64::try_from(*u).map_err(|_| {
                LifeError::Other(format!(
                    "BigUnsigned value {u} exceeds i64::MAX, cannot be bound"
                ))
            })?;
            Box::new(SqlInteger(signed))
        }
        Value::Float(Some(f)) => Box::new(*f),
        Value::Double(Some(d)) => Box::new(*d),
        Value::String(Some(s)) => Box::new(s.to_string()),
        Value::Char(Some(c)) => Box::new(c.to_string()),
        Value::Bytes(Some(b)) => Box::new(b.to_vec()),
        Value::Json(Some(j)) => Box::new(serde_json::Value::clone(j)),
        Value::Uuid(Some(u)) => Box::new(uuid::Uuid::clone(u)),
        Value::ChronoDateTimeUtc(Some(d)) => Box::new(chrono::DateTime::<chrono::Utc>::clone(d)),
        Value::ChronoDateTime(Some(d)) => Box::new(chrono::NaiveDateTime::clone(d)),
        Value::ChronoDate(Some(d)) => Box::new(chrono::NaiveDate::clone(d)),
        Value::Decimal(Some(d)) => Box::new(rust_decimal::Decimal::clone(d)),
        other => {
            return Err(LifeError::Other(format!(
                "Unsupported value type in query: {other:?}"
            )));
        }
    };
    Ok(param)
}

/// NULL parameter of any type.
#[derive(Debug)]
pub struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(&self, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, BoxError> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    postgres_types::to_sql_checked!();
}

/// Integer parameter written at the width of the target column.
#[derive(Debug)]
pub struct SqlInteger(pub i64);

impl ToSql for SqlInteger {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if *ty == Type::INT2 {
            i16::try_from(self.0)?.to_sql(ty, out)
        } else if *ty == Type::INT4 {
            i32::try_from(self.0)?.to_sql(ty, out)
        } else {
            self.0.to_sql(ty, out)
        }
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8
    }

    postgres_types::to_sql_checked!();
}

/// Decode a `may_postgres` row into a [`Row`].
///
/// # Errors
///
/// Returns `LifeError::ParseError` for a column type with no `Value` mapping.
pub fn decode_row(row: &PgRow) -> Result<Row, LifeError> {
    let mut decoded = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_())?;
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &PgRow, idx: usize, ty: &Type) -> Result<Value, LifeError> {
    let value = match ty.name() {
        "bool" => Value::from(row.try_get::<_, Option<bool>>(idx)?),
        "int2" => Value::from(row.try_get::<_, Option<i16>>(idx)?),
        "int4" => Value::from(row.try_get::<_, Option<i32>>(idx)?),
        "int8" => Value::from(row.try_get::<_, Option<i64>>(idx)?),
        "float4" => Value::from(row.try_get::<_, Option<f32>>(idx)?),
        "float8" => Value::from(row.try_get::<_, Option<f64>>(idx)?),
        "text" | "varchar" | "bpchar" | "name" | "citext" => {
            Value::from(row.try_get::<_, Option<String>>(idx)?)
        }
        "bytea" => Value::from(row.try_get::<_, Option<Vec<u8>>>(idx)?),
        "uuid" => Value::from(row.try_get::<_, Option<uuid::Uuid>>(idx)?),
        "json" | "jsonb" => Value::from(row.try_get::<_, Option<serde_json::Value>>(idx)?),
        "timestamptz" => {
            Value::from(row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?)
        }
        "timestamp" => Value::from(row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?),
        "date" => Value::from(row.try_get::<_, Option<chrono::NaiveDate>>(idx)?),
        "numeric" => Value::from(row.try_get::<_, Option<rust_decimal::Decimal>>(idx)?),
        other => {
            return Err(LifeError::ParseError(format!(
                "unsupported column type `{other}` at index {idx}"
            )));
        }
    };
    Ok(value)
}
