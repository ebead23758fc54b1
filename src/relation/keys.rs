//! Relation keys.
//!
//! Keys are compared across tables whose columns may decode to different
//! `Value` variants (`INT4` on one side, `INT8` on the other). [`Key`]
//! normalizes them so `Value::Int(Some(1))` and `Value::BigInt(Some(1))` match.

use crate::model::ModelTrait;
use crate::relation::error::RelationError;
use crate::value::format_sql_literal;
use sea_query::Value;
use std::collections::HashSet;
use std::fmt;

/// Hashable, normalized form of a non-null key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bool(bool),
    Int(i64),
    /// Unsigned values above `i64::MAX`
    Unsigned(u64),
    Text(String),
    Uuid(uuid::Uuid),
    Bytes(Vec<u8>),
    /// Any other variant, compared by its SQL literal
    Literal(String),
}

impl Key {
    /// `None` for null values.
    pub fn from_value(value: &Value) -> Option<Key> {
        if crate::value::is_null(value) {
            return None;
        }
        let key = match value {
            Value::Bool(Some(b)) => Key::Bool(*b),
            Value::TinyInt(Some(i)) => Key::Int(i64::from(*i)),
            Value::SmallInt(Some(i)) => Key::Int(i64::from(*i)),
            Value::Int(Some(i)) => Key::Int(i64::from(*i)),
            Value::BigInt(Some(i)) => Key::Int(*i),
            Value::TinyUnsigned(Some(u)) => Key::Int(i64::from(*u)),
            Value::SmallUnsigned(Some(u)) => Key::Int(i64::from(*u)),
            Value::Unsigned(Some(u)) => Key::Int(i64::from(*u)),
            Value::BigUnsigned(Some(u)) => match i64::try_from(*u) {
                Ok(i) => Key::Int(i),
                Err(_) => Key::Unsigned(*u),
            },
            Value::String(Some(s)) => Key::Text(s.to_string()),
            Value::Char(Some(c)) => Key::Text(c.to_string()),
            Value::Uuid(Some(u)) => Key::Uuid(uuid::Uuid::clone(u)),
            Value::Bytes(Some(b)) => Key::Bytes(b.to_vec()),
            other => Key::Literal(format_sql_literal(other)),
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(i) => write!(f, "{i}"),
            Key::Unsigned(u) => write!(f, "{u}"),
            Key::Text(s) => f.write_str(&format_sql_literal(&Value::from(s.as_str()))),
            Key::Uuid(u) => write!(f, "'{u}'"),
            Key::Bytes(b) => f.write_str(&format_sql_literal(&Value::from(b.clone()))),
            Key::Literal(s) => f.write_str(s),
        }
    }
}

/// Insertion-ordered set of distinct non-null keys.
///
/// Keeps the first `Value` seen for each key so it can be bound as-is.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<Key>,
    values: Vec<Value>,
    seen: HashSet<Key>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` for nulls and duplicates.
    pub fn insert(&mut self, value: &Value) -> bool {
        let Some(key) = Key::from_value(value) else {
            return false;
        };
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.keys.push(key);
        self.values.push(value.clone());
        true
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.seen.contains(key)
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        Key::from_value(value).is_some_and(|key| self.seen.contains(&key))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.keys.iter().zip(self.values.iter())
    }
}

impl<V: Into<Value>> FromIterator<V> for KeySet {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut set = KeySet::new();
        for value in iter {
            set.insert(&value.into());
        }
        set
    }
}

/// Key of `entity` in `column`; `None` when the column is null.
///
/// # Errors
///
/// `RelationError::UnknownColumn` when the entity has no such column.
pub fn key_of<M: ModelTrait>(entity: &M, column: &str) -> Result<Option<Key>, RelationError> {
    let value = entity
        .get_by_column_name(column)
        .ok_or_else(|| RelationError::UnknownColumn {
            table: M::table_name(),
            column: column.to_string(),
        })?;
    Ok(Key::from_value(&value))
}

/// Distinct non-null values of `column` across `entities`, in first-seen order.
///
/// # Errors
///
/// `RelationError::UnknownColumn` when the entities have no such column.
pub fn extract_keys<M: ModelTrait>(entities: &[M], column: &str) -> Result<KeySet, RelationError> {
    let mut keys = KeySet::new();
    for entity in entities {
        let value = entity
            .get_by_column_name(column)
            .ok_or_else(|| RelationError::UnknownColumn {
                table: M::table_name(),
                column: column.to_string(),
            })?;
        keys.insert(&value);
    }
    Ok(keys)
}
