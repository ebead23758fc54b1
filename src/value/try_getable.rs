//! TryGetable trait for safe value extraction
//!
//! Converts a `sea_query::Value` back into a Rust field type. Row decoding,
//! `set_by_column_name` and pivot bookkeeping all go through here, so the
//! conversions are deliberately lenient about integer width: an `INT8`
//! column can populate an `i32` field as long as the value fits.

use crate::value::is_null;
use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch { expected: String, actual: String },
    /// Value conversion failed (e.g., overflow, invalid format)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected}, got {actual}")
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {msg}")
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// ```rust
/// use lifeline::value::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(Value::BigInt(Some(42)));
/// assert_eq!(result, Ok(42));
///
/// let result: Result<Option<i32>, ValueExtractionError> = TryGetable::try_get(Value::Int(None));
/// assert_eq!(result, Ok(None));
/// ```
pub trait TryGetable: Sized {
    /// Returns:
    /// - `Ok(T)` if the value matches the expected type and is not null
    /// - `Err(ValueExtractionError::NullValue)` if the value is null
    /// - `Err(ValueExtractionError::TypeMismatch)` if the value type doesn't match
    /// - `Err(ValueExtractionError::ConversionError)` if conversion fails (e.g., overflow)
    fn try_get(value: Value) -> Result<Self, ValueExtractionError>;
}

fn mismatch(expected: &str, value: &Value) -> ValueExtractionError {
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{value:?}"),
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::TinyInt(Some(v)) => Some(i128::from(*v)),
        Value::SmallInt(Some(v)) => Some(i128::from(*v)),
        Value::Int(Some(v)) => Some(i128::from(*v)),
        Value::BigInt(Some(v)) => Some(i128::from(*v)),
        Value::TinyUnsigned(Some(v)) => Some(i128::from(*v)),
        Value::SmallUnsigned(Some(v)) => Some(i128::from(*v)),
        Value::Unsigned(Some(v)) => Some(i128::from(*v)),
        Value::BigUnsigned(Some(v)) => Some(i128::from(*v)),
        _ => None,
    }
}

macro_rules! impl_try_getable_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TryGetable for $ty {
                fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                    if is_null(&value) {
                        return Err(ValueExtractionError::NullValue);
                    }
                    let wide = as_integer(&value).ok_or_else(|| mismatch(stringify!($ty), &value))?;
                    <$ty>::try_from(wide).map_err(|_| {
                        ValueExtractionError::ConversionError(format!(
                            "{wide} does not fit in {}",
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

impl_try_getable_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl TryGetable for bool {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bool(Some(b)) => Ok(b),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("bool", &v)),
        }
    }
}

impl TryGetable for f32 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Float(Some(f)) => Ok(f),
            Value::Double(Some(d)) => Ok(d as f32),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("f32", &v)),
        }
    }
}

impl TryGetable for f64 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Double(Some(d)) => Ok(d),
            Value::Float(Some(f)) => Ok(f64::from(f)),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("f64", &v)),
        }
    }
}

impl TryGetable for String {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(s)) => Ok(s.to_string()),
            Value::Char(Some(c)) => Ok(c.to_string()),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("String", &v)),
        }
    }
}

impl TryGetable for Vec<u8> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bytes(Some(b)) => Ok(b.to_vec()),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("Vec<u8>", &v)),
        }
    }
}

impl TryGetable for uuid::Uuid {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Uuid(Some(u)) => Ok(uuid::Uuid::clone(&u)),
            Value::String(Some(s)) => uuid::Uuid::parse_str(&s)
                .map_err(|e| ValueExtractionError::ConversionError(e.to_string())),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("Uuid", &v)),
        }
    }
}

impl TryGetable for serde_json::Value {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(j)) => Ok(serde_json::Value::clone(&j)),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("serde_json::Value", &v)),
        }
    }
}

impl TryGetable for chrono::DateTime<chrono::Utc> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::ChronoDateTimeUtc(Some(d)) => Ok(chrono::DateTime::<chrono::Utc>::clone(&d)),
            Value::ChronoDateTime(Some(d)) => Ok(chrono::NaiveDateTime::clone(&d).and_utc()),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("DateTime<Utc>", &v)),
        }
    }
}

impl TryGetable for chrono::NaiveDateTime {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::ChronoDateTime(Some(d)) => Ok(chrono::NaiveDateTime::clone(&d)),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("NaiveDateTime", &v)),
        }
    }
}

impl TryGetable for chrono::NaiveDate {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::ChronoDate(Some(d)) => Ok(chrono::NaiveDate::clone(&d)),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => Err(mismatch("NaiveDate", &v)),
        }
    }
}

impl TryGetable for rust_decimal::Decimal {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Decimal(Some(d)) => Ok(rust_decimal::Decimal::clone(&d)),
            ref v if is_null(v) => Err(ValueExtractionError::NullValue),
            v => match as_integer(&v) {
                Some(i) => rust_decimal::Decimal::try_from_i128_with_scale(i, 0)
                    .map_err(|e| ValueExtractionError::ConversionError(e.to_string())),
                None => Err(mismatch("Decimal", &v)),
            },
        }
    }
}

impl<T: TryGetable> TryGetable for Option<T> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        if is_null(&value) {
            return Ok(None);
        }
        T::try_get(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i32::try_get(Value::BigInt(Some(7))), Ok(7));
        assert_eq!(i64::try_get(Value::SmallInt(Some(-3))), Ok(-3));
        assert_eq!(u32::try_get(Value::Int(Some(12))), Ok(12));
        assert!(matches!(
            i16::try_get(Value::BigInt(Some(1 << 40))),
            Err(ValueExtractionError::ConversionError(_))
        ));
        assert!(matches!(
            u64::try_get(Value::Int(Some(-1))),
            Err(ValueExtractionError::ConversionError(_))
        ));
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(i32::try_get(Value::Int(None)), Err(ValueExtractionError::NullValue));
        assert_eq!(Option::<i32>::try_get(Value::Int(None)), Ok(None));
        assert_eq!(Option::<i32>::try_get(Value::BigInt(Some(5))), Ok(Some(5)));
        assert_eq!(Option::<String>::try_get(Value::String(None)), Ok(None));
    }

    #[test]
    fn test_type_mismatch() {
        let result = i32::try_get(Value::from("hello"));
        assert!(matches!(result, Err(ValueExtractionError::TypeMismatch { .. })));

        let result = String::try_get(Value::Int(Some(1)));
        assert!(matches!(result, Err(ValueExtractionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_string_and_bytes() {
        assert_eq!(String::try_get(Value::from("hello")), Ok("hello".to_string()));
        assert_eq!(Vec::<u8>::try_get(Value::from(vec![1u8, 2, 3])), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_uuid_from_uuid_and_text() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(uuid::Uuid::try_get(Value::from(id)), Ok(id));
        assert_eq!(uuid::Uuid::try_get(Value::from(id.to_string())), Ok(id));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ValueExtractionError::NullValue.to_string(), "Value is null");
        let err = ValueExtractionError::TypeMismatch {
            expected: "i32".to_string(),
            actual: "String".to_string(),
        };
        assert!(err.to_string().contains("expected i32"));
    }
}
