//! Dynamic field values.
//!
//! Every field a factory touches travels through `Value`: static rule values, sequence and
//! dynamic generator output, call-site overrides and the column values handed to the store.
//! Conversions into `Value` use `From`; conversions back into a typed struct field go through
//! `FromValue`, which reports a `ValueError` instead of panicking when the kinds disagree.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::ValueError;

/// A single field value as seen by rules, overrides and the store adapter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value; maps to SQL `NULL`.
    #[default]
    Null,
    Bool(bool),
    /// All integer widths are carried as `i64` and narrowed by `FromValue`.
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Name of the value kind, used in conversion error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Checks whether the value is the zero value of its kind.
    ///
    /// A primary key holding an unset value is omitted from inserts so the store can assign
    /// one, and makes deletes fail before reaching the store.
    ///
    /// # Returns
    /// - `true` - `Null`, `0`, `0.0` or empty text
    /// - `false` - Any other value, including `false` and timestamps
    pub fn is_unset(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::Bool(_) | Value::Timestamp(_) => false,
        }
    }

    /// Returns the integer payload if this is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text payload if this is a `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

macro_rules! int_into_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Value> for sea_orm::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => sea_orm::Value::String(None),
            Value::Bool(b) => b.into(),
            Value::Int(n) => n.into(),
            Value::Float(x) => x.into(),
            Value::Text(s) => s.into(),
            Value::Timestamp(t) => t.into(),
        }
    }
}

/// Fallible conversion from a `Value` into a concrete field type.
///
/// Implemented for the scalar types model fields use, for `Option<T>` (where `Null` maps to
/// `None`) and for `Value` itself.
pub trait FromValue: Sized {
    /// Converts the value, failing when its kind does not fit `Self`.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ValueError::mismatch("bool", &other)),
        }
    }
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(n) => <$ty>::try_from(n).map_err(|_| ValueError::OutOfRange {
                            target: stringify!($ty),
                            value: n,
                        }),
                        other => Err(ValueError::mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(n) => Ok(n as f64),
            other => Err(ValueError::mismatch("f64", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ValueError::mismatch("String", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            other => Err(ValueError::mismatch("DateTime<Utc>", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_integers_within_range() {
        assert_eq!(i32::from_value(Value::Int(42)).unwrap(), 42);
        assert!(matches!(
            i32::from_value(Value::Int(i64::MAX)),
            Err(ValueError::OutOfRange { target: "i32", .. })
        ));
    }

    #[test]
    fn rejects_mismatched_kinds() {
        let err = String::from_value(Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "expected String, found int");
    }

    #[test]
    fn maps_null_to_none() {
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(Value::Int(3)).unwrap(), Some(3));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn detects_unset_values() {
        assert!(Value::Null.is_unset());
        assert!(Value::Int(0).is_unset());
        assert!(Value::from("").is_unset());
        assert!(!Value::Int(7).is_unset());
        assert!(!Value::Bool(false).is_unset());
    }
}
