//! SQL scalar values and conversions to and from native Rust types.
//!
//! [`Value`] is the only thing that crosses the boundary between the builders and the
//! engine. Native types opt in through [`ToValue`] (encode) and [`FromValue`] (decode).
//!
//! Decoding never coerces between kinds: an `Integer` decoded as `f64` is a type
//! mismatch, not a cast.

use crate::error::OrmError;
use crate::schema::SqlType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use thiserror::Error;

/// A single SQL scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

/// The active variant of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Blob => "blob",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Encode a native value.
    pub fn encode<T: ToValue + ?Sized>(value: &T) -> Result<Self, ValueError> {
        value.to_value()
    }

    /// Decode into a native value.
    pub fn decode<T: FromValue>(&self) -> Result<T, ValueError> {
        T::from_value(self)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Blob(_) => ValueKind::Blob,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Render as an inline SQL literal (used for DEFAULT clauses, never for bound values).
    pub fn to_sql_literal(&self) -> String {
        let mut out = String::new();
        self.write_sql_literal(&mut out);
        out
    }

    pub(crate) fn write_sql_literal(&self, out: &mut String) {
        match self {
            Value::Integer(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Float(f) if f.is_nan() => out.push_str("NULL"),
            Value::Float(f) if f.is_infinite() => {
                out.push_str(if *f > 0.0 { "9e999" } else { "-9e999" });
            }
            // `{:?}` keeps a trailing `.0` so the engine reads a REAL.
            Value::Float(f) => {
                let _ = write!(out, "{f:?}");
            }
            Value::Text(s) => {
                out.push('\'');
                for ch in s.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
                out.push('\'');
            }
            Value::Blob(b) => {
                out.push_str("X'");
                for byte in b {
                    let _ = write!(out, "{byte:02X}");
                }
                out.push('\'');
            }
            Value::Null => out.push_str("NULL"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

/// A value-level decode failure, not yet attributed to a column.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: ValueKind,
    },
    #[error("unexpected NULL")]
    UnexpectedNull,
    #[error("{0}")]
    Invalid(String),
}

impl ValueError {
    fn mismatch(expected: &'static str, actual: &Value) -> Self {
        match actual {
            Value::Null => ValueError::UnexpectedNull,
            other => ValueError::TypeMismatch {
                expected,
                actual: other.kind(),
            },
        }
    }

    /// Attribute this failure to a column.
    pub fn at(self, column: impl Into<String>) -> OrmError {
        let column = column.into();
        match self {
            ValueError::TypeMismatch { expected, actual } => OrmError::TypeMismatch {
                column,
                expected,
                actual,
            },
            ValueError::UnexpectedNull => OrmError::UnexpectedNull { column },
            ValueError::Invalid(message) => OrmError::Decode { column, message },
        }
    }
}

/// Encode a native value into a [`Value`].
///
/// Encoding only fails for values with no SQL representation, such as a
/// [`Json`] map with non-string keys.
pub trait ToValue {
    fn to_value(&self) -> Result<Value, ValueError>;
}

/// Decode a [`Value`] into a native value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

/// Declared SQL type and nullability of a native type, used to infer column declarations.
pub trait ColumnType {
    fn sql_type() -> SqlType;

    fn nullable() -> bool {
        false
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value, ValueError> {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(self.clone())
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(value.clone())
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Integer(*self))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Integer(i) => Ok(*i),
            other => Err(ValueError::mismatch("integer", other)),
        }
    }
}

impl ColumnType for i64 {
    fn sql_type() -> SqlType {
        SqlType::Integer
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Result<Value, ValueError> {
                    Ok(Value::Integer(i64::from(*self)))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ValueError> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| {
                        ValueError::Invalid(format!(
                            "integer {wide} out of range for {}",
                            stringify!($ty)
                        ))
                    })
                }
            }

            impl ColumnType for $ty {
                fn sql_type() -> SqlType {
                    SqlType::Integer
                }
            }
        )*
    };
}

narrow_integer!(i8, i16, i32, u8, u16, u32);

impl ToValue for isize {
    fn to_value(&self) -> Result<Value, ValueError> {
        // isize is at most 64 bits on every supported target.
        Ok(Value::Integer(*self as i64))
    }
}

impl FromValue for isize {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let wide = i64::from_value(value)?;
        isize::try_from(wide)
            .map_err(|_| ValueError::Invalid(format!("integer {wide} out of range for isize")))
    }
}

impl ColumnType for isize {
    fn sql_type() -> SqlType {
        SqlType::Integer
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Integer(i64::from(*self)))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        i64::from_value(value).map(|i| i != 0)
    }
}

impl ColumnType for bool {
    fn sql_type() -> SqlType {
        SqlType::Integer
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Float(*self))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(*f),
            other => Err(ValueError::mismatch("float", other)),
        }
    }
}

impl ColumnType for f64 {
    fn sql_type() -> SqlType {
        SqlType::Real
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let wide = f64::from_value(value)?;
        let narrow = wide as f32;
        if f64::from(narrow) == wide || wide.is_nan() {
            Ok(narrow)
        } else {
            Err(ValueError::Invalid(format!(
                "float {wide} is not exactly representable as f32"
            )))
        }
    }
}

impl ColumnType for f32 {
    fn sql_type() -> SqlType {
        SqlType::Real
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.to_string()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(ValueError::mismatch("text", other)),
        }
    }
}

impl ColumnType for String {
    fn sql_type() -> SqlType {
        SqlType::Text
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Blob(self.to_vec()))
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Blob(self.clone()))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(ValueError::mismatch("blob", other)),
        }
    }
}

impl ColumnType for Vec<u8> {
    fn sql_type() -> SqlType {
        SqlType::Blob
    }
}

impl ToValue for bytes::Bytes {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Blob(self.to_vec()))
    }
}

impl FromValue for bytes::Bytes {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Vec::<u8>::from_value(value).map(bytes::Bytes::from)
    }
}

impl ColumnType for bytes::Bytes {
    fn sql_type() -> SqlType {
        SqlType::Blob
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, ValueError> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    fn sql_type() -> SqlType {
        T::sql_type()
    }

    fn nullable() -> bool {
        true
    }
}

// ==================== Text-encoded types ====================

fn text<'a>(value: &'a Value, expected: &'static str) -> Result<&'a str, ValueError> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(ValueError::mismatch(expected, other)),
    }
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

impl ToValue for NaiveDate {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.format(DATE_FORMAT).to_string()))
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let s = text(value, "text (date)")?;
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|e| ValueError::Invalid(format!("invalid date '{s}': {e}")))
    }
}

impl ColumnType for NaiveDate {
    fn sql_type() -> SqlType {
        SqlType::Text
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.format(DATETIME_FORMAT).to_string()))
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let s = text(value, "text (datetime)")?;
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .or_else(|_| s.parse::<NaiveDateTime>())
            .map_err(|e| ValueError::Invalid(format!("invalid datetime '{s}': {e}")))
    }
}

impl ColumnType for NaiveDateTime {
    fn sql_type() -> SqlType {
        SqlType::Text
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.to_rfc3339()))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let s = text(value, "text (timestamp)")?;
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ValueError::Invalid(format!("invalid timestamp '{s}': {e}")))
    }
}

impl ColumnType for DateTime<Utc> {
    fn sql_type() -> SqlType {
        SqlType::Text
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.hyphenated().to_string()))
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let s = text(value, "text (uuid)")?;
        uuid::Uuid::parse_str(s).map_err(|e| ValueError::Invalid(format!("invalid uuid '{s}': {e}")))
    }
}

impl ColumnType for uuid::Uuid {
    fn sql_type() -> SqlType {
        SqlType::Text
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.to_string()))
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let s = text(value, "text (json)")?;
        serde_json::from_str(s).map_err(|e| ValueError::Invalid(format!("invalid json: {e}")))
    }
}

impl ColumnType for serde_json::Value {
    fn sql_type() -> SqlType {
        SqlType::Text
    }
}

/// Wrapper storing any serde type as JSON text.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Orbit { period_days: f64 }
///
/// out.set(Planet::ORBIT, &Json(orbit));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> Result<Value, ValueError> {
        serde_json::to_string(&self.0)
            .map(Value::Text)
            .map_err(|e| ValueError::Invalid(format!("cannot serialize json: {e}")))
    }
}

impl<T: serde::de::DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let s = text(value, "text (json)")?;
        serde_json::from_str(s)
            .map(Json)
            .map_err(|e| ValueError::Invalid(format!("invalid json: {e}")))
    }
}

impl<T> ColumnType for Json<T> {
    fn sql_type() -> SqlType {
        SqlType::Text
    }
}

// ==================== Literals ====================

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

value_from!(
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    i64 => Integer,
    u8 => Integer,
    u16 => Integer,
    u32 => Integer,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<u8> => Blob,
    &[u8] => Blob,
);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// ==================== Engine binding ====================

impl rusqlite::types::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, ValueRef};

        Ok(ToSqlOutput::Borrowed(match self {
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Float(f) => ValueRef::Real(*f),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b),
            Value::Null => ValueRef::Null,
        }))
    }
}

impl TryFrom<rusqlite::types::ValueRef<'_>> for Value {
    type Error = ValueError;

    fn try_from(value: rusqlite::types::ValueRef<'_>) -> Result<Self, ValueError> {
        use rusqlite::types::ValueRef;

        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Float(f),
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(text) => Value::Text(text.to_string()),
                Err(e) => return Err(ValueError::Invalid(format!("invalid UTF-8 text: {e}"))),
            },
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        })
    }
}
