//! Cell values exchanged with the engine.

use indexmap::IndexMap;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Core value types for SQLite operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

/// One result row, keyed by column name in `SELECT` order.
pub type Row = IndexMap<String, Value>;

impl Value {
    /// Convert a descriptor value into a bindable cell.
    ///
    /// Descriptor values are always compared and stored as text: numbers and
    /// booleans use their JSON spelling, arrays and objects their JSON text.
    /// Only `null` stays NULL.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            // SQLite has no boolean storage class.
            Value::Boolean(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(
                std::str::from_utf8(t)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))?
                    .to_owned(),
            ),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use serde_json::json;

    #[test]
    fn json_values_bind_as_text() {
        assert_eq!(Value::from_json(&json!("Ann")), Value::from("Ann"));
        assert_eq!(Value::from_json(&json!(42)), Value::from("42"));
        assert_eq!(Value::from_json(&json!(1.5)), Value::from("1.5"));
        assert_eq!(Value::from_json(&json!(true)), Value::from("true"));
        assert!(Value::from_json(&json!(null)).is_null());
        assert_eq!(
            Value::from_json(&json!({"a": 1})),
            Value::Text("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn values_bind_and_read_back() {
        let conn = Connection::open_in_memory().unwrap();
        let cases = [
            Value::Null,
            Value::Integer(-7),
            Value::Real(2.25),
            Value::from("it's \"quoted\""),
            Value::Blob(vec![0, 1, 2]),
        ];
        for case in cases {
            let back: Value = conn
                .query_row("SELECT ?1", [&case], |row| row.get(0))
                .unwrap();
            assert_eq!(back, case);
        }

        let flag: Value = conn
            .query_row("SELECT ?1", [&Value::Boolean(true)], |row| row.get(0))
            .unwrap();
        assert_eq!(flag, Value::Integer(1));
    }

    #[test]
    fn untagged_serde_matches_json_shapes() {
        let v: Value = serde_json::from_value(json!("x")).unwrap();
        assert_eq!(v, Value::from("x"));
        let v: Value = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(v, Value::Integer(3));
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!(null));
    }
}
