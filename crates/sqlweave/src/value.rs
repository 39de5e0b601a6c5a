//! Literal values carried in the escape list.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A dynamically typed literal bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Check if this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A reference to another column, rendered bare instead of bound.
///
/// ```ignore
/// builder.update("t").set("a", FieldRef::new("b")); // UPDATE t SET a = b
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef(pub String);

impl FieldRef {
    /// Reference the column `name`.
    pub fn new(name: impl Into<String>) -> Self {
        FieldRef(name.into())
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Right-hand side of an INSERT/UPDATE assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// Bound literal
    Value(Value),
    /// Bare column reference
    Field(FieldRef),
}

impl From<FieldRef> for Assignment {
    fn from(f: FieldRef) -> Self {
        Assignment::Field(f)
    }
}

macro_rules! impl_assignment_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Assignment {
                fn from(v: $t) -> Self {
                    Assignment::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_assignment_from!(
    Value, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String, &String, Uuid,
    DateTime<Utc>, serde_json::Value
);

impl<T: Into<Value>> From<Option<T>> for Assignment {
    fn from(v: Option<T>) -> Self {
        Assignment::Value(Value::from(v))
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

    impl ToSql for Value {
        /// Each variant defers to its inner type's checked encoder, so a value
        /// bound to an incompatible column fails with `WrongType`.
        fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(v) => v.to_sql_checked(ty, out),
                Value::Int(v) => {
                    if *ty == Type::INT2 {
                        i16::try_from(*v)?.to_sql_checked(ty, out)
                    } else if *ty == Type::INT4 {
                        i32::try_from(*v)?.to_sql_checked(ty, out)
                    } else {
                        v.to_sql_checked(ty, out)
                    }
                }
                Value::Float(v) => {
                    if *ty == Type::FLOAT4 {
                        (*v as f32).to_sql_checked(ty, out)
                    } else {
                        v.to_sql_checked(ty, out)
                    }
                }
                Value::Text(v) => v.to_sql_checked(ty, out),
                Value::Uuid(v) => v.to_sql_checked(ty, out),
                Value::Timestamp(v) => v.to_sql_checked(ty, out),
                Value::Json(v) => v.to_sql_checked(ty, out),
            }
        }

        // The variant is only known per value; `to_sql` does the type check.
        fn accepts(_ty: &Type) -> bool {
            true
        }

        to_sql_checked!();
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tokio_postgres::types::WrongType;

        fn encode(value: &Value, ty: &Type) -> Result<Vec<u8>, Box<dyn Error + Sync + Send>> {
            let mut out = BytesMut::new();
            value.to_sql_checked(ty, &mut out)?;
            Ok(out.to_vec())
        }

        #[test]
        fn test_encode_matching_types() {
            assert_eq!(encode(&Value::Int(5), &Type::INT8).unwrap(), 5i64.to_be_bytes());
            assert_eq!(encode(&Value::Int(5), &Type::INT4).unwrap(), 5i32.to_be_bytes());
            assert_eq!(encode(&Value::Int(5), &Type::INT2).unwrap(), 5i16.to_be_bytes());
            assert_eq!(encode(&Value::from("abc"), &Type::TEXT).unwrap(), b"abc");
            assert_eq!(encode(&Value::Float(1.5), &Type::FLOAT4).unwrap(), 1.5f32.to_be_bytes());
        }

        #[test]
        fn test_encode_wrong_type() {
            let err = encode(&Value::from("abc"), &Type::INT4).unwrap_err();
            assert!(err.is::<WrongType>());
            let err = encode(&Value::Int(5), &Type::TEXT).unwrap_err();
            assert!(err.is::<WrongType>());
            let err = encode(&Value::Bool(true), &Type::INT8).unwrap_err();
            assert!(err.is::<WrongType>());
        }

        #[test]
        fn test_encode_int_overflow() {
            assert!(encode(&Value::Int(70_000), &Type::INT2).is_err());
            assert!(encode(&Value::Int(i64::from(i32::MAX) + 1), &Type::INT4).is_err());
            assert!(encode(&Value::Int(70_000), &Type::INT4).is_ok());
        }

        #[test]
        fn test_encode_null() {
            let mut out = BytesMut::new();
            let is_null = Value::Null.to_sql_checked(&Type::INT4, &mut out).unwrap();
            assert!(matches!(is_null, IsNull::Yes));
            assert!(out.is_empty());
        }
    }
}
