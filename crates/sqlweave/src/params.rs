//! The escape list and the result of rendering.

use crate::value::Value;
use serde::Serialize;

/// Ordered bind values collected while rendering.
///
/// Every placeholder written into SQL text pushes exactly one value, so the
/// position of a value in the list is the position of its placeholder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Borrow the collected values.
    pub fn as_slice(&self) -> &[Value] {
        &self.params
    }

    /// Take the collected values.
    pub fn into_vec(self) -> Vec<Value> {
        self.params
    }
}

/// SQL text plus the values for its placeholders, in textual order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Rendered {
    /// Pair rendered SQL with its params.
    pub fn new(sql: String, params: ParamList) -> Self {
        Self {
            sql,
            params: params.into_vec(),
        }
    }

    /// Split into `(sql, params)`.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Get parameters as references compatible with tokio-postgres.
    #[cfg(feature = "postgres")]
    pub fn params_ref(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_one_based_index() {
        let mut params = ParamList::new();
        assert!(params.is_empty());
        assert_eq!(params.push(Value::from(1)), 1);
        assert_eq!(params.push(Value::from("a")), 2);
        assert_eq!(params.len(), 2);
        assert_eq!(params.as_slice()[1], Value::from("a"));
    }

    #[test]
    fn test_rendered_parts() {
        let mut params = ParamList::new();
        params.push(Value::from(10));
        let rendered = Rendered::new("id = ?".to_string(), params);
        let (sql, values) = rendered.into_parts();
        assert_eq!(sql, "id = ?");
        assert_eq!(values, vec![Value::Int(10)]);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_params_ref_binds_in_order() {
        use bytes::BytesMut;
        use tokio_postgres::types::Type;

        let mut params = ParamList::new();
        params.push(Value::from("image"));
        params.push(Value::from(15));
        let rendered = Rendered::new("kind = $1 AND category_id = $2".to_string(), params);
        let refs = rendered.params_ref();
        assert_eq!(refs.len(), 2);

        let mut out = BytesMut::new();
        refs[0].to_sql_checked(&Type::TEXT, &mut out).unwrap();
        assert_eq!(&out[..], b"image");

        let mut out = BytesMut::new();
        refs[1].to_sql_checked(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], 15i32.to_be_bytes());
        assert!(refs[1].to_sql_checked(&Type::TEXT, &mut BytesMut::new()).is_err());
    }
}
