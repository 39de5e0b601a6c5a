//! Comparison operands.

use crate::builder::Builder;
use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::params::ParamList;
use crate::value::{FieldRef, Value};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A nested query used as an operand, a derived table or a CTE body.
#[derive(Debug, Clone)]
pub enum Subquery {
    /// Raw SQL, emitted verbatim.
    Text(String),
    /// A builder rendered inline, its params spliced into the outer list.
    Builder(Box<Builder>),
}

impl Subquery {
    /// SQL of the nested query without surrounding parentheses.
    pub(crate) fn render(&self, dialect: &Dialect, params: &mut ParamList) -> SqlResult<String> {
        match self {
            Subquery::Text(sql) => Ok(sql.clone()),
            Subquery::Builder(builder) => builder.render_nested(dialect, params),
        }
    }
}

impl From<Builder> for Subquery {
    fn from(builder: Builder) -> Self {
        Subquery::Builder(Box::new(builder))
    }
}

impl From<&str> for Subquery {
    fn from(sql: &str) -> Self {
        Subquery::Text(sql.to_string())
    }
}

impl From<String> for Subquery {
    fn from(sql: String) -> Self {
        Subquery::Text(sql)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Column reference, qualified at render time.
    Field { name: String, alias: Option<String> },
    /// Bound literal. Text that looks like a SELECT is emitted as a subquery.
    Value(Value),
    /// Element list for IN and BETWEEN.
    List(Vec<Operand>),
    Subquery(Subquery),
}

impl Operand {
    /// A column qualified with the default alias for its position.
    pub fn field(name: impl Into<String>) -> Self {
        Operand::Field {
            name: name.into(),
            alias: None,
        }
    }

    /// A column qualified with an explicit table or alias.
    pub fn aliased_field(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Operand::Field {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// A literal bound to a placeholder.
    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Value(value.into())
    }

    /// A list of operands, for IN and BETWEEN.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Operand>,
    {
        Operand::List(items.into_iter().map(Into::into).collect())
    }

    /// A nested query, rendered in parentheses.
    pub fn subquery(query: impl Into<Subquery>) -> Self {
        Operand::Subquery(query.into())
    }

    /// Whether this is a column reference.
    pub fn is_field(&self) -> bool {
        matches!(self, Operand::Field { .. })
    }
}

macro_rules! impl_operand_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_operand_from_value!(
    Value, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String, &String, Uuid,
    DateTime<Utc>, serde_json::Value
);

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Operand::List(items.into_iter().map(|v| Operand::Value(v.into())).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(items: [T; N]) -> Self {
        Operand::List(items.into_iter().map(|v| Operand::Value(v.into())).collect())
    }
}

impl From<FieldRef> for Operand {
    fn from(field: FieldRef) -> Self {
        Operand::field(field.0)
    }
}

impl From<Builder> for Operand {
    fn from(builder: Builder) -> Self {
        Operand::Subquery(Subquery::from(builder))
    }
}

impl From<Subquery> for Operand {
    fn from(query: Subquery) -> Self {
        Operand::Subquery(query)
    }
}
