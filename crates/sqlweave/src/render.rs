//! Render plumbing shared by filters, joins and statements.
//!
//! Nothing is late-bound: the dialect, the table context and the default
//! aliases for each operand position travel together in a [`RenderCtx`], and
//! every fragment writes its values into one shared [`ParamList`].

use crate::classify::Classifier;
use crate::context::TableContext;
use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::operand::Operand;
use crate::params::ParamList;
use crate::value::Value;

/// Which side of a comparison an operand sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Source,
    Dest,
}

/// Everything a fragment needs to render.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx<'a> {
    pub dialect: &'a Dialect,
    pub tables: &'a TableContext,
    source: Option<&'a str>,
    dest: Option<&'a str>,
}

impl<'a> RenderCtx<'a> {
    /// Statement scope: source columns belong to the origin, destination
    /// columns to the first joined table.
    pub fn new(dialect: &'a Dialect, tables: &'a TableContext) -> Self {
        Self {
            dialect,
            tables,
            source: tables.origin().map(|(_, alias)| alias),
            dest: tables.joins().next().map(|(_, alias)| alias),
        }
    }

    /// Join qualifier scope: source columns belong to the joined table,
    /// destination columns to the origin.
    pub fn for_join<'b>(&self, join_alias: &'b str) -> RenderCtx<'b>
    where
        'a: 'b,
    {
        RenderCtx {
            dialect: self.dialect,
            tables: self.tables,
            source: Some(join_alias),
            dest: self.tables.origin().map(|(_, alias)| alias),
        }
    }

    /// Classifier for the render dialect.
    pub fn classifier(&self) -> Classifier<'a> {
        self.dialect.classifier()
    }

    /// Alias used for an unqualified field at `position`.
    pub fn default_alias(&self, position: Position) -> Option<&'a str> {
        match position {
            Position::Source => self.source,
            Position::Dest => self.dest,
        }
    }

    /// Push `value` and return its placeholder.
    pub fn bind(&self, value: Value, params: &mut ParamList) -> String {
        let index = params.push(value);
        self.dialect.placeholder.token(index)
    }

    /// Qualify a column name for `position`.
    ///
    /// Explicit aliases go through the table context, so a table name resolves
    /// to its registered alias. Without one, already-qualified columns and
    /// function calls are kept verbatim.
    pub fn resolve_field(&self, name: &str, alias: Option<&str>, position: Position) -> String {
        let classifier = self.classifier();
        let alias = match alias {
            Some(alias) => Some(self.tables.resolve(alias)),
            None => {
                if classifier.field_is_aliased(name) || classifier.is_sql_function(name) {
                    return name.to_string();
                }
                self.default_alias(position)
            }
        };
        match alias {
            Some(alias) => classifier.qualify(alias, name),
            None => name.to_string(),
        }
    }

    /// Render one operand. Subqueries come back wrapped in parentheses.
    pub fn operand(
        &self,
        operand: &Operand,
        position: Position,
        params: &mut ParamList,
    ) -> SqlResult<String> {
        match operand {
            Operand::Field { name, alias } => Ok(self.resolve_field(name, alias.as_deref(), position)),
            Operand::Value(Value::Text(text)) if self.classifier().is_select_query(text) => {
                Ok(format!("({text})"))
            }
            Operand::Value(value) => Ok(self.bind(value.clone(), params)),
            Operand::List(items) => {
                let parts = items
                    .iter()
                    .map(|item| self.operand(item, position, params))
                    .collect::<SqlResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(", ")))
            }
            Operand::Subquery(query) => Ok(format!("({})", query.render(self.dialect, params)?)),
        }
    }

    /// True when the operand renders as a subquery.
    pub fn is_subquery(&self, operand: &Operand) -> bool {
        match operand {
            Operand::Subquery(_) => true,
            Operand::Value(Value::Text(text)) => self.classifier().is_select_query(text),
            _ => false,
        }
    }
}

/// A fragment that renders against a context into a shared param list.
pub trait Render {
    fn render(&self, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> TableContext {
        let mut ctx = TableContext::new();
        ctx.add_alias("languages", Some("l"), None).unwrap();
        ctx.add_alias("countries", Some("c"), None).unwrap();
        ctx
    }

    #[test]
    fn test_statement_scope_defaults() {
        let dialect = Dialect::generic();
        let tables = tables();
        let ctx = RenderCtx::new(&dialect, &tables);
        assert_eq!(ctx.resolve_field("id", None, Position::Source), "l.id");
        assert_eq!(ctx.resolve_field("id", None, Position::Dest), "c.id");
    }

    #[test]
    fn test_join_scope_defaults() {
        let dialect = Dialect::generic();
        let tables = tables();
        let ctx = RenderCtx::new(&dialect, &tables).for_join("c");
        assert_eq!(ctx.resolve_field("refid", None, Position::Source), "c.refid");
        assert_eq!(ctx.resolve_field("id", None, Position::Dest), "l.id");
    }

    #[test]
    fn test_explicit_alias_resolves_table_name() {
        let dialect = Dialect::generic();
        let tables = tables();
        let ctx = RenderCtx::new(&dialect, &tables);
        assert_eq!(ctx.resolve_field("code", Some("countries"), Position::Source), "c.code");
        assert_eq!(ctx.resolve_field("code", Some("x"), Position::Source), "x.code");
    }

    #[test]
    fn test_verbatim_fields() {
        let dialect = Dialect::generic();
        let tables = tables();
        let ctx = RenderCtx::new(&dialect, &tables);
        assert_eq!(ctx.resolve_field("c.name", None, Position::Source), "c.name");
        assert_eq!(ctx.resolve_field("COUNT(id)", None, Position::Source), "COUNT(id)");
    }

    #[test]
    fn test_empty_context_leaves_bare_names() {
        let dialect = Dialect::generic();
        let tables = TableContext::new();
        let ctx = RenderCtx::new(&dialect, &tables);
        assert_eq!(ctx.resolve_field("kind", None, Position::Source), "kind");
        assert_eq!(ctx.resolve_field("kind", None, Position::Dest), "kind");
    }

    #[test]
    fn test_quoting_on_reserved_chars() {
        let dialect = Dialect::postgres();
        let mut tables = TableContext::new();
        tables.add_alias("t", None, None).unwrap();
        let ctx = RenderCtx::new(&dialect, &tables);
        assert_eq!(ctx.resolve_field("first name", None, Position::Source), r#""t"."first name""#);
    }

    #[test]
    fn test_operand_binding() {
        let dialect = Dialect::generic().with_placeholder(crate::dialect::PlaceholderStyle::Numbered);
        let tables = TableContext::new();
        let ctx = RenderCtx::new(&dialect, &tables);
        let mut params = ParamList::new();

        let list = Operand::from(vec![1, 2]);
        assert_eq!(ctx.operand(&list, Position::Dest, &mut params).unwrap(), "($1, $2)");
        let sub = Operand::from("select id from t");
        assert!(ctx.is_subquery(&sub));
        assert_eq!(
            ctx.operand(&sub, Position::Dest, &mut params).unwrap(),
            "(select id from t)"
        );
        assert_eq!(params.len(), 2);
    }
}
