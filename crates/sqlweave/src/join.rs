//! JOIN clauses.

use crate::classify::Classifier;
use crate::context::{Role, TableContext};
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::filter::Where;
use crate::params::{ParamList, Rendered};
use crate::render::{Render, RenderCtx};
use std::str::FromStr;

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    /// SQL keyword for this join kind.
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            _ => Err(SqlError::configuration(format!("invalid join kind '{s}'"))),
        }
    }
}

/// A table reference: `"t"`, `"t alias"` or `(table, alias)`.
///
/// Raw strings are split into table and alias with the dialect's quoting rules
/// when the reference is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    Raw(String),
    Aliased { table: String, alias: String },
}

impl TableRef {
    /// Split into table name and explicit alias.
    pub(crate) fn expand(&self, classifier: &Classifier<'_>) -> (String, Option<String>) {
        match self {
            TableRef::Raw(text) => classifier.expand_table(text),
            TableRef::Aliased { table, alias } => (table.clone(), Some(alias.clone())),
        }
    }
}

impl From<&str> for TableRef {
    fn from(text: &str) -> Self {
        TableRef::Raw(text.to_string())
    }
}

impl From<String> for TableRef {
    fn from(text: String) -> Self {
        TableRef::Raw(text)
    }
}

impl From<(&str, &str)> for TableRef {
    fn from((table, alias): (&str, &str)) -> Self {
        TableRef::Aliased {
            table: table.to_string(),
            alias: alias.to_string(),
        }
    }
}

impl From<(String, String)> for TableRef {
    fn from((table, alias): (String, String)) -> Self {
        TableRef::Aliased { table, alias }
    }
}

/// `<kind> JOIN <table>[ <alias>] ON (<qualifier>)`
///
/// Inside the qualifier, unqualified source columns belong to the joined table
/// and unqualified destination columns to the statement's origin:
///
/// ```ignore
/// Join::inner("b", Where::new("refid").equals(Operand::field("id")))
/// // INNER JOIN b ON (b.refid = a.id)
/// ```
#[derive(Debug, Clone)]
pub struct Join {
    table: TableRef,
    kind: JoinKind,
    qualifier: Option<Where>,
}

impl Join {
    /// A join without a qualifier. Set one with [`Join::on`] before rendering.
    pub fn new(table: impl Into<TableRef>, kind: JoinKind) -> Self {
        Self {
            table: table.into(),
            kind,
            qualifier: None,
        }
    }

    /// `INNER JOIN table ON (qualifier)`
    pub fn inner(table: impl Into<TableRef>, qualifier: Where) -> Self {
        Self::new(table, JoinKind::Inner).on(qualifier)
    }

    /// `LEFT JOIN table ON (qualifier)`
    pub fn left(table: impl Into<TableRef>, qualifier: Where) -> Self {
        Self::new(table, JoinKind::Left).on(qualifier)
    }

    /// `RIGHT JOIN table ON (qualifier)`
    pub fn right(table: impl Into<TableRef>, qualifier: Where) -> Self {
        Self::new(table, JoinKind::Right).on(qualifier)
    }

    /// Set the ON qualifier.
    pub fn on(mut self, qualifier: Where) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// Kind of this join.
    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// The ON clause, if set.
    pub fn qualifier(&self) -> Option<&Where> {
        self.qualifier.as_ref()
    }

    /// Add the joined table to `tables` as a join entry, unless it is already
    /// known.
    pub fn register(&self, tables: &mut TableContext, dialect: &Dialect) -> SqlResult<()> {
        let (table, alias) = self.table.expand(&dialect.classifier());
        if tables.contains(&table) {
            return Ok(());
        }
        tables.add_alias(table, alias.as_deref(), Some(Role::Join))
    }

    /// Render standalone with the default dialect and no table context.
    pub fn build(&self) -> SqlResult<Rendered> {
        self.build_with(&Dialect::default(), &TableContext::new())
    }

    /// Render standalone against an existing context.
    pub fn build_with(&self, dialect: &Dialect, tables: &TableContext) -> SqlResult<Rendered> {
        let ctx = RenderCtx::new(dialect, tables);
        let mut params = ParamList::new();
        let sql = self.render(&ctx, &mut params)?;
        Ok(Rendered::new(sql, params))
    }
}

impl Render for Join {
    fn render(&self, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
        let (table, explicit) = self.table.expand(&ctx.classifier());
        let qualifier = self.qualifier.as_ref().ok_or_else(|| {
            SqlError::missing_operand(format!("join on '{table}' has no qualifier"))
        })?;

        let alias = explicit.or_else(|| ctx.tables.alias_for(&table).map(str::to_string));
        let join_alias = alias.as_deref().unwrap_or(&table);
        let head = if join_alias == table {
            format!("{} {table}", self.kind.keyword())
        } else {
            format!("{} {table} {join_alias}", self.kind.keyword())
        };

        let on = qualifier.render(&ctx.for_join(join_alias), params)?;
        if on.is_empty() {
            return Err(SqlError::missing_operand(format!(
                "join on '{table}' has an empty qualifier"
            )));
        }
        Ok(format!("{head} ON ({on})"))
    }
}
