//! Statement builder.
//!
//! A [`Builder`] holds one statement at a time. A verb (`select`,
//! `insert_into`, `update`, `delete_from`, `with`, `with_recursive`) starts a
//! new statement with a fresh table context; clause setters then fill it in.
//! Nothing is rendered until [`Builder::render`], which returns the SQL text
//! and the values for its placeholders in textual order.
//!
//! # Usage
//!
//! ```ignore
//! use sqlweave::{Builder, FieldRef, Join, Operand, Where};
//!
//! let rendered = Builder::new()
//!     .select(["id", "name"])
//!     .from("a")
//!     .join(Join::inner("b", Where::new("refid").equals(Operand::field("id"))))
//!     .filter(Where::new("kind").equals("image"))
//!     .render()?;
//! // SELECT a.id, a.name FROM a INNER JOIN b ON (b.refid = a.id) WHERE a.kind = ?
//!
//! let rendered = Builder::new()
//!     .update("t")
//!     .set("a", FieldRef::new("b"))
//!     .render()?;
//! // UPDATE t SET a = b
//! ```
//!
//! Setters never fail. A clause that does not fit the current statement, or a
//! table alias that conflicts with one already registered, is recorded and the
//! first such error is returned by `render`.

mod mutation;
mod select;
mod with;


use crate::context::{Role, TableContext};
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::filter::Where;
use crate::join::{Join, TableRef};
use crate::operand::Subquery;
use crate::params::{ParamList, Rendered};
use crate::value::Assignment;
use std::fmt;

use mutation::Mutation;
use select::SelectParts;
use with::WithParts;

pub use select::Source;

/// Default maximum SQL length (in bytes) written to logs.
pub const DEFAULT_LOG_SQL_LENGTH: usize = 200;

/// Kind of the statement a builder holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    With,
}

impl StatementKind {
    /// Lowercase name, as written to logs.
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::With => "with",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum Statement {
    Empty,
    Select(SelectParts),
    Insert(Mutation),
    Update(Mutation),
    Delete(Mutation),
    With(WithParts),
}

impl Statement {
    fn kind(&self) -> Option<StatementKind> {
        match self {
            Statement::Empty => None,
            Statement::Select(_) => Some(StatementKind::Select),
            Statement::Insert(_) => Some(StatementKind::Insert),
            Statement::Update(_) => Some(StatementKind::Update),
            Statement::Delete(_) => Some(StatementKind::Delete),
            Statement::With(_) => Some(StatementKind::With),
        }
    }
}

fn clause_error(clause: &str, kind: Option<StatementKind>) -> SqlError {
    match kind {
        Some(kind) => SqlError::statement_state(format!("{clause} is not valid for a {kind} statement")),
        None => SqlError::statement_state(format!("{clause} called before a statement verb")),
    }
}

/// Fluent SQL statement builder.
#[derive(Debug, Clone)]
pub struct Builder {
    dialect: Dialect,
    tables: TableContext,
    statement: Statement,
    /// Alias used when this builder is a derived table.
    alias: Option<String>,
    build_error: Option<SqlError>,
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    max_log_sql_length: Option<usize>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::with_dialect(Dialect::default())
    }
}

impl Builder {
    /// Create a builder for the generic dialect.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for `dialect`.
    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: TableContext::new(),
            statement: Statement::Empty,
            alias: None,
            build_error: None,
            max_log_sql_length: Some(DEFAULT_LOG_SQL_LENGTH),
        }
    }

    /// Truncate logged SQL to `len` bytes. Rendered SQL is never truncated.
    pub fn max_log_sql_length(mut self, len: usize) -> Self {
        self.max_log_sql_length = Some(len);
        self
    }

    /// Log SQL in full.
    pub fn no_log_truncate(mut self) -> Self {
        self.max_log_sql_length = None;
        self
    }

    /// Dialect this builder renders with.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Table context of the current statement.
    pub fn tables(&self) -> &TableContext {
        &self.tables
    }

    /// Kind of the current statement, `None` before any verb.
    pub fn kind(&self) -> Option<StatementKind> {
        self.statement.kind()
    }

    /// Alias set with [`Builder::alias`].
    pub fn derived_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// First error recorded by a setter, if any.
    pub fn build_error(&self) -> Option<&SqlError> {
        self.build_error.as_ref()
    }

    fn record_error(&mut self, err: SqlError) {
        if self.build_error.is_none() {
            #[cfg(feature = "tracing")]
            tracing::warn!(target: "sqlweave.sql", error = %err, "builder error recorded");
            self.build_error = Some(err);
        }
    }

    fn reset(&mut self, statement: Statement) {
        self.tables = TableContext::new();
        self.statement = statement;
        self.alias = None;
        self.build_error = None;
    }

    // ==================== Verbs ====================

    /// Start a SELECT, or supply the inner SELECT of a pending WITH.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Statement::With(with) = &mut self.statement
            && !with.has_select
        {
            with.has_select = true;
            with.select.columns = columns;
            return self;
        }
        self.reset(Statement::Select(SelectParts::new(columns)));
        self
    }

    /// `SELECT *`
    pub fn select_all(self) -> Self {
        self.select(Vec::<String>::new())
    }

    /// Start an INSERT into `table`.
    pub fn insert_into(mut self, table: impl Into<String>) -> Self {
        self.reset(Statement::Insert(Mutation::new(table)));
        self
    }

    /// Start an UPDATE of `table`.
    pub fn update(mut self, table: impl Into<String>) -> Self {
        self.reset(Statement::Update(Mutation::new(table)));
        self
    }

    /// Start a DELETE from `table`.
    pub fn delete_from(mut self, table: impl Into<String>) -> Self {
        self.reset(Statement::Delete(Mutation::new(table)));
        self
    }

    /// Start a WITH statement whose first CTE is `name`.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.reset(Statement::With(WithParts::new(name.into(), false)));
        self
    }

    /// Start a `WITH RECURSIVE` statement whose first CTE is `name`.
    pub fn with_recursive(mut self, name: impl Into<String>) -> Self {
        self.reset(Statement::With(WithParts::new(name.into(), true)));
        self
    }

    /// Attach the body of the current CTE; `next_name` opens the next one.
    ///
    /// ```ignore
    /// Builder::new()
    ///     .with("a").as_("SELECT 1", Some("b"))
    ///     .as_("SELECT 2", None)
    ///     .select_all().from("b")
    /// // WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM b
    /// ```
    pub fn as_(mut self, body: impl Into<Subquery>, next_name: Option<&str>) -> Self {
        match &mut self.statement {
            Statement::With(with) => {
                with.bodies.push(body.into());
                if let Some(name) = next_name {
                    with.names.push(name.to_string());
                }
            }
            other => {
                let err = clause_error("AS", other.kind());
                self.record_error(err);
            }
        }
        self
    }

    /// Alias used when this builder is a derived table in another FROM.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    // ==================== SELECT clauses ====================

    fn select_clause<F>(mut self, clause: &str, apply: F) -> Self
    where
        F: FnOnce(&mut SelectParts, &mut TableContext, &Dialect) -> SqlResult<()>,
    {
        let result = match &mut self.statement {
            Statement::Select(parts) => apply(parts, &mut self.tables, &self.dialect),
            Statement::With(with) => apply(&mut with.select, &mut self.tables, &self.dialect),
            other => Err(clause_error(clause, other.kind())),
        };
        if let Err(err) = result {
            self.record_error(err);
        }
        self
    }

    /// FROM a table (`"t"`, `"t alias"`, `(t, alias)`) or a derived SELECT.
    ///
    /// The table becomes the origin of the statement's context.
    pub fn from(self, source: impl Into<Source>) -> Self {
        let source = source.into();
        self.select_clause("FROM", |parts, tables, dialect| {
            let source = match source {
                Source::Table(table_ref) => {
                    let (table, alias) = table_ref.expand(&dialect.classifier());
                    tables.add_alias(table.clone(), alias.as_deref(), Some(Role::Origin))?;
                    Source::Table(match alias {
                        Some(alias) => TableRef::Aliased { table, alias },
                        None => TableRef::Raw(table),
                    })
                }
                Source::Derived(query) => {
                    if query.kind() != Some(StatementKind::Select) {
                        return Err(SqlError::statement_state(
                            "derived table must be a SELECT statement",
                        ));
                    }
                    if let Some(alias) = query.derived_alias() {
                        tables.add_alias(alias, None, Some(Role::Origin))?;
                    }
                    Source::Derived(query)
                }
            };
            parts.source = Some(source);
            Ok(())
        })
    }

    /// Add a JOIN and register its table in the context.
    pub fn join(self, join: Join) -> Self {
        self.select_clause("JOIN", |parts, tables, dialect| {
            join.register(tables, dialect)?;
            parts.joins.push(join);
            Ok(())
        })
    }

    /// GROUP BY columns, qualified like the select list.
    pub fn group<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.select_clause("GROUP BY", |parts, _, _| {
            parts.group = columns;
            Ok(())
        })
    }

    /// HAVING clause, rendered in the statement scope.
    pub fn having(self, having: Where) -> Self {
        self.select_clause("HAVING", |parts, _, _| {
            parts.having = Some(having);
            Ok(())
        })
    }

    /// ORDER BY columns, qualified like the select list.
    pub fn order<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.select_clause("ORDER BY", |parts, _, _| {
            parts.order = columns;
            Ok(())
        })
    }

    /// LIMIT, written into the SQL as a literal.
    pub fn limit(self, limit: u64) -> Self {
        self.select_clause("LIMIT", |parts, _, _| {
            parts.limit = Some(limit);
            Ok(())
        })
    }

    /// Append `UNION <query>`.
    pub fn union(self, query: impl Into<Subquery>) -> Self {
        let query = query.into();
        self.select_clause("UNION", |parts, _, _| {
            parts.unions.push((query, false));
            Ok(())
        })
    }

    /// Append `UNION ALL <query>`.
    pub fn union_all(self, query: impl Into<Subquery>) -> Self {
        let query = query.into();
        self.select_clause("UNION ALL", |parts, _, _| {
            parts.unions.push((query, true));
            Ok(())
        })
    }

    // ==================== WHERE ====================

    /// Add a WHERE filter. Multiple filters are AND-joined.
    pub fn filter(mut self, filter: Where) -> Self {
        match &mut self.statement {
            Statement::Select(parts) => parts.filters.push(filter),
            Statement::With(with) => with.select.filters.push(filter),
            Statement::Update(m) | Statement::Delete(m) => m.filters.push(filter),
            other => {
                let err = clause_error("WHERE", other.kind());
                self.record_error(err);
            }
        }
        self
    }

    // ==================== INSERT / UPDATE values ====================

    /// Set one column value. Setting the same column again replaces the value
    /// in place.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Assignment>) -> Self {
        match &mut self.statement {
            Statement::Insert(m) | Statement::Update(m) => m.assign(column.into(), value.into()),
            other => {
                let err = clause_error("VALUES", other.kind());
                self.record_error(err);
            }
        }
        self
    }

    /// Set several column values at once. See [`Builder::value`].
    pub fn values<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Assignment>,
    {
        values
            .into_iter()
            .fold(self, |builder, (column, value)| builder.value(column, value))
    }

    /// UPDATE ... SET `column` = `value`.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Assignment>) -> Self {
        match &mut self.statement {
            Statement::Update(m) => m.assign(column.into(), value.into()),
            other => {
                let err = clause_error("SET", other.kind());
                self.record_error(err);
            }
        }
        self
    }

    /// Set several UPDATE assignments at once.
    pub fn set_all<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Assignment>,
    {
        values
            .into_iter()
            .fold(self, |builder, (column, value)| builder.set(column, value))
    }

    // ==================== Render ====================

    /// Render the statement.
    pub fn render(&self) -> SqlResult<Rendered> {
        let mut params = ParamList::new();
        match self.render_nested(&self.dialect, &mut params) {
            Ok(sql) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "sqlweave.sql",
                    kind = self.kind().map_or("-", StatementKind::as_str),
                    param_count = params.len(),
                    sql = %self.truncate_for_log(&sql),
                    "rendered statement"
                );
                Ok(Rendered::new(sql, params))
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    target: "sqlweave.sql",
                    kind = self.kind().map_or("-", StatementKind::as_str),
                    error = %err,
                    "render failed"
                );
                Err(err)
            }
        }
    }

    /// Render as a nested query into an outer statement's params.
    pub(crate) fn render_nested(&self, dialect: &Dialect, params: &mut ParamList) -> SqlResult<String> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        let ctx = crate::render::RenderCtx::new(dialect, &self.tables);
        match &self.statement {
            Statement::Empty => Err(SqlError::statement_state("nothing to render, no statement verb")),
            Statement::Select(parts) => select::render(parts, &ctx, params),
            Statement::Insert(m) => mutation::render_insert(m, &ctx, params),
            Statement::Update(m) => mutation::render_update(m, &ctx, params),
            Statement::Delete(m) => mutation::render_delete(m, &ctx, params),
            Statement::With(with) => with::render(with, &ctx, params),
        }
    }

    #[cfg(feature = "tracing")]
    fn truncate_for_log(&self, sql: &str) -> String {
        match self.max_log_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

/// Cut `sql` to at most `max_bytes`, backing off to a char boundary.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
