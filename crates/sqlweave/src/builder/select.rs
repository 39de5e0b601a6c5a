//! SELECT assembly.

use super::Builder;
use crate::error::SqlResult;
use crate::filter::Where;
use crate::join::{Join, TableRef};
use crate::operand::Subquery;
use crate::params::ParamList;
use crate::render::{Render, RenderCtx};

/// Alias written for a derived table that was given none.
const UNNAMED_DERIVED_TABLE: &str = "not_specified";

/// What a SELECT reads from.
#[derive(Debug, Clone)]
pub enum Source {
    Table(TableRef),
    /// `(<select>) AS <alias>`
    Derived(Box<Builder>),
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Table(TableRef::from(text))
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::Table(TableRef::from(text))
    }
}

impl From<(&str, &str)> for Source {
    fn from(pair: (&str, &str)) -> Self {
        Source::Table(TableRef::from(pair))
    }
}

impl From<TableRef> for Source {
    fn from(table: TableRef) -> Self {
        Source::Table(table)
    }
}

impl From<Builder> for Source {
    fn from(builder: Builder) -> Self {
        Source::Derived(Box::new(builder))
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SelectParts {
    pub(super) columns: Vec<String>,
    pub(super) source: Option<Source>,
    pub(super) joins: Vec<Join>,
    pub(super) filters: Vec<Where>,
    pub(super) group: Vec<String>,
    pub(super) having: Option<Where>,
    pub(super) order: Vec<String>,
    pub(super) limit: Option<u64>,
    /// `(query, all)`
    pub(super) unions: Vec<(Subquery, bool)>,
}

impl SelectParts {
    pub(super) fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }
}

/// Split comma lists and prefix plain columns with the origin alias.
///
/// Columns that are already qualified, function calls, literals and
/// expressions are left alone.
fn normalize_columns(columns: &[String], ctx: &RenderCtx<'_>) -> Vec<String> {
    let classifier = ctx.classifier();
    let origin = ctx.tables.origin().map(|(_, alias)| alias);
    let sep = ctx.dialect.field_separator;

    columns
        .iter()
        .flat_map(|column| classifier.split_fields(column))
        .filter(|column| !column.is_empty())
        .map(|column| match origin {
            Some(origin)
                if !(classifier.field_is_aliased(&column)
                    || classifier.is_sql_function(&column)
                    || classifier.is_value(&column)
                    || classifier.is_sql_expression(&column)) =>
            {
                format!("{origin}{sep}{column}")
            }
            _ => column,
        })
        .collect()
}

/// Render WHERE filters, AND-joined. An OR filter is parenthesized when it
/// shares the clause with others.
pub(super) fn render_filters(
    filters: &[Where],
    ctx: &RenderCtx<'_>,
    params: &mut ParamList,
) -> SqlResult<Option<String>> {
    let mut parts = Vec::with_capacity(filters.len());
    for filter in filters {
        let sql = filter.render(ctx, params)?;
        if sql.is_empty() {
            continue;
        }
        if filters.len() > 1 && filter.has_or() {
            parts.push(format!("({sql})"));
        } else {
            parts.push(sql);
        }
    }
    Ok((!parts.is_empty()).then(|| parts.join(" AND ")))
}

fn render_source(source: &Source, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
    match source {
        Source::Table(TableRef::Aliased { table, alias }) if alias != table => {
            Ok(format!("{table} {alias}"))
        }
        Source::Table(TableRef::Aliased { table, .. } | TableRef::Raw(table)) => Ok(table.clone()),
        Source::Derived(query) => {
            let sub = query.render_nested(ctx.dialect, params)?;
            let alias = query.derived_alias().unwrap_or(UNNAMED_DERIVED_TABLE);
            Ok(format!("({sub}) AS {alias}"))
        }
    }
}

pub(super) fn render(parts: &SelectParts, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
    let mut query = vec!["SELECT".to_string()];

    let columns = normalize_columns(&parts.columns, ctx);
    if columns.is_empty() {
        query.push("*".to_string());
    } else {
        query.push(columns.join(", "));
    }

    if let Some(source) = &parts.source {
        query.push("FROM".to_string());
        query.push(render_source(source, ctx, params)?);
    }

    for join in &parts.joins {
        query.push(join.render(ctx, params)?);
    }

    if let Some(filters) = render_filters(&parts.filters, ctx, params)? {
        query.push("WHERE".to_string());
        query.push(filters);
    }

    let group = normalize_columns(&parts.group, ctx);
    if !group.is_empty() {
        query.push("GROUP BY".to_string());
        query.push(group.join(", "));
    }

    if let Some(having) = &parts.having {
        let sql = having.render(ctx, params)?;
        if !sql.is_empty() {
            query.push("HAVING".to_string());
            query.push(sql);
        }
    }

    for (union, all) in &parts.unions {
        query.push(if *all { "UNION ALL" } else { "UNION" }.to_string());
        query.push(union.render(ctx.dialect, params)?);
    }

    let order = normalize_columns(&parts.order, ctx);
    if !order.is_empty() {
        query.push("ORDER BY".to_string());
        query.push(order.join(", "));
    }

    // Literal, not a placeholder.
    if let Some(limit) = parts.limit {
        query.push(format!("LIMIT {limit}"));
    }

    Ok(query.join(" "))
}
