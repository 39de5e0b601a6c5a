//! INSERT / UPDATE / DELETE assembly.

use super::select::render_filters;
use crate::error::{SqlError, SqlResult};
use crate::filter::Where;
use crate::params::ParamList;
use crate::render::RenderCtx;
use crate::value::Assignment;

/// Target table plus the assignments and filters of a mutation.
#[derive(Debug, Clone)]
pub(crate) struct Mutation {
    pub(super) dest: String,
    /// Column assignments in insertion order.
    pub(super) values: Vec<(String, Assignment)>,
    pub(super) filters: Vec<Where>,
}

impl Mutation {
    pub(super) fn new(dest: impl Into<String>) -> Self {
        Self {
            dest: dest.into(),
            values: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub(super) fn assign(&mut self, column: String, value: Assignment) {
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((column, value)),
        }
    }

    fn dest(&self, ctx: &RenderCtx<'_>) -> String {
        let classifier = ctx.classifier();
        if classifier.field_needs_quoted(&self.dest) {
            classifier.quote_field(&self.dest)
        } else {
            self.dest.clone()
        }
    }

    fn value_sql(value: &Assignment, ctx: &RenderCtx<'_>, params: &mut ParamList) -> String {
        match value {
            Assignment::Value(v) => ctx.bind(v.clone(), params),
            Assignment::Field(field) => field.name().to_string(),
        }
    }
}

fn push_filters(
    query: &mut Vec<String>,
    m: &Mutation,
    ctx: &RenderCtx<'_>,
    params: &mut ParamList,
) -> SqlResult<()> {
    if let Some(filters) = render_filters(&m.filters, ctx, params)? {
        query.push("WHERE".to_string());
        query.push(filters);
    }
    Ok(())
}

pub(super) fn render_insert(m: &Mutation, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
    if m.values.is_empty() {
        return Err(SqlError::statement_state(format!(
            "INSERT INTO {} has no values",
            m.dest
        )));
    }

    let mut keys = Vec::with_capacity(m.values.len());
    let mut vals = Vec::with_capacity(m.values.len());
    for (column, value) in &m.values {
        keys.push(column.as_str());
        vals.push(Mutation::value_sql(value, ctx, params));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        m.dest(ctx),
        keys.join(", "),
        vals.join(", ")
    ))
}

pub(super) fn render_update(m: &Mutation, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
    if m.values.is_empty() {
        return Err(SqlError::statement_state(format!(
            "UPDATE {} has no SET values",
            m.dest
        )));
    }

    let sets: Vec<String> = m
        .values
        .iter()
        .map(|(column, value)| format!("{column} = {}", Mutation::value_sql(value, ctx, params)))
        .collect();

    let mut query = vec![
        "UPDATE".to_string(),
        m.dest(ctx),
        "SET".to_string(),
        sets.join(", "),
    ];
    push_filters(&mut query, m, ctx, params)?;
    Ok(query.join(" "))
}

pub(super) fn render_delete(m: &Mutation, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
    let mut query = vec!["DELETE FROM".to_string(), m.dest(ctx)];
    push_filters(&mut query, m, ctx, params)?;
    Ok(query.join(" "))
}
