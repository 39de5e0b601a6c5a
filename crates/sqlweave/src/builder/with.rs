//! WITH (common table expression) assembly.
//!
//! CTE names and bodies are kept in two parallel lists: `with(name)` opens the
//! first slot, and each `as_(body, next)` fills the current slot and may open
//! the next one. Both lists must have the same length at render time.

use super::select::{self, SelectParts};
use crate::error::{SqlError, SqlResult};
use crate::operand::Subquery;
use crate::params::ParamList;
use crate::render::RenderCtx;

#[derive(Debug, Clone)]
pub(crate) struct WithParts {
    pub(super) names: Vec<String>,
    pub(super) bodies: Vec<Subquery>,
    pub(super) recursive: bool,
    /// Set once the inner SELECT has been supplied.
    pub(super) has_select: bool,
    pub(super) select: SelectParts,
}

impl WithParts {
    pub(super) fn new(name: String, recursive: bool) -> Self {
        Self {
            names: vec![name],
            bodies: Vec::new(),
            recursive,
            has_select: false,
            select: SelectParts::default(),
        }
    }
}

pub(super) fn render(with: &WithParts, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
    if with.names.len() != with.bodies.len() {
        return Err(SqlError::statement_state(format!(
            "WITH has {} names but {} bodies",
            with.names.len(),
            with.bodies.len()
        )));
    }
    if !with.has_select {
        return Err(SqlError::statement_state("WITH is missing its inner SELECT"));
    }

    let mut query = vec!["WITH".to_string()];
    if with.recursive {
        query.push("RECURSIVE".to_string());
    }

    let mut ctes = Vec::with_capacity(with.names.len());
    for (name, body) in with.names.iter().zip(&with.bodies) {
        ctes.push(format!("{name} AS ({})", body.render(ctx.dialect, params)?));
    }
    query.push(ctes.join(", "));
    query.push(select::render(&with.select, ctx, params)?);

    Ok(query.join(" "))
}
