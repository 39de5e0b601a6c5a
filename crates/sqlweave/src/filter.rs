//! WHERE / ON / HAVING expressions.
//!
//! A [`Where`] is an ordered list of comparisons joined by `AND`/`OR`, built
//! fluently:
//!
//! ```ignore
//! Where::new("kind").equals("image").and("category_id").equals(15)
//! // kind = ? AND category_id = ?   ["image", 15]
//! ```
//!
//! Each conjunction (`new`, `and`, `or`) names the source operand, and the
//! comparison method that follows it closes the pair. Mistakes in the chain are
//! recorded and reported when the clause is rendered.

use crate::context::TableContext;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::operand::{Operand, Subquery};
use crate::params::{ParamList, Rendered};
use crate::render::{Position, Render, RenderCtx};
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// How a comparison attaches to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    /// SQL keyword for this conjunction.
    pub fn keyword(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// Number of destination operands an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No destination (`IS NULL`).
    Unary,
    /// One destination.
    Binary,
    /// A list of destinations (`IN`).
    List,
    /// Exactly two destinations (`BETWEEN`).
    Range,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    Between,
    Like,
    ILike,
    Exists,
}

struct OperatorSpec {
    name: &'static str,
    operator: Operator,
    symbol: &'static str,
    arity: Arity,
}

const fn row(name: &'static str, operator: Operator, symbol: &'static str, arity: Arity) -> OperatorSpec {
    OperatorSpec {
        name,
        operator,
        symbol,
        arity,
    }
}

static OPERATORS: [OperatorSpec; 16] = [
    row("equals", Operator::Equals, "=", Arity::Binary),
    row("not_equals", Operator::NotEquals, "!=", Arity::Binary),
    row("gt", Operator::Gt, ">", Arity::Binary),
    row("gte", Operator::Gte, ">=", Arity::Binary),
    row("lt", Operator::Lt, "<", Arity::Binary),
    row("lte", Operator::Lte, "<=", Arity::Binary),
    row("is_in", Operator::In, "IN", Arity::List),
    row("not_in", Operator::NotIn, "NOT IN", Arity::List),
    row("is_null", Operator::IsNull, "IS NULL", Arity::Unary),
    row("is_not_null", Operator::IsNotNull, "IS NOT NULL", Arity::Unary),
    row("is_empty", Operator::IsEmpty, "=", Arity::Unary),
    row("is_not_empty", Operator::IsNotEmpty, "!=", Arity::Unary),
    row("between", Operator::Between, "BETWEEN", Arity::Range),
    row("like", Operator::Like, "LIKE", Arity::Binary),
    row("ilike", Operator::ILike, "ILIKE", Arity::Binary),
    row("exists", Operator::Exists, "EXISTS", Arity::Binary),
];

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|ch| *ch != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Operator {
    /// Look up an operator by name, in snake_case (`not_equals`) or
    /// camelCase (`notEquals`).
    pub fn lookup(name: &str) -> Option<Operator> {
        let wanted = normalize_name(name);
        OPERATORS
            .iter()
            .find(|s| normalize_name(s.name) == wanted)
            .map(|s| s.operator)
    }

    fn spec(self) -> &'static OperatorSpec {
        // Every variant has exactly one row.
        let idx = OPERATORS
            .iter()
            .position(|s| s.operator == self)
            .unwrap_or_default();
        &OPERATORS[idx]
    }

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// SQL text written between the operands.
    pub fn symbol(self) -> &'static str {
        self.spec().symbol
    }

    /// Number of destination operands taken.
    pub fn arity(self) -> Arity {
        self.spec().arity
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::lookup(s).ok_or_else(|| SqlError::UnsupportedOperator(s.to_string()))
    }
}

/// One `source OP dest` term.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub conjunction: Option<Conjunction>,
    pub source: Option<Operand>,
    pub operator: Operator,
    pub dest: Option<Operand>,
}

impl Comparison {
    fn dest(&self) -> SqlResult<&Operand> {
        self.dest.as_ref().ok_or_else(|| {
            SqlError::missing_operand(format!("{} requires a destination operand", self.operator))
        })
    }

    fn source(&self, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
        let source = self.source.as_ref().ok_or_else(|| {
            SqlError::missing_operand(format!("{} requires a source operand", self.operator))
        })?;
        ctx.operand(source, Position::Source, params)
    }

    fn render(&self, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
        let symbol = self.operator.symbol();
        match self.operator.arity() {
            Arity::Unary => {
                let source = self.source(ctx, params)?;
                Ok(match self.operator {
                    Operator::IsEmpty | Operator::IsNotEmpty => {
                        let q = ctx.dialect.value_quote;
                        format!("{source} {symbol} {q}{q}")
                    }
                    _ => format!("{source} {symbol}"),
                })
            }
            Arity::Binary if self.operator == Operator::Exists => {
                let dest = self.dest()?;
                if !ctx.is_subquery(dest) {
                    return Err(SqlError::missing_operand("EXISTS requires a subquery"));
                }
                Ok(format!("EXISTS {}", ctx.operand(dest, Position::Dest, params)?))
            }
            Arity::Binary => {
                let dest = self.dest()?;
                let source = self.source(ctx, params)?;
                let dest = ctx.operand(dest, Position::Dest, params)?;
                Ok(format!("{source} {symbol} {dest}"))
            }
            Arity::List => self.render_list(ctx, params),
            Arity::Range => {
                let (min, max) = match self.dest()? {
                    Operand::List(items) if items.len() == 2 => (&items[0], &items[1]),
                    _ => {
                        return Err(SqlError::missing_operand(
                            "BETWEEN requires exactly two bounds",
                        ));
                    }
                };
                let source = self.source(ctx, params)?;
                let min = ctx.operand(min, Position::Dest, params)?;
                let max = ctx.operand(max, Position::Dest, params)?;
                Ok(format!("{source} {symbol} {min} AND {max}"))
            }
        }
    }

    fn render_list(&self, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
        let symbol = self.operator.symbol();
        let dest = self.dest()?;

        if let Operand::List(items) = dest {
            if items.is_empty() {
                // Nothing matches an empty IN; everything matches an empty NOT IN.
                return Ok(match self.operator {
                    Operator::NotIn => "1=1".to_string(),
                    _ => "1=0".to_string(),
                });
            }
            if let [single] = items.as_slice()
                && ctx.is_subquery(single)
            {
                let source = self.source(ctx, params)?;
                let sub = ctx.operand(single, Position::Dest, params)?;
                return Ok(format!("{source} {symbol} {sub}"));
            }
        }

        let source = self.source(ctx, params)?;
        let rendered = ctx.operand(dest, Position::Dest, params)?;
        if matches!(dest, Operand::List(_)) || ctx.is_subquery(dest) {
            Ok(format!("{source} {symbol} {rendered}"))
        } else {
            Ok(format!("{source} {symbol} ({rendered})"))
        }
    }
}

/// Operand waiting for its comparison.
#[derive(Debug, Clone)]
struct Pending {
    conjunction: Option<Conjunction>,
    source: Option<Operand>,
}

/// A sequence of comparisons.
#[derive(Debug, Clone)]
pub struct Where {
    comparisons: Vec<Comparison>,
    pending: Option<Pending>,
    build_error: Option<SqlError>,
}

#[allow(clippy::wrong_self_convention)]
impl Where {
    fn start(source: Option<Operand>) -> Self {
        Self {
            comparisons: Vec::new(),
            pending: Some(Pending {
                conjunction: None,
                source,
            }),
            build_error: None,
        }
    }

    /// Start with a column.
    pub fn new(field: impl Into<String>) -> Self {
        Self::start(Some(Operand::field(field)))
    }

    /// Start with a column of a specific table or alias.
    pub fn aliased(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::start(Some(Operand::aliased_field(field, alias)))
    }

    /// Start with a bound value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::start(Some(Operand::Value(value.into())))
    }

    /// Start with any operand.
    pub fn operand(operand: impl Into<Operand>) -> Self {
        Self::start(Some(operand.into()))
    }

    /// Start without a source, for `EXISTS`.
    pub fn empty() -> Self {
        Self::start(None)
    }

    fn record_error(&mut self, err: SqlError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    fn conjoin(mut self, conjunction: Conjunction, source: Option<Operand>) -> Self {
        if self.pending.is_some() {
            self.record_error(SqlError::missing_operand(format!(
                "{} follows an operand with no comparison",
                conjunction.keyword()
            )));
        }
        self.pending = Some(Pending {
            conjunction: Some(conjunction),
            source,
        });
        self
    }

    /// Continue with `AND <field>`.
    pub fn and(self, field: impl Into<String>) -> Self {
        self.conjoin(Conjunction::And, Some(Operand::field(field)))
    }

    /// Continue with `OR <field>`.
    pub fn or(self, field: impl Into<String>) -> Self {
        self.conjoin(Conjunction::Or, Some(Operand::field(field)))
    }

    /// Continue with `AND <operand>`.
    pub fn and_operand(self, operand: impl Into<Operand>) -> Self {
        self.conjoin(Conjunction::And, Some(operand.into()))
    }

    /// Continue with `OR <operand>`.
    pub fn or_operand(self, operand: impl Into<Operand>) -> Self {
        self.conjoin(Conjunction::Or, Some(operand.into()))
    }

    fn push(mut self, operator: Operator, dest: Option<Operand>) -> Self {
        if operator == Operator::Exists
            && let Some(Pending { source: Some(_), .. }) = &self.pending
        {
            self.record_error(SqlError::missing_operand(
                "EXISTS takes only a subquery, the source operand would be dropped",
            ));
        }
        match self.pending.take() {
            Some(Pending {
                conjunction,
                source,
            }) => self.comparisons.push(Comparison {
                conjunction,
                source,
                operator,
                dest,
            }),
            None => self.record_error(SqlError::missing_operand(format!(
                "{operator} has no pending operand"
            ))),
        }
        self
    }

    /// `source = dest`
    pub fn equals(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::Equals, Some(dest.into()))
    }

    /// `source != dest`
    pub fn not_equals(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::NotEquals, Some(dest.into()))
    }

    /// `source > dest`
    pub fn gt(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::Gt, Some(dest.into()))
    }

    /// `source >= dest`
    pub fn gte(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::Gte, Some(dest.into()))
    }

    /// `source < dest`
    pub fn lt(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::Lt, Some(dest.into()))
    }

    /// `source <= dest`
    pub fn lte(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::Lte, Some(dest.into()))
    }

    /// `IN (...)`. Accepts a list, a single value or a subquery.
    pub fn is_in(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::In, Some(dest.into()))
    }

    /// `NOT IN (...)`. An empty list matches every row.
    pub fn not_in(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::NotIn, Some(dest.into()))
    }

    /// `source IS NULL`
    pub fn is_null(self) -> Self {
        self.push(Operator::IsNull, None)
    }

    /// `source IS NOT NULL`
    pub fn is_not_null(self) -> Self {
        self.push(Operator::IsNotNull, None)
    }

    /// `= ''`
    pub fn is_empty(self) -> Self {
        self.push(Operator::IsEmpty, None)
    }

    /// `!= ''`
    pub fn is_not_empty(self) -> Self {
        self.push(Operator::IsNotEmpty, None)
    }

    /// `source BETWEEN min AND max`
    pub fn between(self, min: impl Into<Operand>, max: impl Into<Operand>) -> Self {
        self.push(
            Operator::Between,
            Some(Operand::List(vec![min.into(), max.into()])),
        )
    }

    /// `source LIKE dest`
    pub fn like(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::Like, Some(dest.into()))
    }

    /// `source ILIKE dest`
    pub fn ilike(self, dest: impl Into<Operand>) -> Self {
        self.push(Operator::ILike, Some(dest.into()))
    }

    /// `EXISTS (subquery)`. Start the chain with [`Where::empty`]; a source
    /// operand is an error.
    pub fn exists(self, query: impl Into<Subquery>) -> Self {
        self.push(Operator::Exists, Some(Operand::Subquery(query.into())))
    }

    /// `... AND EXISTS (subquery)`
    pub fn and_exists(self, query: impl Into<Subquery>) -> Self {
        self.conjoin(Conjunction::And, None).exists(query)
    }

    /// `... OR EXISTS (subquery)`
    pub fn or_exists(self, query: impl Into<Subquery>) -> Self {
        self.conjoin(Conjunction::Or, None).exists(query)
    }

    /// Apply an operator by name. `dest` is ignored for operators that take
    /// none; for `between` it must be a two-element list.
    pub fn compare(mut self, name: &str, dest: impl Into<Operand>) -> Self {
        match Operator::lookup(name) {
            Some(operator) if operator.arity() == Arity::Unary => self.push(operator, None),
            Some(operator) => self.push(operator, Some(dest.into())),
            None => {
                self.record_error(SqlError::UnsupportedOperator(name.to_string()));
                self.pending = None;
                self
            }
        }
    }

    /// Comparisons appended so far.
    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// True when any comparison is OR-joined.
    pub fn has_or(&self) -> bool {
        self.comparisons
            .iter()
            .any(|c| c.conjunction == Some(Conjunction::Or))
    }

    /// Render standalone with the default dialect and no table context.
    pub fn build(&self) -> SqlResult<Rendered> {
        self.build_with(&Dialect::default())
    }

    /// Render standalone with `dialect` and no table context.
    pub fn build_with(&self, dialect: &Dialect) -> SqlResult<Rendered> {
        let tables = TableContext::new();
        let ctx = RenderCtx::new(dialect, &tables);
        let mut params = ParamList::new();
        let sql = self.render(&ctx, &mut params)?;
        Ok(Rendered::new(sql, params))
    }
}

impl Render for Where {
    fn render(&self, ctx: &RenderCtx<'_>, params: &mut ParamList) -> SqlResult<String> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        if let Some(Pending {
            conjunction: Some(conjunction),
            ..
        }) = &self.pending
        {
            return Err(SqlError::missing_operand(format!(
                "dangling {} with no comparison",
                conjunction.keyword()
            )));
        }

        let mut parts = Vec::with_capacity(self.comparisons.len() * 2);
        for comparison in &self.comparisons {
            if let Some(conjunction) = comparison.conjunction {
                parts.push(conjunction.keyword().to_string());
            }
            parts.push(comparison.render(ctx, params)?);
        }
        Ok(parts.join(" "))
    }
}
