//! # sqlweave
//!
//! A parameterized SQL compiler. Statements are described with a fluent
//! builder and rendered into SQL text plus the ordered list of values bound to
//! its placeholders. Nothing here talks to a database.
//!
//! ## Features
//!
//! - **Dialect driven**: quote characters, field separator, placeholder style
//!   and boolean spellings come from a [`Dialect`], built in code or from TOML
//! - **Alias aware**: a per-statement [`TableContext`] qualifies bare columns
//!   with the origin or join alias they belong to
//! - **Nested queries**: builders nest as subqueries, derived tables, unions
//!   and CTE bodies, sharing one parameter list in textual order
//! - **No silent failures**: invalid chains are recorded and returned by
//!   `render` as a [`SqlError`]
//!
//! ## Example
//!
//! ```ignore
//! use sqlweave::{Builder, Join, Operand, Where};
//!
//! let (sql, params) = Builder::new()
//!     .select(["a.id, name"])
//!     .from(("mytable", "a"))
//!     .join(Join::inner(("table2", "b"), Where::new("ref_id").equals(Operand::field("id"))))
//!     .filter(Where::new("id").gt(25).and("id").lt(100))
//!     .render()?
//!     .into_parts();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT a.id, a.name FROM mytable a INNER JOIN table2 b ON (b.ref_id = a.id) \
//!      WHERE a.id > ? AND a.id < ?"
//! );
//! assert_eq!(params.len(), 2);
//! ```
//!
//! ## Logging
//!
//! With the default `tracing` feature, rendered statements are logged at
//! `debug` under the `sqlweave.sql` target and alias registration at `trace`
//! under `sqlweave.context`.

pub mod builder;
pub mod classify;
pub mod context;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod join;
pub mod operand;
pub mod params;
pub mod render;
pub mod scan;
pub mod value;

pub use builder::{Builder, DEFAULT_LOG_SQL_LENGTH, Source, StatementKind};
pub use classify::Classifier;
pub use context::{Role, TableAlias, TableContext};
pub use dialect::{Dialect, DialectConfig, PlaceholderStyle, Preset};
pub use error::{SqlError, SqlResult};
pub use filter::{Arity, Comparison, Conjunction, Operator, Where};
pub use join::{Join, JoinKind, TableRef};
pub use operand::{Operand, Subquery};
pub use params::{ParamList, Rendered};
pub use render::{Position, Render, RenderCtx};
pub use scan::{QuoteState, Scanner, scan};
pub use value::{Assignment, FieldRef, Value};
