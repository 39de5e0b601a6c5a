//! Table alias context.
//!
//! Every statement owns one [`TableContext`]: the tables it touches, the alias
//! each is known by, and which one is the origin (the table the statement reads
//! from). Operands consult it when a column needs qualifying.

use crate::error::{SqlError, SqlResult};
use std::fmt;
use std::str::FromStr;

/// Role of a table inside a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The table the statement reads from. At most one per context.
    Origin,
    /// A joined table.
    Join,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Origin => write!(f, "origin"),
            Role::Join => write!(f, "join"),
        }
    }
}

impl FromStr for Role {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "origin" => Ok(Role::Origin),
            "join" => Ok(Role::Join),
            other => Err(SqlError::configuration(format!(
                "invalid table role '{other}', expected 'origin' or 'join'"
            ))),
        }
    }
}

/// One registered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAlias {
    pub table: String,
    pub alias: String,
    pub role: Role,
}

/// Order-preserving `table -> (alias, role)` registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableContext {
    entries: Vec<TableAlias>,
}

impl TableContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table`.
    ///
    /// The alias defaults to the table name. Without an explicit role the first
    /// table becomes the origin and later ones are joins.
    pub fn add_alias(
        &mut self,
        table: impl Into<String>,
        alias: Option<&str>,
        role: Option<Role>,
    ) -> SqlResult<()> {
        let table = table.into();
        let alias = alias.map_or_else(|| table.clone(), str::to_string);
        let role = role.unwrap_or(if self.origin().is_some() {
            Role::Join
        } else {
            Role::Origin
        });

        if self.contains(&table) {
            return Err(SqlError::DuplicateTable(table));
        }
        if role == Role::Origin
            && let Some((origin, _)) = self.origin()
        {
            return Err(SqlError::DuplicateOrigin {
                table,
                origin: origin.to_string(),
            });
        }
        if let Some(existing) = self.entries.iter().find(|e| e.alias == alias) {
            return Err(SqlError::DuplicateAlias {
                alias,
                existing: existing.table.clone(),
                table,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "sqlweave.context",
            table = %table,
            alias = %alias,
            role = %role,
            "registered table alias"
        );

        self.entries.push(TableAlias { table, alias, role });
        Ok(())
    }

    /// `(table, alias)` of the origin, if any.
    pub fn origin(&self) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .find(|e| e.role == Role::Origin)
            .map(|e| (e.table.as_str(), e.alias.as_str()))
    }

    /// Join entries in registration order.
    pub fn joins(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|e| e.role == Role::Join)
            .map(|e| (e.table.as_str(), e.alias.as_str()))
    }

    /// Alias of a known table, otherwise `name` unchanged.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias_for(name).unwrap_or(name)
    }

    /// Alias registered for `table`.
    pub fn alias_for(&self, table: &str) -> Option<&str> {
        self.entry(table).map(|e| e.alias.as_str())
    }

    /// Role registered for `table`.
    pub fn role_for(&self, table: &str) -> Option<Role> {
        self.entry(table).map(|e| e.role)
    }

    /// Whether `table` is registered.
    pub fn contains(&self, table: &str) -> bool {
        self.entry(table).is_some()
    }

    /// Change the role of a registered table, keeping a single origin.
    pub fn set_role(&mut self, table: &str, role: Role) -> SqlResult<()> {
        if role == Role::Origin
            && let Some((origin, _)) = self.origin()
            && origin != table
        {
            return Err(SqlError::DuplicateOrigin {
                table: table.to_string(),
                origin: origin.to_string(),
            });
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.table == table)
            .ok_or_else(|| SqlError::configuration(format!("table '{table}' is not registered")))?;
        entry.role = role;
        Ok(())
    }

    /// Unregister `table`, returning its entry.
    pub fn remove(&mut self, table: &str) -> Option<TableAlias> {
        let idx = self.entries.iter().position(|e| e.table == table)?;
        Some(self.entries.remove(idx))
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no table is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TableAlias> {
        self.entries.iter()
    }

    fn entry(&self, table: &str) -> Option<&TableAlias> {
        self.entries.iter().find(|e| e.table == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_table_is_origin() {
        let mut ctx = TableContext::new();
        ctx.add_alias("languages", Some("l"), None).unwrap();
        ctx.add_alias("countries", Some("c"), None).unwrap();
        ctx.add_alias("regions", None, None).unwrap();

        assert_eq!(ctx.origin(), Some(("languages", "l")));
        let joins: Vec<_> = ctx.joins().collect();
        assert_eq!(joins, vec![("countries", "c"), ("regions", "regions")]);
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_explicit_join_before_origin() {
        let mut ctx = TableContext::new();
        ctx.add_alias("b", None, Some(Role::Join)).unwrap();
        ctx.add_alias("a", None, None).unwrap();
        assert_eq!(ctx.origin(), Some(("a", "a")));
        assert_eq!(ctx.role_for("b"), Some(Role::Join));
    }

    #[test]
    fn test_second_origin_conflicts() {
        let mut ctx = TableContext::new();
        ctx.add_alias("a", None, None).unwrap();
        let err = ctx.add_alias("b", None, Some(Role::Origin)).unwrap_err();
        assert!(err.is_alias_conflict());
        assert!(matches!(err, SqlError::DuplicateOrigin { .. }));
    }

    #[test]
    fn test_duplicate_alias_conflicts() {
        let mut ctx = TableContext::new();
        ctx.add_alias("a", Some("x"), None).unwrap();
        let err = ctx.add_alias("b", Some("x"), None).unwrap_err();
        assert_eq!(
            err,
            SqlError::DuplicateAlias {
                alias: "x".into(),
                existing: "a".into(),
                table: "b".into()
            }
        );
    }

    #[test]
    fn test_duplicate_table_conflicts() {
        let mut ctx = TableContext::new();
        ctx.add_alias("a", None, None).unwrap();
        let err = ctx.add_alias("a", Some("other"), None).unwrap_err();
        assert_eq!(err, SqlError::DuplicateTable("a".into()));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_resolve() {
        let mut ctx = TableContext::new();
        ctx.add_alias("languages", Some("l"), None).unwrap();
        assert_eq!(ctx.resolve("languages"), "l");
        assert_eq!(ctx.resolve("l"), "l");
        assert_eq!(ctx.resolve("unknown"), "unknown");
        assert_eq!(ctx.alias_for("unknown"), None);
    }

    #[test]
    fn test_set_role_keeps_single_origin() {
        let mut ctx = TableContext::new();
        ctx.add_alias("a", None, None).unwrap();
        ctx.add_alias("b", None, None).unwrap();
        assert!(ctx.set_role("b", Role::Origin).unwrap_err().is_alias_conflict());

        ctx.set_role("a", Role::Join).unwrap();
        ctx.set_role("b", Role::Origin).unwrap();
        assert_eq!(ctx.origin(), Some(("b", "b")));
        assert!(ctx.set_role("missing", Role::Join).unwrap_err().is_configuration());
    }

    #[test]
    fn test_remove() {
        let mut ctx = TableContext::new();
        ctx.add_alias("a", Some("x"), None).unwrap();
        let removed = ctx.remove("a").unwrap();
        assert_eq!(removed.alias, "x");
        assert!(ctx.is_empty());
        assert!(ctx.remove("a").is_none());
        ctx.add_alias("b", Some("x"), None).unwrap();
        assert_eq!(ctx.origin(), Some(("b", "x")));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("origin".parse::<Role>().unwrap(), Role::Origin);
        assert_eq!("join".parse::<Role>().unwrap(), Role::Join);
        assert!("joined".parse::<Role>().unwrap_err().is_configuration());
        assert_eq!(Role::Join.to_string(), "join");
    }

    #[test]
    fn test_iter_in_registration_order() {
        let mut ctx = TableContext::new();
        for t in ["z", "a", "m"] {
            ctx.add_alias(t, None, None).unwrap();
        }
        let tables: Vec<&str> = ctx.iter().map(|e| e.table.as_str()).collect();
        assert_eq!(tables, vec!["z", "a", "m"]);
    }
}
