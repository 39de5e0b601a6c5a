//! Error types for sqlweave

use thiserror::Error;

/// Result type alias for sqlweave operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while configuring, building or rendering a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// Invalid configuration value (join kind, table role, dialect settings)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A second origin table was registered in one context
    #[error("Alias conflict: table '{table}' cannot be an origin, '{origin}' already is")]
    DuplicateOrigin { table: String, origin: String },

    /// Two tables were registered under the same alias
    #[error("Alias conflict: alias '{alias}' is used by both '{existing}' and '{table}'")]
    DuplicateAlias {
        alias: String,
        existing: String,
        table: String,
    },

    /// The same table name was registered twice
    #[error("Alias conflict: table '{0}' is already registered")]
    DuplicateTable(String),

    /// Comparison operator name not in the operator table
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A required operand or clause is absent
    #[error("Missing operand: {0}")]
    MissingOperand(String),

    /// Clause not valid for the current statement kind
    #[error("Statement state error: {0}")]
    StatementState(String),
}

impl SqlError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a missing operand error
    pub fn missing_operand(message: impl Into<String>) -> Self {
        Self::MissingOperand(message.into())
    }

    /// Create a statement state error
    pub fn statement_state(message: impl Into<String>) -> Self {
        Self::StatementState(message.into())
    }

    /// Check if this is any of the alias conflict errors
    pub fn is_alias_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateOrigin { .. } | Self::DuplicateAlias { .. } | Self::DuplicateTable(_)
        )
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a missing operand error
    pub fn is_missing_operand(&self) -> bool {
        matches!(self, Self::MissingOperand(_))
    }

    /// Check if this is a statement state error
    pub fn is_statement_state(&self) -> bool {
        matches!(self, Self::StatementState(_))
    }
}

impl From<toml::de::Error> for SqlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
