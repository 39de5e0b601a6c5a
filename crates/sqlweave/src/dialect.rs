//! Backend configuration.
//!
//! A [`Dialect`] is the single value that specializes the compiler for a
//! backend: quote characters, placeholder style, boolean spellings and the
//! characters that force an identifier to be quoted.
//!
//! Dialects can be built from a preset and adjusted with `with_*` setters, or
//! loaded from TOML:
//!
//! ```toml
//! preset = "postgres"
//! placeholder = "numbered"
//! ```

use crate::classify::Classifier;
use crate::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};

/// Characters which must be quoted to be understood literally in identifiers.
pub const DEFAULT_RESERVED_CHARS: &str = " `~!@#$%^&*()-=+[]{}\\|;:'\",.<>/?";

/// Positional placeholder convention of the backend driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?` (sqlite, odbc)
    #[default]
    #[serde(alias = "?")]
    Question,
    /// `%s` (psycopg, MySQLdb)
    #[serde(alias = "%s")]
    Format,
    /// `$1, $2, ...` numbered in textual order (tokio-postgres)
    #[serde(alias = "$n")]
    Numbered,
}

impl PlaceholderStyle {
    /// Placeholder text for the parameter at 1-based `index`.
    pub fn token(self, index: usize) -> String {
        match self {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Format => "%s".to_string(),
            PlaceholderStyle::Numbered => format!("${index}"),
        }
    }
}

/// Named starting points for a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Generic,
    Postgres,
    Mysql,
    Sqlite,
}

impl Preset {
    /// Dialect for this preset.
    pub fn dialect(self) -> Dialect {
        match self {
            Preset::Generic => Dialect::generic(),
            Preset::Postgres => Dialect::postgres(),
            Preset::Mysql => Dialect::mysql(),
            Preset::Sqlite => Dialect::sqlite(),
        }
    }
}

/// Backend configuration injected into the scanner, classifier and compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialect {
    /// Quote for identifiers (tables, columns, aliases).
    pub field_quote: char,
    /// Quote for string literals.
    pub value_quote: char,
    /// Separator between a table alias and a column.
    pub field_separator: char,
    /// Placeholder written for each bound value.
    pub placeholder: PlaceholderStyle,
    /// Spellings recognized as boolean literals, compared case-insensitively.
    pub boolean_literals: Vec<String>,
    /// Characters that force an identifier to be quoted.
    pub reserved_chars: String,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::generic()
    }
}

impl Dialect {
    /// Backtick identifiers, `?` placeholders.
    pub fn generic() -> Self {
        Self {
            field_quote: '`',
            value_quote: '\'',
            field_separator: '.',
            placeholder: PlaceholderStyle::Question,
            boolean_literals: vec!["true".to_string(), "false".to_string()],
            reserved_chars: DEFAULT_RESERVED_CHARS.to_string(),
        }
    }

    /// Double-quoted identifiers, `%s` placeholders, PostgreSQL boolean input spellings.
    pub fn postgres() -> Self {
        let booleans = [
            "true", "'true'", "'t'", "'yes'", "'y'", "'on'", "'1'", "false", "'false'", "'no'",
            "'n'", "'off'", "'0'",
        ];
        Self {
            field_quote: '"',
            placeholder: PlaceholderStyle::Format,
            boolean_literals: booleans.iter().map(|s| s.to_string()).collect(),
            ..Self::generic()
        }
    }

    /// Backtick identifiers, `%s` placeholders.
    pub fn mysql() -> Self {
        Self {
            placeholder: PlaceholderStyle::Format,
            ..Self::generic()
        }
    }

    /// Backtick identifiers, `?` placeholders, `1`/`0` booleans.
    pub fn sqlite() -> Self {
        Self {
            boolean_literals: vec!["1".to_string(), "0".to_string()],
            ..Self::generic()
        }
    }

    /// Set the identifier quote character.
    pub fn with_field_quote(mut self, quote: char) -> Self {
        self.field_quote = quote;
        self
    }

    /// Set the string literal quote character.
    pub fn with_value_quote(mut self, quote: char) -> Self {
        self.value_quote = quote;
        self
    }

    /// Set the placeholder style.
    pub fn with_placeholder(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder = style;
        self
    }

    /// Replace the recognized boolean spellings.
    pub fn with_boolean_literals<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boolean_literals = literals.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the characters that force identifier quoting.
    pub fn with_reserved_chars(mut self, chars: impl Into<String>) -> Self {
        self.reserved_chars = chars.into();
        self
    }

    /// Token predicates for this dialect.
    pub fn classifier(&self) -> Classifier<'_> {
        Classifier::new(self)
    }

    /// Check that the quote and separator characters are distinguishable.
    pub fn validate(&self) -> SqlResult<()> {
        if self.field_quote == self.value_quote {
            return Err(SqlError::configuration(format!(
                "field quote and value quote are both '{}'",
                self.field_quote
            )));
        }
        if self.field_separator == self.field_quote || self.field_separator == self.value_quote {
            return Err(SqlError::configuration(format!(
                "field separator '{}' collides with a quote character",
                self.field_separator
            )));
        }
        Ok(())
    }

    /// Load a dialect from TOML (see [`DialectConfig`]).
    pub fn from_toml_str(raw: &str) -> SqlResult<Self> {
        DialectConfig::from_toml_str(raw)?.into_dialect()
    }
}

/// File form of a dialect: a preset plus optional overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialectConfig {
    #[serde(default)]
    pub preset: Preset,
    pub field_quote: Option<char>,
    pub value_quote: Option<char>,
    pub field_separator: Option<char>,
    pub placeholder: Option<PlaceholderStyle>,
    pub boolean_literals: Option<Vec<String>>,
    pub reserved_chars: Option<String>,
}

impl DialectConfig {
    /// Parse a config from TOML without applying it.
    pub fn from_toml_str(raw: &str) -> SqlResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply the overrides to the preset and validate the result.
    pub fn into_dialect(self) -> SqlResult<Dialect> {
        let mut dialect = self.preset.dialect();
        if let Some(q) = self.field_quote {
            dialect.field_quote = q;
        }
        if let Some(q) = self.value_quote {
            dialect.value_quote = q;
        }
        if let Some(sep) = self.field_separator {
            dialect.field_separator = sep;
        }
        if let Some(style) = self.placeholder {
            dialect.placeholder = style;
        }
        if let Some(booleans) = self.boolean_literals {
            dialect.boolean_literals = booleans;
        }
        if let Some(reserved) = self.reserved_chars {
            dialect.reserved_chars = reserved;
        }
        dialect.validate()?;
        Ok(dialect)
    }
}
