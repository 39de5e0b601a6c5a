//! Token classification.
//!
//! These predicates decide whether a column string is already qualified, is a
//! function call, a literal, an expression or a subquery. They are heuristics
//! built on the quote-aware [`Scanner`], not a SQL parser: nested or aliased
//! expressions can fool them.

use crate::dialect::Dialect;
use crate::scan::Scanner;

/// Constants that behave like niladic functions in most databases.
const NILADIC_FUNCTIONS: [&str; 5] = [
    "CURRENT_TIME",
    "CURRENT_DATE",
    "CURRENT_TIMESTAMP",
    "LOCALTIMESTAMP",
    "CURRENT_USER",
];

/// Comparison characters that mark a column string as an expression.
const EXPRESSION_CHARS: [char; 3] = ['=', '<', '>'];

/// Dialect-aware token predicates.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    dialect: &'a Dialect,
}

impl<'a> Classifier<'a> {
    /// Create a classifier for `dialect`.
    pub fn new(dialect: &'a Dialect) -> Self {
        Self { dialect }
    }

    fn scanner<'t>(&self, text: &'t str) -> Scanner<'t> {
        Scanner::new(text, self.dialect.field_quote, self.dialect.value_quote)
    }

    /// A niladic constant, or text with an unquoted `(` followed by an unquoted `)`.
    ///
    /// Only the first pair matters; parenthesis depth is not tracked.
    pub fn is_sql_function(&self, text: &str) -> bool {
        let upper = text.trim().to_uppercase();
        if NILADIC_FUNCTIONS.contains(&upper.as_str()) {
            return true;
        }
        if !text.contains('(') || !text.contains(')') {
            return false;
        }

        let mut open = false;
        for (_, ch) in self.scanner(text).unquoted() {
            match ch {
                '(' => open = true,
                ')' if open => return true,
                _ => {}
            }
        }
        false
    }

    /// Starts with `CASE`, or has an unquoted `=`, `<` or `>`.
    pub fn is_sql_expression(&self, text: &str) -> bool {
        if text
            .trim_start()
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("case"))
        {
            return true;
        }
        self.scanner(text)
            .unquoted()
            .any(|(_, ch)| EXPRESSION_CHARS.contains(&ch))
    }

    /// Text that starts with `select`, ignoring case and surrounding space.
    pub fn is_select_query(&self, text: &str) -> bool {
        text.trim()
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
    }

    /// Has an unquoted field separator that is not the last character.
    pub fn field_is_aliased(&self, text: &str) -> bool {
        let sep = self.dialect.field_separator;
        if !text.contains(sep) {
            return false;
        }
        let last = text.char_indices().next_back().map(|(idx, _)| idx);
        self.scanner(text)
            .unquoted()
            .any(|(idx, ch)| ch == sep && Some(idx) != last)
    }

    /// Split on unquoted commas, trimming each segment.
    pub fn split_fields(&self, text: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut start = 0;
        for (idx, ch) in self.scanner(text).unquoted() {
            if ch == ',' {
                fields.push(text[start..idx].trim().to_string());
                start = idx + ch.len_utf8();
            }
        }
        fields.push(text[start..].trim().to_string());
        fields
    }

    /// Wrapped in the dialect's field quote.
    pub fn is_quoted_field(&self, text: &str) -> bool {
        is_wrapped_in(text.trim(), self.dialect.field_quote)
    }

    /// Wrapped in the dialect's value quote.
    pub fn is_quoted_value(&self, text: &str) -> bool {
        is_wrapped_in(text.trim(), self.dialect.value_quote)
    }

    /// Unquoted text containing any reserved character.
    pub fn field_needs_quoted(&self, text: &str) -> bool {
        if self.is_quoted_field(text) {
            return false;
        }
        text.chars().any(|ch| self.dialect.reserved_chars.contains(ch))
    }

    /// A boolean spelling, quoted string, integer or float.
    pub fn is_value(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        if self
            .dialect
            .boolean_literals
            .iter()
            .any(|b| b.to_lowercase() == lower)
        {
            return true;
        }
        if self.is_quoted_value(text) {
            return true;
        }
        if text.chars().all(|ch| ch.is_ascii_digit()) {
            return true;
        }
        text.parse::<f64>().is_ok()
    }

    /// Wrap in field quotes, doubling embedded field quote characters.
    pub fn quote_field(&self, text: &str) -> String {
        let quote = self.dialect.field_quote;
        let mut out = String::with_capacity(text.len() + 2);
        out.push(quote);
        for ch in text.chars() {
            if ch == quote {
                out.push(quote);
            }
            out.push(ch);
        }
        out.push(quote);
        out
    }

    fn quote_unless_quoted(&self, text: &str) -> String {
        if self.is_quoted_field(text) {
            text.to_string()
        } else {
            self.quote_field(text)
        }
    }

    /// `alias.column`, quoting both sides when either needs it.
    pub fn qualify(&self, alias: &str, column: &str) -> String {
        let sep = self.dialect.field_separator;
        if self.field_needs_quoted(alias) || self.field_needs_quoted(column) {
            format!(
                "{}{sep}{}",
                self.quote_unless_quoted(alias),
                self.quote_unless_quoted(column)
            )
        } else {
            format!("{alias}{sep}{column}")
        }
    }

    /// Split `"table alias"` into its parts. Anything else is a bare table.
    pub fn expand_table(&self, text: &str) -> (String, Option<String>) {
        if !self.is_quoted_value(text) && !self.is_quoted_field(text) && text.contains(' ') {
            let parts: Vec<&str> = text.split(' ').collect();
            if let [table, alias] = parts.as_slice() {
                return (table.to_string(), Some(alias.to_string()));
            }
        }
        (text.to_string(), None)
    }
}

fn is_wrapped_in(text: &str, quote: char) -> bool {
    text.starts_with(quote) && text.ends_with(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic() -> Dialect {
        Dialect::generic()
    }

    fn pg() -> Dialect {
        Dialect::postgres()
    }

    #[test]
    fn test_sql_function_constants() {
        let d = generic();
        let c = d.classifier();
        assert!(c.is_sql_function("CURRENT_TIMESTAMP"));
        assert!(c.is_sql_function("  current_date "));
        assert!(!c.is_sql_function("current_dates"));
    }

    #[test]
    fn test_sql_function_parens() {
        let d = pg();
        let c = d.classifier();
        assert!(c.is_sql_function("COUNT(*)"));
        assert!(c.is_sql_function("lower(name) AS n"));
        assert!(!c.is_sql_function("name"));
        assert!(!c.is_sql_function(")("));
        // Parentheses inside quotes do not count.
        assert!(!c.is_sql_function(r#""weird(col)""#));
        assert!(!c.is_sql_function("'(' || x || ')'"));
    }

    #[test]
    fn test_sql_expression() {
        let d = pg();
        let c = d.classifier();
        assert!(c.is_sql_expression("CASE WHEN id < 5 THEN 'lt' ELSE 'gt' END AS foo"));
        assert!(c.is_sql_expression("case when x then 1 end"));
        assert!(c.is_sql_expression("a = b"));
        assert!(c.is_sql_expression("x>1"));
        assert!(!c.is_sql_expression("'a = b'"));
        assert!(!c.is_sql_expression(r#""a<b""#));
        assert!(!c.is_sql_expression("name"));
    }

    #[test]
    fn test_select_query() {
        let c_dialect = generic();
        let c = c_dialect.classifier();
        assert!(c.is_select_query("  SELECT id FROM t"));
        assert!(c.is_select_query("select 1"));
        assert!(!c.is_select_query("(SELECT 1)"));
        assert!(!c.is_select_query("sel"));
        assert!(!c.is_select_query(""));
    }

    #[test]
    fn test_field_is_aliased() {
        let d = pg();
        let c = d.classifier();
        assert!(c.field_is_aliased("a.id"));
        assert!(!c.field_is_aliased("id"));
        assert!(!c.field_is_aliased("id."));
        assert!(!c.field_is_aliased(r#""a.id""#));
        assert!(!c.field_is_aliased("'1.5'"));
        assert!(c.field_is_aliased(r#""my table".id"#));
    }

    #[test]
    fn test_split_fields() {
        let d = pg();
        let c = d.classifier();
        assert_eq!(c.split_fields("id, name ,x"), vec!["id", "name", "x"]);
        assert_eq!(
            c.split_fields(r#"'a,b' AS s, "c,d", e"#),
            vec!["'a,b' AS s", r#""c,d""#, "e"]
        );
        assert_eq!(c.split_fields(""), vec![""]);
    }

    #[test]
    fn test_quoted_checks_on_empty() {
        let d = generic();
        let c = d.classifier();
        assert!(!c.is_quoted_field(""));
        assert!(!c.is_quoted_value("   "));
        assert!(!c.is_value(""));
    }

    #[test]
    fn test_field_needs_quoted() {
        let d = generic();
        let c = d.classifier();
        assert!(!c.field_needs_quoted("user_id"));
        assert!(c.field_needs_quoted("user id"));
        assert!(c.field_needs_quoted("price-usd"));
        assert!(!c.field_needs_quoted("`user id`"));
    }

    #[test]
    fn test_is_value() {
        let d = pg();
        let c = d.classifier();
        assert!(c.is_value("TRUE"));
        assert!(c.is_value("'yes'"));
        assert!(c.is_value("'hello'"));
        assert!(c.is_value("42"));
        assert!(c.is_value("3.25"));
        assert!(c.is_value("-1e3"));
        assert!(!c.is_value("name"));
        assert!(!c.is_value("a.b"));
    }

    #[test]
    fn test_quote_field_doubles_quotes() {
        let d = pg();
        let c = d.classifier();
        assert_eq!(c.quote_field("my table"), r#""my table""#);
        assert_eq!(c.quote_field(r#"a"b"#), r#""a""b""#);
    }

    #[test]
    fn test_quote_field_is_not_idempotent_but_settles() {
        let d = generic();
        let c = d.classifier();
        for x in ["plain", "with space", "back`tick", "", "`"] {
            let once = c.quote_field(x);
            assert_ne!(c.quote_field(&once), once);
            assert!(!c.field_needs_quoted(&once));
        }
    }

    #[test]
    fn test_qualify() {
        let d = pg();
        let c = d.classifier();
        assert_eq!(c.qualify("a", "id"), "a.id");
        assert_eq!(c.qualify("a", "user id"), r#""a"."user id""#);
        assert_eq!(c.qualify("my t", r#""id""#), r#""my t"."id""#);
    }

    #[test]
    fn test_expand_table() {
        let d = generic();
        let c = d.classifier();
        assert_eq!(
            c.expand_table("languages l"),
            ("languages".to_string(), Some("l".to_string()))
        );
        assert_eq!(c.expand_table("languages"), ("languages".to_string(), None));
        assert_eq!(c.expand_table("`my table`"), ("`my table`".to_string(), None));
        assert_eq!(c.expand_table("a b c"), ("a b c".to_string(), None));
    }
}
