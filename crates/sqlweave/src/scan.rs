//! Quote-aware character scanning.
//!
//! The scanner walks a string and reports, for every character, whether it sits
//! inside a field-quoted span (`"col"` / `` `col` ``), a value-quoted span
//! (`'text'`), or neither. A quote character only opens a span when the other
//! kind of span is not already open, and spans never nest. The quote characters
//! themselves are reported as part of the span they open or close.

use std::str::CharIndices;

/// Quote state of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteState {
    Unquoted,
    Field,
    Value,
}

impl QuoteState {
    /// Inside either kind of quoted span.
    pub fn is_quoted(self) -> bool {
        self != QuoteState::Unquoted
    }
}

/// Streaming scanner yielding `(byte_index, char, state)`.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    chars: CharIndices<'a>,
    field_quote: char,
    value_quote: char,
    state: QuoteState,
}

impl<'a> Scanner<'a> {
    /// Scan `text` with the given quote characters.
    pub fn new(text: &'a str, field_quote: char, value_quote: char) -> Self {
        Self {
            chars: text.char_indices(),
            field_quote,
            value_quote,
            state: QuoteState::Unquoted,
        }
    }

    /// Only the characters outside of any quoted span.
    pub fn unquoted(self) -> impl Iterator<Item = (usize, char)> + 'a {
        self.filter(|(_, _, state)| !state.is_quoted())
            .map(|(idx, ch, _)| (idx, ch))
    }
}

impl Iterator for Scanner<'_> {
    type Item = (usize, char, QuoteState);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, ch) = self.chars.next()?;
        let state = match self.state {
            QuoteState::Unquoted if ch == self.field_quote => {
                self.state = QuoteState::Field;
                QuoteState::Field
            }
            QuoteState::Unquoted if ch == self.value_quote => {
                self.state = QuoteState::Value;
                QuoteState::Value
            }
            QuoteState::Unquoted => QuoteState::Unquoted,
            QuoteState::Field => {
                if ch == self.field_quote {
                    self.state = QuoteState::Unquoted;
                }
                QuoteState::Field
            }
            QuoteState::Value => {
                if ch == self.value_quote {
                    self.state = QuoteState::Unquoted;
                }
                QuoteState::Value
            }
        };
        Some((idx, ch, state))
    }
}

/// Quote state for every character of `text`, in order.
pub fn scan(text: &str, field_quote: char, value_quote: char) -> Vec<QuoteState> {
    Scanner::new(text, field_quote, value_quote)
        .map(|(_, _, state)| state)
        .collect()
}
