//! Cursor-based string scanner used by every node and argument parser.
//!
//! The cursor is a byte offset that always sits on a `char` boundary. Typed
//! readers either advance past what they consumed or, on failure, leave the
//! cursor exactly where it was before the call.

use std::sync::Arc;

use crate::error::{CommandSyntaxError, Expected, SyntaxErrorKind};

const DOUBLE_QUOTE: char = '"';
const SINGLE_QUOTE: char = '\'';
const ESCAPE: char = '\\';

/// Whether `c` opens a quoted string.
pub fn is_quote(c: char) -> bool {
    c == DOUBLE_QUOTE || c == SINGLE_QUOTE
}

/// Characters that may appear in an integer token.
pub fn is_integer_char(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

/// Characters that may appear in a float token (`,` is accepted as decimal mark).
pub fn is_float_char(c: char) -> bool {
    c.is_ascii_digit() || c == '-' || c == '.' || c == ','
}

/// A mutable cursor over an immutable command string.
///
/// Cloning is cheap (the string is shared) and gives an independent cursor,
/// which is how speculative parses are isolated from each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringReader {
    string: Arc<str>,
    cursor: usize,
}

impl StringReader {
    /// Reader positioned at the start of `string`.
    pub fn new(string: impl Into<Arc<str>>) -> Self {
        Self {
            string: string.into(),
            cursor: 0,
        }
    }

    /// The full input.
    pub fn string(&self) -> &str {
        &self.string
    }

    pub(crate) fn shared_string(&self) -> Arc<str> {
        Arc::clone(&self.string)
    }

    /// Current byte offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to `position`.
    ///
    /// Fails with `InvalidCursorPosition` if `position` is past the end of the
    /// input or not on a character boundary.
    pub fn set_cursor(&mut self, position: usize) -> Result<(), CommandSyntaxError> {
        if position > self.string.len() || !self.string.is_char_boundary(position) {
            return Err(self.error(SyntaxErrorKind::InvalidCursorPosition {
                position,
                length: self.string.len(),
            }));
        }
        self.cursor = position;
        Ok(())
    }

    /// Return to a position previously obtained from [`cursor`](Self::cursor).
    ///
    /// Positions taken from this reader are always valid, so this cannot fail.
    pub fn rewind(&mut self, position: usize) {
        debug_assert!(self.string.is_char_boundary(position));
        self.cursor = position.min(self.string.len());
    }

    /// Total input length in bytes.
    pub fn total_len(&self) -> usize {
        self.string.len()
    }

    /// Bytes left after the cursor.
    pub fn remaining_len(&self) -> usize {
        self.string.len() - self.cursor
    }

    /// Text already consumed.
    pub fn read(&self) -> &str {
        &self.string[..self.cursor]
    }

    /// Text after the cursor.
    pub fn remaining(&self) -> &str {
        &self.string[self.cursor..]
    }

    /// Whether at least `n` more characters are available.
    pub fn can_read_n(&self, n: usize) -> bool {
        n == 0 || self.remaining().chars().nth(n - 1).is_some()
    }

    /// Whether at least one more character is available.
    pub fn can_read(&self) -> bool {
        self.cursor < self.string.len()
    }

    /// The character under the cursor.
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// The character `offset` characters after the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Advance past one character; no-op at the end of input.
    pub fn skip(&mut self) {
        if let Some(c) = self.peek() {
            self.cursor += c.len_utf8();
        }
    }

    /// Advance past up to `n` characters.
    pub fn skip_n(&mut self, n: usize) {
        for _ in 0..n {
            self.skip();
        }
    }

    /// Advance by `bytes`, which must land on a character boundary.
    pub(crate) fn advance(&mut self, bytes: usize) {
        self.rewind(self.cursor + bytes);
    }

    /// Read one character.
    pub fn read_char(&mut self) -> Result<char, CommandSyntaxError> {
        let Some(c) = self.peek() else {
            return Err(self.error(SyntaxErrorKind::InvalidCursorPosition {
                position: self.cursor + 1,
                length: self.string.len(),
            }));
        };
        self.cursor += c.len_utf8();
        Ok(c)
    }

    /// Consume `expected` or fail without moving.
    pub fn expect(&mut self, expected: char) -> Result<(), CommandSyntaxError> {
        if self.peek() != Some(expected) {
            return Err(self.error(SyntaxErrorKind::Expected(Expected::Character)));
        }
        self.skip();
        Ok(())
    }

    /// Greedily consume characters while `predicate` holds, returning them.
    pub fn read_while(&mut self, predicate: impl Fn(char) -> bool) -> &str {
        let start = self.cursor;
        let len = self
            .remaining()
            .char_indices()
            .find(|&(_, c)| !predicate(c))
            .map_or(self.remaining_len(), |(i, _)| i);
        self.cursor += len;
        &self.string[start..self.cursor]
    }

    /// Skip any run of whitespace.
    pub fn skip_whitespace(&mut self) {
        self.read_while(char::is_whitespace);
    }

    /// Read a signed integer.
    pub fn read_int(&mut self) -> Result<i64, CommandSyntaxError> {
        let start = self.cursor;
        let number = self.read_while(is_integer_char).to_string();
        if number.is_empty() {
            return Err(self.error(SyntaxErrorKind::Expected(Expected::Integer)));
        }
        match number.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => Err(self.fail_at(
                start,
                SyntaxErrorKind::BadValue {
                    expected: Expected::Integer,
                    value: number,
                },
            )),
        }
    }

    /// Read a float. A single `,` is accepted in place of `.`.
    pub fn read_float(&mut self) -> Result<f64, CommandSyntaxError> {
        let start = self.cursor;
        let number = self.read_while(is_float_char).to_string();
        if number.is_empty() {
            return Err(self.error(SyntaxErrorKind::Expected(Expected::Float)));
        }
        let dots = number.matches('.').count();
        let commas = number.matches(',').count();
        let bad_value = |reader: &mut Self| {
            reader.fail_at(
                start,
                SyntaxErrorKind::BadValue {
                    expected: Expected::Float,
                    value: number.clone(),
                },
            )
        };
        if dots + commas > 1 {
            return Err(bad_value(self));
        }
        match number.replace(',', ".").parse::<f64>() {
            Ok(value) if !value.is_nan() => Ok(value),
            _ => Err(bad_value(self)),
        }
    }

    /// Read up to the next whitespace.
    pub fn read_unquoted_string(&mut self) -> String {
        self.read_while(|c| !c.is_whitespace()).to_string()
    }

    /// Read a string enclosed in matching `"` or `'` quotes.
    ///
    /// Inside the quotes a backslash escapes the quote character or another
    /// backslash. Returns an empty string at the end of input.
    pub fn read_quoted_string(&mut self) -> Result<String, CommandSyntaxError> {
        let Some(quote) = self.peek() else {
            return Ok(String::new());
        };
        if !is_quote(quote) {
            return Err(self.error(SyntaxErrorKind::Expected(Expected::StartOfQuote)));
        }
        let start = self.cursor;
        self.skip();
        self.read_string_until(start, quote)
    }

    fn read_string_until(
        &mut self,
        start: usize,
        terminator: char,
    ) -> Result<String, CommandSyntaxError> {
        let mut result = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if escaped {
                if c == terminator || c == ESCAPE {
                    result.push(c);
                    escaped = false;
                } else {
                    return Err(self.fail_at(start, SyntaxErrorKind::InvalidEscape(c)));
                }
            } else if c == ESCAPE {
                escaped = true;
            } else if c == terminator {
                self.skip();
                return Ok(result);
            } else {
                result.push(c);
            }
            self.skip();
        }
        Err(self.fail_at(start, SyntaxErrorKind::MissingQuote))
    }

    /// Read a quoted string if one starts here, otherwise an unquoted one.
    pub fn read_string(&mut self) -> Result<String, CommandSyntaxError> {
        match self.peek() {
            None => Ok(String::new()),
            Some(c) if is_quote(c) => self.read_quoted_string(),
            Some(_) => Ok(self.read_unquoted_string()),
        }
    }

    /// Read `true` or `false`, case-insensitively.
    pub fn read_boolean(&mut self) -> Result<bool, CommandSyntaxError> {
        let start = self.cursor;
        let value = self.read_string()?;
        if value.is_empty() {
            return Err(self.fail_at(start, SyntaxErrorKind::Expected(Expected::Boolean)));
        }
        if value.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if value.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(self.fail_at(
                start,
                SyntaxErrorKind::BadValue {
                    expected: Expected::Boolean,
                    value,
                },
            ))
        }
    }

    /// Error pointing at the current cursor.
    pub fn error(&self, kind: SyntaxErrorKind) -> CommandSyntaxError {
        CommandSyntaxError::with_context(kind, self.shared_string(), self.cursor)
    }

    /// Error pointing at `position`.
    pub fn error_at(&self, position: usize, kind: SyntaxErrorKind) -> CommandSyntaxError {
        CommandSyntaxError::with_context(kind, self.shared_string(), position)
    }

    /// Build an error at the current cursor, then rewind to `start`.
    fn fail_at(&mut self, start: usize, kind: SyntaxErrorKind) -> CommandSyntaxError {
        let err = self.error(kind);
        self.rewind(start);
        err
    }
}

impl From<&str> for StringReader {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
