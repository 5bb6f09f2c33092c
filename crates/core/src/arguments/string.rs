use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::{ArgumentType, loaded};
use crate::context::EntryPoint;
use crate::error::{CommandError, CommandSyntaxError, Expected, SyntaxErrorKind};
use crate::reader::{StringReader, is_quote};

/// How much input a string argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMode {
    /// One unquoted token.
    #[default]
    SingleWord,
    /// One quoted or unquoted token.
    QuotablePhrase,
    /// Everything up to the end of input.
    GreedyPhrase,
}

impl StringMode {
    /// Read one value in this mode. Fails without moving the cursor.
    pub fn read(self, reader: &mut StringReader) -> Result<String, CommandSyntaxError> {
        match self {
            StringMode::SingleWord => {
                let word = reader.read_unquoted_string();
                if word.is_empty() {
                    return Err(reader.error(SyntaxErrorKind::Expected(Expected::Word)));
                }
                Ok(word)
            }
            StringMode::QuotablePhrase => {
                let start = reader.cursor();
                let text = reader.read_string()?;
                if reader.cursor() == start {
                    return Err(reader.error(SyntaxErrorKind::Expected(Expected::Word)));
                }
                Ok(text)
            }
            StringMode::GreedyPhrase => {
                let text = reader.remaining().to_string();
                reader.advance(text.len());
                Ok(text)
            }
        }
    }

    fn examples(self) -> &'static [&'static str] {
        match self {
            StringMode::SingleWord => &["word", "words_with_underscores"],
            StringMode::QuotablePhrase => &["\"quoted phrase\"", "word", "\"\""],
            StringMode::GreedyPhrase => &["word", "words with spaces", "\"and symbols\""],
        }
    }
}

/// A string argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringArgument {
    mode: StringMode,
}

impl StringArgument {
    /// A string argument reading in `mode`.
    pub fn new(mode: StringMode) -> Self {
        Self { mode }
    }

    /// One unquoted word.
    pub fn word() -> Self {
        Self::new(StringMode::SingleWord)
    }

    /// One quoted or unquoted token.
    pub fn string() -> Self {
        Self::new(StringMode::QuotablePhrase)
    }

    /// The rest of the input.
    pub fn greedy() -> Self {
        Self::new(StringMode::GreedyPhrase)
    }

    /// The configured mode.
    pub fn mode(&self) -> StringMode {
        self.mode
    }
}

impl ArgumentType for StringArgument {
    type Parsed = String;
    type Output = String;

    fn parse(
        &self,
        _entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<String, CommandSyntaxError> {
        self.mode.read(reader)
    }

    fn load(
        &self,
        _entry: &EntryPoint,
        parsed: String,
    ) -> BoxFuture<'static, Result<String, CommandError>> {
        loaded(parsed)
    }

    fn examples(&self) -> Vec<String> {
        self.mode.examples().iter().map(|s| (*s).to_string()).collect()
    }
}

/// Quote `input` if it would not survive being read back as a single token.
pub fn escape_if_required(input: &str) -> String {
    let needs_quotes = input.is_empty()
        || input
            .chars()
            .any(|c| c.is_whitespace() || is_quote(c) || c == '\\');
    if !needs_quotes {
        return input.to_string();
    }
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('"');
    for c in input.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('"');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(mode: StringMode, input: &str) -> (Result<String, CommandSyntaxError>, usize) {
        let mut reader = StringReader::new(input);
        let result = StringArgument::new(mode).parse(&EntryPoint::default(), &mut reader);
        (result, reader.cursor())
    }

    #[test]
    fn word_stops_at_space() {
        let (value, cursor) = read(StringMode::SingleWord, "hello world");
        assert_eq!(value.unwrap(), "hello");
        assert_eq!(cursor, 5);
    }

    #[test]
    fn empty_word_is_expected() {
        let (value, cursor) = read(StringMode::SingleWord, " x");
        assert_eq!(
            value.unwrap_err().kind(),
            &SyntaxErrorKind::Expected(Expected::Word)
        );
        assert_eq!(cursor, 0);
    }

    #[test]
    fn quotable_reads_quoted_phrase() {
        let (value, cursor) = read(StringMode::QuotablePhrase, "\"hello world\" x");
        assert_eq!(value.unwrap(), "hello world");
        assert_eq!(cursor, 13);
    }

    #[test]
    fn quotable_accepts_empty_quotes() {
        let (value, _) = read(StringMode::QuotablePhrase, "\"\"");
        assert_eq!(value.unwrap(), "");
    }

    #[test]
    fn greedy_takes_everything() {
        let (value, cursor) = read(StringMode::GreedyPhrase, "hello \"world\" !");
        assert_eq!(value.unwrap(), "hello \"world\" !");
        assert_eq!(cursor, 15);
    }

    #[test]
    fn escape_round_trips_through_quotable() {
        for raw in ["plain", "two words", "with \"quotes\"", "back\\slash", ""] {
            let escaped = escape_if_required(raw);
            let (value, _) = read(StringMode::QuotablePhrase, &escaped);
            assert_eq!(value.unwrap(), raw, "escaped as {escaped}");
        }
    }
}
