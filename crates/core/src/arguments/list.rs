use std::collections::HashSet;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::ArgumentType;
use crate::context::EntryPoint;
use crate::error::{
    CommandError, CommandSyntaxError, Expected, RangeError, RangeViolation, SyntaxErrorKind,
};
use crate::reader::{StringReader, is_quote};
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// Separator-delimited values of another argument type.
///
/// Elements end at the separator or at whitespace, so a list stops at the
/// first space that is not right after a separator:
///
/// ```
/// use cmdgraph_core::{ArgumentType, EntryPoint, ListArgument, StringArgument, StringReader};
///
/// let list = ListArgument::new(StringArgument::greedy()).count(1, 20);
/// let mut reader = StringReader::new("Hello, world! tail");
/// let parsed = list.parse(&EntryPoint::default(), &mut reader).unwrap();
/// assert_eq!(parsed, ["Hello", "world!"]);
/// assert_eq!(reader.remaining(), " tail");
/// ```
#[derive(Debug)]
pub struct ListArgument<A> {
    inner: Arc<A>,
    separator: char,
    min: usize,
    max: usize,
    unique: bool,
}

impl<A> Clone for ListArgument<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            separator: self.separator,
            min: self.min,
            max: self.max,
            unique: self.unique,
        }
    }
}

impl<A: ArgumentType> ListArgument<A> {
    /// A comma-separated list of at least one `inner` value.
    pub fn new(inner: A) -> Self {
        Self {
            inner: Arc::new(inner),
            separator: ',',
            min: 1,
            max: usize::MAX,
            unique: false,
        }
    }

    /// Use `separator` between elements.
    pub fn separated_by(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Require between `min` and `max` elements (inclusive).
    pub fn count(mut self, min: usize, max: usize) -> Self {
        self.min = min.max(1);
        self.max = max.max(self.min);
        self
    }

    /// Drop elements whose text repeats an earlier element.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// The element separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    fn length_error(&self, violation: RangeViolation, actual: usize) -> SyntaxErrorKind {
        SyntaxErrorKind::OutOfRange(RangeError {
            what: "list length",
            violation,
            min: self.min.to_string(),
            max: self.max.to_string(),
            actual: actual.to_string(),
        })
    }

    /// Byte length of the element token at the cursor.
    fn element_len(&self, reader: &StringReader) -> Result<usize, CommandSyntaxError> {
        if reader.peek().is_some_and(is_quote) {
            let mut lookahead = reader.clone();
            lookahead.read_quoted_string()?;
            return Ok(lookahead.cursor() - reader.cursor());
        }
        let separator = self.separator;
        Ok(reader
            .remaining()
            .char_indices()
            .find(|&(_, c)| c == separator || c.is_whitespace())
            .map_or(reader.remaining_len(), |(i, _)| i))
    }

    fn parse_elements(
        &self,
        entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<Vec<A::Parsed>, CommandSyntaxError> {
        let mut values = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let element_start = reader.cursor();
            let len = self.element_len(reader)?;
            if len == 0 {
                let kind = if values.is_empty() && seen.is_empty() {
                    SyntaxErrorKind::Expected(Expected::ListElement)
                } else {
                    SyntaxErrorKind::BadSeparator(format!(
                        "expected a list element after '{}'",
                        self.separator
                    ))
                };
                return Err(reader.error(kind));
            }
            let token = reader.remaining()[..len].to_string();
            let mut element = StringReader::new(token.as_str());
            let value = self
                .inner
                .parse(entry, &mut element)
                .map_err(|err| {
                    reader.error_at(element_start + err.cursor().unwrap_or(0), err.kind().clone())
                })?;
            if element.can_read() {
                return Err(reader.error_at(
                    element_start + element.cursor(),
                    SyntaxErrorKind::BadSeparator(format!(
                        "expected '{}' between list elements",
                        self.separator
                    )),
                ));
            }
            reader.advance(len);
            if !self.unique || seen.insert(token) {
                values.push(value);
            }

            if reader.peek() != Some(self.separator) {
                break;
            }
            if values.len() >= self.max {
                let error = self.length_error(RangeViolation::TooHigh, values.len() + 1);
                return Err(reader.error(error));
            }
            reader.skip();
            while reader.peek() == Some(' ') && self.separator != ' ' {
                reader.skip();
            }
        }
        if values.len() < self.min {
            return Err(reader.error(self.length_error(RangeViolation::TooLow, values.len())));
        }
        Ok(values)
    }
}

impl<A: ArgumentType> ArgumentType for ListArgument<A> {
    type Parsed = Vec<A::Parsed>;
    type Output = Vec<A::Output>;

    fn parse(
        &self,
        entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<Self::Parsed, CommandSyntaxError> {
        let start = reader.cursor();
        let result = self.parse_elements(entry, reader);
        if result.is_err() {
            reader.rewind(start);
        }
        result
    }

    fn load(
        &self,
        entry: &EntryPoint,
        parsed: Self::Parsed,
    ) -> BoxFuture<'static, Result<Self::Output, CommandError>> {
        let inner = Arc::clone(&self.inner);
        let entry = entry.clone();
        async move {
            let mut values = Vec::with_capacity(parsed.len());
            for element in parsed {
                values.push(inner.load(&entry, element).await?);
            }
            Ok(values)
        }
        .boxed()
    }

    fn list_suggestions(
        &self,
        entry: &EntryPoint,
        builder: SuggestionsBuilder,
    ) -> BoxFuture<'static, Result<Suggestions, CommandError>> {
        let remaining = builder.remaining();
        let offset = match remaining.rfind(self.separator) {
            Some(i) => {
                let after = &remaining[i + self.separator.len_utf8()..];
                let spaces = after.len() - after.trim_start_matches(' ').len();
                builder.start() + i + self.separator.len_utf8() + spaces
            }
            None => builder.start(),
        };
        self.inner.list_suggestions(entry, builder.create_offset(offset))
    }

    fn examples(&self) -> Vec<String> {
        let separator = self.separator;
        let elements: Vec<String> = self
            .inner
            .examples()
            .into_iter()
            .filter(|e| !e.is_empty() && !e.contains(|c: char| c == separator || c.is_whitespace()))
            .collect();
        let mut examples = Vec::new();
        if self.min <= 1 {
            examples.extend(elements.iter().take(2).cloned());
        }
        if elements.len() >= 2 && self.min <= 2 && self.max >= 2 {
            examples.push(format!("{}{separator}{}", elements[0], elements[1]));
        }
        examples
    }
}
