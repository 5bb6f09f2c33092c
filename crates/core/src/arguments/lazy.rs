use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{ArgumentType, StringMode, loaded};
use crate::context::EntryPoint;
use crate::error::{CommandError, CommandSyntaxError, SyntaxErrorKind};
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

type Resolver<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, CommandError>> + Send + Sync>;

/// A captured argument whose parse and load run only when asked.
pub struct Lazy<T> {
    raw: String,
    resolver: Resolver<T>,
}

impl<T> Lazy<T> {
    /// The captured input text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parse and load the captured text. Each call resolves again.
    pub fn resolve(&self) -> BoxFuture<'static, Result<T, CommandError>> {
        (self.resolver)()
    }
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy").field("raw", &self.raw).finish_non_exhaustive()
    }
}

/// Captures a span of input now and defers the wrapped type until
/// [`Lazy::resolve`] is awaited.
#[derive(Debug)]
pub struct LazyArgument<A> {
    inner: Arc<A>,
    capture: StringMode,
}

impl<A> Clone for LazyArgument<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            capture: self.capture,
        }
    }
}

impl<A: ArgumentType> LazyArgument<A> {
    /// Defer `inner`, capturing a single word.
    pub fn new(inner: A) -> Self {
        Self {
            inner: Arc::new(inner),
            capture: StringMode::SingleWord,
        }
    }

    /// Capture the raw text with `mode` instead.
    pub fn capture(mut self, mode: StringMode) -> Self {
        self.capture = mode;
        self
    }
}

impl<A: ArgumentType> ArgumentType for LazyArgument<A> {
    type Parsed = String;
    type Output = Lazy<A::Output>;

    fn parse(
        &self,
        _entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<String, CommandSyntaxError> {
        let start = reader.cursor();
        self.capture.read(reader)?;
        Ok(reader.string()[start..reader.cursor()].to_string())
    }

    fn load(
        &self,
        entry: &EntryPoint,
        parsed: String,
    ) -> BoxFuture<'static, Result<Self::Output, CommandError>> {
        let inner = Arc::clone(&self.inner);
        let entry = entry.clone();
        let raw = parsed.clone();
        let resolver: Resolver<A::Output> = Arc::new(move || {
            let mut reader = StringReader::new(raw.as_str());
            let parsed = match inner.parse(&entry, &mut reader) {
                Ok(_) if reader.can_read() => {
                    let err = reader.error(SyntaxErrorKind::ExpectedSeparator);
                    return futures::future::ready(Err(CommandError::from(err))).boxed();
                }
                Ok(parsed) => parsed,
                Err(err) => return futures::future::ready(Err(CommandError::from(err))).boxed(),
            };
            inner.load(&entry, parsed)
        });
        loaded(Lazy {
            raw: parsed,
            resolver,
        })
    }

    fn list_suggestions(
        &self,
        entry: &EntryPoint,
        builder: SuggestionsBuilder,
    ) -> BoxFuture<'static, Result<Suggestions, CommandError>> {
        self.inner.list_suggestions(entry, builder)
    }

    fn examples(&self) -> Vec<String> {
        self.inner.examples()
    }
}
