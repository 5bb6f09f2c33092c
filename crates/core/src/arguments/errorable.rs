use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{ArgumentType, StringMode, loaded};
use crate::context::EntryPoint;
use crate::error::{CommandError, CommandSyntaxError};
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// Parse result of an [`ErrorableArgument`].
#[derive(Debug, Clone)]
pub enum Errorable<P> {
    /// The wrapped type parsed `raw`.
    Parsed {
        /// Parse result of the wrapped type.
        value: P,
        /// Input text consumed.
        raw: String,
    },
    /// The wrapped type failed and the fallback captured `raw` instead.
    Failed {
        /// Input text captured by the fallback.
        raw: String,
        /// Why the wrapped type rejected it.
        error: CommandSyntaxError,
    },
}

impl<P> Errorable<P> {
    /// Input text covered by this argument.
    pub fn raw(&self) -> &str {
        match self {
            Errorable::Parsed { raw, .. } | Errorable::Failed { raw, .. } => raw,
        }
    }
}

/// Loaded value of an [`ErrorableArgument`].
#[derive(Debug, Clone)]
pub struct ErrorableValue<T> {
    value: Option<T>,
    raw: String,
    error: Option<CommandSyntaxError>,
}

impl<T> ErrorableValue<T> {
    /// The loaded value, or `None` if the wrapped type failed to parse.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Take the loaded value.
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Input text covered by this argument.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parse failure, if any.
    pub fn error(&self) -> Option<&CommandSyntaxError> {
        self.error.as_ref()
    }
}

/// Tries the wrapped type and, if it fails, captures the same span as a
/// plain string so the command still runs and can report the problem.
#[derive(Debug)]
pub struct ErrorableArgument<A> {
    inner: Arc<A>,
    fallback: StringMode,
}

impl<A> Clone for ErrorableArgument<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            fallback: self.fallback,
        }
    }
}

impl<A: ArgumentType> ErrorableArgument<A> {
    /// Wrap `inner`, falling back to a single word.
    pub fn new(inner: A) -> Self {
        Self {
            inner: Arc::new(inner),
            fallback: StringMode::SingleWord,
        }
    }

    /// Capture failed input with `mode` instead.
    pub fn fallback(mut self, mode: StringMode) -> Self {
        self.fallback = mode;
        self
    }
}

impl<A: ArgumentType> ArgumentType for ErrorableArgument<A> {
    type Parsed = Errorable<A::Parsed>;
    type Output = ErrorableValue<A::Output>;

    fn parse(
        &self,
        entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<Self::Parsed, CommandSyntaxError> {
        let start = reader.cursor();
        let error = match self.inner.parse(entry, reader) {
            Ok(value) => {
                let raw = reader.string()[start..reader.cursor()].to_string();
                return Ok(Errorable::Parsed { value, raw });
            }
            Err(error) => error,
        };
        reader.rewind(start);
        if self.fallback.read(reader).is_err() {
            reader.rewind(start);
            return Err(error);
        }
        let raw = reader.string()[start..reader.cursor()].to_string();
        Ok(Errorable::Failed { raw, error })
    }

    fn load(
        &self,
        entry: &EntryPoint,
        parsed: Self::Parsed,
    ) -> BoxFuture<'static, Result<Self::Output, CommandError>> {
        match parsed {
            Errorable::Parsed { value, raw } => self
                .inner
                .load(entry, value)
                .map(|result| {
                    result.map(|value| ErrorableValue {
                        value: Some(value),
                        raw,
                        error: None,
                    })
                })
                .boxed(),
            Errorable::Failed { raw, error } => loaded(ErrorableValue {
                value: None,
                raw,
                error: Some(error),
            }),
        }
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
