//! Pluggable argument types.
//!
//! An [`ArgumentType`] turns text at the reader's cursor into a parse result
//! (synchronously, without I/O) and later loads that result into its final
//! value (asynchronously, possibly with side effects). The built-in types
//! cover booleans, bounded numbers, strings, lists, and two wrappers that
//! defer or tolerate failures of another type.

/// Boolean argument.
pub mod boolean;
/// Argument wrapper that keeps going when the inner type fails to parse.
pub mod errorable;
/// Argument wrapper that defers parsing and loading until asked.
pub mod lazy;
/// Separator-delimited lists of another argument type.
pub mod list;
/// Bounded integer and float arguments.
pub mod number;
/// Word, quotable phrase, and greedy phrase arguments.
pub mod string;

pub use boolean::BoolArgument;
pub use errorable::{Errorable, ErrorableArgument, ErrorableValue};
pub use lazy::{Lazy, LazyArgument};
pub use list::ListArgument;
pub use number::{FloatArgument, IntegerArgument, Number, NumberArgument};
pub use string::{StringArgument, StringMode, escape_if_required};

use std::any::type_name;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};

use crate::context::{AnyValue, EntryPoint};
use crate::error::{CommandError, CommandSyntaxError};
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// How a typed argument is parsed, loaded, and completed.
///
/// Implementations must leave the reader's cursor where it was when
/// [`parse`](Self::parse) fails, so that sibling nodes see a clean reader.
pub trait ArgumentType: Send + Sync + 'static {
    /// Result of the syntactic parse.
    type Parsed: Clone + Send + Sync + 'static;
    /// Final value handed to commands.
    type Output: Send + Sync + 'static;

    /// Read this argument at the reader's cursor.
    fn parse(
        &self,
        entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<Self::Parsed, CommandSyntaxError>;

    /// Resolve a parse result into the value commands see.
    fn load(
        &self,
        entry: &EntryPoint,
        parsed: Self::Parsed,
    ) -> BoxFuture<'static, Result<Self::Output, CommandError>>;

    /// Completions for the partial token in `builder`.
    ///
    /// Defaults to the [`examples`](Self::examples) that start with what was
    /// typed, ignoring case.
    fn list_suggestions(
        &self,
        _entry: &EntryPoint,
        builder: SuggestionsBuilder,
    ) -> BoxFuture<'static, Result<Suggestions, CommandError>> {
        let examples = self.examples();
        let builder = examples
            .into_iter()
            .filter(|example| builder.matches(example))
            .fold(builder.restart(), SuggestionsBuilder::suggest);
        future::ready(Ok(builder.build())).boxed()
    }

    /// Representative valid inputs, used for default completions and
    /// ambiguity detection.
    fn examples(&self) -> Vec<String> {
        Vec::new()
    }
}

/// An already-resolved load result, for types whose parse result is final.
pub fn loaded<T: Send + 'static>(value: T) -> BoxFuture<'static, Result<T, CommandError>> {
    future::ready(Ok(value)).boxed()
}

/// Object-safe view of an [`ArgumentType`] with its values erased.
pub(crate) trait ErasedArgument: Send + Sync {
    fn parse(
        &self,
        entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<AnyValue, CommandSyntaxError>;

    fn load(
        &self,
        entry: &EntryPoint,
        name: &str,
        parsed: &AnyValue,
    ) -> BoxFuture<'static, Result<AnyValue, CommandError>>;

    fn list_suggestions(
        &self,
        entry: &EntryPoint,
        builder: SuggestionsBuilder,
    ) -> BoxFuture<'static, Result<Suggestions, CommandError>>;

    fn examples(&self) -> Vec<String>;
}

impl<A: ArgumentType> ErasedArgument for A {
    fn parse(
        &self,
        entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<AnyValue, CommandSyntaxError> {
        let parsed = ArgumentType::parse(self, entry, reader)?;
        Ok(Arc::new(parsed))
    }

    fn load(
        &self,
        entry: &EntryPoint,
        name: &str,
        parsed: &AnyValue,
    ) -> BoxFuture<'static, Result<AnyValue, CommandError>> {
        let Some(parsed) = parsed.downcast_ref::<A::Parsed>() else {
            return future::ready(Err(CommandError::ArgumentTypeMismatch {
                name: name.to_string(),
                expected: type_name::<A::Parsed>(),
            }))
            .boxed();
        };
        ArgumentType::load(self, entry, parsed.clone())
            .map(|result| result.map(|value| Arc::new(value) as AnyValue))
            .boxed()
    }

    fn list_suggestions(
        &self,
        entry: &EntryPoint,
        builder: SuggestionsBuilder,
    ) -> BoxFuture<'static, Result<Suggestions, CommandError>> {
        ArgumentType::list_suggestions(self, entry, builder)
    }

    fn examples(&self) -> Vec<String> {
        ArgumentType::examples(self)
    }
}

/// Whether `input` parses as `argument` up to the end or a space.
pub(crate) fn accepts(argument: &dyn ErasedArgument, input: &str, separator: char) -> bool {
    let mut reader = StringReader::new(input);
    match argument.parse(&EntryPoint::default(), &mut reader) {
        Ok(_) => !reader.can_read() || reader.peek() == Some(separator),
        Err(_) => false,
    }
}
