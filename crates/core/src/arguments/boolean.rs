use futures::FutureExt;
use futures::future::{self, BoxFuture};

use super::{ArgumentType, loaded};
use crate::context::EntryPoint;
use crate::error::{CommandError, CommandSyntaxError};
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// `true` or `false`, case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolArgument;

impl BoolArgument {
    /// A boolean argument.
    pub fn new() -> Self {
        Self
    }
}

impl ArgumentType for BoolArgument {
    type Parsed = bool;
    type Output = bool;

    fn parse(
        &self,
        _entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<bool, CommandSyntaxError> {
        reader.read_boolean()
    }

    fn load(
        &self,
        _entry: &EntryPoint,
        parsed: bool,
    ) -> BoxFuture<'static, Result<bool, CommandError>> {
        loaded(parsed)
    }

    fn list_suggestions(
        &self,
        _entry: &EntryPoint,
        builder: SuggestionsBuilder,
    ) -> BoxFuture<'static, Result<Suggestions, CommandError>> {
        let mut builder = builder;
        for word in ["true", "false"] {
            if word.starts_with(builder.remaining_lowercase()) {
                builder = builder.suggest(word);
            }
        }
        future::ready(Ok(builder.build())).boxed()
    }

    fn examples(&self) -> Vec<String> {
        vec!["true".into(), "false".into()]
    }
}
