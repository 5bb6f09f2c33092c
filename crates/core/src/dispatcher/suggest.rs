use tracing::debug;

use super::{Dispatcher, ParseResults};
use crate::error::{CommandSyntaxError, SyntaxErrorKind};
use crate::suggestion::{Suggestions, SuggestionsBuilder};
use crate::tree::CommandSource;

impl<S: CommandSource> Dispatcher<S> {
    /// Completions for the input of `parse` with the caret at byte `cursor`.
    ///
    /// Every usable child of the node before the cursor contributes; a
    /// provider that fails is skipped so the others still complete.
    pub async fn completion_suggestions(
        &self,
        parse: &ParseResults<S>,
        cursor: usize,
    ) -> Result<Suggestions, CommandSyntaxError> {
        let full_input = parse.reader.string();
        if cursor > full_input.len() || !full_input.is_char_boundary(cursor) {
            return Err(CommandSyntaxError::new(
                SyntaxErrorKind::InvalidCursorPosition {
                    position: cursor,
                    length: full_input.len(),
                },
            ));
        }

        let separator_len = self.config.argument_separator.len_utf8();
        let found = parse.context.find_suggestion_context(cursor, separator_len)?;
        let start = found.start.min(cursor);
        let truncated = &full_input[..cursor];
        let context = parse.context.build(truncated);
        let source = parse.context.source();

        let mut batches = Vec::new();
        for &child in self.tree.node(found.parent).children() {
            if !self.tree.can_use(child, source) {
                continue;
            }
            let builder = SuggestionsBuilder::new(truncated, start);
            let listed = self
                .tree
                .list_suggestions(child, context.clone(), builder, self.config.suggest_aliases)
                .await;
            match listed {
                Ok(suggestions) => batches.push(suggestions),
                Err(err) => debug!(node = %child, error = %err, "suggestion provider failed"),
            }
        }
        Ok(Suggestions::merge(full_input, &batches))
    }
}
