use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{CommandContext, EntryPoint, ParsedArgument, ParsedCommandNode};
use crate::error::{CommandSyntaxError, SyntaxErrorKind};
use crate::range::StringRange;
use crate::tree::{Command, NodeId, RedirectModifier};

/// Where completion should happen: the children of `parent`, replacing text
/// from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionContext {
    /// Node whose children are asked for suggestions.
    pub parent: NodeId,
    /// Byte offset the suggestions replace from.
    pub start: usize,
}

/// Accumulates what a parse matched while descending the tree.
///
/// Cloned before every sibling attempt so a failed branch leaves the
/// original untouched.
pub struct CommandContextBuilder<S> {
    source: S,
    entry: EntryPoint,
    root: NodeId,
    arguments: BTreeMap<String, ParsedArgument>,
    nodes: Vec<ParsedCommandNode>,
    range: StringRange,
    command: Option<Command<S>>,
    child: Option<Box<CommandContextBuilder<S>>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S: Clone> Clone for CommandContextBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            entry: self.entry.clone(),
            root: self.root,
            arguments: self.arguments.clone(),
            nodes: self.nodes.clone(),
            range: self.range,
            command: self.command.as_ref().map(Arc::clone),
            child: self.child.clone(),
            modifier: self.modifier.as_ref().map(Arc::clone),
            forks: self.forks,
        }
    }
}

impl<S> fmt::Debug for CommandContextBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContextBuilder")
            .field("root", &self.root)
            .field("nodes", &self.nodes)
            .field("arguments", &self.arguments.keys().collect::<Vec<_>>())
            .field("range", &self.range)
            .field("executable", &self.command.is_some())
            .field("child", &self.child)
            .field("forks", &self.forks)
            .finish_non_exhaustive()
    }
}

impl<S: Clone> CommandContextBuilder<S> {
    /// Empty builder starting at `start`, with parsing rooted at `root`.
    pub fn new(source: S, entry: EntryPoint, root: NodeId, start: usize) -> Self {
        Self {
            source,
            entry,
            root,
            arguments: BTreeMap::new(),
            nodes: Vec::new(),
            range: StringRange::at(start),
            command: None,
            child: None,
            modifier: None,
            forks: false,
        }
    }

    /// The source the command runs as.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Replace the source.
    pub fn with_source(&mut self, source: S) -> &mut Self {
        self.source = source;
        self
    }

    /// Ambient parse data.
    pub fn entry_point(&self) -> &EntryPoint {
        &self.entry
    }

    /// Node parsing started from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Input span matched so far.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Nodes matched so far, in input order.
    pub fn nodes(&self) -> &[ParsedCommandNode] {
        &self.nodes
    }

    /// Arguments matched so far.
    pub fn arguments(&self) -> &BTreeMap<String, ParsedArgument> {
        &self.arguments
    }

    /// The command of the last matched node, if it has one.
    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    /// Context continuing after a redirect.
    pub fn child(&self) -> Option<&CommandContextBuilder<S>> {
        self.child.as_deref()
    }

    /// Innermost context in the redirect chain.
    pub fn last_child(&self) -> &CommandContextBuilder<S> {
        let mut current = self;
        while let Some(child) = current.child.as_deref() {
            current = child;
        }
        current
    }

    pub(crate) fn with_argument(&mut self, name: String, argument: ParsedArgument) -> &mut Self {
        self.arguments.insert(name, argument);
        self
    }

    pub(crate) fn with_command(&mut self, command: Option<Command<S>>) -> &mut Self {
        self.command = command;
        self
    }

    pub(crate) fn with_node(
        &mut self,
        node: NodeId,
        range: StringRange,
        modifier: Option<RedirectModifier<S>>,
        forks: bool,
    ) -> &mut Self {
        self.nodes.push(ParsedCommandNode { node, range });
        self.range = StringRange::encompassing(self.range, range);
        self.modifier = modifier;
        self.forks = forks;
        self
    }

    pub(crate) fn with_child(&mut self, child: CommandContextBuilder<S>) -> &mut Self {
        self.child = Some(Box::new(child));
        self
    }

    /// Freeze into a [`CommandContext`] over `input`.
    pub fn build(&self, input: &str) -> CommandContext<S> {
        self.build_shared(Arc::from(input))
    }

    fn build_shared(&self, input: Arc<str>) -> CommandContext<S> {
        let child = self
            .child
            .as_ref()
            .map(|child| Arc::new(child.build_shared(Arc::clone(&input))));
        CommandContext {
            source: self.source.clone(),
            input,
            entry: self.entry.clone(),
            arguments: Arc::new(self.arguments.clone()),
            loaded: Arc::new(BTreeMap::new()),
            command: self.command.as_ref().map(Arc::clone),
            root: self.root,
            nodes: Arc::from(self.nodes.as_slice()),
            range: self.range,
            child,
            modifier: self.modifier.as_ref().map(Arc::clone),
            forks: self.forks,
        }
    }

    /// Find which node's children should complete the input at `cursor`.
    ///
    /// `separator_len` is the byte length of the argument separator that
    /// follows the last matched node.
    pub fn find_suggestion_context(
        &self,
        cursor: usize,
        separator_len: usize,
    ) -> Result<SuggestionContext, CommandSyntaxError> {
        if self.range.start() > cursor {
            return Err(self.cursor_error(cursor));
        }
        if self.range.end() < cursor {
            if let Some(child) = &self.child {
                return child.find_suggestion_context(cursor, separator_len);
            }
            return Ok(match self.nodes.last() {
                Some(last) => SuggestionContext {
                    parent: last.node,
                    start: last.range.end() + separator_len,
                },
                None => SuggestionContext {
                    parent: self.root,
                    start: self.range.start(),
                },
            });
        }
        let mut previous = self.root;
        for parsed in &self.nodes {
            if parsed.range.start() <= cursor && cursor <= parsed.range.end() {
                return Ok(SuggestionContext {
                    parent: previous,
                    start: parsed.range.start(),
                });
            }
            previous = parsed.node;
        }
        Ok(SuggestionContext {
            parent: previous,
            start: self.range.start(),
        })
    }

    fn cursor_error(&self, cursor: usize) -> CommandSyntaxError {
        CommandSyntaxError::new(SyntaxErrorKind::InvalidCursorPosition {
            position: cursor,
            length: self.range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with(nodes: &[(u32, usize, usize)]) -> CommandContextBuilder<()> {
        let mut builder = CommandContextBuilder::new((), EntryPoint::default(), NodeId::ROOT, 0);
        for &(id, start, end) in nodes {
            builder.with_node(NodeId(id), StringRange::new(start, end), None, false);
        }
        builder
    }

    #[test]
    fn range_grows_with_nodes() {
        let builder = builder_with(&[(1, 0, 3), (2, 4, 7)]);
        assert_eq!(builder.range(), StringRange::new(0, 7));
        assert_eq!(builder.nodes().len(), 2);
    }

    #[test]
    fn cursor_past_end_completes_children_of_last_node() {
        let builder = builder_with(&[(1, 0, 1)]);
        let ctx = builder.find_suggestion_context(2, 1).unwrap();
        assert_eq!(ctx, SuggestionContext { parent: NodeId(1), start: 2 });
    }

    #[test]
    fn cursor_inside_node_completes_its_siblings() {
        let builder = builder_with(&[(1, 0, 3), (2, 4, 7)]);
        let ctx = builder.find_suggestion_context(5, 1).unwrap();
        assert_eq!(ctx, SuggestionContext { parent: NodeId(1), start: 4 });
        let ctx = builder.find_suggestion_context(0, 1).unwrap();
        assert_eq!(ctx, SuggestionContext { parent: NodeId::ROOT, start: 0 });
    }

    #[test]
    fn empty_builder_completes_root() {
        let builder = builder_with(&[]);
        let ctx = builder.find_suggestion_context(0, 1).unwrap();
        assert_eq!(ctx, SuggestionContext { parent: NodeId::ROOT, start: 0 });
    }

    #[test]
    fn cursor_before_range_is_invalid() {
        let builder = CommandContextBuilder::new((), EntryPoint::default(), NodeId::ROOT, 4);
        let err = builder.find_suggestion_context(1, 1).unwrap_err();
        assert!(matches!(
            err.kind(),
            SyntaxErrorKind::InvalidCursorPosition { .. }
        ));
    }

    #[test]
    fn last_child_follows_redirect_chain() {
        let mut outer = builder_with(&[(1, 0, 3)]);
        let inner = CommandContextBuilder::new((), EntryPoint::default(), NodeId(5), 4);
        outer.with_child(inner);
        assert_eq!(outer.last_child().root(), NodeId(5));
        let ctx = outer.find_suggestion_context(6, 1).unwrap();
        assert_eq!(ctx, SuggestionContext { parent: NodeId(5), start: 4 });
    }
}
