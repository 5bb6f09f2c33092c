//! Parse contexts: what a parse matched, and the frozen view commands see.

mod builder;
mod entry;

pub use builder::{CommandContextBuilder, SuggestionContext};
pub use entry::{AnyValue, ContextKey, EntryPoint};

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::arguments::ErasedArgument;
use crate::error::CommandError;
use crate::range::StringRange;
use crate::tree::{Command, NodeId, RedirectModifier};

/// A node matched during parsing and the input it covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedCommandNode {
    /// The matched node.
    pub node: NodeId,
    /// The input it covered.
    pub range: StringRange,
}

/// An argument's parse result and the input it covered.
#[derive(Clone)]
pub struct ParsedArgument {
    range: StringRange,
    parsed: AnyValue,
    argument: Arc<dyn ErasedArgument>,
}

impl ParsedArgument {
    pub(crate) fn new(
        range: StringRange,
        parsed: AnyValue,
        argument: Arc<dyn ErasedArgument>,
    ) -> Self {
        Self {
            range,
            parsed,
            argument,
        }
    }

    /// The input this argument covered.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// The parse result, if it has type `P`.
    pub fn parsed<P: 'static>(&self) -> Option<&P> {
        self.parsed.downcast_ref::<P>()
    }
}

impl fmt::Debug for ParsedArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedArgument")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// The immutable context a command (or redirect modifier) runs with.
pub struct CommandContext<S> {
    source: S,
    input: Arc<str>,
    entry: EntryPoint,
    arguments: Arc<BTreeMap<String, ParsedArgument>>,
    loaded: Arc<BTreeMap<String, AnyValue>>,
    command: Option<Command<S>>,
    root: NodeId,
    nodes: Arc<[ParsedCommandNode]>,
    range: StringRange,
    child: Option<Arc<CommandContext<S>>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S: Clone> Clone for CommandContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            input: Arc::clone(&self.input),
            entry: self.entry.clone(),
            arguments: Arc::clone(&self.arguments),
            loaded: Arc::clone(&self.loaded),
            command: self.command.as_ref().map(Arc::clone),
            root: self.root,
            nodes: Arc::clone(&self.nodes),
            range: self.range,
            child: self.child.as_ref().map(Arc::clone),
            modifier: self.modifier.as_ref().map(Arc::clone),
            forks: self.forks,
        }
    }
}

impl<S> fmt::Debug for CommandContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("input", &self.input)
            .field("range", &self.range)
            .field("nodes", &self.nodes)
            .field("arguments", &self.arguments.keys().collect::<Vec<_>>())
            .field("child", &self.child)
            .field("forks", &self.forks)
            .finish_non_exhaustive()
    }
}

impl<S: Clone> CommandContext<S> {
    /// Who issued the command.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The full input string.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Ambient parse data.
    pub fn entry_point(&self) -> &EntryPoint {
        &self.entry
    }

    /// Node parsing of this context started from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Matched nodes, in input order.
    pub fn nodes(&self) -> &[ParsedCommandNode] {
        &self.nodes
    }

    /// Whether any node matched.
    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Input span this context matched.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Context continuing after a redirect.
    pub fn child(&self) -> Option<&CommandContext<S>> {
        self.child.as_deref()
    }

    /// Innermost context in the redirect chain.
    pub fn last_child(&self) -> &CommandContext<S> {
        let mut current = self;
        while let Some(child) = current.child.as_deref() {
            current = child;
        }
        current
    }

    /// The command to run, if input ended on an executable node.
    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    /// The redirect modifier of the last matched node.
    pub fn modifier(&self) -> Option<&RedirectModifier<S>> {
        self.modifier.as_ref()
    }

    /// Whether the last matched node forks.
    pub fn is_forked(&self) -> bool {
        self.forks
    }

    /// Whether an argument called `name` was parsed.
    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// The loaded value of argument `name`.
    pub fn get_argument<T: 'static>(&self, name: &str) -> Result<&T, CommandError> {
        if !self.arguments.contains_key(name) {
            return Err(CommandError::NoSuchArgument(name.to_string()));
        }
        let value = self
            .loaded
            .get(name)
            .ok_or_else(|| CommandError::ArgumentNotLoaded(name.to_string()))?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| CommandError::ArgumentTypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// The raw parse result of argument `name`, before loading.
    pub fn get_parsed<P: 'static>(&self, name: &str) -> Result<&P, CommandError> {
        let argument = self
            .arguments
            .get(name)
            .ok_or_else(|| CommandError::NoSuchArgument(name.to_string()))?;
        argument
            .parsed::<P>()
            .ok_or_else(|| CommandError::ArgumentTypeMismatch {
                name: name.to_string(),
                expected: type_name::<P>(),
            })
    }

    /// The input covered by argument `name`.
    pub fn argument_range(&self, name: &str) -> Option<StringRange> {
        self.arguments.get(name).map(ParsedArgument::range)
    }

    /// Same context running as `source`.
    pub fn copy_for(&self, source: S) -> Self {
        let mut copy = self.clone();
        copy.source = source;
        copy
    }

    /// Load every parsed argument that is not loaded yet, in name order.
    pub(crate) async fn load_arguments(&mut self) -> Result<(), CommandError> {
        if self.loaded.len() == self.arguments.len() {
            return Ok(());
        }
        let mut loaded = BTreeMap::new();
        for (name, argument) in self.arguments.iter() {
            if let Some(value) = self.loaded.get(name) {
                loaded.insert(name.clone(), Arc::clone(value));
                continue;
            }
            let value = argument
                .argument
                .load(&self.entry, name, &argument.parsed)
                .await
                .map_err(|source| CommandError::Load {
                    name: name.clone(),
                    source: Box::new(source),
                })?;
            loaded.insert(name.clone(), value);
        }
        self.loaded = Arc::new(loaded);
        Ok(())
    }
}
