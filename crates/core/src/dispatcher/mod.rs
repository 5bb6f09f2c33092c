//! The dispatcher: parses input against the command tree and executes the
//! matched command.
//!
//! Parsing is a backtracking descent. Every candidate child is tried on a
//! cloned reader and context builder, so a failed attempt leaves nothing
//! behind; failures are recorded per node and only surface if no candidate
//! consumes the whole input. Execution walks the chain of contexts that
//! redirects produce, fanning out once per source a fork modifier returns.

mod ambiguity;
mod suggest;
mod usage;

pub use ambiguity::Ambiguity;

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::config::DispatcherConfig;
use crate::context::{CommandContextBuilder, EntryPoint};
use crate::error::{CommandError, CommandSyntaxError, SyntaxErrorKind};
use crate::reader::StringReader;
use crate::tree::{
    CommandBuilder, CommandSource, CommandTree, NodeId, Registration, RegistrationError,
};

/// Outcome of [`Dispatcher::parse`]: the best match found, where the reader
/// stopped, and why each rejected candidate failed.
#[derive(Debug, Clone)]
pub struct ParseResults<S> {
    /// Everything the best candidate matched.
    pub context: CommandContextBuilder<S>,
    /// Reader positioned after the matched input.
    pub reader: StringReader,
    /// Parse failures of candidates at the point the match stopped.
    pub errors: BTreeMap<NodeId, CommandSyntaxError>,
}

impl<S: CommandSource> ParseResults<S> {
    /// Whether the whole input matched.
    pub fn is_complete(&self) -> bool {
        !self.reader.can_read()
    }

    /// Why the input did not fully match, or `None` if it did.
    ///
    /// A lone candidate failure is reported as is. Otherwise the failure is
    /// `UnknownArgument` when nothing matched at all and `UnknownCommand`
    /// when a prefix matched.
    pub fn unparsed_error(&self) -> Option<CommandSyntaxError> {
        if self.is_complete() {
            return None;
        }
        if self.errors.len() == 1 {
            return self.errors.values().next().cloned();
        }
        let kind = if self.context.range().is_empty() {
            SyntaxErrorKind::UnknownArgument
        } else {
            SyntaxErrorKind::UnknownCommand
        };
        Some(self.reader.error(kind))
    }
}

/// Owns a command tree and runs input against it.
///
/// ```
/// use cmdgraph_core::{Dispatcher, EntryPoint, IntegerArgument, argument, literal};
/// use futures::executor::block_on;
///
/// let mut dispatcher = Dispatcher::<()>::new();
/// dispatcher
///     .register(literal("double").then(
///         argument("n", IntegerArgument::integer())
///             .executes_sync(|ctx| Ok(*ctx.get_argument::<i64>("n")? as i32 * 2)),
///     ))
///     .unwrap();
///
/// let outcomes = block_on(dispatcher.execute(&EntryPoint::default(), "double 21", ())).unwrap();
/// assert_eq!(outcomes.len(), 1);
/// assert_eq!(*outcomes[0].as_ref().unwrap(), 42);
/// ```
#[derive(Debug)]
pub struct Dispatcher<S> {
    tree: CommandTree<S>,
    config: DispatcherConfig,
}

impl<S: CommandSource> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CommandSource> Dispatcher<S> {
    /// Empty dispatcher with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Empty dispatcher using `config`.
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            tree: CommandTree::new(),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Id of the root node, for redirects back to the top level.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The underlying tree.
    pub fn tree(&self) -> &CommandTree<S> {
        &self.tree
    }

    /// Register `builder` as a top-level command.
    ///
    /// A command whose name already exists is merged into the existing node.
    /// If both define a callback for the same path the first one is kept and
    /// the clash is reported in [`Registration::conflicts`].
    pub fn register(
        &mut self,
        builder: CommandBuilder<S>,
    ) -> Result<Registration, RegistrationError> {
        self.register_at(NodeId::ROOT, builder)
    }

    /// Register `builder` beneath `parent`.
    pub fn register_at(
        &mut self,
        parent: NodeId,
        builder: CommandBuilder<S>,
    ) -> Result<Registration, RegistrationError> {
        let registration = self.tree.register(parent, builder)?;
        debug!(
            node = %registration.node,
            conflicts = registration.conflicts.len(),
            "registered command"
        );
        Ok(registration)
    }

    /// Detach `node` from its parent. Returns whether anything was removed.
    pub fn unregister(&mut self, node: NodeId) -> bool {
        self.tree.unregister(node)
    }

    /// Names from the root down to `node`.
    pub fn path(&self, node: NodeId) -> Vec<String> {
        self.tree.path(node)
    }

    /// Node reached by following `path` from the root.
    pub fn find_node(&self, path: &[&str]) -> Option<NodeId> {
        self.tree.find(path)
    }

    /// Parse `input` as issued by `source`.
    ///
    /// Never fails; inspect [`ParseResults::unparsed_error`] or let
    /// [`execute_results`](Self::execute_results) report problems.
    pub fn parse(&self, entry: &EntryPoint, input: &str, source: S) -> ParseResults<S> {
        let reader = StringReader::new(input);
        let context = CommandContextBuilder::new(source, entry.clone(), NodeId::ROOT, 0);
        self.parse_nodes(NodeId::ROOT, &reader, &context)
    }

    fn parse_nodes(
        &self,
        node: NodeId,
        original: &StringReader,
        so_far: &CommandContextBuilder<S>,
    ) -> ParseResults<S> {
        let separator = self.config.argument_separator;
        let source = so_far.source();
        let mut errors = BTreeMap::new();
        let mut potentials: Vec<ParseResults<S>> = Vec::new();

        for child in self.tree.relevant(node, original, separator) {
            if !self.tree.can_use(child, source) {
                continue;
            }
            let mut context = so_far.clone();
            let mut reader = original.clone();
            if let Err(err) = self.try_child(child, &mut reader, &mut context) {
                trace!(
                    node = %child,
                    cursor = original.cursor(),
                    error = %err,
                    "candidate rejected"
                );
                errors.insert(child, err);
                continue;
            }

            let matched = self.tree.node(child);
            context.with_command(matched.command().cloned());
            let redirect = matched.redirect();
            if reader.can_read_n(if redirect.is_some() { 1 } else { 2 }) {
                reader.skip();
                if let Some(target) = redirect {
                    let child_context = CommandContextBuilder::new(
                        source.clone(),
                        so_far.entry_point().clone(),
                        target,
                        reader.cursor(),
                    );
                    let parse = self.parse_nodes(target, &reader, &child_context);
                    context.with_child(parse.context);
                    return ParseResults {
                        context,
                        reader: parse.reader,
                        errors: parse.errors,
                    };
                }
                potentials.push(self.parse_nodes(child, &reader, &context));
            } else {
                potentials.push(ParseResults {
                    context,
                    reader,
                    errors: BTreeMap::new(),
                });
            }
        }

        // Stable: ties keep literal-first tree order.
        potentials.sort_by_key(|parse| (parse.reader.can_read(), !parse.errors.is_empty()));
        match potentials.into_iter().next() {
            Some(best) => best,
            None => ParseResults {
                context: so_far.clone(),
                reader: original.clone(),
                errors,
            },
        }
    }

    /// Parse one child and require a separator (or the end) after it.
    fn try_child(
        &self,
        child: NodeId,
        reader: &mut StringReader,
        context: &mut CommandContextBuilder<S>,
    ) -> Result<(), CommandSyntaxError> {
        let separator = self.config.argument_separator;
        let start = reader.cursor();
        self.tree.parse_child(child, reader, context, separator)?;
        if reader.can_read() && reader.peek() != Some(separator) {
            let err = reader.error(SyntaxErrorKind::ExpectedSeparator);
            reader.rewind(start);
            return Err(err);
        }
        Ok(())
    }

    /// Parse and execute `input` in one step.
    pub async fn execute(
        &self,
        entry: &EntryPoint,
        input: &str,
        source: S,
    ) -> Result<Vec<Result<i32, CommandError>>, CommandError> {
        let parse = self.parse(entry, input, source);
        self.execute_results(&parse).await
    }

    /// Execute a parse, returning one outcome per executed branch.
    ///
    /// Input that did not fully parse fails with the error described on
    /// [`ParseResults::unparsed_error`]. Failures of argument loading,
    /// redirect modifiers, or commands abort the whole call unless they
    /// happen below a fork, where they are recorded as that branch's outcome
    /// and the remaining branches still run.
    pub async fn execute_results(
        &self,
        parse: &ParseResults<S>,
    ) -> Result<Vec<Result<i32, CommandError>>, CommandError> {
        if let Some(err) = parse.unparsed_error() {
            return Err(err.into());
        }

        let original = parse.context.build(parse.reader.string());
        let mut outcomes = Vec::new();
        let mut forked = false;
        let mut found_command = false;
        let mut contexts = vec![original];

        while !contexts.is_empty() {
            let mut next = Vec::new();
            for mut context in contexts {
                if let Some(child) = context.child().cloned() {
                    forked |= context.is_forked();
                    if !child.has_nodes() {
                        continue;
                    }
                    found_command = true;
                    let Some(modifier) = context.modifier().cloned() else {
                        next.push(child.copy_for(context.source().clone()));
                        continue;
                    };
                    let sources = match context.load_arguments().await {
                        Ok(()) => modifier(&context),
                        Err(err) => Err(err),
                    };
                    match sources {
                        Ok(sources) => {
                            next.extend(sources.into_iter().map(|source| child.copy_for(source)));
                        }
                        Err(err) if forked => {
                            warn!(error = %err, "redirect modifier failed in forked execution");
                            outcomes.push(Err(err));
                        }
                        Err(err) => return Err(err),
                    }
                } else if let Some(command) = context.command().cloned() {
                    found_command = true;
                    let result = match context.load_arguments().await {
                        Ok(()) => command(context).await,
                        Err(err) => Err(err),
                    };
                    match result {
                        Ok(value) => outcomes.push(Ok(value)),
                        Err(err) if forked => {
                            warn!(error = %err, "command failed in forked execution");
                            outcomes.push(Err(err));
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            contexts = next;
        }

        if !found_command {
            return Err(parse.reader.error(SyntaxErrorKind::UnknownCommand).into());
        }
        Ok(outcomes)
    }
}
