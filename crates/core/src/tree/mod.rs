//! The command tree: an arena of literal and argument nodes.
//!
//! Nodes are addressed by [`NodeId`] and never move, so redirects (including
//! cycles back to the root) are plain indices. Registering a node whose name
//! already exists under the same parent merges into the existing node.

/// Builders describing nodes before registration.
pub mod builder;
/// Node types and identifiers.
pub mod node;

pub use builder::{CommandBuilder, RegistrationError, argument, literal};
pub use node::{CommandNode, NodeId, NodeKind};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cmdgraph_diagnostics::{Diagnostic, codes};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde::Serialize;

use crate::arguments::{self, ErasedArgument};
use crate::context::{CommandContext, CommandContextBuilder, ParsedArgument};
use crate::error::{CommandError, CommandSyntaxError, SyntaxErrorKind};
use crate::range::StringRange;
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};
use builder::BuilderKind;
use node::NodeData;

/// Host-defined value identifying who issued a command.
pub trait CommandSource: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> CommandSource for T {}

/// Executable callback attached to a node.
pub type Command<S> =
    Arc<dyn Fn(CommandContext<S>) -> BoxFuture<'static, Result<i32, CommandError>> + Send + Sync>;

/// Predicate deciding whether a source may use a node.
pub type Requirement<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Maps the source of a redirecting context to the sources the target runs as.
pub type RedirectModifier<S> =
    Arc<dyn Fn(&CommandContext<S>) -> Result<Vec<S>, CommandError> + Send + Sync>;

/// Custom completion for an argument node.
pub type SuggestionProvider<S> = Arc<
    dyn Fn(
            CommandContext<S>,
            SuggestionsBuilder,
        ) -> BoxFuture<'static, Result<Suggestions, CommandError>>
        + Send
        + Sync,
>;

/// A command path registered twice with a callback; the first callback was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationConflict {
    /// The node that kept its original callback.
    pub node: NodeId,
    /// Names from the root down to the node.
    pub path: Vec<String>,
}

impl RegistrationConflict {
    /// Warning diagnostic describing the ignored callback.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warn(codes::DUPLICATE_COMMAND, self.to_string(), None)
            .with_context(BTreeMap::from([("path".into(), self.path.join(" "))]))
    }
}

impl fmt::Display for RegistrationConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' already has a command; the later registration was ignored",
            self.path.join(" ")
        )
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The registered (or merged-into) node.
    pub node: NodeId,
    /// Callbacks that were ignored because the path already had one.
    pub conflicts: Vec<RegistrationConflict>,
}

/// Most nodes one tree can hold; [`NodeId`] is a `u32` index.
pub const MAX_NODES: usize = u32::MAX as usize;

/// Arena holding every node. Index 0 is the root.
pub struct CommandTree<S> {
    nodes: Vec<CommandNode<S>>,
    node_limit: usize,
}

impl<S: CommandSource> Default for CommandTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for CommandTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.nodes).finish()
    }
}

/// Byte length of the token at the start of `text`.
fn token_len(text: &str, separator: char) -> usize {
    text.find(separator).unwrap_or(text.len())
}

impl<S: CommandSource> CommandTree<S> {
    /// A tree with only a root.
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::new(NodeData::Root, None)],
            node_limit: MAX_NODES,
        }
    }

    #[cfg(test)]
    fn with_node_limit(limit: usize) -> Self {
        Self {
            node_limit: limit,
            ..Self::new()
        }
    }

    /// The root node.
    pub fn root(&self) -> &CommandNode<S> {
        &self.nodes[0]
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&CommandNode<S>> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node(&self, id: NodeId) -> &CommandNode<S> {
        &self.nodes[id.index()]
    }

    /// Number of nodes ever created, including the root and detached nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Names from the root down to `id` (the root itself has an empty path).
    pub fn path(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            if node.kind() == NodeKind::Root {
                break;
            }
            path.push(node.name().to_string());
            current = node.parent.and_then(|parent| self.get(parent));
        }
        path.reverse();
        path
    }

    /// Follow `path` from the root. Literal segments match case-insensitively
    /// (including aliases); argument segments match the argument name.
    pub fn find(&self, path: &[&str]) -> Option<NodeId> {
        path.iter().try_fold(NodeId::ROOT, |current, segment| {
            let node = self.get(current)?;
            node.literal_child(&segment.to_lowercase())
                .or_else(|| node.arguments.get(*segment).copied())
        })
    }

    /// Whether `source` may use `id`: its requirement passes and it either
    /// runs a command, redirects somewhere usable, or has a usable child.
    pub fn can_use(&self, id: NodeId, source: &S) -> bool {
        self.can_use_visiting(id, source, &mut Vec::new())
    }

    fn can_use_visiting(&self, id: NodeId, source: &S, visiting: &mut Vec<NodeId>) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        if visiting.contains(&id) {
            return false;
        }
        if node.requirement.as_ref().is_some_and(|req| !req(source)) {
            return false;
        }
        if node.command.is_some() {
            return true;
        }
        visiting.push(id);
        let usable = node
            .redirect
            .is_some_and(|target| self.can_use_visiting(target, source, visiting))
            || node
                .ordered
                .iter()
                .any(|&child| self.can_use_visiting(child, source, visiting));
        visiting.pop();
        usable
    }

    /// Children of `id` worth trying at the reader's cursor: the one literal
    /// matching the next token if there is one, otherwise every argument.
    pub(crate) fn relevant(
        &self,
        id: NodeId,
        reader: &StringReader,
        separator: char,
    ) -> Vec<NodeId> {
        let node = self.node(id);
        if node.has_literals() {
            let rest = reader.remaining();
            let token = rest[..token_len(rest, separator)].to_lowercase();
            if let Some(literal) = node.literal_child(&token) {
                return vec![literal];
            }
        }
        node.arguments.values().copied().collect()
    }

    /// Parse child `id` at the reader's cursor, recording it in `context`.
    pub(crate) fn parse_child(
        &self,
        id: NodeId,
        reader: &mut StringReader,
        context: &mut CommandContextBuilder<S>,
        separator: char,
    ) -> Result<(), CommandSyntaxError> {
        let node = self.node(id);
        let start = reader.cursor();
        match &node.data {
            NodeData::Root => {}
            NodeData::Literal { name, .. } => {
                let len = token_len(reader.remaining(), separator);
                let token = reader.remaining()[..len].to_lowercase();
                if !node.matches_literal(&token) {
                    return Err(reader.error(SyntaxErrorKind::IncorrectLiteral(name.clone())));
                }
                reader.advance(len);
            }
            NodeData::Argument { name, argument, .. } => {
                let parsed = argument.parse(context.entry_point(), reader)?;
                let range = StringRange::new(start, reader.cursor());
                context.with_argument(
                    name.clone(),
                    ParsedArgument::new(range, parsed, Arc::clone(argument)),
                );
            }
        }
        context.with_node(
            id,
            StringRange::new(start, reader.cursor()),
            node.modifier.clone(),
            node.forks,
        );
        Ok(())
    }

    /// Completions offered by node `id` for the partial token in `builder`.
    pub(crate) fn list_suggestions(
        &self,
        id: NodeId,
        context: CommandContext<S>,
        builder: SuggestionsBuilder,
        suggest_aliases: bool,
    ) -> BoxFuture<'static, Result<Suggestions, CommandError>> {
        match &self.node(id).data {
            NodeData::Root => future::ready(Ok(Suggestions::empty())).boxed(),
            NodeData::Literal { name, aliases } => {
                let candidates = std::iter::once(name)
                    .chain(aliases.iter().filter(|_| suggest_aliases));
                let mut builder = builder;
                for candidate in candidates {
                    if candidate
                        .to_lowercase()
                        .starts_with(builder.remaining_lowercase())
                    {
                        builder = builder.suggest(candidate.clone());
                    }
                }
                future::ready(Ok(builder.build())).boxed()
            }
            NodeData::Argument {
                argument,
                suggestions,
                ..
            } => match suggestions {
                Some(provider) => provider(context, builder),
                None => argument.list_suggestions(context.entry_point(), builder),
            },
        }
    }

    /// Representative inputs node `id` accepts.
    pub fn examples(&self, id: NodeId) -> Vec<String> {
        match self.get(id).map(|node| &node.data) {
            Some(NodeData::Literal { name, .. }) => vec![name.clone()],
            Some(NodeData::Argument { argument, .. }) => argument.examples(),
            _ => Vec::new(),
        }
    }

    /// Whether node `id` alone would accept the start of `input`.
    pub fn is_valid_input(&self, id: NodeId, input: &str, separator: char) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        match &node.data {
            NodeData::Root => false,
            NodeData::Literal { .. } => {
                let token = &input[..token_len(input, separator)];
                node.matches_literal(&token.to_lowercase())
            }
            NodeData::Argument { argument, .. } => {
                arguments::accepts(&**argument, input, separator)
            }
        }
    }

    /// Register `builder` under `parent`, merging into existing nodes.
    pub(crate) fn register(
        &mut self,
        parent: NodeId,
        builder: CommandBuilder<S>,
    ) -> Result<Registration, RegistrationError> {
        if self.get(parent).is_none() {
            return Err(RegistrationError::UnknownParent(parent));
        }
        builder.check()?;
        self.validate(Some(parent), &builder)?;
        // Merged nodes allocate nothing, so the builder size is an upper bound.
        if self.nodes.len().saturating_add(builder.size()) > self.node_limit {
            return Err(RegistrationError::TreeFull {
                limit: self.node_limit,
            });
        }
        let mut conflicts = Vec::new();
        let node = self.insert(parent, builder, &mut conflicts)?;
        Ok(Registration { node, conflicts })
    }

    /// Existing child of `parent` that a builder of `kind` merges into.
    fn existing_child(
        &self,
        parent: Option<NodeId>,
        kind: &BuilderKind<S>,
    ) -> Result<Option<NodeId>, RegistrationError> {
        let Some(parent) = parent.and_then(|id| self.get(id)) else {
            return Ok(None);
        };
        match kind {
            BuilderKind::Literal { name, .. } => {
                let lower = name.to_lowercase();
                if let Some(&id) = parent.literals.get(&lower) {
                    return Ok(Some(id));
                }
                if parent.arguments.keys().any(|arg| arg.to_lowercase() == lower) {
                    return Err(RegistrationError::KindClash {
                        name: name.clone(),
                        existing: NodeKind::Argument,
                    });
                }
                Ok(None)
            }
            BuilderKind::Argument { name, .. } => {
                if let Some(&id) = parent.arguments.get(name) {
                    return Ok(Some(id));
                }
                if parent.literals.contains_key(&name.to_lowercase()) {
                    return Err(RegistrationError::KindClash {
                        name: name.clone(),
                        existing: NodeKind::Literal,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Check a builder subtree against the live tree before mutating anything.
    fn validate(
        &self,
        parent: Option<NodeId>,
        builder: &CommandBuilder<S>,
    ) -> Result<(), RegistrationError> {
        if let Some(target) = builder.redirect {
            if self.get(target).is_none() {
                return Err(RegistrationError::UnknownRedirectTarget(target));
            }
        }
        let existing = self.existing_child(parent, &builder.kind)?;
        for child in &builder.children {
            self.validate(existing, child)?;
        }
        Ok(())
    }

    fn insert(
        &mut self,
        parent: NodeId,
        builder: CommandBuilder<S>,
        conflicts: &mut Vec<RegistrationConflict>,
    ) -> Result<NodeId, RegistrationError> {
        let CommandBuilder {
            kind,
            children,
            command,
            requirement,
            redirect,
            modifier,
            forks,
            ..
        } = builder;
        let existing = self.existing_child(Some(parent), &kind).ok().flatten();
        let id = match existing {
            Some(id) => {
                let path = self.path(id);
                let node = &mut self.nodes[id.index()];
                if let (
                    NodeData::Literal { aliases: known, .. },
                    BuilderKind::Literal { aliases, .. },
                ) = (&mut node.data, kind)
                {
                    for alias in aliases {
                        if !known.iter().any(|k| k.eq_ignore_ascii_case(&alias)) {
                            known.push(alias);
                        }
                    }
                }
                if let Some(command) = command {
                    if node.command.is_some() {
                        tracing::warn!(
                            path = %path.join(" "),
                            "command registered twice; keeping the first callback"
                        );
                        conflicts.push(RegistrationConflict { node: id, path });
                    } else {
                        node.command = Some(command);
                    }
                }
                if node.redirect.is_none() && redirect.is_some() {
                    node.redirect = redirect;
                    node.modifier = modifier;
                    node.forks = forks;
                }
                id
            }
            None => {
                let id = u32::try_from(self.nodes.len())
                    .map(NodeId)
                    .map_err(|_| RegistrationError::TreeFull {
                        limit: self.node_limit,
                    })?;
                let data = match kind {
                    BuilderKind::Literal { name, aliases } => NodeData::Literal { name, aliases },
                    BuilderKind::Argument {
                        name,
                        argument,
                        suggestions,
                    } => NodeData::Argument {
                        name,
                        argument,
                        suggestions,
                    },
                };
                let mut node = CommandNode::new(data, Some(parent));
                node.command = command;
                node.requirement = requirement;
                node.redirect = redirect;
                node.modifier = modifier;
                node.forks = forks;
                self.nodes.push(node);
                tracing::trace!(node = %id, path = %self.path(id).join(" "), "registered node");
                id
            }
        };
        self.link(parent, id);
        for child in children {
            self.insert(id, child, conflicts)?;
        }
        Ok(id)
    }

    /// Index child `id` (and its aliases) in `parent`'s lookup maps.
    fn link(&mut self, parent: NodeId, id: NodeId) {
        let (name, aliases, is_literal) = {
            let child = self.node(id);
            (
                child.name().to_string(),
                child.aliases().to_vec(),
                child.kind() == NodeKind::Literal,
            )
        };
        let parent = &mut self.nodes[parent.index()];
        if is_literal {
            parent.literals.insert(name.to_lowercase(), id);
            for alias in aliases {
                parent.aliases.entry(alias.to_lowercase()).or_insert(id);
            }
        } else {
            parent.arguments.insert(name, id);
        }
        parent.resort();
    }

    /// Detach `id` from its parent. The root cannot be removed.
    pub(crate) fn unregister(&mut self, id: NodeId) -> bool {
        if id == NodeId::ROOT {
            return false;
        }
        let Some(parent) = self.get(id).and_then(|node| node.parent) else {
            return false;
        };
        let parent_node = &mut self.nodes[parent.index()];
        let before = parent_node.ordered.len();
        parent_node.literals.retain(|_, child| *child != id);
        parent_node.aliases.retain(|_, child| *child != id);
        parent_node.arguments.retain(|_, child| *child != id);
        parent_node.resort();
        let removed = parent_node.ordered.len() != before;
        if removed {
            self.nodes[id.index()].parent = None;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{IntegerArgument, StringArgument};

    fn tree() -> CommandTree<()> {
        let mut tree = CommandTree::new();
        tree.register(
            NodeId::ROOT,
            literal("b")
                .alias("bee")
                .executes_sync(|_| Ok(1))
                .then(argument("n", IntegerArgument::integer()).executes_sync(|_| Ok(2))),
        )
        .unwrap();
        tree.register(NodeId::ROOT, literal("a").executes_sync(|_| Ok(3))).unwrap();
        tree.register(
            NodeId::ROOT,
            argument("word", StringArgument::word()).executes_sync(|_| Ok(4)),
        )
        .unwrap();
        tree
    }

    #[test]
    fn children_sorted_literals_first() {
        let tree = tree();
        let names: Vec<&str> = tree
            .root()
            .children()
            .iter()
            .map(|&id| tree.node(id).name())
            .collect();
        assert_eq!(names, ["a", "b", "word"]);
    }

    #[test]
    fn find_and_path_agree() {
        let tree = tree();
        let n = tree.find(&["BEE", "n"]).unwrap();
        assert_eq!(tree.path(n), ["b", "n"]);
        assert_eq!(tree.node(n).usage_text(), "<n>");
    }

    #[test]
    fn relevant_prefers_matching_literal() {
        let tree = tree();
        let relevant = tree.relevant(NodeId::ROOT, &StringReader::new("B 5"), ' ');
        assert_eq!(relevant, [tree.find(&["b"]).unwrap()]);
        let relevant = tree.relevant(NodeId::ROOT, &StringReader::new("zzz"), ' ');
        assert_eq!(relevant, [tree.find(&["word"]).unwrap()]);
    }

    #[test]
    fn can_use_requires_a_reachable_command() {
        let mut tree = CommandTree::<()>::new();
        let empty = tree.register(NodeId::ROOT, literal("empty")).unwrap().node;
        let gated = tree
            .register(
                NodeId::ROOT,
                literal("gated").requires(|_| false).executes_sync(|_| Ok(0)),
            )
            .unwrap()
            .node;
        assert!(!tree.can_use(empty, &()));
        assert!(!tree.can_use(gated, &()));
    }

    #[test]
    fn redirect_cycle_terminates() {
        let mut tree = CommandTree::<()>::new();
        let run = tree
            .register(NodeId::ROOT, literal("run").redirect(NodeId::ROOT))
            .unwrap()
            .node;
        assert!(!tree.can_use(run, &()));
        tree.register(NodeId::ROOT, literal("x").executes_sync(|_| Ok(0)))
            .unwrap();
        assert!(tree.can_use(run, &()));
    }

    #[test]
    fn merge_keeps_first_command_and_reports_conflict() {
        let mut tree = tree();
        let registration = tree
            .register(
                NodeId::ROOT,
                literal("a")
                    .executes_sync(|_| Ok(99))
                    .then(literal("extra").executes_sync(|_| Ok(5))),
            )
            .unwrap();
        assert_eq!(registration.conflicts.len(), 1);
        assert_eq!(registration.conflicts[0].path, ["a"]);
        assert_eq!(tree.root().children().len(), 3);
        assert!(tree.find(&["a", "extra"]).is_some());
    }

    #[test]
    fn kind_clash_is_rejected_without_mutation() {
        let mut tree = tree();
        let before = tree.node_count();
        let err = tree
            .register(
                NodeId::ROOT,
                literal("b").then(literal("new").then(literal("n"))).then(literal("N")),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::KindClash { .. }));
        assert_eq!(tree.node_count(), before);
    }

    #[test]
    fn full_tree_rejects_registration_without_mutation() {
        let mut tree = CommandTree::<()>::with_node_limit(3);
        tree.register(NodeId::ROOT, literal("a").executes_sync(|_| Ok(1))).unwrap();
        let err = tree
            .register(NodeId::ROOT, literal("b").then(literal("c")))
            .unwrap_err();
        assert_eq!(err, RegistrationError::TreeFull { limit: 3 });
        assert_eq!(tree.node_count(), 2);
        assert!(tree.find(&["b"]).is_none());

        tree.register(NodeId::ROOT, literal("b").executes_sync(|_| Ok(2))).unwrap();
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn unknown_redirect_target_is_rejected() {
        let mut tree = CommandTree::<()>::new();
        let err = tree
            .register(NodeId::ROOT, literal("x").redirect(NodeId(42)))
            .unwrap_err();
        assert_eq!(err, RegistrationError::UnknownRedirectTarget(NodeId(42)));
    }

    #[test]
    fn unregister_detaches_node() {
        let mut tree = tree();
        let a = tree.find(&["a"]).unwrap();
        assert!(tree.unregister(a));
        assert!(tree.find(&["a"]).is_none());
        assert!(!tree.unregister(a));
        assert!(!tree.unregister(NodeId::ROOT));
    }

    #[test]
    fn literal_valid_input_requires_whole_token() {
        let tree = tree();
        let a = tree.find(&["a"]).unwrap();
        assert!(tree.is_valid_input(a, "A rest", ' '));
        assert!(!tree.is_valid_input(a, "abc", ' '));
    }
}
