use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{Command, RedirectModifier, Requirement, SuggestionProvider};
use crate::arguments::ErasedArgument;

/// Stable index of a node in a [`CommandTree`](super::CommandTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The tree root; matches nothing itself.
    Root,
    /// A keyword, with optional aliases.
    Literal,
    /// A typed argument.
    Argument,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Root => write!(f, "root"),
            NodeKind::Literal => write!(f, "literal"),
            NodeKind::Argument => write!(f, "argument"),
        }
    }
}

pub(crate) enum NodeData<S> {
    Root,
    Literal {
        name: String,
        aliases: Vec<String>,
    },
    Argument {
        name: String,
        argument: Arc<dyn ErasedArgument>,
        suggestions: Option<SuggestionProvider<S>>,
    },
}

/// One node of the command tree.
pub struct CommandNode<S> {
    pub(crate) data: NodeData<S>,
    pub(crate) parent: Option<NodeId>,
    /// Literal children keyed by lowercase name.
    pub(crate) literals: BTreeMap<String, NodeId>,
    /// Lowercase alias to literal child.
    pub(crate) aliases: BTreeMap<String, NodeId>,
    /// Argument children keyed by name.
    pub(crate) arguments: BTreeMap<String, NodeId>,
    /// Literals first, then arguments, each group by name.
    pub(crate) ordered: Vec<NodeId>,
    pub(crate) command: Option<Command<S>>,
    pub(crate) requirement: Option<Requirement<S>>,
    pub(crate) redirect: Option<NodeId>,
    pub(crate) modifier: Option<RedirectModifier<S>>,
    pub(crate) forks: bool,
}

impl<S> CommandNode<S> {
    pub(crate) fn new(data: NodeData<S>, parent: Option<NodeId>) -> Self {
        Self {
            data,
            parent,
            literals: BTreeMap::new(),
            aliases: BTreeMap::new(),
            arguments: BTreeMap::new(),
            ordered: Vec::new(),
            command: None,
            requirement: None,
            redirect: None,
            modifier: None,
            forks: false,
        }
    }

    /// Root, literal, or argument.
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Root => NodeKind::Root,
            NodeData::Literal { .. } => NodeKind::Literal,
            NodeData::Argument { .. } => NodeKind::Argument,
        }
    }

    /// The literal or argument name; empty for the root.
    pub fn name(&self) -> &str {
        match &self.data {
            NodeData::Root => "",
            NodeData::Literal { name, .. } | NodeData::Argument { name, .. } => name,
        }
    }

    /// Alternative spellings of a literal.
    pub fn aliases(&self) -> &[String] {
        match &self.data {
            NodeData::Literal { aliases, .. } => aliases,
            _ => &[],
        }
    }

    /// How this node appears in usage strings.
    pub fn usage_text(&self) -> String {
        match &self.data {
            NodeData::Root => String::new(),
            NodeData::Literal { name, .. } => name.clone(),
            NodeData::Argument { name, .. } => format!("<{name}>"),
        }
    }

    /// The node this one was registered under.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children, literals first, each group sorted by name.
    pub fn children(&self) -> &[NodeId] {
        &self.ordered
    }

    /// The callback run when input ends at this node.
    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    /// Whether input may end at this node.
    pub fn is_executable(&self) -> bool {
        self.command.is_some()
    }

    /// Whether a requirement predicate gates this node.
    pub fn has_requirement(&self) -> bool {
        self.requirement.is_some()
    }

    /// Where parsing continues after this node, if it redirects.
    pub fn redirect(&self) -> Option<NodeId> {
        self.redirect
    }

    /// Whether the redirect maps one source to many with isolated failures.
    pub fn is_fork(&self) -> bool {
        self.forks
    }

    pub(crate) fn literal_child(&self, lowercase: &str) -> Option<NodeId> {
        self.literals
            .get(lowercase)
            .or_else(|| self.aliases.get(lowercase))
            .copied()
    }

    pub(crate) fn has_literals(&self) -> bool {
        !self.literals.is_empty()
    }

    pub(crate) fn matches_literal(&self, lowercase: &str) -> bool {
        match &self.data {
            NodeData::Literal { name, aliases } => {
                name.to_lowercase() == lowercase
                    || aliases.iter().any(|a| a.to_lowercase() == lowercase)
            }
            _ => false,
        }
    }

    pub(crate) fn resort(&mut self) {
        self.ordered = self
            .literals
            .values()
            .chain(self.arguments.values())
            .copied()
            .collect();
    }
}

impl<S> fmt::Debug for CommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("children", &self.ordered)
            .field("executable", &self.is_executable())
            .field("redirect", &self.redirect)
            .field("forks", &self.forks)
            .finish_non_exhaustive()
    }
}
