use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future;

use super::{
    Command, CommandSource, NodeId, NodeKind, RedirectModifier, Requirement, SuggestionProvider,
};
use crate::arguments::{ArgumentType, ErasedArgument};
use crate::context::CommandContext;
use crate::error::CommandError;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// Misuse of the builder API, reported by `register`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// A redirecting node was also given children.
    #[error("'{0}' redirects elsewhere and cannot have children")]
    RedirectWithChildren(String),

    /// `alias` was called on an argument node.
    #[error("argument '{0}' cannot have aliases; only literals can")]
    AliasOnArgument(String),

    /// `suggests` was called on a literal node.
    #[error("literal '{0}' cannot have a suggestion provider; only arguments can")]
    SuggestionsOnLiteral(String),

    /// A literal or argument name is empty or contains whitespace.
    #[error("invalid node name '{0}'")]
    InvalidName(String),

    /// The redirect target does not exist in this tree.
    #[error("redirect target {0} does not exist")]
    UnknownRedirectTarget(NodeId),

    /// The parent given to `register_at` does not exist.
    #[error("parent node {0} does not exist")]
    UnknownParent(NodeId),

    /// Registering would grow the tree past its node limit.
    #[error("command tree is full ({limit} nodes)")]
    TreeFull {
        /// The node limit that would be exceeded.
        limit: usize,
    },

    /// A sibling with the same name but a different kind already exists.
    #[error("'{name}' is already registered here as a {existing} node")]
    KindClash {
        /// The clashing name.
        name: String,
        /// Kind of the node already using the name.
        existing: NodeKind,
    },
}

pub(crate) enum BuilderKind<S> {
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

impl<S> BuilderKind<S> {
    pub(crate) fn name(&self) -> &str {
        match self {
            BuilderKind::Literal { name, .. } | BuilderKind::Argument { name, .. } => name,
        }
    }
}

/// Describes a node and its subtree before registration.
///
/// ```
/// use cmdgraph_core::{Dispatcher, IntegerArgument, argument, literal};
///
/// let mut dispatcher = Dispatcher::<()>::new();
/// dispatcher
///     .register(
///         literal("add").then(
///             argument("a", IntegerArgument::integer()).then(
///                 argument("b", IntegerArgument::integer()).executes_sync(|ctx| {
///                     Ok((ctx.get_argument::<i64>("a")? + ctx.get_argument::<i64>("b")?) as i32)
///                 }),
///             ),
///         ),
///     )
///     .unwrap();
/// ```
pub struct CommandBuilder<S> {
    pub(crate) kind: BuilderKind<S>,
    pub(crate) children: Vec<CommandBuilder<S>>,
    pub(crate) command: Option<Command<S>>,
    pub(crate) requirement: Option<Requirement<S>>,
    pub(crate) redirect: Option<NodeId>,
    pub(crate) modifier: Option<RedirectModifier<S>>,
    pub(crate) forks: bool,
    misuse: Vec<RegistrationError>,
}

/// Start a literal node matching `name`.
pub fn literal<S: CommandSource>(name: impl Into<String>) -> CommandBuilder<S> {
    CommandBuilder::new(BuilderKind::Literal {
        name: name.into(),
        aliases: Vec::new(),
    })
}

/// Start an argument node called `name` parsed by `ty`.
pub fn argument<S: CommandSource, A: ArgumentType>(
    name: impl Into<String>,
    ty: A,
) -> CommandBuilder<S> {
    CommandBuilder::new(BuilderKind::Argument {
        name: name.into(),
        argument: Arc::new(ty),
        suggestions: None,
    })
}

impl<S: CommandSource> CommandBuilder<S> {
    fn new(kind: BuilderKind<S>) -> Self {
        Self {
            kind,
            children: Vec::new(),
            command: None,
            requirement: None,
            redirect: None,
            modifier: None,
            forks: false,
            misuse: Vec::new(),
        }
    }

    /// Name of the node being built.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Add a child node.
    pub fn then(mut self, child: CommandBuilder<S>) -> Self {
        if self.redirect.is_some() {
            let name = self.name().to_string();
            self.misuse.push(RegistrationError::RedirectWithChildren(name));
        }
        self.children.push(child);
        self
    }

    /// Run `command` when input ends at this node.
    pub fn executes<F, Fut>(mut self, command: F) -> Self
    where
        F: Fn(CommandContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<i32, CommandError>> + Send + 'static,
    {
        self.command = Some(Arc::new(move |ctx| command(ctx).boxed()));
        self
    }

    /// Like [`executes`](Self::executes) for callbacks that do not await.
    pub fn executes_sync<F>(mut self, command: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<i32, CommandError> + Send + Sync + 'static,
    {
        self.command = Some(Arc::new(move |ctx: CommandContext<S>| {
            future::ready(command(&ctx)).boxed()
        }));
        self
    }

    /// Only offer this node to sources satisfying `requirement`.
    pub fn requires<F>(mut self, requirement: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.requirement = Some(Arc::new(requirement));
        self
    }

    /// Also match `alias` (literals only).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        match &mut self.kind {
            BuilderKind::Literal { aliases, .. } => aliases.push(alias.into()),
            BuilderKind::Argument { name, .. } => {
                let name = name.clone();
                self.misuse.push(RegistrationError::AliasOnArgument(name));
            }
        }
        self
    }

    /// Complete this argument with `provider` instead of its type's default.
    pub fn suggests<F, Fut>(mut self, provider: F) -> Self
    where
        F: Fn(CommandContext<S>, SuggestionsBuilder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Suggestions, CommandError>> + Send + 'static,
    {
        match &mut self.kind {
            BuilderKind::Argument { suggestions, .. } => {
                *suggestions = Some(Arc::new(move |ctx, builder| provider(ctx, builder).boxed()));
            }
            BuilderKind::Literal { name, .. } => {
                let name = name.clone();
                self.misuse.push(RegistrationError::SuggestionsOnLiteral(name));
            }
        }
        self
    }

    /// Continue parsing at `target` after this node.
    pub fn redirect(self, target: NodeId) -> Self {
        self.forward(target, None, false)
    }

    /// Continue parsing at `target`, running it as the source `modifier` returns.
    pub fn redirect_with<F>(self, target: NodeId, modifier: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<S, CommandError> + Send + Sync + 'static,
    {
        let modifier: RedirectModifier<S> =
            Arc::new(move |ctx: &CommandContext<S>| modifier(ctx).map(|source| vec![source]));
        self.forward(target, Some(modifier), false)
    }

    /// Continue parsing at `target` once per source `modifier` returns.
    ///
    /// Each forked execution fails independently of the others.
    pub fn fork<F>(self, target: NodeId, modifier: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<Vec<S>, CommandError> + Send + Sync + 'static,
    {
        self.forward(target, Some(Arc::new(modifier)), true)
    }

    /// Set the redirect target, modifier, and fork flag together.
    pub fn forward(
        mut self,
        target: NodeId,
        modifier: Option<RedirectModifier<S>>,
        fork: bool,
    ) -> Self {
        if !self.children.is_empty() {
            let name = self.name().to_string();
            self.misuse.push(RegistrationError::RedirectWithChildren(name));
        }
        self.redirect = Some(target);
        self.modifier = modifier;
        self.forks = fork;
        self
    }

    /// Number of nodes in this subtree, including this one.
    pub(crate) fn size(&self) -> usize {
        1 + self.children.iter().map(CommandBuilder::size).sum::<usize>()
    }

    /// First builder-API misuse in this subtree, or a name clash between
    /// siblings of different kinds.
    pub(crate) fn check(&self) -> Result<(), RegistrationError> {
        if let Some(err) = self.misuse.first() {
            return Err(err.clone());
        }
        let name = self.name();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(RegistrationError::InvalidName(name.to_string()));
        }
        let literals: BTreeSet<String> = self
            .children
            .iter()
            .filter(|child| matches!(child.kind, BuilderKind::Literal { .. }))
            .map(|child| child.name().to_lowercase())
            .collect();
        for child in &self.children {
            if matches!(child.kind, BuilderKind::Argument { .. })
                && literals.contains(&child.name().to_lowercase())
            {
                return Err(RegistrationError::KindClash {
                    name: child.name().to_string(),
                    existing: NodeKind::Literal,
                });
            }
            child.check()?;
        }
        Ok(())
    }
}
