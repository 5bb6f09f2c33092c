//! The built-in demo command tree the CLI operates on.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use cmdgraph_core::{
    BoolArgument, CommandContext, CommandError, Dispatcher, DispatcherConfig, ErrorableArgument,
    ErrorableValue, IntegerArgument, Lazy, LazyArgument, ListArgument, RegistrationConflict,
    StringArgument, argument, literal,
};

/// Names offered when completing `greet <who>`.
const KNOWN_USERS: &[&str] = &["alice", "bob", "carol"];

/// Messages written by commands, shared by every fork of a session.
#[derive(Debug, Clone, Default)]
pub(crate) struct Replies(Arc<Mutex<Vec<String>>>);

impl Replies {
    fn push(&self, line: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// The command source: who is typing, and where replies go.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) user: String,
    pub(crate) admin: bool,
    pub(crate) replies: Replies,
}

impl Session {
    pub(crate) fn new(user: impl Into<String>, admin: bool) -> Self {
        Self {
            user: user.into(),
            admin,
            replies: Replies::default(),
        }
    }

    fn reply(&self, line: impl Into<String>) {
        self.replies.push(line);
    }

    fn as_user(&self, user: &str) -> Self {
        Self {
            user: user.to_string(),
            admin: false,
            replies: self.replies.clone(),
        }
    }
}

fn to_status(value: i64) -> Result<i32, CommandError> {
    i32::try_from(value).map_err(CommandError::other)
}

/// Build the demo tree, returning any registration conflicts for `lint`.
pub(crate) fn build(
    config: DispatcherConfig,
) -> Result<(Dispatcher<Session>, Vec<RegistrationConflict>)> {
    let mut dispatcher = Dispatcher::with_config(config);
    let mut conflicts = Vec::new();
    let root = dispatcher.root();

    let commands = vec![
        literal("echo").then(argument("text", StringArgument::greedy()).executes_sync(
            |ctx: &CommandContext<Session>| {
                let text = ctx.get_argument::<String>("text")?;
                ctx.source().reply(text.clone());
                Ok(1)
            },
        )),
        literal("add").then(
            argument("a", IntegerArgument::integer()).then(
                argument("b", IntegerArgument::integer()).executes_sync(
                    |ctx: &CommandContext<Session>| {
                        let sum = ctx.get_argument::<i64>("a")? + ctx.get_argument::<i64>("b")?;
                        ctx.source().reply(sum.to_string());
                        to_status(sum)
                    },
                ),
            ),
        ),
        literal("sum").then(
            argument("values", ListArgument::new(IntegerArgument::integer()).count(1, 16))
                .executes_sync(|ctx: &CommandContext<Session>| {
                    let sum: i64 = ctx.get_argument::<Vec<i64>>("values")?.iter().sum();
                    ctx.source().reply(sum.to_string());
                    to_status(sum)
                }),
        ),
        literal("greet")
            .alias("hi")
            .executes_sync(|ctx: &CommandContext<Session>| {
                ctx.source().reply(format!("hello, {}", ctx.source().user));
                Ok(1)
            })
            .then(
                argument("who", StringArgument::word())
                    .suggests(|_ctx, builder| async move {
                        let builder = KNOWN_USERS
                            .iter()
                            .filter(|name| builder.matches(name))
                            .fold(builder.restart(), |b, name| {
                                b.suggest_with_tooltip(*name, "known user")
                            });
                        Ok::<_, CommandError>(builder.build())
                    })
                    .executes_sync(|ctx: &CommandContext<Session>| {
                        let who = ctx.get_argument::<String>("who")?;
                        ctx.source().reply(format!("hello, {who}"));
                        Ok(1)
                    }),
            ),
        literal("flag").then(
            argument("value", BoolArgument).executes_sync(|ctx: &CommandContext<Session>| {
                let value = *ctx.get_argument::<bool>("value")?;
                ctx.source().reply(format!("flag is {}", if value { "on" } else { "off" }));
                Ok(i32::from(value))
            }),
        ),
        literal("maybe").then(
            argument("n", ErrorableArgument::new(IntegerArgument::integer())).executes_sync(
                |ctx: &CommandContext<Session>| {
                    let n = ctx.get_argument::<ErrorableValue<i64>>("n")?;
                    match (n.value(), n.error()) {
                        (Some(value), _) => {
                            ctx.source().reply(format!("got {value}"));
                            Ok(1)
                        }
                        (None, Some(err)) => {
                            ctx.source().reply(format!("'{}' is not usable: {err}", n.raw()));
                            Ok(0)
                        }
                        (None, None) => Ok(0),
                    }
                },
            ),
        ),
        literal("later").then(
            argument("n", LazyArgument::new(IntegerArgument::between(0, 100))).executes(
                |ctx: CommandContext<Session>| async move {
                    let lazy = ctx.get_argument::<Lazy<i64>>("n")?.clone();
                    ctx.source().reply(format!("resolving '{}'", lazy.raw()));
                    let value = lazy.resolve().await?;
                    ctx.source().reply(format!("resolved {value}"));
                    to_status(value)
                },
            ),
        ),
        literal("admin")
            .requires(|session: &Session| session.admin)
            .executes_sync(|ctx: &CommandContext<Session>| {
                ctx.source().reply(format!("{} is an admin", ctx.source().user));
                Ok(1)
            }),
        literal("run").redirect(root),
        literal("as").then(
            argument("users", ListArgument::new(StringArgument::word()).unique()).fork(
                root,
                |ctx: &CommandContext<Session>| {
                    let users = ctx.get_argument::<Vec<String>>("users")?;
                    Ok(users.iter().map(|user| ctx.source().as_user(user)).collect())
                },
            ),
        ),
    ];

    for command in commands {
        let registration = dispatcher.register(command)?;
        conflicts.extend(registration.conflicts);
    }
    tracing::debug!(nodes = dispatcher.tree().node_count(), "demo tree built");
    Ok((dispatcher, conflicts))
}
