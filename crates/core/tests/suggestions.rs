//! Completion tests: which node completes at a cursor, how candidates are
//! filtered, and how failing providers are isolated.

mod common;

use common::{User, complete, complete_at, parse};
use cmdgraph_core::{
    BoolArgument, CommandError, Dispatcher, DispatcherConfig, IntegerArgument, ListArgument,
    StringArgument, StringRange, Suggestions, SyntaxErrorKind, argument, literal,
};
use futures::executor::block_on;

fn commands() -> Dispatcher<User> {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(
            literal("i")
                .then(literal("1").executes_sync(|_| Ok(1)))
                .then(literal("2").executes_sync(|_| Ok(2))),
        )
        .unwrap();
    dispatcher
        .register(literal("greet").alias("hi").executes_sync(|_| Ok(0)))
        .unwrap();
    dispatcher
        .register(
            literal("add").then(
                argument("a", IntegerArgument::integer())
                    .then(argument("b", IntegerArgument::integer()).executes_sync(|_| Ok(0))),
            ),
        )
        .unwrap();
    dispatcher
        .register(
            literal("admin")
                .requires(|user: &User| user.admin)
                .executes_sync(|_| Ok(0)),
        )
        .unwrap();
    dispatcher
}

// ─── Node before the cursor ──────────────────────────────────────────────────

#[test]
fn completes_children_after_a_separator() {
    let dispatcher = commands();
    let suggestions = complete(&dispatcher, "i ");
    assert_eq!(suggestions.texts(), ["1", "2"]);
    assert_eq!(suggestions.range(), StringRange::at(2));
}

#[test]
fn completes_top_level_names_at_the_start() {
    let dispatcher = commands();
    let suggestions = complete_at(&dispatcher, "", 0);
    assert_eq!(suggestions.texts(), ["add", "greet", "i"]);
    assert_eq!(suggestions.range(), StringRange::at(0));
}

#[test]
fn completes_partial_token() {
    let dispatcher = commands();
    let suggestions = complete(&dispatcher, "gr");
    assert_eq!(suggestions.texts(), ["greet"]);
    assert_eq!(suggestions.range(), StringRange::new(0, 2));
    assert_eq!(suggestions.list()[0].apply("gr"), "greet");
}

#[test]
fn cursor_inside_earlier_token_completes_that_token() {
    let dispatcher = commands();
    let suggestions = complete_at(&dispatcher, "add 1 2", 2);
    assert_eq!(suggestions.texts(), ["add"]);
    assert_eq!(suggestions.range(), StringRange::new(0, 2));
}

#[test]
fn argument_examples_complete_by_default() {
    let dispatcher = commands();
    let suggestions = complete(&dispatcher, "add 1");
    assert!(suggestions.texts().contains(&"123"));
    assert!(!suggestions.texts().contains(&"-123"));
    assert_eq!(suggestions.range().start(), 4);
}

// ─── Filtering ───────────────────────────────────────────────────────────────

#[test]
fn requirements_hide_completions() {
    let dispatcher = commands();
    let guest = complete(&dispatcher, "ad");
    assert_eq!(guest.texts(), ["add"]);

    let parse = dispatcher.parse(&Default::default(), "ad", User::admin());
    let admin = block_on(dispatcher.completion_suggestions(&parse, 2)).unwrap();
    assert_eq!(admin.texts(), ["add", "admin"]);
}

#[test]
fn aliases_complete_only_when_enabled() {
    let dispatcher = commands();
    assert!(complete(&dispatcher, "h").is_empty());

    let mut with_aliases =
        Dispatcher::<User>::with_config(DispatcherConfig::default().with_suggest_aliases(true));
    with_aliases
        .register(literal("greet").alias("hi").executes_sync(|_| Ok(0)))
        .unwrap();
    assert_eq!(complete(&with_aliases, "h").texts(), ["hi"]);
    assert_eq!(complete(&with_aliases, "").texts(), ["greet", "hi"]);
}

// ─── Providers ───────────────────────────────────────────────────────────────

#[test]
fn custom_provider_replaces_type_suggestions() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("color").then(
            argument("name", StringArgument::word())
                .suggests(|_ctx, builder| async move {
                    let builder = ["red", "green", "blue"]
                        .into_iter()
                        .filter(|c| builder.matches(c))
                        .fold(builder.restart(), |b, c| b.suggest_with_tooltip(c, "a color"));
                    Ok::<_, CommandError>(builder.build())
                })
                .executes_sync(|_| Ok(0)),
        ))
        .unwrap();
    let suggestions = complete(&dispatcher, "color gr");
    assert_eq!(suggestions.texts(), ["green"]);
    assert_eq!(suggestions.list()[0].tooltip(), Some("a color"));
}

#[test]
fn failing_provider_does_not_hide_siblings() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(
            literal("set")
                .then(
                    argument("broken", StringArgument::word())
                        .suggests(|_ctx, _builder| async {
                            Err::<Suggestions, _>(CommandError::user("offline"))
                        })
                        .executes_sync(|_| Ok(0)),
                )
                .then(argument("flag", BoolArgument).executes_sync(|_| Ok(0))),
        )
        .unwrap();
    assert_eq!(complete(&dispatcher, "set t").texts(), ["true"]);
}

#[test]
fn list_completes_after_last_separator() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("flags").then(
            argument("values", ListArgument::new(BoolArgument)).executes_sync(|_| Ok(0)),
        ))
        .unwrap();
    let suggestions = complete(&dispatcher, "flags true,f");
    assert_eq!(suggestions.texts(), ["false"]);
    assert_eq!(suggestions.range(), StringRange::new(11, 12));
}

// ─── Redirects ───────────────────────────────────────────────────────────────

#[test]
fn completes_inside_redirect_target() {
    let mut dispatcher = commands();
    let root = dispatcher.root();
    dispatcher.register(literal("run").redirect(root)).unwrap();
    let suggestions = complete(&dispatcher, "run i ");
    assert_eq!(suggestions.texts(), ["1", "2"]);
    let suggestions = complete(&dispatcher, "run ");
    assert_eq!(suggestions.texts(), ["add", "greet", "i", "run"]);
}

// ─── Cursor validation ───────────────────────────────────────────────────────

#[test]
fn cursor_past_the_end_is_rejected() {
    let dispatcher = commands();
    let parse = parse(&dispatcher, "i");
    let err = block_on(dispatcher.completion_suggestions(&parse, 5)).unwrap_err();
    assert!(matches!(
        err.kind(),
        SyntaxErrorKind::InvalidCursorPosition { position: 5, .. }
    ));
}

#[test]
fn cursor_off_a_char_boundary_is_rejected() {
    let dispatcher = commands();
    let parse = parse(&dispatcher, "é");
    assert!(block_on(dispatcher.completion_suggestions(&parse, 1)).is_err());
}
