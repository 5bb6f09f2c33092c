//! Parsing and execution tests for the dispatcher.
//!
//! Covers literal exclusivity, backtracking between argument siblings,
//! error selection for unparsed input, redirects, forks, registration
//! merging, and the argument wrappers as seen by commands.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{GREETING, GreetingArgument, Log, MissingRecordArgument, User, parse, run, run_as};
use cmdgraph_core::{
    CommandContext, CommandError, Dispatcher, DispatcherConfig, EntryPoint, Errorable, ErrorableArgument,
    ErrorableValue, Expected, IntegerArgument, Lazy, LazyArgument, ListArgument, NodeKind,
    StringArgument, SyntaxErrorKind, argument, literal,
};
use futures::executor::block_on;

fn arithmetic() -> Dispatcher<User> {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(
            literal("add").then(argument("a", IntegerArgument::integer()).then(
                argument("b", IntegerArgument::integer()).executes_sync(|ctx| {
                    let a = ctx.get_argument::<i64>("a")?;
                    let b = ctx.get_argument::<i64>("b")?;
                    Ok((a + b) as i32)
                }),
            )),
        )
        .unwrap();
    dispatcher
        .register(literal("zero").executes_sync(|_| Ok(0)))
        .unwrap();
    dispatcher
}

fn syntax_kind(err: &CommandError) -> &SyntaxErrorKind {
    err.as_syntax()
        .unwrap_or_else(|| panic!("expected a syntax error, got {err}"))
        .kind()
}

// ─── Execution ───────────────────────────────────────────────────────────────

#[test]
fn executes_matched_command_with_loaded_arguments() {
    let dispatcher = arithmetic();
    assert_eq!(run(&dispatcher, "add 2 40"), 42);
    assert_eq!(run(&dispatcher, "zero"), 0);
}

#[test]
fn literals_match_case_insensitively() {
    let dispatcher = arithmetic();
    assert_eq!(run(&dispatcher, "ADD 1 1"), 2);
}

#[test]
fn async_commands_are_awaited() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("later").then(
            argument("n", LazyArgument::new(IntegerArgument::between(0, 10))).executes(
                |ctx| async move {
                    let lazy = ctx.get_argument::<Lazy<i64>>("n")?.clone();
                    assert_eq!(lazy.raw(), "7");
                    let value = lazy.resolve().await?;
                    Ok::<_, CommandError>(value as i32)
                },
            ),
        ))
        .unwrap();
    assert_eq!(run(&dispatcher, "later 7"), 7);
}

#[test]
fn lazy_values_parse_without_validation() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("later").then(
            argument("n", LazyArgument::new(IntegerArgument::between(0, 10)))
                .executes_sync(|ctx| Ok(ctx.get_argument::<Lazy<i64>>("n")?.raw().len() as i32)),
        ))
        .unwrap();
    assert_eq!(run(&dispatcher, "later 70"), 2, "never resolved, so never range-checked");
}

#[test]
fn lazy_resolution_reports_range_errors() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("later").then(
            argument("n", LazyArgument::new(IntegerArgument::between(0, 10))).executes(
                |ctx| async move {
                    let lazy = ctx.get_argument::<Lazy<i64>>("n")?.clone();
                    Ok::<_, CommandError>(lazy.resolve().await? as i32)
                },
            ),
        ))
        .unwrap();
    let err = run_as(&dispatcher, "later 70", User::named("x")).unwrap_err();
    assert!(matches!(syntax_kind(&err), SyntaxErrorKind::OutOfRange(_)));
}

#[test]
fn entry_point_reaches_argument_loading() {
    let mut dispatcher = Dispatcher::<User>::new();
    let log = Log::default();
    let seen = log.clone();
    dispatcher
        .register(literal("greet").then(argument("who", GreetingArgument).executes_sync(
            move |ctx| {
                seen.push(ctx.get_argument::<String>("who")?.clone());
                Ok(1)
            },
        )))
        .unwrap();

    let entry = EntryPoint::default().with(&GREETING, "howdy".to_string());
    block_on(dispatcher.execute(&entry, "greet bob", User::named("x"))).unwrap();
    block_on(dispatcher.execute(&EntryPoint::default(), "greet amy", User::named("x"))).unwrap();
    assert_eq!(log.entries(), ["howdy, bob", "hello, amy"]);
}

#[test]
fn load_failures_propagate_as_load_errors() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(
            literal("show")
                .then(argument("record", MissingRecordArgument).executes_sync(|_| Ok(1))),
        )
        .unwrap();
    let err = run_as(&dispatcher, "show ghost", User::named("x")).unwrap_err();
    match &err {
        CommandError::Load { name, source } => {
            assert_eq!(name, "record");
            assert!(source.is_user_facing());
        }
        other => panic!("expected a load error, got {other:?}"),
    }
    assert!(err.is_user_facing());
}

#[test]
fn command_errors_propagate() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("fail").executes_sync(|_| Err(CommandError::user("nope"))))
        .unwrap();
    let err = run_as(&dispatcher, "fail", User::named("x")).unwrap_err();
    assert_eq!(err.to_string(), "nope");
}

// ─── Parse errors ────────────────────────────────────────────────────────────

#[test]
fn single_candidate_failure_is_reported_verbatim() {
    let dispatcher = arithmetic();
    let err = run_as(&dispatcher, "add x 1", User::named("x")).unwrap_err();
    assert_eq!(syntax_kind(&err), &SyntaxErrorKind::Expected(Expected::Integer));
    assert_eq!(err.as_syntax().unwrap().cursor(), Some(4));
}

#[test]
fn argument_followed_by_garbage_expects_separator() {
    let dispatcher = arithmetic();
    let err = run_as(&dispatcher, "add 1x 2", User::named("x")).unwrap_err();
    assert_eq!(syntax_kind(&err), &SyntaxErrorKind::ExpectedSeparator);
}

#[test]
fn nothing_matched_is_unknown_argument() {
    let dispatcher = arithmetic();
    let err = run_as(&dispatcher, "subtract 1 2", User::named("x")).unwrap_err();
    assert_eq!(syntax_kind(&err), &SyntaxErrorKind::UnknownArgument);
    assert_eq!(err.as_syntax().unwrap().cursor(), Some(0));
}

#[test]
fn trailing_input_after_a_match_is_unknown_command() {
    let dispatcher = arithmetic();
    let parse = parse(&dispatcher, "add 1 2 3");
    assert!(!parse.is_complete());
    let err = parse.unparsed_error().unwrap();
    assert_eq!(err.kind(), &SyntaxErrorKind::UnknownCommand);
    assert_eq!(err.cursor(), Some(8));
}

#[test]
fn incomplete_command_is_unknown_command() {
    let dispatcher = arithmetic();
    let parse = parse(&dispatcher, "add 1");
    assert!(parse.is_complete());
    let err = block_on(dispatcher.execute_results(&parse)).unwrap_err();
    assert_eq!(syntax_kind(&err), &SyntaxErrorKind::UnknownCommand);
}

#[test]
fn literal_must_match_whole_token() {
    let dispatcher = arithmetic();
    let err = run_as(&dispatcher, "zeros", User::named("x")).unwrap_err();
    assert_eq!(syntax_kind(&err), &SyntaxErrorKind::UnknownArgument);
}

// ─── Candidate selection ─────────────────────────────────────────────────────

#[test]
fn matching_literal_excludes_its_siblings() {
    let checked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&checked);
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(
            literal("pick")
                .then(literal("1").then(literal("i").executes_sync(|_| Ok(1))))
                .then(
                    literal("2")
                        .requires(move |_| {
                            counter.fetch_add(1, Ordering::SeqCst);
                            true
                        })
                        .then(literal("i").executes_sync(|_| Ok(2))),
                ),
        )
        .unwrap();

    let parse = parse(&dispatcher, "pick 1 i");
    let path: Vec<Vec<String>> = parse
        .context
        .nodes()
        .iter()
        .map(|parsed| dispatcher.path(parsed.node))
        .collect();
    assert_eq!(path, [vec!["pick"], vec!["pick", "1"], vec!["pick", "1", "i"]]);
    assert_eq!(checked.load(Ordering::SeqCst), 0, "sibling literal was tried");
    assert_eq!(block_on(dispatcher.execute_results(&parse)).unwrap()[0].as_ref().unwrap(), &1);
}

#[test]
fn backtracks_into_the_argument_that_consumes_everything() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(
            literal("pick")
                .then(
                    argument("n", IntegerArgument::integer())
                        .then(literal("int").executes_sync(|_| Ok(1))),
                )
                .then(
                    argument("w", StringArgument::word())
                        .then(literal("word").executes_sync(|_| Ok(2))),
                ),
        )
        .unwrap();
    assert_eq!(run(&dispatcher, "pick 5 int"), 1);
    assert_eq!(run(&dispatcher, "pick 5 word"), 2);
    assert_eq!(run(&dispatcher, "pick five word"), 2);
}

#[test]
fn equally_good_candidates_keep_tree_order() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(
            literal("pick")
                .then(argument("a", StringArgument::word()).executes_sync(|_| Ok(1)))
                .then(argument("b", StringArgument::word()).executes_sync(|_| Ok(2))),
        )
        .unwrap();
    assert_eq!(run(&dispatcher, "pick x"), 1);
}

#[test]
fn requirements_hide_nodes_from_parsing() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(
            literal("shutdown")
                .requires(|user: &User| user.admin)
                .executes_sync(|_| Ok(1)),
        )
        .unwrap();
    assert!(run_as(&dispatcher, "shutdown", User::named("guest")).is_err());
    assert_eq!(
        run_as(&dispatcher, "shutdown", User::admin()).unwrap()[0].as_ref().unwrap(),
        &1
    );
}

#[test]
fn aliases_parse_like_the_primary_name() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("greet").alias("hi").executes_sync(|_| Ok(7)))
        .unwrap();
    assert_eq!(run(&dispatcher, "hi"), 7);
    assert_eq!(run(&dispatcher, "GREET"), 7);
}

#[test]
fn custom_separator_splits_nodes() {
    let mut dispatcher =
        Dispatcher::<User>::with_config(DispatcherConfig::default().with_separator('/'));
    dispatcher
        .register(literal("a").then(argument("n", IntegerArgument::integer()).executes_sync(
            |ctx| Ok(*ctx.get_argument::<i64>("n")? as i32),
        )))
        .unwrap();
    assert_eq!(run(&dispatcher, "a/5"), 5);
}

// ─── Redirects and forks ─────────────────────────────────────────────────────

fn with_check(dispatcher: &mut Dispatcher<User>) {
    dispatcher
        .register(literal("check").executes_sync(|ctx| {
            let user: &User = ctx.source();
            if user.id == 2 {
                return Err(CommandError::user(format!("{} is not allowed", user.name)));
            }
            Ok(user.id as i32)
        }))
        .unwrap();
}

#[test]
fn redirect_to_root_runs_the_rest_as_a_command() {
    let mut dispatcher = arithmetic();
    let root = dispatcher.root();
    dispatcher.register(literal("run").redirect(root)).unwrap();
    assert_eq!(run(&dispatcher, "run add 1 2"), 3);
    assert_eq!(run(&dispatcher, "run run zero"), 0);
}

#[test]
fn redirect_modifier_changes_the_source() {
    let mut dispatcher = Dispatcher::<User>::new();
    let log = Log::default();
    let seen = log.clone();
    dispatcher
        .register(literal("whoami").executes_sync(move |ctx: &CommandContext<User>| {
            seen.push(ctx.source().name.clone());
            Ok(1)
        }))
        .unwrap();
    let root = dispatcher.root();
    dispatcher
        .register(literal("as").then(
            argument("user", StringArgument::word())
                .redirect_with(root, |ctx| Ok(User::named(ctx.get_argument::<String>("user")?))),
        ))
        .unwrap();

    run_as(&dispatcher, "as alice whoami", User::named("bob")).unwrap();
    run_as(&dispatcher, "whoami", User::named("bob")).unwrap();
    assert_eq!(log.entries(), ["alice", "bob"]);
}

#[test]
fn fork_isolates_failing_branches() {
    let mut dispatcher = Dispatcher::<User>::new();
    with_check(&mut dispatcher);
    let root = dispatcher.root();
    dispatcher
        .register(literal("each").then(
            argument("ids", ListArgument::new(IntegerArgument::integer())).fork(root, |ctx| {
                let ids = ctx.get_argument::<Vec<i64>>("ids")?;
                Ok(ids.iter().map(|&id| User::with_id(id)).collect())
            }),
        ))
        .unwrap();

    let outcomes = run_as(&dispatcher, "each 1,2,3 check", User::named("x")).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].as_ref().unwrap(), &1);
    assert_eq!(outcomes[1].as_ref().unwrap_err().to_string(), "user2 is not allowed");
    assert_eq!(outcomes[2].as_ref().unwrap(), &3);
}

#[test]
fn fork_modifier_failure_is_an_outcome() {
    let mut dispatcher = Dispatcher::<User>::new();
    with_check(&mut dispatcher);
    let root = dispatcher.root();
    dispatcher
        .register(literal("nobody").fork(root, |_| Err(CommandError::user("no users"))))
        .unwrap();
    let outcomes = run_as(&dispatcher, "nobody check", User::named("x")).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_err());
}

#[test]
fn fork_to_no_sources_runs_nothing() {
    let mut dispatcher = Dispatcher::<User>::new();
    with_check(&mut dispatcher);
    let root = dispatcher.root();
    dispatcher
        .register(literal("none").fork(root, |_| Ok(Vec::new())))
        .unwrap();
    let outcomes = run_as(&dispatcher, "none check", User::named("x")).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn plain_redirect_propagates_failures() {
    let mut dispatcher = Dispatcher::<User>::new();
    with_check(&mut dispatcher);
    let root = dispatcher.root();
    dispatcher.register(literal("via").redirect(root)).unwrap();
    let err = run_as(&dispatcher, "via check", User::with_id(2)).unwrap_err();
    assert_eq!(err.to_string(), "user2 is not allowed");
    let outcomes = run_as(&dispatcher, "via check", User::with_id(5)).unwrap();
    assert_eq!(outcomes[0].as_ref().unwrap(), &5);
}

#[test]
fn redirect_context_is_chained() {
    let mut dispatcher = arithmetic();
    let root = dispatcher.root();
    dispatcher.register(literal("run").redirect(root)).unwrap();
    let parse = parse(&dispatcher, "run zero");
    let child = parse.context.child().expect("redirect creates a child context");
    assert_eq!(child.root(), root);
    assert_eq!(child.range().start(), 4);
    assert_eq!(parse.context.last_child().nodes().len(), 1);
}

// ─── Registration ────────────────────────────────────────────────────────────

#[test]
fn same_name_registrations_merge() {
    let mut dispatcher = Dispatcher::<User>::new();
    dispatcher
        .register(literal("tool").then(literal("x").executes_sync(|_| Ok(1))))
        .unwrap();
    dispatcher
        .register(literal("tool").then(literal("y").executes_sync(|_| Ok(2))))
        .unwrap();
    assert_eq!(dispatcher.tree().root().children().len(), 1);
    assert_eq!(run(&dispatcher, "tool x"), 1);
    assert_eq!(run(&dispatcher, "tool y"), 2);
}

#[test]
fn conflicting_registration_keeps_the_first_command() {
    let mut dispatcher = Dispatcher::<User>::new();
    let first = dispatcher
        .register(literal("dup").executes_sync(|_| Ok(1)))
        .unwrap();
    assert!(first.conflicts.is_empty());
    let second = dispatcher
        .register(literal("dup").executes_sync(|_| Ok(2)))
        .unwrap();
    assert_eq!(second.node, first.node);
    assert_eq!(second.conflicts.len(), 1);
    assert_eq!(second.conflicts[0].path, ["dup"]);
    assert_eq!(run(&dispatcher, "dup"), 1);
}

#[test]
fn unregister_removes_command() {
    let mut dispatcher = arithmetic();
    let zero = dispatcher.find_node(&["zero"]).unwrap();
    assert_eq!(dispatcher.tree().get(zero).unwrap().kind(), NodeKind::Literal);
    assert!(dispatcher.unregister(zero));
    assert!(run_as(&dispatcher, "zero", User::named("x")).is_err());
}

#[test]
fn register_at_extends_an_existing_node() {
    let mut dispatcher = arithmetic();
    let add = dispatcher.find_node(&["add"]).unwrap();
    dispatcher
        .register_at(add, literal("nothing").executes_sync(|_| Ok(0)))
        .unwrap();
    assert_eq!(run(&dispatcher, "add nothing"), 0);
}

// ─── Wrapped arguments ───────────────────────────────────────────────────────

#[test]
fn errorable_argument_exposes_failure_to_the_command() {
    let mut dispatcher = Dispatcher::<User>::new();
    let log = Log::default();
    let seen = log.clone();
    dispatcher
        .register(literal("maybe").then(
            argument("n", ErrorableArgument::new(IntegerArgument::integer())).executes_sync(
                move |ctx| {
                    let value = ctx.get_argument::<ErrorableValue<i64>>("n")?;
                    seen.push(format!(
                        "{:?} {} {}",
                        value.value(),
                        value.raw(),
                        value.error().map(|e| e.kind().to_string()).unwrap_or_default()
                    ));
                    Ok(0)
                },
            ),
        ))
        .unwrap();

    let parse = parse(&dispatcher, "maybe abc");
    let parsed = parse
        .context
        .arguments()
        .get("n")
        .and_then(|arg| arg.parsed::<Errorable<i64>>())
        .unwrap();
    assert_eq!(parsed.raw(), "abc");

    run(&dispatcher, "maybe abc");
    run(&dispatcher, "maybe 12");
    assert_eq!(log.entries(), ["None abc expected integer", "Some(12) 12 "]);
}
