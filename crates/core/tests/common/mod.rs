//! Shared test helpers for `cmdgraph_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::{Arc, Mutex};

use cmdgraph_core::{
    ArgumentType, CommandError, CommandSyntaxError, ContextKey, Dispatcher, EntryPoint,
    ParseResults, StringMode, StringReader, Suggestions, loaded,
};
use futures::executor::block_on;
use futures::future::BoxFuture;

/// Who issued a command in these tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub admin: bool,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            admin: false,
        }
    }

    #[allow(dead_code)]
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            name: format!("user{id}"),
            admin: false,
        }
    }

    pub fn admin() -> Self {
        Self {
            admin: true,
            ..Self::named("root")
        }
    }
}

/// Records values observed by command callbacks.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ─── Dispatch helpers ────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn parse(dispatcher: &Dispatcher<User>, input: &str) -> ParseResults<User> {
    dispatcher.parse(&EntryPoint::default(), input, User::named("tester"))
}

/// Parse and execute `input` as `user`.
#[allow(dead_code)]
pub fn run_as(
    dispatcher: &Dispatcher<User>,
    input: &str,
    user: User,
) -> Result<Vec<Result<i32, CommandError>>, CommandError> {
    block_on(dispatcher.execute(&EntryPoint::default(), input, user))
}

/// Parse and execute `input`, expecting exactly one successful outcome.
#[allow(dead_code)]
pub fn run(dispatcher: &Dispatcher<User>, input: &str) -> i32 {
    let outcomes = run_as(dispatcher, input, User::named("tester"))
        .unwrap_or_else(|e| panic!("'{input}' failed: {e}"));
    assert_eq!(outcomes.len(), 1, "'{input}' should run one command");
    match &outcomes[0] {
        Ok(value) => *value,
        Err(e) => panic!("'{input}' failed: {e}"),
    }
}

/// Completions for `input` with the caret at `cursor`.
#[allow(dead_code)]
pub fn complete_at(dispatcher: &Dispatcher<User>, input: &str, cursor: usize) -> Suggestions {
    let parse = parse(dispatcher, input);
    block_on(dispatcher.completion_suggestions(&parse, cursor))
        .unwrap_or_else(|e| panic!("completing '{input}' at {cursor} failed: {e}"))
}

/// Completions for `input` with the caret at its end.
#[allow(dead_code)]
pub fn complete(dispatcher: &Dispatcher<User>, input: &str) -> Suggestions {
    complete_at(dispatcher, input, input.len())
}

// ─── Custom argument types ───────────────────────────────────────────────────

/// Ambient greeting prefix read by [`GreetingArgument`] during `load`.
#[allow(dead_code)]
pub const GREETING: ContextKey<String> = ContextKey::new("greeting");

/// A word that loads into `"<greeting>, <word>"` using the entry point.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub struct GreetingArgument;

impl ArgumentType for GreetingArgument {
    type Parsed = String;
    type Output = String;

    fn parse(
        &self,
        _entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<String, CommandSyntaxError> {
        StringMode::SingleWord.read(reader)
    }

    fn load(
        &self,
        entry: &EntryPoint,
        parsed: String,
    ) -> BoxFuture<'static, Result<String, CommandError>> {
        let greeting = entry.get(&GREETING).cloned().unwrap_or_else(|| "hello".into());
        loaded(format!("{greeting}, {parsed}"))
    }

    fn examples(&self) -> Vec<String> {
        vec!["alice".into(), "bob".into()]
    }
}

/// A word whose `load` always fails, like a lookup of a missing record.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub struct MissingRecordArgument;

impl ArgumentType for MissingRecordArgument {
    type Parsed = String;
    type Output = String;

    fn parse(
        &self,
        _entry: &EntryPoint,
        reader: &mut StringReader,
    ) -> Result<String, CommandSyntaxError> {
        StringMode::SingleWord.read(reader)
    }

    fn load(
        &self,
        _entry: &EntryPoint,
        parsed: String,
    ) -> BoxFuture<'static, Result<String, CommandError>> {
        Box::pin(async move { Err(CommandError::user(format!("no record named '{parsed}'"))) })
    }
}
