//! Diagnostics for cmdgraph.
//!
//! Provides [`Diagnostic`], [`Severity`], and [`Span`] types used to report
//! parse failures, execution failures, and registration lint findings from
//! the command engine. Diagnostic codes are defined in the [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error; the command cannot run.
    Error,
    /// The command tree or input may behave unexpectedly.
    Warn,
    /// Informational note.
    Info,
}

/// Byte span in the command input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }
}

/// A diagnostic message produced while parsing, executing, or linting commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"CMD1301"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Optional byte span in the command input that this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Attach machine-readable context metadata (builder pattern).
    ///
    /// Keys are short descriptors like `"node"`, `"argument"`, `"min"`.
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    match id {
        codes::INVALID_CURSOR => Some(
            "The reader cursor was moved outside the bounds of the input or onto a position \
             that is not a character boundary. This indicates a bug in an argument type or \
             host code, not a problem with the typed command.",
        ),
        codes::EXPECTED => Some(
            "The parser expected a particular kind of token (an integer, a boolean, an opening \
             quote, a list element, ...) at this position but found something else or reached \
             the end of the input.",
        ),
        codes::BAD_VALUE => Some(
            "A token had the right shape but could not be converted, e.g. an integer that \
             overflows, a number with more than one decimal point, or a boolean other than \
             `true`/`false`.",
        ),
        codes::MISSING_QUOTE => Some(
            "A quoted string was opened but never closed with the same quote character.",
        ),
        codes::INVALID_ESCAPE => Some(
            "Inside a quoted string, a backslash may only escape the surrounding quote \
             character or another backslash.",
        ),
        codes::OUT_OF_RANGE => Some(
            "A numeric argument or the number of list elements is outside the inclusive \
             bounds declared by the argument type.",
        ),
        codes::BAD_SEPARATOR => Some(
            "A list argument has a separator with nothing after it, two separators in a row, \
             or an element followed by unexpected characters instead of a separator.",
        ),
        codes::UNKNOWN_COMMAND => Some(
            "The input did not match any registered command, or it matched a node that has \
             no executable command attached.",
        ),
        codes::UNKNOWN_ARGUMENT => Some(
            "Parsing stopped before the end of the input and no sibling node accepted the \
             remaining text.",
        ),
        codes::INCORRECT_LITERAL => Some(
            "A keyword node was tried but the input token did not equal its name or any of \
             its aliases (compared case-insensitively).",
        ),
        codes::EXPECTED_SEPARATOR => Some(
            "An argument was parsed successfully but was immediately followed by more \
             characters instead of the argument separator or the end of input.",
        ),
        codes::NO_SUCH_ARGUMENT => Some(
            "A command callback requested an argument name that was not parsed in its \
             context. Check the argument names used when building the command tree.",
        ),
        codes::ARGUMENT_TYPE_MISMATCH => Some(
            "A command callback requested an argument with a different value type than the \
             argument type produces.",
        ),
        codes::LOAD_FAILED => Some(
            "An argument was parsed but resolving it to its final value failed, for example \
             because a referenced entity does not exist.",
        ),
        codes::COMMAND_FAILED => Some(
            "The command ran and reported a failure intended to be shown to the user.",
        ),
        codes::INTERNAL => Some(
            "The command ran and failed with an internal error that is not meant for end \
             users; check the logs.",
        ),
        codes::AMBIGUOUS_INPUT => Some(
            "Two sibling nodes both accept at least one of each other's example inputs. The \
             dispatcher resolves such input deterministically, but the grammar is probably \
             not what the author intended.",
        ),
        codes::DUPLICATE_COMMAND => Some(
            "A command path was registered twice with an executable callback. The first \
             callback is kept and the later one is ignored.",
        ),
        _ => None,
    }
}
