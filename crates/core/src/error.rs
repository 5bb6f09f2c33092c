//! Typed error types for parsing and executing commands.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cmdgraph_diagnostics::{Diagnostic, Span, codes};

/// Number of characters of input shown before the caret in [`CommandSyntaxError::context`].
const CONTEXT_AMOUNT: usize = 10;

/// What a reader or argument type expected to find.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// An integer literal.
    Integer,
    /// A floating point literal.
    Float,
    /// `true` or `false`.
    Boolean,
    /// An opening quote character.
    StartOfQuote,
    /// A non-empty unquoted word.
    Word,
    /// A list element.
    ListElement,
    /// A character.
    Character,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Integer => write!(f, "integer"),
            Expected::Float => write!(f, "float"),
            Expected::Boolean => write!(f, "boolean"),
            Expected::StartOfQuote => write!(f, "quote to start a string"),
            Expected::Word => write!(f, "word"),
            Expected::ListElement => write!(f, "list element"),
            Expected::Character => write!(f, "character"),
        }
    }
}

/// Which bound a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeViolation {
    /// Below the inclusive minimum.
    TooLow,
    /// Above the inclusive maximum.
    TooHigh,
}

/// A numeric value or list length outside its inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{what} must not be {} {}, found {actual}", self.relation(), self.bound())]
pub struct RangeError {
    /// Name of the bounded quantity (`"integer"`, `"float"`, `"list length"`).
    pub what: &'static str,
    /// Which bound was violated.
    pub violation: RangeViolation,
    /// Inclusive minimum, rendered for display.
    pub min: String,
    /// Inclusive maximum, rendered for display.
    pub max: String,
    /// The offending value, rendered for display.
    pub actual: String,
}

impl RangeError {
    /// The bound that was crossed.
    pub fn bound(&self) -> &str {
        match self.violation {
            RangeViolation::TooLow => &self.min,
            RangeViolation::TooHigh => &self.max,
        }
    }

    fn relation(&self) -> &'static str {
        match self.violation {
            RangeViolation::TooLow => "less than",
            RangeViolation::TooHigh => "more than",
        }
    }
}

/// Classification of a syntax-level failure.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    /// The reader cursor was set outside the input or off a char boundary.
    #[error("invalid cursor position {position} for input of length {length}")]
    InvalidCursorPosition {
        /// Requested position.
        position: usize,
        /// Input length in bytes.
        length: usize,
    },

    /// A token of some shape was expected.
    #[error("expected {0}")]
    Expected(Expected),

    /// A token was found but could not be converted.
    #[error("invalid {expected} '{value}'")]
    BadValue {
        /// What the token should have been.
        expected: Expected,
        /// The offending text.
        value: String,
    },

    /// A quoted string was never closed.
    #[error("unclosed quoted string")]
    MissingQuote,

    /// A backslash escaped something other than the quote or a backslash.
    #[error("invalid escape sequence '\\{0}' in quoted string")]
    InvalidEscape(char),

    /// A bounded value was out of range.
    #[error(transparent)]
    OutOfRange(RangeError),

    /// Malformed list separator usage.
    #[error("{0}")]
    BadSeparator(String),

    /// No command matched.
    #[error("unknown command")]
    UnknownCommand,

    /// A command matched but the rest of the input did not.
    #[error("incorrect argument for command")]
    UnknownArgument,

    /// A literal node did not match.
    #[error("expected literal '{0}'")]
    IncorrectLiteral(String),

    /// An argument was followed by trailing data.
    #[error("expected a separator to end one argument, but found trailing data")]
    ExpectedSeparator,
}

impl SyntaxErrorKind {
    /// Diagnostic code for this kind of failure.
    pub fn code(&self) -> &'static str {
        match self {
            SyntaxErrorKind::InvalidCursorPosition { .. } => codes::INVALID_CURSOR,
            SyntaxErrorKind::Expected(_) => codes::EXPECTED,
            SyntaxErrorKind::BadValue { .. } => codes::BAD_VALUE,
            SyntaxErrorKind::MissingQuote => codes::MISSING_QUOTE,
            SyntaxErrorKind::InvalidEscape(_) => codes::INVALID_ESCAPE,
            SyntaxErrorKind::OutOfRange(_) => codes::OUT_OF_RANGE,
            SyntaxErrorKind::BadSeparator(_) => codes::BAD_SEPARATOR,
            SyntaxErrorKind::UnknownCommand => codes::UNKNOWN_COMMAND,
            SyntaxErrorKind::UnknownArgument => codes::UNKNOWN_ARGUMENT,
            SyntaxErrorKind::IncorrectLiteral(_) => codes::INCORRECT_LITERAL,
            SyntaxErrorKind::ExpectedSeparator => codes::EXPECTED_SEPARATOR,
        }
    }

    /// Structured details for tooling.
    fn context(&self) -> BTreeMap<String, String> {
        let mut ctx = BTreeMap::new();
        match self {
            SyntaxErrorKind::InvalidCursorPosition { position, length } => {
                ctx.insert("position".into(), position.to_string());
                ctx.insert("length".into(), length.to_string());
            }
            SyntaxErrorKind::Expected(expected) => {
                ctx.insert("expected".into(), expected.to_string());
            }
            SyntaxErrorKind::BadValue { expected, value } => {
                ctx.insert("expected".into(), expected.to_string());
                ctx.insert("value".into(), value.clone());
            }
            SyntaxErrorKind::OutOfRange(range) => {
                ctx.insert("what".into(), range.what.to_string());
                ctx.insert("min".into(), range.min.clone());
                ctx.insert("max".into(), range.max.clone());
                ctx.insert("actual".into(), range.actual.clone());
            }
            SyntaxErrorKind::IncorrectLiteral(literal) => {
                ctx.insert("literal".into(), literal.clone());
            }
            _ => {}
        }
        ctx
    }
}

/// A syntax failure, optionally carrying the input and cursor where it happened.
///
/// Callers use [`context`](Self::context) or [`to_diagnostic`](Self::to_diagnostic)
/// to point at the failure in the original input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.render())]
pub struct CommandSyntaxError {
    kind: SyntaxErrorKind,
    input: Option<Arc<str>>,
    cursor: Option<usize>,
}

impl CommandSyntaxError {
    /// Error without input context.
    pub fn new(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            input: None,
            cursor: None,
        }
    }

    /// Error pointing at `cursor` within `input`.
    pub fn with_context(kind: SyntaxErrorKind, input: Arc<str>, cursor: usize) -> Self {
        Self {
            kind,
            input: Some(input),
            cursor: Some(cursor),
        }
    }

    /// The failure classification.
    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }

    /// The input being read when the error happened.
    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    /// Byte offset of the failure within [`input`](Self::input).
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Up to ten characters of input before the cursor followed by `<--[HERE]`.
    pub fn context(&self) -> Option<String> {
        let input = self.input.as_deref()?;
        let cursor = self.cursor?.min(input.len());
        let before = input.get(..cursor)?;
        let skip = before.chars().count().saturating_sub(CONTEXT_AMOUNT);
        let shown: String = before.chars().skip(skip).collect();
        let ellipsis = if skip > 0 { "..." } else { "" };
        Some(format!("{ellipsis}{shown}<--[HERE]"))
    }

    /// Span from the cursor to the end of the offending token.
    pub fn span(&self) -> Option<Span> {
        let input = self.input.as_deref()?;
        let start = self.cursor?.min(input.len());
        let token_len = input
            .get(start..)
            .map(|rest| rest.find(' ').unwrap_or(rest.len()))
            .unwrap_or(0);
        Some(Span::new(start, start + token_len))
    }

    /// The message followed by the caret context, when there is one.
    pub fn render(&self) -> String {
        match (self.context(), self.cursor) {
            (Some(context), Some(cursor)) => {
                format!("{} at position {cursor}: {context}", self.kind)
            }
            _ => self.kind.to_string(),
        }
    }

    /// Convert into a [`Diagnostic`] for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let ctx = self.kind.context();
        let diag = Diagnostic::error(self.code(), self.kind.to_string(), self.span());
        if ctx.is_empty() {
            diag
        } else {
            diag.with_context(ctx)
        }
    }
}

impl From<SyntaxErrorKind> for CommandSyntaxError {
    fn from(kind: SyntaxErrorKind) -> Self {
        Self::new(kind)
    }
}


/// A failure meant to be shown verbatim to the person who typed the command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UserError {
    /// Message for the end user.
    pub message: String,
}

impl UserError {
    /// Create a user-facing error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while loading arguments or executing commands.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The input did not parse.
    #[error(transparent)]
    Syntax(#[from] CommandSyntaxError),

    /// No argument with this name was parsed in the context.
    #[error("no argument named '{0}' was parsed")]
    NoSuchArgument(String),

    /// The argument was parsed but not loaded yet.
    #[error("argument '{0}' has not been loaded")]
    ArgumentNotLoaded(String),

    /// The argument value has a different type than requested.
    #[error("argument '{name}' is not a {expected}")]
    ArgumentTypeMismatch {
        /// Argument name.
        name: String,
        /// Requested type name.
        expected: &'static str,
    },

    /// Resolving a parsed argument failed.
    #[error("failed to load argument '{name}': {source}")]
    Load {
        /// Argument name.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<CommandError>,
    },

    /// A failure whose message is meant for the end user.
    #[error(transparent)]
    User(#[from] UserError),

    /// Any other failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl CommandError {
    /// Shorthand for a [`UserError`].
    pub fn user(message: impl Into<String>) -> Self {
        CommandError::User(UserError::new(message))
    }

    /// Wrap an arbitrary error.
    pub fn other(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        CommandError::Other(Box::new(error))
    }

    /// Whether [`to_string`](ToString::to_string) is safe to show to end users.
    pub fn is_user_facing(&self) -> bool {
        match self {
            CommandError::Syntax(_) | CommandError::User(_) => true,
            CommandError::Load { source, .. } => source.is_user_facing(),
            _ => false,
        }
    }

    /// The syntax error, if this is one.
    pub fn as_syntax(&self) -> Option<&CommandSyntaxError> {
        match self {
            CommandError::Syntax(err) => Some(err),
            _ => None,
        }
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Syntax(err) => err.code(),
            CommandError::NoSuchArgument(_) | CommandError::ArgumentNotLoaded(_) => {
                codes::NO_SUCH_ARGUMENT
            }
            CommandError::ArgumentTypeMismatch { .. } => codes::ARGUMENT_TYPE_MISMATCH,
            CommandError::Load { .. } => codes::LOAD_FAILED,
            CommandError::User(_) => codes::COMMAND_FAILED,
            CommandError::Other(_) => codes::INTERNAL,
        }
    }

    /// Convert into a [`Diagnostic`] for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CommandError::Syntax(err) => err.to_diagnostic(),
            CommandError::Load { name, source } => {
                let mut diag = Diagnostic::error(self.code(), self.to_string(), None);
                if let Some(syntax) = source.as_syntax() {
                    diag.span = syntax.span();
                }
                diag.with_context(BTreeMap::from([("argument".into(), name.clone())]))
            }
            _ => Diagnostic::error(self.code(), self.to_string(), None),
        }
    }
}
