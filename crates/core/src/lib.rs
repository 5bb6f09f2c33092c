//! cmdgraph core library.
//!
//! A grammar-driven command engine: commands are registered as a tree of
//! literal keywords and typed arguments, input is parsed against the tree
//! with backtracking, and the matched command runs asynchronously. The same
//! tree drives tab completion, usage strings, and an ambiguity lint.
//!
//! The main entry point is [`Dispatcher`]; trees are described with
//! [`literal`] and [`argument`] builders.

#![warn(missing_docs)]

/// Pluggable argument types and the built-in ones.
pub mod arguments;
/// Dispatcher configuration.
pub mod config;
/// Parse contexts and the typed entry-point map.
pub mod context;
/// Parsing, execution, completion, usage, and ambiguity detection.
pub mod dispatcher;
/// Syntax and execution errors.
pub mod error;
/// Byte ranges over the input.
pub mod range;
/// Cursor-based string reader.
pub mod reader;
/// Completion suggestions.
pub mod suggestion;
/// The command tree and its builders.
pub mod tree;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Reader
pub use range::StringRange;
pub use reader::StringReader;

// Errors
pub use error::{
    CommandError, CommandSyntaxError, Expected, RangeError, RangeViolation, SyntaxErrorKind,
    UserError,
};

// Suggestions
pub use suggestion::{Suggestion, Suggestions, SuggestionsBuilder};

// Argument types
pub use arguments::{
    ArgumentType, BoolArgument, Errorable, ErrorableArgument, ErrorableValue, FloatArgument,
    IntegerArgument, Lazy, LazyArgument, ListArgument, Number, NumberArgument, StringArgument,
    StringMode, escape_if_required, loaded,
};

// Tree
pub use tree::{
    Command, CommandBuilder, CommandNode, CommandSource, CommandTree, MAX_NODES, NodeId, NodeKind,
    RedirectModifier, Registration, RegistrationConflict, RegistrationError, Requirement,
    SuggestionProvider, argument, literal,
};

// Context
pub use context::{
    AnyValue, CommandContext, CommandContextBuilder, ContextKey, EntryPoint, ParsedArgument,
    ParsedCommandNode, SuggestionContext,
};

// Dispatcher
pub use config::DispatcherConfig;
pub use dispatcher::{Ambiguity, Dispatcher, ParseResults};

// Diagnostics (re-exported from the diagnostics crate)
pub use cmdgraph_diagnostics::{Diagnostic, Severity, Span, codes, explain};
