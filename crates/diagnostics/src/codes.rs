//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. Every code listed in [`ALL`] has an entry in
//! [`crate::explain`].

// ── Reader ──────────────────────────────────────────────────────────────

/// The reader cursor was moved outside the input.
pub const INVALID_CURSOR: &str = "CMD1001";
/// A token of a particular shape was expected but not found.
pub const EXPECTED: &str = "CMD1101";
/// A token was found but could not be converted to the expected value.
pub const BAD_VALUE: &str = "CMD1102";
/// A quoted string was never closed.
pub const MISSING_QUOTE: &str = "CMD1103";
/// A quoted string contained an unsupported escape sequence.
pub const INVALID_ESCAPE: &str = "CMD1104";

// ── Argument types ──────────────────────────────────────────────────────

/// A numeric value or list length fell outside its allowed bounds.
pub const OUT_OF_RANGE: &str = "CMD1201";
/// A list separator was missing, doubled, or trailing.
pub const BAD_SEPARATOR: &str = "CMD1202";

// ── Dispatcher ──────────────────────────────────────────────────────────

/// No registered command matched the input.
pub const UNKNOWN_COMMAND: &str = "CMD1301";
/// A command matched but one of its arguments did not.
pub const UNKNOWN_ARGUMENT: &str = "CMD1302";
/// A literal keyword did not match the input token.
pub const INCORRECT_LITERAL: &str = "CMD1303";
/// An argument was followed by trailing data instead of a separator.
pub const EXPECTED_SEPARATOR: &str = "CMD1304";

// ── Execution ───────────────────────────────────────────────────────────

/// A command asked for an argument that was not parsed.
pub const NO_SUCH_ARGUMENT: &str = "CMD1401";
/// A command asked for an argument with the wrong value type.
pub const ARGUMENT_TYPE_MISMATCH: &str = "CMD1402";
/// Loading (resolving) a parsed argument failed.
pub const LOAD_FAILED: &str = "CMD1501";
/// A command reported a user-facing failure.
pub const COMMAND_FAILED: &str = "CMD1502";
/// A command failed with an internal error.
pub const INTERNAL: &str = "CMD1503";

// ── Registration / lint ─────────────────────────────────────────────────

/// Two sibling nodes accept the same example input.
pub const AMBIGUOUS_INPUT: &str = "CMD1601";
/// A registration tried to replace an existing command callback.
pub const DUPLICATE_COMMAND: &str = "CMD1602";

/// Every known diagnostic code, in numeric order.
pub const ALL: &[&str] = &[
    INVALID_CURSOR,
    EXPECTED,
    BAD_VALUE,
    MISSING_QUOTE,
    INVALID_ESCAPE,
    OUT_OF_RANGE,
    BAD_SEPARATOR,
    UNKNOWN_COMMAND,
    UNKNOWN_ARGUMENT,
    INCORRECT_LITERAL,
    EXPECTED_SEPARATOR,
    NO_SUCH_ARGUMENT,
    ARGUMENT_TYPE_MISMATCH,
    LOAD_FAILED,
    COMMAND_FAILED,
    INTERNAL,
    AMBIGUOUS_INPUT,
    DUPLICATE_COMMAND,
];
