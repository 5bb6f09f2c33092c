use serde::{Deserialize, Serialize};

/// Byte range `[start, end)` over a command input string.
///
/// Tags which part of the input a parsed node, argument, or suggestion
/// corresponds to. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StringRange {
    start: usize,
    end: usize,
}

impl StringRange {
    /// Create a range covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "StringRange end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Zero-width range at `pos`.
    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Smallest range covering both `a` and `b`.
    pub fn encompassing(a: StringRange, b: StringRange) -> Self {
        Self {
            start: a.start.min(b.start),
            end: a.end.max(b.end),
        }
    }

    /// Byte offset of the first character.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The slice of `input` covered by this range, clamped to the input.
    pub fn get<'a>(&self, input: &'a str) -> &'a str {
        let end = self.end.min(input.len());
        let start = self.start.min(end);
        input.get(start..end).unwrap_or("")
    }
}

impl From<StringRange> for cmdgraph_diagnostics::Span {
    fn from(range: StringRange) -> Self {
        cmdgraph_diagnostics::Span::new(range.start, range.end)
    }
}
