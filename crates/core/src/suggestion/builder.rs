use crate::range::StringRange;

use super::{Suggestion, Suggestions};

/// Collects suggestions for the text between `start` and the end of `input`.
#[derive(Debug, Clone)]
pub struct SuggestionsBuilder {
    input: String,
    start: usize,
    remaining: String,
    remaining_lower: String,
    result: Vec<Suggestion>,
}

impl SuggestionsBuilder {
    /// Builder for suggestions replacing `input[start..]`.
    ///
    /// `start` is clamped to the input and moved back to a character boundary.
    pub fn new(input: impl Into<String>, start: usize) -> Self {
        let input = input.into();
        let mut start = start.min(input.len());
        while !input.is_char_boundary(start) {
            start -= 1;
        }
        let remaining = input[start..].to_string();
        let remaining_lower = remaining.to_lowercase();
        Self {
            input,
            start,
            remaining,
            remaining_lower,
            result: Vec::new(),
        }
    }

    /// The (truncated) input being completed.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Where replacements start.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The partial token typed so far.
    pub fn remaining(&self) -> &str {
        &self.remaining
    }

    /// [`remaining`](Self::remaining), lowercased.
    pub fn remaining_lowercase(&self) -> &str {
        &self.remaining_lower
    }

    fn range(&self) -> StringRange {
        StringRange::new(self.start, self.input.len())
    }

    /// Offer `text`. Ignored if it equals what was already typed.
    pub fn suggest(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if text != self.remaining {
            let range = self.range();
            self.result.push(Suggestion::new(range, text));
        }
        self
    }

    /// Offer `text` with a tooltip.
    pub fn suggest_with_tooltip(
        mut self,
        text: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> Self {
        let text = text.into();
        if text != self.remaining {
            let range = self.range();
            self.result.push(Suggestion::with_tooltip(range, text, tooltip));
        }
        self
    }

    /// Take over everything another builder collected.
    pub fn add(mut self, other: SuggestionsBuilder) -> Self {
        self.result.extend(other.result);
        self
    }

    /// Whether `candidate` starts with the typed text, ignoring case.
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.to_lowercase().starts_with(&self.remaining_lower)
    }

    /// Freeze into a sorted batch.
    pub fn build(self) -> Suggestions {
        Suggestions::create(&self.input, self.result)
    }

    /// Empty builder over the same input starting at `start`.
    pub fn create_offset(&self, start: usize) -> SuggestionsBuilder {
        SuggestionsBuilder::new(self.input.clone(), start)
    }

    /// Empty builder over the same input and start.
    pub fn restart(&self) -> SuggestionsBuilder {
        self.create_offset(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_appends_to_partial_token() {
        let result = SuggestionsBuilder::new("Hello w", 6).suggest("world!").build();
        assert_eq!(result.texts(), ["world!"]);
        assert_eq!(result.range(), StringRange::new(6, 7));
    }

    #[test]
    fn suggest_skips_exact_match() {
        let result = SuggestionsBuilder::new("Hello world!", 6)
            .suggest("world!")
            .build();
        assert!(result.is_empty());
    }

    #[test]
    fn matches_is_case_insensitive_prefix() {
        let builder = SuggestionsBuilder::new("ECH", 0);
        assert!(builder.matches("echo"));
        assert!(!builder.matches("add"));
    }

    #[test]
    fn restart_drops_collected_suggestions() {
        let builder = SuggestionsBuilder::new("a", 0).suggest("abc");
        assert!(builder.restart().build().is_empty());
        assert_eq!(builder.build().texts(), ["abc"]);
    }

    #[test]
    fn add_combines_builders() {
        let a = SuggestionsBuilder::new("x", 0).suggest("xa");
        let b = a.restart().suggest("xb");
        assert_eq!(a.add(b).build().texts(), ["xa", "xb"]);
    }

    #[test]
    fn start_past_end_is_clamped() {
        let builder = SuggestionsBuilder::new("ab", 10);
        assert_eq!(builder.start(), 2);
        assert_eq!(builder.remaining(), "");
    }
}
