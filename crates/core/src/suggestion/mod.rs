//! Completion suggestions: single replacements and merged batches.

mod builder;

pub use builder::SuggestionsBuilder;

use std::cmp::Ordering;

use serde::Serialize;

use crate::range::StringRange;

/// A candidate replacement for a span of the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Suggestion {
    range: StringRange,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
}

impl Suggestion {
    /// Replace `range` with `text`.
    pub fn new(range: StringRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            tooltip: None,
        }
    }

    /// Replace `range` with `text`, showing `tooltip` alongside it.
    pub fn with_tooltip(
        range: StringRange,
        text: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> Self {
        Self {
            range,
            text: text.into(),
            tooltip: Some(tooltip.into()),
        }
    }

    /// The span of input this suggestion replaces.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Replacement text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Optional hint shown next to the suggestion.
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Splice this suggestion into `input`.
    pub fn apply(&self, input: &str) -> String {
        if self.range.start() == 0 && self.range.end() == input.len() {
            return self.text.clone();
        }
        let prefix = StringRange::new(0, self.range.start()).get(input);
        let suffix = input.get(self.range.end()..).unwrap_or("");
        format!("{prefix}{}{suffix}", self.text)
    }

    /// Re-anchor to the wider `range`, copying the surrounding input into the text.
    pub fn expand(&self, command: &str, range: StringRange) -> Suggestion {
        if range == self.range {
            return self.clone();
        }
        let before = StringRange::new(range.start(), self.range.start().max(range.start()));
        let after = StringRange::new(self.range.end().min(range.end()), range.end());
        Suggestion {
            range,
            text: format!("{}{}{}", before.get(command), self.text, after.get(command)),
            tooltip: self.tooltip.clone(),
        }
    }

    fn sort_key(&self, other: &Self) -> Ordering {
        self.text
            .to_lowercase()
            .cmp(&other.text.to_lowercase())
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.tooltip.cmp(&other.tooltip))
    }
}

/// A sorted, deduplicated batch of suggestions sharing one range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Suggestions {
    range: StringRange,
    #[serde(rename = "suggestions")]
    list: Vec<Suggestion>,
}

impl Suggestions {
    /// No suggestions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The combined range every suggestion replaces.
    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Suggestions in case-insensitive order.
    pub fn list(&self) -> &[Suggestion] {
        &self.list
    }

    /// Just the replacement texts.
    pub fn texts(&self) -> Vec<&str> {
        self.list.iter().map(Suggestion::text).collect()
    }

    /// Whether there is nothing to suggest.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Anchor `suggestions` to their combined range, then sort and deduplicate.
    pub fn create(command: &str, suggestions: Vec<Suggestion>) -> Self {
        let Some(range) = suggestions
            .iter()
            .map(Suggestion::range)
            .reduce(StringRange::encompassing)
        else {
            return Self::empty();
        };
        let mut list: Vec<Suggestion> = suggestions
            .iter()
            .map(|s| s.expand(command, range))
            .collect();
        list.sort_by(Suggestion::sort_key);
        list.dedup();
        Self { range, list }
    }

    /// Combine batches from sibling providers into one.
    pub fn merge(command: &str, batches: &[Suggestions]) -> Self {
        match batches {
            [] => Self::empty(),
            [single] => single.clone(),
            _ => {
                let all = batches
                    .iter()
                    .flat_map(|batch| batch.list.iter().cloned())
                    .collect();
                Self::create(command, all)
            }
        }
    }
}
