//! Dispatcher configuration.

use serde::Deserialize;

/// Settings shared by parsing, completion, and usage generation.
///
/// Deserializes from partial documents; missing fields keep their defaults:
///
/// ```
/// use cmdgraph_core::DispatcherConfig;
///
/// let config: DispatcherConfig = serde_json::from_str(r#"{ "suggest_aliases": true }"#).unwrap();
/// assert!(config.suggest_aliases);
/// assert_eq!(config.argument_separator, ' ');
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Character separating one node's input from the next.
    pub argument_separator: char,
    /// Usage text for a redirect back to the root.
    pub root_redirect_usage: String,
    /// Offer literal aliases as completions alongside the primary name.
    pub suggest_aliases: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            argument_separator: ' ',
            root_redirect_usage: "...".to_string(),
            suggest_aliases: false,
        }
    }
}

impl DispatcherConfig {
    /// Use `separator` between nodes.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.argument_separator = separator;
        self
    }

    /// Use `text` for redirects back to the root in usage strings.
    pub fn with_root_redirect_usage(mut self, text: impl Into<String>) -> Self {
        self.root_redirect_usage = text.into();
        self
    }

    /// Whether to complete literal aliases.
    pub fn with_suggest_aliases(mut self, suggest: bool) -> Self {
        self.suggest_aliases = suggest;
        self
    }
}
