//! Engine settings

use actgraph_core::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// Settings for clause tagging and graph construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Traversal bound when locating the merge of a decision
    pub max_search_depth: usize,
    /// Keywords that turn a condition into the `else` branch
    pub empty_conditional_indicators: Vec<String>,
    /// Verbs whose actions end the activity
    pub termination_indicators: Vec<String>,
    /// Keywords that mark a conditional argument frame
    pub conditional_indicators: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_search_depth: DEFAULT_MAX_DEPTH,
            empty_conditional_indicators: strings(&[
                "otherwise",
                "else",
                "or else",
                "if not",
                "in other cases",
                "in any other case",
            ]),
            termination_indicators: strings(&[
                "end",
                "stop",
                "terminate",
                "finish",
                "cancel",
                "abort",
                "reject",
                "quit",
                "close",
                "exit",
            ]),
            conditional_indicators: strings(&[
                "if",
                "when",
                "whenever",
                "in case",
                "unless",
                "otherwise",
                "else",
                "as long as",
                "provided that",
                "in the event",
                "once",
            ]),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With traversal bound
    #[inline]
    #[must_use]
    pub fn with_max_search_depth(mut self, depth: usize) -> Self {
        self.max_search_depth = depth;
        self
    }

    /// With empty-conditional keywords
    #[inline]
    #[must_use]
    pub fn with_empty_conditional_indicators<S: Into<String>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.empty_conditional_indicators = words.into_iter().map(Into::into).collect();
        self
    }

    /// With termination verbs
    #[inline]
    #[must_use]
    pub fn with_termination_indicators<S: Into<String>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.termination_indicators = words.into_iter().map(Into::into).collect();
        self
    }

    /// With conditional keywords
    #[inline]
    #[must_use]
    pub fn with_conditional_indicators<S: Into<String>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.conditional_indicators = words.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `keyword` (case-insensitive) is an empty-conditional indicator
    #[must_use]
    pub fn is_empty_conditional(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        self.empty_conditional_indicators
            .iter()
            .any(|i| i.to_lowercase() == keyword)
    }
}
