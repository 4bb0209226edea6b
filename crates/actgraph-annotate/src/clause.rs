//! Clause (agent-verb-object) records

use crate::entailment::EntailmentLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Result of one entailment pair as seen from one side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntailmentTag {
    pub label: EntailmentLabel,
    /// Index of the pair within its batch (sequential or coreference)
    pub pair: usize,
    /// Index of the clause on the other side of the pair
    pub other: usize,
}

impl EntailmentTag {
    #[inline]
    #[must_use]
    pub fn is_contradiction(&self) -> bool {
        self.label == EntailmentLabel::Contradiction
    }
}

/// One agent-verb-object unit of a sentence, decorated in place by the tagging passes.
///
/// Offsets are token offsets in the whole document and both ends are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clause {
    pub sent_index: usize,
    pub begin_index: usize,
    pub end_index: usize,
    /// Clause tokens
    pub action_text: Vec<String>,
    /// Text used for node names and entailment premises
    pub node_text: Vec<String>,
    /// Text used as branch guard
    pub complete_text: Vec<String>,
    pub condition: bool,
    pub action: bool,
    /// Action was found in front of its condition in the sentence
    pub before_condition: bool,
    /// Keyword tokens when a clause is both condition and action
    pub condition_keyword: Option<Vec<String>>,
    /// Actor span relative to `begin_index`
    pub sw_lane: Option<(usize, usize)>,
    pub sw_lane_text: Vec<String>,
    pub coref_ids: BTreeSet<usize>,
    pub start_cond_entail: Option<EntailmentTag>,
    pub receive_cond_entail: Option<EntailmentTag>,
    pub start_cond_coref_entail: Vec<EntailmentTag>,
    pub receive_cond_coref_entail: Vec<EntailmentTag>,
}

impl Default for Clause {
    fn default() -> Self {
        Self::new(0, 0, Vec::new())
    }
}

impl Clause {
    /// Untagged clause starting at document offset `begin_index`
    #[must_use]
    pub fn new(sent_index: usize, begin_index: usize, tokens: Vec<String>) -> Self {
        let end_index = (begin_index + tokens.len()).saturating_sub(1);
        Self {
            sent_index,
            begin_index,
            end_index,
            node_text: tokens.clone(),
            complete_text: tokens.clone(),
            action_text: tokens,
            condition: false,
            action: false,
            before_condition: false,
            condition_keyword: None,
            sw_lane: None,
            sw_lane_text: Vec::new(),
            coref_ids: BTreeSet::new(),
            start_cond_entail: None,
            receive_cond_entail: None,
            start_cond_coref_entail: Vec::new(),
            receive_cond_coref_entail: Vec::new(),
        }
    }

    /// Whitespace-split convenience constructor
    #[must_use]
    pub fn from_text(sent_index: usize, begin_index: usize, text: &str) -> Self {
        Self::new(
            sent_index,
            begin_index,
            text.split_whitespace().map(str::to_string).collect(),
        )
    }

    /// Tagged as condition
    #[inline]
    #[must_use]
    pub fn as_condition(mut self) -> Self {
        self.condition = true;
        self
    }

    /// Tagged as action
    #[inline]
    #[must_use]
    pub fn as_action(mut self) -> Self {
        self.action = true;
        self
    }

    /// With condition keyword
    #[inline]
    #[must_use]
    pub fn with_condition_keyword(mut self, keyword: &str) -> Self {
        self.condition_keyword = Some(keyword.split_whitespace().map(str::to_string).collect());
        self
    }

    /// With coreference clusters
    #[inline]
    #[must_use]
    pub fn with_coref_ids(mut self, ids: impl IntoIterator<Item = usize>) -> Self {
        self.coref_ids = ids.into_iter().collect();
        self
    }

    /// With swimlane text
    #[inline]
    #[must_use]
    pub fn with_swimlane(mut self, span: (usize, usize), text: &str) -> Self {
        self.sw_lane = Some(span);
        self.sw_lane_text = text.split_whitespace().map(str::to_string).collect();
        self
    }

    /// Copy `action_text` into empty `node_text`/`complete_text` (hand-written clause lists)
    pub fn fill_texts(&mut self) {
        if self.node_text.is_empty() {
            self.node_text.clone_from(&self.action_text);
        }
        if self.complete_text.is_empty() {
            self.complete_text.clone_from(&self.action_text);
        }
    }

    #[must_use]
    pub fn range(&self) -> RangeInclusive<usize> {
        self.begin_index..=self.end_index
    }

    /// Whether the inclusive span `[begin, end]` overlaps this clause
    #[must_use]
    pub fn overlaps(&self, begin: usize, end: usize) -> bool {
        begin <= self.end_index && self.begin_index <= end
    }

    /// Guard text for a branch opened by this clause
    #[must_use]
    pub fn guard_text(&self) -> String {
        self.complete_text.join(" ")
    }

    /// Premise/hypothesis text
    #[must_use]
    pub fn node_text_joined(&self) -> String {
        self.node_text.join(" ")
    }

    /// Action node name: `[swimlane] text`, or just the text without a swimlane
    #[must_use]
    pub fn node_name(&self) -> String {
        let text = self.node_text_joined();
        if self.sw_lane.is_some() && !self.sw_lane_text.is_empty() {
            format!("[{}] {text}", self.sw_lane_text.join(" "))
        } else {
            text
        }
    }

    /// Joined condition keyword, if any
    #[must_use]
    pub fn keyword(&self) -> Option<String> {
        self.condition_keyword.as_ref().map(|k| k.join(" "))
    }
}
