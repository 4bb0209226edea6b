//! Condition/action tagging of clauses

use crate::clause::Clause;
use crate::condition::ConditionActionIndex;

/// Marks clauses that overlap extracted condition or action ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseTagger;

impl ClauseTagger {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Tag every clause whose sentence has entries in `index`.
    ///
    /// Overlap with a condition range sets `condition`, overlap with an action range sets
    /// `action` (and `before_condition` when the action came first). A clause that ends
    /// up both condition and action records the condition keyword: the matched indicator
    /// when known, otherwise its own tokens inside the condition range.
    pub fn tag(&self, clauses: &mut [Clause], index: &ConditionActionIndex) {
        for clause in clauses.iter_mut() {
            let Some(entries) = index.get(&clause.sent_index) else {
                continue;
            };
            for entry in entries {
                if let Some(cond) = &entry.condition {
                    if clause.overlaps(cond.begin, cond.end) {
                        clause.condition = true;
                    }
                }
                if let Some(act) = &entry.action {
                    if clause.overlaps(act.begin, act.end) {
                        clause.action = true;
                        if act.found_in_front {
                            clause.before_condition = true;
                        }
                    }
                }

                if let (Some(cond), Some(_)) = (&entry.condition, &entry.action) {
                    if clause.condition && clause.action {
                        let keyword = match &cond.keyword {
                            Some(k) => k.split_whitespace().map(str::to_string).collect(),
                            None => tokens_in(clause, cond.begin, cond.end),
                        };
                        clause.condition_keyword = Some(keyword);
                    }
                }
            }
            if clause.condition || clause.action {
                tracing::debug!(
                    sent_index = clause.sent_index,
                    begin = clause.begin_index,
                    condition = clause.condition,
                    action = clause.action,
                    "clause tagged"
                );
            }
        }
    }
}

/// Words of `clause` inside the document range `begin..=end`; empty when they do not overlap.
fn tokens_in(clause: &Clause, begin: usize, end: usize) -> Vec<String> {
    let from = begin.max(clause.begin_index) - clause.begin_index;
    let Some(to) = end.min(clause.end_index).checked_sub(clause.begin_index) else {
        return Vec::new();
    };
    if from > to {
        return Vec::new();
    }
    clause
        .action_text
        .get(from..=to)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}
