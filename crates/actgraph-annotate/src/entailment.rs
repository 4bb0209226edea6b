//! Entailment pairing of condition clauses and tagging of the verdicts

use crate::clause::{Clause, EntailmentTag};
use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Classifier verdict for a premise/hypothesis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntailmentLabel {
    Entailment,
    Contradiction,
    Neutral,
}

impl FromStr for EntailmentLabel {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entailment" => Ok(EntailmentLabel::Entailment),
            "contradiction" => Ok(EntailmentLabel::Contradiction),
            "neutral" => Ok(EntailmentLabel::Neutral),
            other => Err(PayloadError::UnknownLabel(other.to_string())),
        }
    }
}

impl fmt::Display for EntailmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntailmentLabel::Entailment => "entailment",
            EntailmentLabel::Contradiction => "contradiction",
            EntailmentLabel::Neutral => "neutral",
        })
    }
}

/// One classifier input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntailmentRequest {
    pub premise: String,
    pub hypothesis: String,
}

/// Parse `[{label, ...}]`, with or without an `output` envelope.
///
/// # Errors
/// [`PayloadError`] for a non-list body, an item without a string `label`, or a label
/// outside the known set.
pub fn parse_labels(value: &Value) -> Result<Vec<EntailmentLabel>, PayloadError> {
    let body = value.get("output").unwrap_or(value);
    let items = body
        .as_array()
        .ok_or_else(|| PayloadError::missing("output", "entailment response"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.get("label")
                .and_then(Value::as_str)
                .ok_or_else(|| PayloadError::missing("label", format!("entailment item {i}")))?
                .parse()
        })
        .collect()
}

/// Clause index pair `(earlier, later)`
pub type ClausePair = (usize, usize);

/// Condition pairs to classify: sequential pairs, then coreference pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntailmentBranchResolver {
    sequential: Vec<ClausePair>,
    coreference: Vec<ClausePair>,
    requests: Vec<EntailmentRequest>,
}

impl EntailmentBranchResolver {
    /// Collect the pairs for `clauses`.
    ///
    /// Every condition after the first pairs with the previous condition. Conditions that
    /// share a coreference cluster pair with each other, clusters in ascending order.
    #[must_use]
    pub fn pair(clauses: &[Clause]) -> Self {
        let conditions: Vec<usize> = clauses
            .iter()
            .enumerate()
            .filter(|(_, c)| c.condition)
            .map(|(i, _)| i)
            .collect();

        let sequential: Vec<ClausePair> = conditions.windows(2).map(|w| (w[0], w[1])).collect();

        let mut by_cluster: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &i in &conditions {
            for &cluster in &clauses[i].coref_ids {
                by_cluster.entry(cluster).or_default().push(i);
            }
        }
        let mut coreference = Vec::new();
        for members in by_cluster.values() {
            for (a, first) in members.iter().enumerate() {
                for second in &members[a + 1..] {
                    coreference.push((*first, *second));
                }
            }
        }

        let requests = sequential
            .iter()
            .chain(&coreference)
            .map(|(p, h)| EntailmentRequest {
                premise: clauses[*p].node_text_joined(),
                hypothesis: clauses[*h].node_text_joined(),
            })
            .collect();

        Self {
            sequential,
            coreference,
            requests,
        }
    }

    #[must_use]
    pub fn sequential_pairs(&self) -> &[ClausePair] {
        &self.sequential
    }

    #[must_use]
    pub fn coreference_pairs(&self) -> &[ClausePair] {
        &self.coreference
    }

    /// Combined batch, sequential pairs first
    #[must_use]
    pub fn requests(&self) -> &[EntailmentRequest] {
        &self.requests
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Tag clauses with the verdicts for [`requests`](Self::requests), in order.
    ///
    /// # Errors
    /// [`PayloadError::LengthMismatch`] when the label count differs from the request
    /// count; no clause is touched then.
    pub fn apply(&self, clauses: &mut [Clause], labels: &[EntailmentLabel]) -> Result<(), PayloadError> {
        if labels.len() != self.requests.len() {
            return Err(PayloadError::LengthMismatch {
                context: "entailment labels".into(),
                expected: self.requests.len(),
                actual: labels.len(),
            });
        }
        let (seq_labels, coref_labels) = labels.split_at(self.sequential.len());

        for (pair, (&(start, receive), &label)) in self.sequential.iter().zip(seq_labels).enumerate() {
            clauses[start].start_cond_entail = Some(EntailmentTag {
                label,
                pair,
                other: receive,
            });
            clauses[receive].receive_cond_entail = Some(EntailmentTag {
                label,
                pair,
                other: start,
            });
        }
        for (pair, (&(start, receive), &label)) in self.coreference.iter().zip(coref_labels).enumerate() {
            clauses[start].start_cond_coref_entail.push(EntailmentTag {
                label,
                pair,
                other: receive,
            });
            clauses[receive].receive_cond_coref_entail.push(EntailmentTag {
                label,
                pair,
                other: start,
            });
        }
        tracing::debug!(
            sequential = self.sequential.len(),
            coreference = self.coreference.len(),
            "entailment tags applied"
        );
        Ok(())
    }
}
