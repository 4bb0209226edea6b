//! Coreference payloads, antecedent chains and clause decoration

use crate::clause::Clause;
use crate::error::PayloadError;
use crate::srl::swimlane_text;
use serde::Deserialize;
use serde_json::Value;

const PERSONAL_PRONOUNS: [&str; 6] = ["i", "we", "he", "she", "you", "they"];

/// Inclusive document token span
pub type Span = (usize, usize);

/// Parsed resolver output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorefOutput {
    pub document: Vec<String>,
    pub top_spans: Vec<Span>,
    /// Index into `top_spans`, or -1 for no antecedent
    pub predicted_antecedents: Vec<i64>,
    pub clusters: Vec<Vec<Span>>,
}

/// A mention: its text and span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub text: String,
    pub span: Span,
}

/// Parse the resolver response, with or without its `output` envelope.
///
/// # Errors
/// [`PayloadError`] on missing fields, mismatched `top_spans`/`predicted_antecedents`
/// lengths, antecedent indices outside `top_spans`, or spans outside the document.
pub fn parse_coref(value: &Value) -> Result<CorefOutput, PayloadError> {
    let body = value.get("output").unwrap_or(value);
    for field in ["document", "top_spans", "predicted_antecedents", "clusters"] {
        if body.get(field).is_none() {
            return Err(PayloadError::missing(field, "coreference response"));
        }
    }
    let output: CorefOutput = serde_json::from_value(body.clone())?;
    output.validate()?;
    Ok(output)
}

impl CorefOutput {
    /// Check the cross-field index invariants.
    ///
    /// # Errors
    /// See [`parse_coref`].
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.top_spans.len() != self.predicted_antecedents.len() {
            return Err(PayloadError::LengthMismatch {
                context: "predicted_antecedents vs top_spans".into(),
                expected: self.top_spans.len(),
                actual: self.predicted_antecedents.len(),
            });
        }
        let len = self.document.len();
        let spans = self.top_spans.iter().chain(self.clusters.iter().flatten());
        for &(begin, end) in spans {
            if begin > end || end >= len {
                return Err(PayloadError::SpanOutOfRange {
                    begin: i64::try_from(begin).unwrap_or(i64::MAX),
                    end: i64::try_from(end).unwrap_or(i64::MAX),
                    len,
                });
            }
        }
        for &ant in &self.predicted_antecedents {
            let in_range = usize::try_from(ant).is_ok_and(|a| a < self.top_spans.len());
            if ant != -1 && !in_range {
                return Err(PayloadError::SpanOutOfRange {
                    begin: ant,
                    end: ant,
                    len: self.top_spans.len(),
                });
            }
        }
        Ok(())
    }

    fn mention(&self, span: Span) -> Mention {
        Mention {
            text: self.document[span.0..=span.1].join(" "),
            span,
        }
    }

    /// `(mention, antecedent)` for every mention with a predicted antecedent
    #[must_use]
    pub fn links(&self) -> Vec<(Mention, Mention)> {
        self.predicted_antecedents
            .iter()
            .enumerate()
            .filter_map(|(i, ant)| {
                let ant = usize::try_from(*ant).ok()?;
                Some((self.mention(self.top_spans[i]), self.mention(self.top_spans[ant])))
            })
            .collect()
    }

    /// Personal pronouns paired with the main antecedent their chain ends in.
    ///
    /// A main antecedent is one that is never itself a linked mention. Chains that loop
    /// or dead-end are dropped.
    #[must_use]
    pub fn personal_antecedents(&self) -> Vec<(Mention, Mention)> {
        let links = self.links();
        let is_mention = |m: &Mention| links.iter().any(|(p, _)| p == m);
        let mut out = Vec::new();
        for (pronoun, _) in links
            .iter()
            .filter(|(p, _)| PERSONAL_PRONOUNS.contains(&p.text.to_lowercase().as_str()))
        {
            let mut current = pronoun;
            for _ in 0..links.len() {
                let Some((_, ant)) = links.iter().find(|(p, _)| p == current) else {
                    break;
                };
                if !is_mention(ant) {
                    out.push((pronoun.clone(), ant.clone()));
                    break;
                }
                current = ant;
            }
        }
        out
    }
}

/// Attach cluster ids to clauses and resolve pronoun swimlanes.
///
/// `coref_ids` of a clause are the indices of clusters with a span overlapping it. A
/// swimlane that is exactly a personal pronoun with a resolved main antecedent takes the
/// antecedent's text.
pub fn decorate(clauses: &mut [Clause], coref: &CorefOutput) {
    let resolved = coref.personal_antecedents();
    for clause in clauses.iter_mut() {
        for (cluster_id, spans) in coref.clusters.iter().enumerate() {
            if spans.iter().any(|(b, e)| clause.overlaps(*b, *e)) {
                clause.coref_ids.insert(cluster_id);
            }
        }

        let Some((lane_begin, lane_end)) = clause.sw_lane else {
            continue;
        };
        let lane = (clause.begin_index + lane_begin, clause.begin_index + lane_end);
        if let Some((pronoun, antecedent)) = resolved.iter().find(|(p, _)| p.span == lane) {
            let tokens = &coref.document[antecedent.span.0..=antecedent.span.1];
            tracing::debug!(pronoun = %pronoun.text, antecedent = %antecedent.text, "swimlane resolved");
            clause.sw_lane_text = swimlane_text(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        // "The customer brings a computer . She waits . The clerk checks it ."
        json!({"output": {
            "document": ["The", "customer", "brings", "a", "computer", ".",
                         "She", "waits", ".", "The", "clerk", "checks", "it", "."],
            "top_spans": [[0, 1], [3, 4], [6, 6], [12, 12]],
            "predicted_antecedents": [-1, -1, 0, 1],
            "clusters": [[[0, 1], [6, 6]], [[3, 4], [12, 12]]]
        }})
    }

    #[test]
    fn parse_checks_antecedent_indices() {
        let mut bad = sample();
        bad["output"]["predicted_antecedents"] = json!([-1, -1, 0, 9]);
        assert!(matches!(parse_coref(&bad), Err(PayloadError::SpanOutOfRange { .. })));

        let mut short = sample();
        short["output"]["predicted_antecedents"] = json!([-1]);
        assert!(matches!(parse_coref(&short), Err(PayloadError::LengthMismatch { .. })));

        assert!(matches!(
            parse_coref(&json!({"document": []})),
            Err(PayloadError::MissingField { field: "top_spans", .. })
        ));
    }

    #[test]
    fn pronouns_resolve_to_main_antecedent() {
        let coref = parse_coref(&sample()).unwrap();
        let resolved = coref.personal_antecedents();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0.text, "She");
        assert_eq!(resolved[0].1.text, "The customer");
    }

    #[test]
    fn decorate_sets_clusters_and_swimlanes() {
        let coref = parse_coref(&sample()).unwrap();
        let mut clauses = vec![
            Clause::from_text(0, 0, "The customer brings a computer"),
            Clause::from_text(1, 6, "She waits").with_swimlane((0, 0), "She"),
            Clause::from_text(2, 9, "The clerk checks it"),
        ];
        decorate(&mut clauses, &coref);
        assert_eq!(clauses[0].coref_ids.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(clauses[1].coref_ids.iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(clauses[1].sw_lane_text, vec!["customer".to_string()]);
        assert_eq!(clauses[2].coref_ids.iter().copied().collect::<Vec<_>>(), vec![1]);
    }
}
