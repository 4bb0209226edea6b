//! Entailment tagging through an [`EntailmentService`]

use crate::service::EntailmentService;
use actgraph_annotate::{Clause, EntailmentBranchResolver};

/// How an entailment pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntailmentOutcome {
    /// Clauses were tagged from this many verdicts
    Tagged(usize),
    /// Fewer than two conditions; nothing to classify
    NoPairs,
    /// Service failed or answered with the wrong label count; clauses untouched
    Skipped,
}

impl EntailmentOutcome {
    #[must_use]
    pub fn is_tagged(self) -> bool {
        matches!(self, EntailmentOutcome::Tagged(_))
    }
}

/// Pair the conditions of `clauses`, classify the whole batch in one call and tag the
/// clauses with the verdicts.
///
/// Failures leave every condition untagged, so each opens its own decision.
pub async fn resolve_entailment(service: &dyn EntailmentService, clauses: &mut [Clause]) -> EntailmentOutcome {
    let resolver = EntailmentBranchResolver::pair(clauses);
    if resolver.is_empty() {
        tracing::debug!("no condition pairs; entailment skipped");
        return EntailmentOutcome::NoPairs;
    }

    let labels = match service.predict(resolver.requests()).await {
        Ok(labels) => labels,
        Err(err) => {
            tracing::warn!(error = %err, pairs = resolver.requests().len(), "entailment unavailable; tagging skipped");
            return EntailmentOutcome::Skipped;
        }
    };
    if let Err(err) = resolver.apply(clauses, &labels) {
        tracing::warn!(error = %err, "entailment labels rejected; tagging skipped");
        return EntailmentOutcome::Skipped;
    }
    EntailmentOutcome::Tagged(labels.len())
}
