//! actgraph annotate
//!
//! Turns semantic-role and coreference output into tagged clauses ready for graph
//! building:
//! 1. **srl**: payload parsing and clause (agent-verb-object) extraction
//! 2. **condition**: condition/action ranges from conditional argument frames
//! 3. **ClauseTagger**: condition/action flags per clause
//! 4. **coref**: cluster ids and pronoun swimlane resolution
//! 5. **EntailmentBranchResolver**: condition pairing and verdict tagging

pub mod clause;
pub mod condition;
pub mod coref;
pub mod entailment;
pub mod error;
pub mod srl;
pub mod tagger;

pub use clause::{Clause, EntailmentTag};
pub use condition::{ActionSpan, ConditionAction, ConditionActionIndex, ConditionExtractor, ConditionSpan};
pub use coref::{decorate, parse_coref, CorefOutput, Mention};
pub use entailment::{parse_labels, EntailmentBranchResolver, EntailmentLabel, EntailmentRequest};
pub use error::PayloadError;
pub use srl::{extract_clauses, parse_srl, SrlFrame, SrlSentence};
pub use tagger::ClauseTagger;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
