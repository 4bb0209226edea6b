//! actgraph builder
//!
//! Turns a tagged clause sequence into an activity graph:
//! 1. **GraphBuilder**: one pass over the clauses, conditional runs become
//!    Decision/Merge structures
//! 2. **normalize**: single-branch closure, termination rerouting, merge splicing
//! 3. **termination**: verb tagging and lemma matching of termination verbs

pub mod builder;
pub mod config;
pub mod normalize;
pub mod termination;

pub use builder::{BuildDiagnostic, BuildReport, GraphBuilder};
pub use config::EngineConfig;
pub use normalize::{
    close_single_branches, normalize, reroute_terminations, splice_degenerate_merges, NormalizeReport, ELSE_GUARD,
};
pub use termination::{Lemmatizer, RuleLemmatizer, RuleTagger, TerminationDetector, VerbTagger};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
