//! actgraph services
//!
//! Async seams to the external collaborators of a build and their HTTP clients:
//! 1. **SrlService**: semantic role labelling per sentence
//! 2. **CorefService**: document coreference clusters
//! 3. **EntailmentService**: batched premise/hypothesis classification
//! 4. **ActivityBackend**: activity creation and graph persistence
//!
//! Every call answers with a typed [`ServiceError`]; callers decide whether a failure
//! skips an enrichment or aborts the run.

pub mod config;
pub mod entailment;
pub mod error;
pub mod http;
pub mod sentences;
pub mod service;

pub use config::ServicesConfig;
pub use entailment::{resolve_entailment, EntailmentOutcome};
pub use error::ServiceError;
pub use http::{BackendClient, CorefClient, EntailmentClient, SrlClient};
pub use sentences::split_sentences;
pub use service::{ActivityBackend, CorefService, EntailmentService, Services, SrlService};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
