//! actgraph pipeline
//!
//! Explicit entry point from a document to a persisted activity graph:
//! 1. **config**: TOML configuration for the engine and the service endpoints
//! 2. **Pipeline**: labelling, tagging, coreference, entailment, building and sync
//!
//! Nothing runs on import; every endpoint comes from [`PipelineConfig`].

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{load_config, parse_config, validate_config, ConfigError, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::{Annotated, Pipeline, PipelineOutput};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
