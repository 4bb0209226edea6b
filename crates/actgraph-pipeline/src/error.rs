//! Error types for pipeline runs

use crate::config::ConfigError;
use actgraph_annotate::PayloadError;
use actgraph_core::StoreError;
use actgraph_services::ServiceError;
use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration could not be loaded or is invalid
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A required service call failed
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Graph store rejected an operation
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Offline input had the wrong shape
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
}

impl PipelineError {
    /// Whether retrying the same run can succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            PipelineError::Service(ServiceError::Unreachable { .. } | ServiceError::Http(_)) => true,
            PipelineError::Service(ServiceError::Status { status, .. }) => *status >= 500,
            PipelineError::Store(err) => err.is_recoverable(),
            PipelineError::Service(ServiceError::Payload { .. })
            | PipelineError::Config(_)
            | PipelineError::Payload(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_services_are_retryable() {
        let down = PipelineError::from(ServiceError::Unreachable {
            service: "srl",
            url: "http://127.0.0.1:9".into(),
        });
        assert!(down.is_recoverable());

        let busy = PipelineError::from(ServiceError::Status { service: "srl", status: 503 });
        assert!(busy.is_recoverable());

        let rejected = PipelineError::from(ServiceError::Status { service: "srl", status: 400 });
        assert!(!rejected.is_recoverable());

        let invalid = PipelineError::from(ConfigError::Invalid("x must be > 0".into()));
        assert!(!invalid.is_recoverable());
        assert!(invalid.to_string().contains("x must be > 0"));
    }
}
