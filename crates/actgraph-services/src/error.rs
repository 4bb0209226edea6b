//! Error types for service calls

use actgraph_annotate::PayloadError;
use thiserror::Error;

/// Service call errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport or body decoding failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Any status other than 200
    #[error("{service} answered with status {status}")]
    Status { service: &'static str, status: u16 },

    /// Response body did not have the expected shape
    #[error("invalid {service} payload: {source}")]
    Payload {
        service: &'static str,
        #[source]
        source: PayloadError,
    },

    /// Connection refused or timed out
    #[error("{service} unreachable at {url}")]
    Unreachable { service: &'static str, url: String },
}

impl ServiceError {
    /// Name of the service that failed, when known
    #[must_use]
    pub fn service(&self) -> Option<&'static str> {
        match self {
            ServiceError::Status { service, .. }
            | ServiceError::Payload { service, .. }
            | ServiceError::Unreachable { service, .. } => Some(service),
            ServiceError::Http(_) => None,
        }
    }
}
