//! Error types for annotation payloads
//!
//! Every parse of an external service payload (semantic roles, coreference, entailment)
//! goes through these variants instead of failing on a missing key or bad index.

/// Malformed upstream payload
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Required field absent or of the wrong JSON type
    #[error("missing or malformed field `{field}` in {context}")]
    MissingField {
        /// Field name
        field: &'static str,
        /// Where the field was expected
        context: String,
    },

    /// Two sequences that must line up do not
    #[error("{context}: expected {expected} items, got {actual}")]
    LengthMismatch {
        /// What was being compared
        context: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Token span outside the document
    #[error("span [{begin}, {end}] out of range for {len} tokens")]
    SpanOutOfRange {
        /// Span start
        begin: i64,
        /// Span end (inclusive)
        end: i64,
        /// Token count
        len: usize,
    },

    /// Entailment label outside the known set
    #[error("unknown entailment label: {0}")]
    UnknownLabel(String),

    /// Not valid JSON for the expected shape
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl PayloadError {
    /// [`PayloadError::MissingField`] for `field` in `context`
    #[must_use]
    pub fn missing(field: &'static str, context: impl Into<String>) -> Self {
        PayloadError::MissingField {
            field,
            context: context.into(),
        }
    }
}
