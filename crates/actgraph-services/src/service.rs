//! Service seams used by the pipeline

use crate::error::ServiceError;
use actgraph_annotate::{CorefOutput, EntailmentLabel, EntailmentRequest, SrlSentence};
use actgraph_core::{Activity, ActivityId, ActivityPayload};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Semantic role labelling, one result per sentence.
#[async_trait]
pub trait SrlService: Send + Sync {
    async fn label(&self, sentences: &[String]) -> Result<Vec<SrlSentence>, ServiceError>;
}

/// Coreference resolution over a whole document.
#[async_trait]
pub trait CorefService: Send + Sync {
    async fn resolve(&self, document: &str) -> Result<CorefOutput, ServiceError>;
}

/// Batched entailment classification, one label per request.
#[async_trait]
pub trait EntailmentService: Send + Sync {
    async fn predict(&self, batch: &[EntailmentRequest]) -> Result<Vec<EntailmentLabel>, ServiceError>;
}

/// Persistence backend for activity graphs.
#[async_trait]
pub trait ActivityBackend: Send + Sync {
    /// Create `activity` remotely and look up the id the backend gave it.
    ///
    /// An activity the lookup cannot find yields [`ActivityId::UNRESOLVED`].
    async fn create_activity(&self, activity: &Activity) -> Result<ActivityId, ServiceError>;

    /// Post the full graph payload; succeeds only on HTTP 200.
    async fn sync(&self, payload: &ActivityPayload) -> Result<(), ServiceError>;
}

/// The set of services one pipeline talks to.
#[derive(Clone)]
pub struct Services {
    pub srl: Arc<dyn SrlService>,
    pub coref: Arc<dyn CorefService>,
    pub entailment: Arc<dyn EntailmentService>,
    pub backend: Arc<dyn ActivityBackend>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
