//! reqwest-backed service clients

use crate::config::ServicesConfig;
use crate::error::ServiceError;
use crate::service::{ActivityBackend, CorefService, EntailmentService, Services, SrlService};
use actgraph_annotate::{
    parse_coref, parse_labels, parse_srl, CorefOutput, EntailmentLabel, EntailmentRequest, PayloadError, SrlSentence,
};
use actgraph_core::{Activity, ActivityId, ActivityPayload, Change};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// One JSON endpoint.
#[derive(Debug, Clone)]
struct Endpoint {
    client: reqwest::Client,
    service: &'static str,
    url: String,
}

impl Endpoint {
    fn new(client: reqwest::Client, service: &'static str, url: &str) -> Self {
        Self {
            client,
            service,
            url: url.to_string(),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_connect() || err.is_timeout() {
            tracing::warn!(service = self.service, url = %self.url, error = %err, "service unreachable");
            ServiceError::Unreachable {
                service: self.service,
                url: self.url.clone(),
            }
        } else {
            ServiceError::Http(err)
        }
    }

    fn check(&self, status: StatusCode) -> Result<(), ServiceError> {
        if status == StatusCode::OK {
            return Ok(());
        }
        tracing::warn!(service = self.service, status = status.as_u16(), "service call failed");
        Err(ServiceError::Status {
            service: self.service,
            status: status.as_u16(),
        })
    }

    async fn post<B: Serialize + ?Sized + Sync>(&self, body: &B) -> Result<reqwest::Response, ServiceError> {
        tracing::debug!(service = self.service, url = %self.url, "POST");
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.check(response.status())?;
        Ok(response)
    }

    async fn post_json<B: Serialize + ?Sized + Sync>(&self, body: &B) -> Result<Value, ServiceError> {
        Ok(self.post(body).await?.json().await?)
    }

    async fn get_json(&self, url: &str) -> Result<Value, ServiceError> {
        tracing::debug!(service = self.service, url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| self.transport_error(e))?;
        self.check(response.status())?;
        Ok(response.json().await?)
    }

    fn payload_error(&self, source: PayloadError) -> ServiceError {
        ServiceError::Payload {
            service: self.service,
            source,
        }
    }
}

fn build_client(config: &ServicesConfig) -> Result<reqwest::Client, ServiceError> {
    Ok(reqwest::Client::builder().timeout(config.timeout()).build()?)
}

/// Semantic role labelling client.
#[derive(Debug, Clone)]
pub struct SrlClient(Endpoint);

impl SrlClient {
    /// # Errors
    /// [`ServiceError::Http`] when the HTTP client cannot be built.
    pub fn new(config: &ServicesConfig) -> Result<Self, ServiceError> {
        Ok(Self(Endpoint::new(build_client(config)?, "srl", &config.srl_url)))
    }
}

#[async_trait]
impl SrlService for SrlClient {
    async fn label(&self, sentences: &[String]) -> Result<Vec<SrlSentence>, ServiceError> {
        let body: Vec<Value> = sentences.iter().map(|s| json!({ "sentence": s })).collect();
        let value = self.0.post_json(&body).await?;
        let labelled = parse_srl(&value).map_err(|e| self.0.payload_error(e))?;
        if labelled.len() != sentences.len() {
            tracing::warn!(sent = sentences.len(), received = labelled.len(), "srl sentence count differs");
        }
        Ok(labelled)
    }
}

/// Coreference client.
#[derive(Debug, Clone)]
pub struct CorefClient(Endpoint);

impl CorefClient {
    /// # Errors
    /// [`ServiceError::Http`] when the HTTP client cannot be built.
    pub fn new(config: &ServicesConfig) -> Result<Self, ServiceError> {
        Ok(Self(Endpoint::new(build_client(config)?, "coref", &config.coref_url)))
    }
}

#[async_trait]
impl CorefService for CorefClient {
    async fn resolve(&self, document: &str) -> Result<CorefOutput, ServiceError> {
        let value = self.0.post_json(&json!({ "document": document })).await?;
        parse_coref(&value).map_err(|e| self.0.payload_error(e))
    }
}

/// Entailment classifier client.
#[derive(Debug, Clone)]
pub struct EntailmentClient(Endpoint);

impl EntailmentClient {
    /// # Errors
    /// [`ServiceError::Http`] when the HTTP client cannot be built.
    pub fn new(config: &ServicesConfig) -> Result<Self, ServiceError> {
        Ok(Self(Endpoint::new(
            build_client(config)?,
            "entailment",
            &config.entailment_url,
        )))
    }
}

#[async_trait]
impl EntailmentService for EntailmentClient {
    async fn predict(&self, batch: &[EntailmentRequest]) -> Result<Vec<EntailmentLabel>, ServiceError> {
        let value = self.0.post_json(batch).await?;
        parse_labels(&value).map_err(|e| self.0.payload_error(e))
    }
}

/// Activity persistence backend client.
#[derive(Debug, Clone)]
pub struct BackendClient(Endpoint);

impl BackendClient {
    /// # Errors
    /// [`ServiceError::Http`] when the HTTP client cannot be built.
    pub fn new(config: &ServicesConfig) -> Result<Self, ServiceError> {
        Ok(Self(Endpoint::new(build_client(config)?, "backend", &config.backend_url)))
    }

    /// Listing URL: the data endpoint with `request-type=activities` appended
    #[must_use]
    pub fn activities_url(&self) -> String {
        let sep = if self.0.url.contains('?') { '&' } else { '?' };
        format!("{}{sep}request-type=activities", self.0.url)
    }

    /// Id of the activity named `name` in the backend listing.
    ///
    /// # Errors
    /// [`ServiceError`] when the listing cannot be fetched or lacks `activities`.
    pub async fn find_activity(&self, name: &str) -> Result<ActivityId, ServiceError> {
        let listing = self.0.get_json(&self.activities_url()).await?;
        let activities = listing
            .get("activities")
            .and_then(Value::as_object)
            .ok_or_else(|| self.0.payload_error(PayloadError::missing("activities", "activity listing")))?;

        let mut found = ActivityId::UNRESOLVED;
        for entry in activities.values() {
            if entry.get("name").and_then(Value::as_str) != Some(name) {
                continue;
            }
            match entry.get("id").map(ActivityId::from_json) {
                Some(Ok(id)) => found = id,
                _ => tracing::warn!(name, "activity listing entry without integer id"),
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl ActivityBackend for BackendClient {
    async fn create_activity(&self, activity: &Activity) -> Result<ActivityId, ServiceError> {
        let payload = ActivityPayload::for_changes(vec![Change::Activity(activity.clone())]);
        self.0.post(&payload).await?;
        let id = self.find_activity(&activity.name).await?;
        if !id.is_resolved() {
            tracing::warn!(name = %activity.name, "created activity not found in backend listing");
        }
        Ok(id)
    }

    async fn sync(&self, payload: &ActivityPayload) -> Result<(), ServiceError> {
        self.0.post(payload).await?;
        tracing::info!(
            nodes = payload.nodes.len(),
            connections = payload.connections.len(),
            changes = payload.changes.len(),
            "activity synced"
        );
        Ok(())
    }
}

impl Services {
    /// HTTP clients for every endpoint in `config`
    ///
    /// # Errors
    /// [`ServiceError::Http`] when an HTTP client cannot be built.
    pub fn http(config: &ServicesConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            srl: Arc::new(SrlClient::new(config)?),
            coref: Arc::new(CorefClient::new(config)?),
            entailment: Arc::new(EntailmentClient::new(config)?),
            backend: Arc::new(BackendClient::new(config)?),
        })
    }
}
