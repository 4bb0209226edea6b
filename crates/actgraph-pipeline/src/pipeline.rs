//! Document → annotated clauses → activity graph

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use actgraph_annotate::{decorate, extract_clauses, Clause, ClauseTagger, ConditionExtractor, SrlSentence};
use actgraph_builder::{BuildReport, GraphBuilder};
use actgraph_core::{Activity, ActivityId, ActivityOptions, ActivityPayload, GraphStore};
use actgraph_services::{resolve_entailment, split_sentences, EntailmentOutcome, Services};

/// Clauses of one document with their annotations applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub clauses: Vec<Clause>,
    /// Coreference clusters were attached
    pub coreference: bool,
    pub entailment: EntailmentOutcome,
}

/// Result of one [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Backend id of the activity, [`ActivityId::UNRESOLVED`] when creation failed
    pub activity_id: ActivityId,
    pub annotated: Annotated,
    pub store: GraphStore,
    pub report: BuildReport,
    /// Payload was accepted by the backend
    pub synced: bool,
}

impl PipelineOutput {
    /// Backend payload of the built graph
    #[must_use]
    pub fn payload(&self) -> ActivityPayload {
        self.store.payload()
    }
}

/// Runs documents through annotation, graph building and persistence.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    services: Services,
    builder: GraphBuilder,
    extractor: ConditionExtractor,
    sync: bool,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig, services: Services) -> Self {
        let builder = GraphBuilder::new(config.engine.clone());
        let extractor = ConditionExtractor::new(&config.engine.conditional_indicators);
        Self {
            config,
            services,
            builder,
            extractor,
            sync: false,
        }
    }

    /// Post the finished payload to the backend after each run
    #[inline]
    #[must_use]
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Label, tag and decorate the clauses of `document`.
    ///
    /// Coreference and entailment are enrichments: when either service fails the clauses
    /// are returned without them.
    ///
    /// # Errors
    /// [`PipelineError::Service`] when semantic role labelling fails.
    pub async fn annotate(&self, document: &str) -> Result<Annotated, PipelineError> {
        let sentences = split_sentences(document);
        if sentences.is_empty() {
            tracing::debug!("document has no sentences");
            return Ok(Annotated {
                clauses: Vec::new(),
                coreference: false,
                entailment: EntailmentOutcome::NoPairs,
            });
        }

        let srl = self.services.srl.label(&sentences).await?;
        let mut clauses = extract_clauses(&srl);
        let index = self.extractor.extract(&srl);
        ClauseTagger::new().tag(&mut clauses, &index);

        let coreference = self.attach_coreference(document, &srl, &mut clauses).await;
        let entailment = resolve_entailment(self.services.entailment.as_ref(), &mut clauses).await;

        tracing::info!(
            sentences = sentences.len(),
            clauses = clauses.len(),
            conditions = clauses.iter().filter(|c| c.condition).count(),
            coreference,
            entailment = ?entailment,
            "document annotated"
        );
        Ok(Annotated {
            clauses,
            coreference,
            entailment,
        })
    }

    /// Decorate `clauses` with coreference clusters when the resolver's tokens line up
    /// with the labeller's.
    async fn attach_coreference(&self, document: &str, srl: &[SrlSentence], clauses: &mut [Clause]) -> bool {
        let coref = match self.services.coref.resolve(document).await {
            Ok(coref) => coref,
            Err(err) => {
                tracing::warn!(error = %err, "coreference unavailable; clusters skipped");
                return false;
            }
        };
        let labelled: usize = srl.iter().map(|s| s.words.len()).sum();
        if coref.document.len() != labelled {
            tracing::warn!(
                coref_tokens = coref.document.len(),
                srl_tokens = labelled,
                "token streams differ; clusters skipped"
            );
            return false;
        }
        decorate(clauses, &coref);
        true
    }

    /// Create the run's activity on the backend.
    ///
    /// Failures yield [`ActivityId::UNRESOLVED`] so the graph can still be built locally.
    pub async fn create_activity(&self) -> ActivityId {
        let activity = Activity::new(self.config.activity_name.clone(), ActivityOptions::default());
        match self.services.backend.create_activity(&activity).await {
            Ok(id) => {
                if !id.is_resolved() {
                    tracing::warn!(name = %activity.name, "activity id not found on backend");
                }
                id
            }
            Err(err) => {
                tracing::warn!(error = %err, name = %activity.name, "activity creation failed");
                ActivityId::UNRESOLVED
            }
        }
    }

    /// Build the graph of already annotated `clauses` into a fresh store.
    ///
    /// Clauses with empty `node_text`/`complete_text` get them from `action_text`.
    ///
    /// # Errors
    /// [`PipelineError::Store`] when the builder rejects an operation.
    pub fn build_from_clauses(
        &self,
        clauses: &[Clause],
        activity_id: ActivityId,
    ) -> Result<(GraphStore, BuildReport), PipelineError> {
        let clauses: Vec<Clause> = clauses
            .iter()
            .cloned()
            .map(|mut c| {
                c.fill_texts();
                c
            })
            .collect();

        let mut store = GraphStore::new();
        if activity_id.is_resolved() {
            store.record_activity(Activity::retype(activity_id, self.config.activity_name.clone()));
        }
        let report = self.builder.build(&mut store, Some(activity_id), &clauses)?;
        Ok((store, report))
    }

    /// Run `document` end to end.
    ///
    /// # Errors
    /// [`PipelineError::Service`] when labelling fails, [`PipelineError::Store`] when the
    /// builder rejects an operation. Backend failures never abort a run.
    pub async fn run(&self, document: &str) -> Result<PipelineOutput, PipelineError> {
        let annotated = self.annotate(document).await?;
        let activity_id = self.create_activity().await;
        let (store, report) = self.build_from_clauses(&annotated.clauses, activity_id)?;

        let synced = if self.sync {
            match self.services.backend.sync(&store.payload()).await {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, nodes = store.node_count(), "graph sync failed");
                    false
                }
            }
        } else {
            false
        };

        tracing::info!(
            activity = %activity_id,
            nodes = store.node_count(),
            connections = store.connection_count(),
            synced,
            "pipeline run finished"
        );
        Ok(PipelineOutput {
            activity_id,
            annotated,
            store,
            report,
            synced,
        })
    }
}
