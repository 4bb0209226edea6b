//! End-to-end runs against mocked services

use actgraph_annotate::{CorefOutput, EntailmentLabel, EntailmentRequest, SrlFrame, SrlSentence};
use actgraph_core::{Activity, ActivityId, ActivityPayload, Change, NodeType};
use actgraph_pipeline::{Pipeline, PipelineConfig, PipelineError};
use actgraph_services::{
    ActivityBackend, CorefService, EntailmentOutcome, EntailmentService, ServiceError, Services, SrlService,
};
use actgraph_test_utils::guards_from;
use async_trait::async_trait;
use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;

mock! {
    pub Srl {}

    #[async_trait]
    impl SrlService for Srl {
        async fn label(&self, sentences: &[String]) -> Result<Vec<SrlSentence>, ServiceError>;
    }
}

mock! {
    pub Coref {}

    #[async_trait]
    impl CorefService for Coref {
        async fn resolve(&self, document: &str) -> Result<CorefOutput, ServiceError>;
    }
}

mock! {
    pub Entailment {}

    #[async_trait]
    impl EntailmentService for Entailment {
        async fn predict(&self, batch: &[EntailmentRequest]) -> Result<Vec<EntailmentLabel>, ServiceError>;
    }
}

mock! {
    pub Backend {}

    #[async_trait]
    impl ActivityBackend for Backend {
        async fn create_activity(&self, activity: &Activity) -> Result<ActivityId, ServiceError>;
        async fn sync(&self, payload: &ActivityPayload) -> Result<(), ServiceError>;
    }
}

const DOCUMENT: &str =
    "If the part is in stock, the clerk ships it. Otherwise the clerk cancels the order.";

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn frame(verb: &str, tags: &str) -> SrlFrame {
    SrlFrame {
        verb: verb.to_string(),
        description: String::new(),
        tags: words(tags),
    }
}

/// Labeller output for [`DOCUMENT`]: 12 tokens, then 7.
fn labelled() -> Vec<SrlSentence> {
    vec![
        SrlSentence {
            words: words("If the part is in stock , the clerk ships it ."),
            verbs: vec![
                frame("is", "O B-ARG1 I-ARG1 B-V B-ARG2 I-ARG2 O O O O O O"),
                frame(
                    "ships",
                    "B-ARGM-ADV I-ARGM-ADV I-ARGM-ADV I-ARGM-ADV I-ARGM-ADV I-ARGM-ADV O B-ARG0 I-ARG0 B-V B-ARG1 O",
                ),
            ],
        },
        SrlSentence {
            words: words("Otherwise the clerk cancels the order ."),
            verbs: vec![
                frame("cancels", "B-ARGM-DIS B-ARG0 I-ARG0 B-V B-ARG1 I-ARG1 O"),
                frame("cancels", "B-ARGM-ADV O O B-V O O O"),
            ],
        },
    ]
}

fn resolved() -> CorefOutput {
    CorefOutput {
        document: words("If the part is in stock , the clerk ships it . Otherwise the clerk cancels the order ."),
        top_spans: vec![(1, 2), (7, 8), (10, 10), (13, 14)],
        predicted_antecedents: vec![-1, -1, 0, 1],
        clusters: vec![vec![(1, 2), (10, 10)], vec![(7, 8), (13, 14)]],
    }
}

fn srl_ok() -> MockSrl {
    let mut srl = MockSrl::new();
    srl.expect_label()
        .withf(|sentences: &[String]| sentences.len() == 2)
        .times(1)
        .returning(|_| Ok(labelled()));
    srl
}

fn unreachable(service: &'static str) -> ServiceError {
    ServiceError::Unreachable {
        service,
        url: "http://127.0.0.1:9".to_string(),
    }
}

fn services(srl: MockSrl, coref: MockCoref, entailment: MockEntailment, backend: MockBackend) -> Services {
    Services {
        srl: Arc::new(srl),
        coref: Arc::new(coref),
        entailment: Arc::new(entailment),
        backend: Arc::new(backend),
    }
}

#[tokio::test]
async fn contradicting_conditions_share_one_decision() {
    let mut coref = MockCoref::new();
    coref.expect_resolve().times(1).returning(|_| Ok(resolved()));

    let mut entailment = MockEntailment::new();
    entailment
        .expect_predict()
        .withf(|batch: &[EntailmentRequest]| {
            batch.len() == 1
                && batch[0].premise == "the part is in stock"
                && batch[0].hypothesis == "Otherwise the clerk cancels the order"
        })
        .times(1)
        .returning(|_| Ok(vec![EntailmentLabel::Contradiction]));

    let mut backend = MockBackend::new();
    backend
        .expect_create_activity()
        .withf(|activity: &Activity| activity.name == "Order handling")
        .times(1)
        .returning(|_| Ok(ActivityId(42)));
    backend
        .expect_sync()
        .withf(|payload: &ActivityPayload| !payload.nodes.is_empty())
        .times(1)
        .returning(|_| Ok(()));

    let config = PipelineConfig::new().with_activity_name("Order handling");
    let pipeline = Pipeline::new(config, services(srl_ok(), coref, entailment, backend)).with_sync(true);
    let output = pipeline.run(DOCUMENT).await.unwrap();

    assert_eq!(output.activity_id, ActivityId(42));
    assert!(output.synced);
    assert!(output.annotated.coreference);
    assert_eq!(output.annotated.entailment, EntailmentOutcome::Tagged(1));

    let clauses = &output.annotated.clauses;
    assert_eq!(clauses.len(), 3);
    assert!(clauses[0].condition && !clauses[0].action);
    assert!(clauses[1].action && !clauses[1].condition);
    assert!(clauses[2].condition && clauses[2].action);
    assert_eq!(clauses[2].keyword().as_deref(), Some("otherwise"));
    assert_eq!(clauses[1].coref_ids.iter().copied().collect::<Vec<_>>(), vec![0, 1]);

    let store = &output.store;
    let decisions = store.nodes_of_type(NodeType::Decision);
    assert_eq!(decisions.len(), 1);
    assert_eq!(
        guards_from(store, decisions[0]),
        vec!["the part is in stock".to_string(), "else".to_string()]
    );
    assert_eq!(output.report.runs, 1);
    assert_eq!(output.report.normalized.terminations, 1);
    assert_eq!(store.nodes_of_type(NodeType::ActivityFinal).len(), 2);
    assert!(store.nodes_of_type(NodeType::Merge).is_empty());
    assert!(store.nodes().all(|(_, n)| n.activity_id == ActivityId(42)));
    assert!(store
        .changes()
        .iter()
        .any(|c| matches!(c, Change::Activity(a) if a.id == Some(ActivityId(42)))));
}

#[tokio::test]
async fn enrichment_failures_still_build_locally() {
    let mut coref = MockCoref::new();
    coref
        .expect_resolve()
        .times(1)
        .returning(|_| Err(unreachable("coref")));

    let mut entailment = MockEntailment::new();
    entailment
        .expect_predict()
        .times(1)
        .returning(|_| Err(ServiceError::Status { service: "entailment", status: 500 }));

    let mut backend = MockBackend::new();
    backend
        .expect_create_activity()
        .times(1)
        .returning(|_| Err(unreachable("backend")));
    backend.expect_sync().never();

    let pipeline = Pipeline::new(PipelineConfig::default(), services(srl_ok(), coref, entailment, backend));
    let output = pipeline.run(DOCUMENT).await.unwrap();

    assert_eq!(output.activity_id, ActivityId::UNRESOLVED);
    assert!(!output.synced);
    assert!(!output.annotated.coreference);
    assert_eq!(output.annotated.entailment, EntailmentOutcome::Skipped);
    assert_eq!(output.store.nodes_of_type(NodeType::Decision).len(), 2);
    assert!(!output
        .store
        .changes()
        .iter()
        .any(|c| matches!(c, Change::Activity(_))));
}

#[tokio::test]
async fn misaligned_coreference_is_ignored() {
    let mut coref = MockCoref::new();
    coref.expect_resolve().times(1).returning(|_| {
        let mut out = resolved();
        out.document.pop();
        out.clusters.clear();
        out.top_spans.clear();
        out.predicted_antecedents.clear();
        Ok(out)
    });

    let mut entailment = MockEntailment::new();
    entailment
        .expect_predict()
        .returning(|batch| Ok(vec![EntailmentLabel::Neutral; batch.len()]));

    let mut backend = MockBackend::new();
    backend.expect_create_activity().returning(|_| Ok(ActivityId(3)));

    let pipeline = Pipeline::new(PipelineConfig::default(), services(srl_ok(), coref, entailment, backend));
    let output = pipeline.run(DOCUMENT).await.unwrap();

    assert!(!output.annotated.coreference);
    assert!(output.annotated.clauses.iter().all(|c| c.coref_ids.is_empty()));
    assert_eq!(output.annotated.entailment, EntailmentOutcome::Tagged(1));
}

#[tokio::test]
async fn labelling_failure_aborts_before_the_backend() {
    let mut srl = MockSrl::new();
    srl.expect_label()
        .times(1)
        .returning(|_| Err(ServiceError::Status { service: "srl", status: 503 }));

    let mut coref = MockCoref::new();
    coref.expect_resolve().never();
    let mut entailment = MockEntailment::new();
    entailment.expect_predict().never();
    let mut backend = MockBackend::new();
    backend.expect_create_activity().never();
    backend.expect_sync().never();

    let pipeline = Pipeline::new(PipelineConfig::default(), services(srl, coref, entailment, backend));
    let err = pipeline.run(DOCUMENT).await.unwrap_err();

    assert!(matches!(err, PipelineError::Service(ServiceError::Status { status: 503, .. })));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn empty_document_builds_a_straight_flow() {
    let mut srl = MockSrl::new();
    srl.expect_label().never();
    let mut backend = MockBackend::new();
    backend.expect_create_activity().returning(|_| Ok(ActivityId(5)));

    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        services(srl, MockCoref::new(), MockEntailment::new(), backend),
    );
    let output = pipeline.run("  ").await.unwrap();

    assert!(output.annotated.clauses.is_empty());
    assert_eq!(output.store.node_count(), 2);
    assert_eq!(output.store.connection_count(), 1);
}
