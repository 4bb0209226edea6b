//! Clause stream → activity graph

use crate::config::EngineConfig;
use crate::normalize::{normalize, NormalizeReport, ELSE_GUARD};
use crate::termination::{Lemmatizer, TerminationDetector, VerbTagger};
use actgraph_annotate::{Clause, EntailmentTag};
use actgraph_core::{ActivityId, ConnectionArgs, GraphStore, NodeArgs, NodeKey, NodeType, StoreError};
use std::collections::{BTreeSet, HashMap};

/// Entailment pair a decision was registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BranchKey {
    Sequential(usize),
    Coreference(usize),
}

/// Clause positions the builder could not place as tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildDiagnostic {
    /// Action in front of the condition it belongs to; the two were swapped
    ActionBeforeCondition { index: usize },
    /// Action with no condition on either side; placed as a plain action
    UnconditionedAction { index: usize },
}

/// What one [`GraphBuilder::build`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub initial: NodeKey,
    /// ActivityFinal closing the main flow
    pub last: NodeKey,
    /// Conditional runs processed
    pub runs: usize,
    pub normalized: NormalizeReport,
    pub diagnostics: Vec<BuildDiagnostic>,
}

/// Branch terminus waiting for the run's closing merge
#[derive(Debug, Clone)]
struct Pending {
    node: NodeKey,
    guard: String,
}

fn contradiction(tag: &EntailmentTag) -> bool {
    tag.is_contradiction()
}

/// Register `node` under the contradiction pairs `clause` starts and look up the ones it
/// receives.
///
/// Returns the decision of a contradicting earlier condition, if registered, and the
/// decisions of contradicting coreferent conditions.
fn register_condition<T: Copy>(
    clause: &Clause,
    decisions: &mut HashMap<BranchKey, T>,
    node: T,
) -> (Option<T>, Vec<T>) {
    if let Some(tag) = clause.start_cond_entail.filter(contradiction) {
        decisions.insert(BranchKey::Sequential(tag.pair), node);
    }
    let sibling = clause
        .receive_cond_entail
        .filter(contradiction)
        .and_then(|tag| decisions.get(&BranchKey::Sequential(tag.pair)).copied());

    for tag in clause.start_cond_coref_entail.iter().filter(|t| contradiction(t)) {
        decisions.insert(BranchKey::Coreference(tag.pair), node);
    }
    let coreferent = clause
        .receive_cond_coref_entail
        .iter()
        .filter(|t| contradiction(t))
        .filter_map(|tag| decisions.get(&BranchKey::Coreference(tag.pair)).copied())
        .collect();
    (sibling, coreferent)
}

/// Coreference pairs whose earlier decision should feed a shared merge.
///
/// Applies only when the sequential predecessor does not contradict the clause and the
/// clause does not contradict its successor.
fn coreference_merge_keys(clause: &Clause) -> Vec<BranchKey> {
    let open = clause.receive_cond_entail.map_or(true, |t| !t.is_contradiction())
        && clause.start_cond_entail.map_or(true, |t| !t.is_contradiction());
    if !open {
        return Vec::new();
    }
    clause
        .receive_cond_coref_entail
        .iter()
        .filter(|t| contradiction(t))
        .map(|t| BranchKey::Coreference(t.pair))
        .collect()
}

/// Length of the conditional run at the head of `clauses`.
///
/// The head must be a condition. Later conditions join only when they contradict an
/// earlier member; actions join, as do clauses sharing a coreference cluster with a
/// member.
fn run_length(clauses: &[Clause]) -> usize {
    let Some(first) = clauses.first().filter(|c| c.condition) else {
        return 0;
    };
    let mut seen = HashMap::new();
    register_condition(first, &mut seen, ());
    let mut clusters: BTreeSet<usize> = first.coref_ids.clone();

    let mut len = 1;
    for clause in &clauses[1..] {
        let joins = if clause.condition {
            register_condition(clause, &mut seen, ()).0.is_some()
        } else {
            clause.action || !clause.coref_ids.is_disjoint(&clusters)
        };
        if !joins {
            break;
        }
        clusters.extend(clause.coref_ids.iter().copied());
        len += 1;
    }
    len
}

/// Builds activity graphs from tagged clause sequences.
///
/// # Example
///
/// ```rust
/// use actgraph_annotate::Clause;
/// use actgraph_builder::{EngineConfig, GraphBuilder};
/// use actgraph_core::{ActivityId, GraphStore, NodeType};
///
/// let clauses = vec![
///     Clause::from_text(0, 1, "the part is available").as_condition(),
///     Clause::from_text(0, 5, "it is reserved").as_action(),
/// ];
/// let mut store = GraphStore::new();
/// let report = GraphBuilder::new(EngineConfig::default())
///     .build(&mut store, Some(ActivityId(1)), &clauses)
///     .unwrap();
///
/// assert_eq!(store.nodes_of_type(NodeType::Decision).len(), 1);
/// assert_eq!(report.runs, 1);
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    config: EngineConfig,
    detector: TerminationDetector,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let detector = TerminationDetector::new(&config.termination_indicators);
        Self { config, detector }
    }

    /// With a lemmatizer for termination verbs
    #[must_use]
    pub fn with_lemmatizer(mut self, lemmatizer: impl Lemmatizer + 'static) -> Self {
        self.detector = self.detector.with_lemmatizer(lemmatizer);
        self
    }

    /// With a tagger picking the verbs of action names
    #[must_use]
    pub fn with_verb_tagger(mut self, tagger: impl VerbTagger + 'static) -> Self {
        self.detector = self.detector.with_tagger(tagger);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the graph for `clauses` into `store`, then normalize it.
    ///
    /// The graph runs from one Initial node to an ActivityFinal node; conditions open
    /// Decision nodes whose branches close in Merge nodes.
    ///
    /// # Errors
    /// [`StoreError::InvalidActivityId`] when `activity` is `None`; the store is left
    /// untouched.
    pub fn build(
        &self,
        store: &mut GraphStore,
        activity: Option<ActivityId>,
        clauses: &[Clause],
    ) -> Result<BuildReport, StoreError> {
        let mut session = Session {
            store,
            activity,
            config: &self.config,
            decisions: HashMap::new(),
            diagnostics: Vec::new(),
            runs: 0,
        };
        let initial = session.node(NodeType::Initial, "Initial")?;
        let mut prev = initial;

        let mut index = 0;
        while index < clauses.len() {
            let clause = &clauses[index];
            if clause.condition {
                let (node, consumed) = session.conditional_run(&clauses[index..], prev)?;
                prev = node;
                index += consumed.max(1);
                continue;
            }
            if clause.action {
                let next_is_condition = clauses.get(index + 1).is_some_and(|c| c.condition);
                if next_is_condition {
                    tracing::debug!(index, "action precedes its condition; swapping");
                    session.diagnostics.push(BuildDiagnostic::ActionBeforeCondition { index });
                    let mut swapped = clauses[index..].to_vec();
                    swapped.swap(0, 1);
                    let (node, consumed) = session.conditional_run(&swapped, prev)?;
                    prev = node;
                    index += consumed.max(1);
                    continue;
                } else {
                    tracing::warn!(index, text = %clause.node_text_joined(), "action clause without condition");
                    session.diagnostics.push(BuildDiagnostic::UnconditionedAction { index });
                    prev = session.action(clause, prev, "")?;
                }
            } else {
                prev = session.action(clause, prev, "")?;
            }
            index += 1;
        }

        let last = session.node(NodeType::ActivityFinal, "Final")?;
        session.connect(prev, last, "")?;
        let Session { runs, diagnostics, .. } = session;

        let normalized = normalize(store, &self.detector, self.config.max_search_depth)?;
        tracing::info!(
            clauses = clauses.len(),
            runs,
            nodes = store.node_count(),
            connections = store.connection_count(),
            "activity graph built"
        );
        Ok(BuildReport {
            initial,
            last,
            runs,
            normalized,
            diagnostics,
        })
    }
}

/// State of one build
struct Session<'a> {
    store: &'a mut GraphStore,
    activity: Option<ActivityId>,
    config: &'a EngineConfig,
    decisions: HashMap<BranchKey, NodeKey>,
    diagnostics: Vec<BuildDiagnostic>,
    runs: usize,
}

impl Session<'_> {
    fn node(&mut self, node_type: NodeType, name: &str) -> Result<NodeKey, StoreError> {
        self.store.create_node(self.activity, node_type, NodeArgs::named(name))
    }

    fn connect(&mut self, from: NodeKey, to: NodeKey, guard: &str) -> Result<(), StoreError> {
        self.store
            .create_connection(self.activity, from, to, ConnectionArgs::guarded(guard))
            .map(|_| ())
    }

    fn action(&mut self, clause: &Clause, from: NodeKey, guard: &str) -> Result<NodeKey, StoreError> {
        let key = self.node(NodeType::Action, &clause.node_name())?;
        self.connect(from, key, guard)?;
        Ok(key)
    }

    /// Shared merge fed by the decisions of contradicting coreferent conditions.
    fn coreference_merge(&mut self, clause: &Clause, prev: NodeKey, keys: &[BranchKey]) -> Result<NodeKey, StoreError> {
        let merge = self.node(NodeType::Merge, "MergeNode")?;
        self.connect(prev, merge, "")?;
        let guard = clause.guard_text();
        for key in keys {
            match self.decisions.get(key).copied() {
                Some(decision) => self.connect(decision, merge, &guard)?,
                None => tracing::debug!(?key, "no decision registered for coreference pair"),
            }
        }
        register_condition(clause, &mut self.decisions, merge);
        Ok(merge)
    }

    /// Build the run at the head of `clauses` after `prev`.
    ///
    /// Returns the node closing the run and the number of clauses consumed.
    fn conditional_run(&mut self, clauses: &[Clause], prev: NodeKey) -> Result<(NodeKey, usize), StoreError> {
        let len = run_length(clauses);
        let Some(first) = clauses.first().filter(|_| len > 0) else {
            return Ok((prev, 0));
        };
        self.runs += 1;

        let coref_keys = coreference_merge_keys(first);
        let mut pending: Vec<Pending> = Vec::new();
        let mut start: Option<NodeKey> = None;
        let mut prev = prev;
        let mut guard;

        if coref_keys.is_empty() {
            let decision = self.node(NodeType::Decision, "ConditionNode")?;
            self.connect(prev, decision, "")?;
            guard = first.guard_text();
            register_condition(first, &mut self.decisions, decision);
            pending.push(Pending {
                node: decision,
                guard: guard.clone(),
            });
            start = Some(decision);
            prev = decision;
        } else {
            prev = self.coreference_merge(first, prev, &coref_keys)?;
            guard = String::new();
        }

        if len == 1 {
            if start.is_none() {
                return Ok((prev, 1));
            }
            let merge = self.node(NodeType::Merge, "MergeNode")?;
            self.connect(prev, merge, &guard)?;
            return Ok((merge, 1));
        }

        let mut after_decision = true;
        for clause in &clauses[1..len] {
            if clause.condition {
                guard = clause.guard_text();
                after_decision = true;
                let decision = match start {
                    Some(decision) => decision,
                    None => {
                        let decision = self.node(NodeType::Decision, "ConditionNode")?;
                        self.connect(prev, decision, "")?;
                        start = Some(decision);
                        decision
                    }
                };
                let empty_keyword = clause
                    .keyword()
                    .is_some_and(|k| self.config.is_empty_conditional(&k));
                if empty_keyword {
                    let action = self.action(clause, decision, ELSE_GUARD)?;
                    pending.push(Pending {
                        node: action,
                        guard: String::new(),
                    });
                    prev = action;
                    after_decision = false;
                } else {
                    register_condition(clause, &mut self.decisions, decision);
                    pending.push(Pending {
                        node: decision,
                        guard: guard.clone(),
                    });
                    prev = decision;
                }
                continue;
            }

            let action = self.action(clause, prev, if after_decision { &guard } else { "" })?;
            let entry = Pending {
                node: action,
                guard: String::new(),
            };
            match pending.last_mut() {
                Some(last) if !after_decision || last.node == prev => *last = entry,
                _ => pending.push(entry),
            }
            prev = action;
            after_decision = false;
        }

        let merge = self.node(NodeType::Merge, "MergeNode")?;
        for entry in &pending {
            self.connect(entry.node, merge, &entry.guard)?;
        }
        tracing::debug!(clauses = len, branches = pending.len(), "conditional run closed");
        Ok((merge, len))
    }
}
