//! Testing utilities for the actgraph workspace
//!
//! Shared clause fixtures and small graph shapes.

#![allow(missing_docs)]

use actgraph_annotate::{Clause, EntailmentLabel, EntailmentTag};
use actgraph_core::{ActivityId, ConnectionArgs, GraphStore, NodeArgs, NodeKey, NodeType};

/// Activity id used by fixtures
pub const TEST_ACTIVITY: ActivityId = ActivityId(7);

pub fn condition(sent_index: usize, begin: usize, text: &str) -> Clause {
    Clause::from_text(sent_index, begin, text).as_condition()
}

pub fn action(sent_index: usize, begin: usize, text: &str) -> Clause {
    Clause::from_text(sent_index, begin, text).as_action()
}

/// Tag `clauses[start]`/`clauses[receive]` as sequential pair `pair` with `label`.
pub fn link_sequential(clauses: &mut [Clause], start: usize, receive: usize, pair: usize, label: EntailmentLabel) {
    clauses[start].start_cond_entail = Some(EntailmentTag {
        label,
        pair,
        other: receive,
    });
    clauses[receive].receive_cond_entail = Some(EntailmentTag {
        label,
        pair,
        other: start,
    });
}

/// Tag `clauses[start]`/`clauses[receive]` as coreference pair `pair` with `label`.
pub fn link_coreference(clauses: &mut [Clause], start: usize, receive: usize, pair: usize, label: EntailmentLabel) {
    clauses[start].start_cond_coref_entail.push(EntailmentTag {
        label,
        pair,
        other: receive,
    });
    clauses[receive].receive_cond_coref_entail.push(EntailmentTag {
        label,
        pair,
        other: start,
    });
}

/// "If the part is available in-house, it is reserved."
pub fn single_condition() -> Vec<Clause> {
    vec![
        condition(0, 1, "the part is available in-house").with_coref_ids([0]),
        action(0, 6, "it is reserved").with_coref_ids([0]),
    ]
}

/// Two conditions on one subject with actions each, tagged with `label`.
pub fn two_conditions(label: EntailmentLabel) -> Vec<Clause> {
    let mut clauses = vec![
        condition(0, 1, "the part is available in-house"),
        action(0, 6, "it is reserved"),
        condition(1, 10, "the part is not available"),
        action(1, 15, "it is ordered from the supplier"),
    ];
    link_sequential(&mut clauses, 0, 2, 0, label);
    clauses
}

/// Decision with two guarded branches joined by a merge:
/// `Initial -> Decision -(yes)-> A -> Merge`, `Decision -(no)-> B -> Merge`, `Merge -> Final`.
pub fn diamond(store: &mut GraphStore) -> Diamond {
    let activity = Some(TEST_ACTIVITY);
    let mut node = |t: NodeType, name: &str| {
        store
            .create_node(activity, t, NodeArgs::named(name))
            .unwrap()
    };
    let initial = node(NodeType::Initial, "Initial");
    let decision = node(NodeType::Decision, "ConditionNode");
    let yes = node(NodeType::Action, "ship the order");
    let no = node(NodeType::Action, "cancel the order");
    let merge = node(NodeType::Merge, "MergeNode");
    let last = node(NodeType::ActivityFinal, "Final");
    let mut edge = |from: NodeKey, to: NodeKey, guard: &str| {
        store
            .create_connection(activity, from, to, ConnectionArgs::guarded(guard))
            .unwrap();
    };
    edge(initial, decision, "");
    edge(decision, yes, "in stock");
    edge(decision, no, "out of stock");
    edge(yes, merge, "");
    edge(no, merge, "");
    edge(merge, last, "");
    Diamond {
        initial,
        decision,
        yes,
        no,
        merge,
        last,
    }
}

/// Keys of a [`diamond`] graph
#[derive(Debug, Clone, Copy)]
pub struct Diamond {
    pub initial: NodeKey,
    pub decision: NodeKey,
    pub yes: NodeKey,
    pub no: NodeKey,
    pub merge: NodeKey,
    pub last: NodeKey,
}

/// Guard strings of every connection leaving `key`, in creation order.
pub fn guards_from(store: &GraphStore, key: NodeKey) -> Vec<String> {
    store
        .connections_from(key)
        .into_iter()
        .filter_map(|c| store.connection(c).map(|c| c.guard.clone()))
        .collect()
}

/// Targets of every connection leaving `key`, in creation order.
pub fn targets_of(store: &GraphStore, key: NodeKey) -> Vec<NodeKey> {
    store
        .connections_from(key)
        .into_iter()
        .filter_map(|c| store.connection(c).map(|c| c.to_key))
        .collect()
}

/// Node type of `key`, panicking on a missing key.
pub fn type_of(store: &GraphStore, key: NodeKey) -> NodeType {
    store.node(key).expect("node exists").node_type
}
