//! Post-pass graph normalization

use crate::termination::TerminationDetector;
use actgraph_core::{ConditionStructureLocator, ConnectionArgs, GraphStore, NodeArgs, NodeKey, NodeType, StoreError};

/// Guard of the synthetic branch added to single-branch decisions
pub const ELSE_GUARD: &str = "else";

/// Counts of the changes made by [`normalize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub else_branches: usize,
    pub terminations: usize,
    pub spliced_merges: usize,
}

/// Run every pass: single-branch closure, termination rerouting, merge splicing.
///
/// # Errors
/// Propagates [`StoreError`] from the store; keys are read from the store itself, so
/// this only fires on a store that changes underneath.
pub fn normalize(
    store: &mut GraphStore,
    detector: &TerminationDetector,
    max_depth: usize,
) -> Result<NormalizeReport, StoreError> {
    let else_branches = close_single_branches(store, max_depth)?;
    let terminations = reroute_terminations(store, detector, max_depth)?;
    let spliced_merges = splice_degenerate_merges(store)?;
    Ok(NormalizeReport {
        else_branches,
        terminations,
        spliced_merges,
    })
}

/// Give every Decision with exactly one outgoing connection an `else` connection to the
/// first Merge located from it. Decisions without a located Merge are left as they are.
///
/// # Errors
/// See [`normalize`].
pub fn close_single_branches(store: &mut GraphStore, max_depth: usize) -> Result<usize, StoreError> {
    let structures = ConditionStructureLocator::new(store)
        .with_max_depth(max_depth)
        .locate_conditional_structures();

    let mut added = 0;
    for (decision, merges) in structures.iter() {
        if store.connections_from(*decision).len() != 1 {
            continue;
        }
        let Some(merge) = merges.first() else {
            tracing::debug!(%decision, "single-branch decision without located merge");
            continue;
        };
        let activity = store.node(*decision).map(|n| n.activity_id);
        store.create_connection(activity, *decision, *merge, ConnectionArgs::guarded(ELSE_GUARD))?;
        added += 1;
    }
    Ok(added)
}

/// Remove every Merge with exactly one incoming connection.
///
/// The predecessor is connected to each successor with the incoming guard and the
/// Merge is deleted with its connections. Merges without a successor, or whose only
/// incoming connection is a self-loop, stay.
///
/// # Errors
/// See [`normalize`].
pub fn splice_degenerate_merges(store: &mut GraphStore) -> Result<usize, StoreError> {
    let mut spliced = 0;
    for merge in store.nodes_of_type(NodeType::Merge) {
        let incoming = store.connections_to(merge);
        let [only] = incoming.as_slice() else {
            continue;
        };
        let Some(edge) = store.connection(*only) else {
            continue;
        };
        let (prev, guard) = (edge.from_key, edge.guard.clone());
        if prev == merge {
            continue;
        }
        let successors: Vec<NodeKey> = store
            .connections_from(merge)
            .into_iter()
            .filter_map(|c| store.connection(c).map(|c| c.to_key))
            .collect();
        if successors.is_empty() {
            tracing::debug!(%merge, "merge without successor kept");
            continue;
        }

        let activity = store.node(merge).map(|n| n.activity_id);
        for next in successors {
            store.create_connection(activity, prev, next, ConnectionArgs::guarded(guard.clone()))?;
        }
        store.delete_node(merge)?;
        tracing::debug!(%merge, %prev, "degenerate merge spliced");
        spliced += 1;
    }
    Ok(spliced)
}

/// Send terminating last actions to their own ActivityFinal.
///
/// Candidates are the Actions with a connection into a Merge located from some
/// Decision. When the action's name holds a termination verb, its first connection into
/// one of those Merges is replaced by a connection to a new ActivityFinal.
///
/// # Errors
/// See [`normalize`].
pub fn reroute_terminations(
    store: &mut GraphStore,
    detector: &TerminationDetector,
    max_depth: usize,
) -> Result<usize, StoreError> {
    let locator = ConditionStructureLocator::new(store).with_max_depth(max_depth);
    let merges = locator.locate_conditional_structures().all_merges();
    let actions = locator.last_actions_before(&merges);

    let mut rerouted = 0;
    for action in actions {
        let Some(node) = store.node(action) else {
            continue;
        };
        let Some(verb) = detector.matching_word(&node.name) else {
            continue;
        };
        let verb = verb.to_string();
        let activity = Some(node.activity_id);
        let into_merge = store
            .connections_from(action)
            .into_iter()
            .find(|c| store.connection(*c).is_some_and(|c| merges.contains(&c.to_key)));
        let Some(conn) = into_merge else {
            continue;
        };

        store.delete_connection(conn)?;
        let last = store.create_node(activity, NodeType::ActivityFinal, NodeArgs::named("Final"))?;
        store.create_connection(activity, action, last, ConnectionArgs::default())?;
        tracing::debug!(%action, verb = %verb, "termination action rerouted to final node");
        rerouted += 1;
    }
    Ok(rerouted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actgraph_test_utils::{diamond, guards_from, targets_of, type_of, TEST_ACTIVITY};
    use pretty_assertions::assert_eq;

    const ACT: Option<actgraph_core::ActivityId> = Some(TEST_ACTIVITY);

    #[test]
    fn single_branch_gets_else_to_its_merge() {
        let mut store = GraphStore::new();
        let d = diamond(&mut store);
        let no_edge = store.connections_from(d.decision)[1];
        store.delete_connection(no_edge).unwrap();

        assert_eq!(close_single_branches(&mut store, 4).unwrap(), 1);
        assert_eq!(guards_from(&store, d.decision), vec!["in stock", "else"]);
        assert_eq!(targets_of(&store, d.decision)[1], d.merge);
        assert_eq!(close_single_branches(&mut store, 4).unwrap(), 0);
    }

    #[test]
    fn decision_without_reachable_merge_is_left() {
        let mut store = GraphStore::new();
        let d = diamond(&mut store);
        let no_edge = store.connections_from(d.decision)[1];
        store.delete_connection(no_edge).unwrap();
        assert_eq!(close_single_branches(&mut store, 0).unwrap(), 0);
        assert_eq!(store.connections_from(d.decision).len(), 1);
    }

    #[test]
    fn merge_with_one_input_is_spliced() {
        let mut store = GraphStore::new();
        let d = diamond(&mut store);
        let extra = store
            .create_node(ACT, NodeType::Merge, NodeArgs::named("MergeNode"))
            .unwrap();
        let before_final = store.connections_to(d.last)[0];
        store.delete_connection(before_final).unwrap();
        store
            .create_connection(ACT, d.merge, extra, ConnectionArgs::guarded("done"))
            .unwrap();
        store
            .create_connection(ACT, extra, d.last, ConnectionArgs::default())
            .unwrap();

        assert_eq!(splice_degenerate_merges(&mut store).unwrap(), 1);
        assert!(store.node(extra).is_none());
        assert_eq!(targets_of(&store, d.merge), vec![d.last]);
        assert_eq!(guards_from(&store, d.merge), vec!["done"]);
    }

    #[test]
    fn merge_without_successor_stays() {
        let mut store = GraphStore::new();
        let a = store.create_node(ACT, NodeType::Action, NodeArgs::named("a")).unwrap();
        let m = store.create_node(ACT, NodeType::Merge, NodeArgs::named("MergeNode")).unwrap();
        store.create_connection(ACT, a, m, ConnectionArgs::default()).unwrap();
        assert_eq!(splice_degenerate_merges(&mut store).unwrap(), 0);
        assert!(store.node(m).is_some());
    }

    #[test]
    fn terminating_action_leaves_the_merge() {
        let mut store = GraphStore::new();
        let d = diamond(&mut store);
        let detector = TerminationDetector::new(&["cancel"]);

        assert_eq!(reroute_terminations(&mut store, &detector, 4).unwrap(), 1);
        let targets = targets_of(&store, d.no);
        assert_eq!(targets.len(), 1);
        assert_eq!(type_of(&store, targets[0]), NodeType::ActivityFinal);
        assert_eq!(targets_of(&store, d.yes), vec![d.merge]);
        assert_eq!(store.connections_to(d.merge).len(), 1);
    }

    #[test]
    fn full_pass_collapses_the_emptied_merge() {
        let mut store = GraphStore::new();
        let d = diamond(&mut store);
        let detector = TerminationDetector::new(&["cancel"]);

        let report = normalize(&mut store, &detector, 4).unwrap();
        assert_eq!(
            report,
            NormalizeReport {
                else_branches: 0,
                terminations: 1,
                spliced_merges: 1,
            }
        );
        assert!(store.node(d.merge).is_none());
        assert_eq!(targets_of(&store, d.yes), vec![d.last]);
    }
}
