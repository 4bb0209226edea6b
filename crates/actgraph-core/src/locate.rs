//! Decision → Merge reconvergence lookup

use crate::store::GraphStore;
use crate::types::{NodeKey, NodeType};
use indexmap::IndexMap;

/// Default traversal bound for [`ConditionStructureLocator`]
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Per Decision, the Merge nodes its branches reach, deduplicated and in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalStructures(pub IndexMap<NodeKey, Vec<NodeKey>>);

impl ConditionalStructures {
    /// Merges located for `decision`
    #[must_use]
    pub fn merges_of(&self, decision: NodeKey) -> &[NodeKey] {
        self.0.get(&decision).map_or(&[], Vec::as_slice)
    }

    /// First located merge of `decision`
    #[must_use]
    pub fn first_merge(&self, decision: NodeKey) -> Option<NodeKey> {
        self.merges_of(decision).first().copied()
    }

    /// All located merges across decisions, deduplicated
    #[must_use]
    pub fn all_merges(&self) -> Vec<NodeKey> {
        let mut out: Vec<NodeKey> = Vec::new();
        for merge in self.0.values().flatten() {
            if !out.contains(merge) {
                out.push(*merge);
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &Vec<NodeKey>)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Bounded first-edge traversal over a [`GraphStore`].
#[derive(Debug, Clone, Copy)]
pub struct ConditionStructureLocator<'a> {
    store: &'a GraphStore,
    max_depth: usize,
}

impl<'a> ConditionStructureLocator<'a> {
    #[must_use]
    pub fn new(store: &'a GraphStore) -> Self {
        Self {
            store,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// With traversal bound
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk from `start` along the first outgoing connection of each node until a node of
    /// `target` type is found.
    ///
    /// Returns `None` once more than `max_depth` edges have been followed, when the walk
    /// comes back to `start`, at a node with no outgoing connection, or when a connection
    /// points at a node that no longer exists. `start` itself is checked first.
    #[must_use]
    pub fn find_first_node_of_type(&self, start: NodeKey, target: NodeType) -> Option<NodeKey> {
        let mut current = start;
        let mut depth = 0usize;
        loop {
            if depth > self.max_depth {
                tracing::debug!(%start, max_depth = self.max_depth, "search depth exceeded");
                return None;
            }
            let node = self.store.node(current)?;
            if node.node_type == target {
                return Some(current);
            }
            if current == start && depth > 0 {
                tracing::debug!(%start, "cycle detected");
                return None;
            }
            // TODO: follow every outgoing edge and report when branches disagree
            let first = *self.store.connections_from(current).first()?;
            let next = self.store.connection(first)?.to_key;
            if self.store.node(next).is_none() {
                tracing::warn!(%next, "connection target missing during search");
                return None;
            }
            current = next;
            depth += 1;
        }
    }

    /// For every Decision, the Merge nodes reached from each of its branches.
    #[must_use]
    pub fn locate_conditional_structures(&self) -> ConditionalStructures {
        let mut out = IndexMap::new();
        for decision in self.store.nodes_of_type(NodeType::Decision) {
            let mut merges: Vec<NodeKey> = Vec::new();
            for conn in self.store.connections_from(decision) {
                let Some(edge) = self.store.connection(conn) else {
                    continue;
                };
                if let Some(merge) = self.find_first_node_of_type(edge.to_key, NodeType::Merge) {
                    if !merges.contains(&merge) {
                        merges.push(merge);
                    }
                }
            }
            out.insert(decision, merges);
        }
        ConditionalStructures(out)
    }

    /// Action nodes with a direct connection into any of `merges`, deduplicated.
    #[must_use]
    pub fn last_actions_before(&self, merges: &[NodeKey]) -> Vec<NodeKey> {
        let mut actions = Vec::new();
        for merge in merges {
            for conn in self.store.connections_to(*merge) {
                let Some(from) = self.store.connection(conn).map(|c| c.from_key) else {
                    continue;
                };
                let is_action = self
                    .store
                    .node(from)
                    .is_some_and(|n| n.node_type == NodeType::Action);
                if is_action && !actions.contains(&from) {
                    actions.push(from);
                }
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionArgs, NodeArgs};
    use crate::types::ActivityId;

    const ACT: Option<ActivityId> = Some(ActivityId(1));

    fn chain(store: &mut GraphStore, types: &[NodeType]) -> Vec<NodeKey> {
        let keys: Vec<NodeKey> = types
            .iter()
            .map(|t| store.create_node(ACT, *t, NodeArgs::named(t.as_str())).unwrap())
            .collect();
        for pair in keys.windows(2) {
            store
                .create_connection(ACT, pair[0], pair[1], ConnectionArgs::default())
                .unwrap();
        }
        keys
    }

    #[test]
    fn finds_merge_within_depth() {
        let mut store = GraphStore::new();
        let keys = chain(
            &mut store,
            &[NodeType::Decision, NodeType::Action, NodeType::Action, NodeType::Merge],
        );
        let locator = ConditionStructureLocator::new(&store);
        assert_eq!(
            locator.find_first_node_of_type(keys[0], NodeType::Merge),
            Some(keys[3])
        );
    }

    #[test]
    fn start_node_matches_itself() {
        let mut store = GraphStore::new();
        let keys = chain(&mut store, &[NodeType::Merge, NodeType::Action]);
        let locator = ConditionStructureLocator::new(&store);
        assert_eq!(locator.find_first_node_of_type(keys[0], NodeType::Merge), Some(keys[0]));
    }

    #[test]
    fn gives_up_past_max_depth() {
        let mut store = GraphStore::new();
        let mut types = vec![NodeType::Action; 6];
        types.push(NodeType::Merge);
        let keys = chain(&mut store, &types);
        let locator = ConditionStructureLocator::new(&store);
        assert_eq!(locator.find_first_node_of_type(keys[0], NodeType::Merge), None);
        assert_eq!(
            locator
                .with_max_depth(6)
                .find_first_node_of_type(keys[0], NodeType::Merge),
            Some(keys[6])
        );
    }

    #[test]
    fn stops_on_cycle() {
        let mut store = GraphStore::new();
        let keys = chain(&mut store, &[NodeType::Action, NodeType::Action]);
        store
            .create_connection(ACT, keys[1], keys[0], ConnectionArgs::default())
            .unwrap();
        let locator = ConditionStructureLocator::new(&store).with_max_depth(100);
        assert_eq!(locator.find_first_node_of_type(keys[0], NodeType::Merge), None);
    }

    #[test]
    fn only_first_edge_is_followed() {
        let mut store = GraphStore::new();
        let d = store.create_node(ACT, NodeType::Action, NodeArgs::named("a")).unwrap();
        let dead = store.create_node(ACT, NodeType::Action, NodeArgs::named("dead")).unwrap();
        let m = store.create_node(ACT, NodeType::Merge, NodeArgs::named("m")).unwrap();
        store.create_connection(ACT, d, dead, ConnectionArgs::default()).unwrap();
        store.create_connection(ACT, d, m, ConnectionArgs::default()).unwrap();
        let locator = ConditionStructureLocator::new(&store);
        assert_eq!(locator.find_first_node_of_type(d, NodeType::Merge), None);
    }

    #[test]
    fn decisions_collect_deduplicated_merges() {
        let mut store = GraphStore::new();
        let d = store.create_node(ACT, NodeType::Decision, NodeArgs::named("d")).unwrap();
        let a = store.create_node(ACT, NodeType::Action, NodeArgs::named("a")).unwrap();
        let b = store.create_node(ACT, NodeType::Action, NodeArgs::named("b")).unwrap();
        let m = store.create_node(ACT, NodeType::Merge, NodeArgs::named("m")).unwrap();
        store.create_connection(ACT, d, a, ConnectionArgs::guarded("x")).unwrap();
        store.create_connection(ACT, d, b, ConnectionArgs::guarded("y")).unwrap();
        store.create_connection(ACT, a, m, ConnectionArgs::default()).unwrap();
        store.create_connection(ACT, b, m, ConnectionArgs::default()).unwrap();

        let locator = ConditionStructureLocator::new(&store);
        let found = locator.locate_conditional_structures();
        assert_eq!(found.merges_of(d), &[m]);
        assert_eq!(locator.last_actions_before(&found.all_merges()), vec![a, b]);
    }
}
