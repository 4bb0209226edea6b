//! In-memory activity graph with an append-only change log

use crate::changes::{ActivityPayload, Change, ConnectionChange, ConnectionRecord, NodeChange, NodeRecord};
use crate::error::StoreError;
use crate::model::{Activity, Connection, ConnectionArgs, Node, NodeArgs};
use crate::types::{ActivityId, ConnectionKey, NodeKey, NodeType};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Owns the nodes, connections and change log of one build.
///
/// Numeric ids come from per-store counters: they increase with every creation and are
/// never handed out again after a deletion, so ids may have gaps. Both maps keep
/// insertion order; "first outgoing connection" means first created.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: IndexMap<NodeKey, Node>,
    connections: IndexMap<ConnectionKey, Connection>,
    changes: Vec<Change>,
    next_node_id: u64,
    next_connection_id: u64,
}

impl GraphStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node owned by `activity_id`.
    ///
    /// # Errors
    /// [`StoreError::InvalidActivityId`] when no activity id is given; nothing is mutated.
    pub fn create_node(
        &mut self,
        activity_id: Option<ActivityId>,
        node_type: NodeType,
        args: NodeArgs,
    ) -> Result<NodeKey, StoreError> {
        let Some(activity_id) = activity_id else {
            tracing::warn!(node_type = %node_type, "create_node skipped: activity id missing");
            return Err(StoreError::InvalidActivityId);
        };

        let key = NodeKey::new();
        self.next_node_id += 1;
        let id = self.next_node_id;

        self.changes.push(Change::Node(NodeChange {
            node_key: key,
            node_type,
            activity_id,
            id,
            name: args.name.clone(),
            description: args.description.clone(),
            x: args.x,
            y: args.y,
        }));
        self.nodes.insert(
            key,
            Node {
                node_type,
                name: args.name,
                activity_id,
                description: args.description,
                instances: BTreeMap::new(),
                id,
            },
        );

        tracing::debug!(%key, id, node_type = %node_type, "node created");
        Ok(key)
    }

    /// Connect `from` to `to`.
    ///
    /// # Errors
    /// [`StoreError::InvalidActivityId`] or [`StoreError::MissingNode`]; nothing is mutated.
    pub fn create_connection(
        &mut self,
        activity_id: Option<ActivityId>,
        from: NodeKey,
        to: NodeKey,
        args: ConnectionArgs,
    ) -> Result<ConnectionKey, StoreError> {
        let Some(activity_id) = activity_id else {
            tracing::warn!(%from, %to, "create_connection skipped: activity id missing");
            return Err(StoreError::InvalidActivityId);
        };
        let from_id = self.node_id(from)?;
        let to_id = self.node_id(to)?;

        let key = ConnectionKey::new();
        self.next_connection_id += 1;
        let id = self.next_connection_id;

        self.changes.push(Change::Connection(ConnectionChange {
            key,
            id,
            guard: args.guard.clone(),
            weight: args.weight.clone(),
            from_key: from,
            to_key: to,
            activity_id,
        }));
        self.connections.insert(
            key,
            Connection {
                guard: args.guard,
                weight: args.weight,
                from_key: from,
                to_key: to,
                from_id,
                to_id,
                id,
            },
        );

        tracing::debug!(%key, %from, %to, "connection created");
        Ok(key)
    }

    fn node_id(&self, key: NodeKey) -> Result<u64, StoreError> {
        match self.nodes.get(&key) {
            Some(node) => Ok(node.id),
            None => {
                tracing::warn!(%key, "missing node");
                Err(StoreError::MissingNode(key))
            }
        }
    }

    /// Delete a node together with every connection touching it.
    ///
    /// Incoming connections go first, then outgoing ones, then the node's change entry
    /// and record.
    ///
    /// # Errors
    /// [`StoreError::MissingNode`] when the key is unknown; nothing is mutated.
    pub fn delete_node(&mut self, key: NodeKey) -> Result<(), StoreError> {
        if !self.nodes.contains_key(&key) {
            tracing::warn!(%key, "delete_node: missing node");
            return Err(StoreError::MissingNode(key));
        }

        for conn in self.connections_to(key) {
            self.delete_connection(conn)?;
        }
        for conn in self.connections_from(key) {
            self.delete_connection(conn)?;
        }

        let target = key.to_string();
        if let Err(err) = self.remove_first_change(&target, |c| c.node_key() == Some(key)) {
            tracing::warn!(error = %err, "node change entry not found");
        }
        self.nodes.shift_remove(&key);
        Ok(())
    }

    /// Delete a connection and its change entry.
    ///
    /// # Errors
    /// [`StoreError::MissingConnection`] when the key is unknown; nothing is mutated.
    pub fn delete_connection(&mut self, key: ConnectionKey) -> Result<(), StoreError> {
        if !self.connections.contains_key(&key) {
            tracing::warn!(%key, "delete_connection: missing connection");
            return Err(StoreError::MissingConnection(key));
        }

        let target = key.to_string();
        if let Err(err) = self.remove_first_change(&target, |c| c.connection_key() == Some(key)) {
            tracing::warn!(error = %err, "connection change entry not found");
        }
        self.connections.shift_remove(&key);
        Ok(())
    }

    /// Removes only the first matching entry; later duplicates stay in the log.
    fn remove_first_change(
        &mut self,
        key: &str,
        matches: impl Fn(&Change) -> bool,
    ) -> Result<(), StoreError> {
        let pos = self
            .changes
            .iter()
            .position(&matches)
            .ok_or_else(|| StoreError::MissingChange(key.to_string()))?;
        self.changes.remove(pos);
        if self.changes.iter().any(&matches) {
            tracing::warn!(key, "duplicate change entries; only the first was removed");
        }
        Ok(())
    }

    /// Append an activity change to the log
    pub fn record_activity(&mut self, activity: Activity) {
        tracing::debug!(name = %activity.name, kind = ?activity.kind, "activity recorded");
        self.changes.push(Change::Activity(activity));
    }

    /// Reset nodes, connections, changes and id counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    #[must_use]
    pub fn connection(&self, key: ConnectionKey) -> Option<&Connection> {
        self.connections.get(&key)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter().map(|(k, n)| (*k, n))
    }

    /// Connections in creation order
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionKey, &Connection)> {
        self.connections.iter().map(|(k, c)| (*k, c))
    }

    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Keys of all nodes of `node_type`, in creation order
    #[must_use]
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.node_type == node_type)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Outgoing connections of `key`, in creation order
    #[must_use]
    pub fn connections_from(&self, key: NodeKey) -> Vec<ConnectionKey> {
        self.connections
            .iter()
            .filter(|(_, c)| c.from_key == key)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Incoming connections of `key`, in creation order
    #[must_use]
    pub fn connections_to(&self, key: NodeKey) -> Vec<ConnectionKey> {
        self.connections
            .iter()
            .filter(|(_, c)| c.to_key == key)
            .map(|(k, _)| *k)
            .collect()
    }

    /// First Initial node, if any
    #[must_use]
    pub fn initial_node(&self) -> Option<NodeKey> {
        self.nodes
            .iter()
            .find(|(_, n)| n.node_type == NodeType::Initial)
            .map(|(k, _)| *k)
    }

    /// Rebuild a store by applying `changes` in order to an empty one.
    ///
    /// Keys and numeric ids are taken from the changes, so the result holds the same
    /// nodes and connections as the store that produced the log.
    ///
    /// # Errors
    /// [`StoreError::MissingNode`] when a connection change refers to a node that no
    /// earlier change created.
    pub fn replay(changes: &[Change]) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for change in changes {
            match change {
                Change::Activity(_) => {}
                Change::Node(nc) => {
                    store.nodes.insert(
                        nc.node_key,
                        Node {
                            node_type: nc.node_type,
                            name: nc.name.clone(),
                            activity_id: nc.activity_id,
                            description: nc.description.clone(),
                            instances: BTreeMap::new(),
                            id: nc.id,
                        },
                    );
                    store.next_node_id = store.next_node_id.max(nc.id);
                }
                Change::Connection(cc) => {
                    let from_id = store.node_id(cc.from_key)?;
                    let to_id = store.node_id(cc.to_key)?;
                    store.connections.insert(
                        cc.key,
                        Connection {
                            guard: cc.guard.clone(),
                            weight: cc.weight.clone(),
                            from_key: cc.from_key,
                            to_key: cc.to_key,
                            from_id,
                            to_id,
                            id: cc.id,
                        },
                    );
                    store.next_connection_id = store.next_connection_id.max(cc.id);
                }
            }
            store.changes.push(change.clone());
        }
        Ok(store)
    }

    /// Whether both stores hold the same nodes and connections under the same keys
    #[must_use]
    pub fn same_graph(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.connections == other.connections
    }

    /// Backend POST body for the current state
    #[must_use]
    pub fn payload(&self) -> ActivityPayload {
        ActivityPayload {
            nodes: self
                .nodes
                .iter()
                .map(|(k, n)| (*k, NodeRecord::from(n)))
                .collect(),
            connections: self
                .connections
                .iter()
                .map(|(k, c)| (*k, ConnectionRecord::from(c)))
                .collect(),
            changes: self.changes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActivityOptions;
    use pretty_assertions::assert_eq;

    const ACT: Option<ActivityId> = Some(ActivityId(1));

    fn node(store: &mut GraphStore, t: NodeType, name: &str) -> NodeKey {
        store.create_node(ACT, t, NodeArgs::named(name)).unwrap()
    }

    #[test]
    fn missing_activity_id_is_rejected_without_mutation() {
        let mut store = GraphStore::new();
        let err = store
            .create_node(None, NodeType::Action, NodeArgs::named("x"))
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidActivityId);
        assert_eq!(store.node_count(), 0);
        assert!(store.changes().is_empty());
    }

    #[test]
    fn connection_to_unknown_node_fails() {
        let mut store = GraphStore::new();
        let a = node(&mut store, NodeType::Initial, "Initial");
        let ghost = NodeKey::new();
        let err = store
            .create_connection(ACT, a, ghost, ConnectionArgs::default())
            .unwrap_err();
        assert_eq!(err, StoreError::MissingNode(ghost));
        assert_eq!(store.connection_count(), 0);
        assert_eq!(store.changes().len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_deletion() {
        let mut store = GraphStore::new();
        let a = node(&mut store, NodeType::Initial, "a");
        let b = node(&mut store, NodeType::Action, "b");
        store.delete_node(b).unwrap();
        let c = node(&mut store, NodeType::Action, "c");
        assert_eq!(store.node(a).unwrap().id, 1);
        assert_eq!(store.node(c).unwrap().id, 3);
    }

    #[test]
    fn delete_node_removes_touching_connections_and_changes() {
        let mut store = GraphStore::new();
        let a = node(&mut store, NodeType::Initial, "a");
        let b = node(&mut store, NodeType::Action, "b");
        let c = node(&mut store, NodeType::ActivityFinal, "c");
        store.create_connection(ACT, a, b, ConnectionArgs::default()).unwrap();
        store.create_connection(ACT, b, c, ConnectionArgs::default()).unwrap();
        store.create_connection(ACT, a, c, ConnectionArgs::guarded("else")).unwrap();

        store.delete_node(b).unwrap();

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.connection_count(), 1);
        assert_eq!(store.changes().len(), 3);
        let remaining = store.connections_from(a);
        assert_eq!(store.connection(remaining[0]).unwrap().guard, "else");
    }

    #[test]
    fn delete_missing_connection_is_reported() {
        let mut store = GraphStore::new();
        let key = ConnectionKey::new();
        assert_eq!(
            store.delete_connection(key),
            Err(StoreError::MissingConnection(key))
        );
    }

    #[test]
    fn connection_queries_follow_creation_order() {
        let mut store = GraphStore::new();
        let d = node(&mut store, NodeType::Decision, "d");
        let x = node(&mut store, NodeType::Action, "x");
        let y = node(&mut store, NodeType::Action, "y");
        let first = store.create_connection(ACT, d, x, ConnectionArgs::guarded("g1")).unwrap();
        let second = store.create_connection(ACT, d, y, ConnectionArgs::guarded("g2")).unwrap();
        assert_eq!(store.connections_from(d), vec![first, second]);
        assert_eq!(store.connections_to(y), vec![second]);
        assert_eq!(store.nodes_of_type(NodeType::Action), vec![x, y]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = GraphStore::new();
        store.record_activity(Activity::new("a", ActivityOptions::default()));
        node(&mut store, NodeType::Initial, "Initial");
        store.clear();
        assert_eq!(store.node_count(), 0);
        assert!(store.changes().is_empty());
        assert!(store.initial_node().is_none());
        let k = node(&mut store, NodeType::Initial, "Initial");
        assert_eq!(store.node(k).unwrap().id, 1);
    }

    #[test]
    fn replay_reconstructs_after_deletes() {
        let mut store = GraphStore::new();
        store.record_activity(Activity::new("a", ActivityOptions::default()));
        let a = node(&mut store, NodeType::Initial, "a");
        let m = node(&mut store, NodeType::Merge, "m");
        let f = node(&mut store, NodeType::ActivityFinal, "f");
        store.create_connection(ACT, a, m, ConnectionArgs::guarded("g")).unwrap();
        store.create_connection(ACT, m, f, ConnectionArgs::default()).unwrap();
        store.delete_node(m).unwrap();
        store.create_connection(ACT, a, f, ConnectionArgs::guarded("g")).unwrap();

        let replayed = GraphStore::replay(store.changes()).unwrap();
        assert!(replayed.same_graph(&store));
        assert_eq!(replayed.changes(), store.changes());
    }

    #[test]
    fn payload_lists_records_by_key() {
        let mut store = GraphStore::new();
        let a = node(&mut store, NodeType::Initial, "a");
        let f = node(&mut store, NodeType::ActivityFinal, "f");
        let c = store.create_connection(ACT, a, f, ConnectionArgs::default()).unwrap();
        let value = serde_json::to_value(store.payload()).unwrap();
        assert_eq!(value["nodes"][a.to_string()]["type"], "Initial");
        assert_eq!(value["nodes"][f.to_string()]["data"]["activity_id"], 1);
        assert_eq!(value["connections"][c.to_string()]["from_id"], 1);
        assert_eq!(value["connections"][c.to_string()]["to_id"], 2);
        assert_eq!(value["changes"].as_array().unwrap().len(), 3);
    }
}
