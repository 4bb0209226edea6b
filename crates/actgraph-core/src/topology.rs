//! petgraph projection of a [`GraphStore`] for invariant checks and rendering

use crate::store::GraphStore;
use crate::types::{NodeKey, NodeType};
use petgraph::dot::Dot;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;

/// A finalized-graph invariant that does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyViolation {
    /// Non-Initial node without incoming connections
    NoIncoming(NodeKey),
    /// Non-ActivityFinal node without outgoing connections
    NoOutgoing(NodeKey),
}

impl fmt::Display for TopologyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyViolation::NoIncoming(key) => write!(f, "node {key} has no incoming connection"),
            TopologyViolation::NoOutgoing(key) => write!(f, "node {key} has no outgoing connection"),
        }
    }
}

/// Directed view of the store's nodes and connections.
#[derive(Debug)]
pub struct Topology<'a> {
    store: &'a GraphStore,
    graph: DiGraphMap<NodeKey, ()>,
}

impl<'a> Topology<'a> {
    #[must_use]
    pub fn of(store: &'a GraphStore) -> Self {
        let mut graph = DiGraphMap::new();
        for (key, _) in store.nodes() {
            graph.add_node(key);
        }
        for (_, conn) in store.connections() {
            graph.add_edge(conn.from_key, conn.to_key, ());
        }
        Self { store, graph }
    }

    /// Nodes with no predecessors
    #[must_use]
    pub fn entry_nodes(&self) -> Vec<NodeKey> {
        self.graph
            .nodes()
            .filter(|n| self.graph.neighbors_directed(*n, Direction::Incoming).next().is_none())
            .collect()
    }

    /// Nodes with no successors
    #[must_use]
    pub fn exit_nodes(&self) -> Vec<NodeKey> {
        self.graph
            .nodes()
            .filter(|n| self.graph.neighbors_directed(*n, Direction::Outgoing).next().is_none())
            .collect()
    }

    /// Every entry that is not an Initial node and every exit that is not an ActivityFinal
    #[must_use]
    pub fn violations(&self) -> Vec<TopologyViolation> {
        let is = |key: NodeKey, t: NodeType| self.store.node(key).is_some_and(|n| n.node_type == t);
        let mut out: Vec<TopologyViolation> = self
            .entry_nodes()
            .into_iter()
            .filter(|k| !is(*k, NodeType::Initial))
            .map(TopologyViolation::NoIncoming)
            .collect();
        out.extend(
            self.exit_nodes()
                .into_iter()
                .filter(|k| !is(*k, NodeType::ActivityFinal))
                .map(TopologyViolation::NoOutgoing),
        );
        out
    }

    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Graphviz rendering with node names and guards as labels
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut labelled: petgraph::Graph<String, String> = petgraph::Graph::new();
        let mut index = HashMap::new();
        for (key, node) in self.store.nodes() {
            let idx = labelled.add_node(format!("{}: {}", node.node_type, node.name));
            index.insert(key, idx);
        }
        for (_, conn) in self.store.connections() {
            if let (Some(from), Some(to)) = (index.get(&conn.from_key), index.get(&conn.to_key)) {
                labelled.add_edge(*from, *to, conn.guard.clone());
            }
        }
        format!("{}", Dot::new(&labelled))
    }
}
