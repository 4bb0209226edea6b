//! Append-only change log and the backend payload built from it.
//!
//! The change log mirrors every mutation of a [`GraphStore`](crate::GraphStore): replaying
//! it in order against an empty store rebuilds the same nodes and connections. The
//! serialized shapes below are the ones the persistence backend accepts.

use crate::model::{Activity, ActivityChangeKind, Connection, Node};
use crate::types::{ActivityId, ConnectionKey, NodeKey, NodeType};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Discriminant of a [`Change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Activity created without a backend id
    CreateActivity,
    /// Activity bound to a resolved backend id
    RetypeActivity,
    /// Node created
    CreateNode,
    /// Connection created
    CreateConnection,
}

/// One entry of the change log.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Activity creation or retype
    Activity(Activity),
    /// Node creation
    Node(NodeChange),
    /// Connection creation
    Connection(ConnectionChange),
}

/// Creation of a node, with the full node fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeChange {
    pub node_key: NodeKey,
    pub node_type: NodeType,
    pub activity_id: ActivityId,
    pub id: u64,
    pub name: String,
    pub description: String,
    pub x: i64,
    pub y: i64,
}

/// Creation of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionChange {
    pub key: ConnectionKey,
    pub id: u64,
    pub guard: String,
    pub weight: String,
    pub from_key: NodeKey,
    pub to_key: NodeKey,
    pub activity_id: ActivityId,
}

impl Change {
    /// Kind of this change
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Activity(act) => match act.kind {
                ActivityChangeKind::NewActivity => ChangeKind::CreateActivity,
                ActivityChangeKind::RetypeActivity => ChangeKind::RetypeActivity,
            },
            Change::Node(_) => ChangeKind::CreateNode,
            Change::Connection(_) => ChangeKind::CreateConnection,
        }
    }

    /// Node key for node changes
    #[must_use]
    pub fn node_key(&self) -> Option<NodeKey> {
        match self {
            Change::Node(change) => Some(change.node_key),
            _ => None,
        }
    }

    /// Connection key for connection changes
    #[must_use]
    pub fn connection_key(&self) -> Option<ConnectionKey> {
        match self {
            Change::Connection(change) => Some(change.key),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct Position {
    x: i64,
    y: i64,
}

#[derive(Serialize)]
struct NodeChangeBody<'a> {
    id: u64,
    activity_id: ActivityId,
    name: &'a str,
    description: &'a str,
    position: Position,
    #[serde(rename = "type")]
    node_type: NodeType,
}

#[derive(Serialize)]
struct NodeChangeRecord<'a> {
    #[serde(rename = "type")]
    change_type: String,
    #[serde(rename = "nodeKey")]
    node_key: NodeKey,
    key: Option<ConnectionKey>,
    to: NodeChangeBody<'a>,
}

#[derive(Serialize)]
struct ConnectionChangeBody<'a> {
    id: u64,
    guard: &'a str,
    weight: &'a str,
    activity_id: ActivityId,
    from: NodeKey,
    to: NodeKey,
}

#[derive(Serialize)]
struct ConnectionChangeRecord<'a> {
    #[serde(rename = "type")]
    change_type: &'static str,
    key: ConnectionKey,
    to: ConnectionChangeBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityBody<'a> {
    id: Option<ActivityId>,
    name: &'a str,
    precondition: &'a str,
    postcondition: &'a str,
    is_read_only: bool,
    is_single_execution: bool,
    action: &'a str,
    retype: Option<&'a str>,
}

#[derive(Serialize)]
struct ActivityRecord<'a> {
    #[serde(rename = "type")]
    change_type: ActivityChangeKind,
    nodekey: NodeKey,
    to: ActivityBody<'a>,
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Change::Activity(act) => ActivityRecord {
                change_type: act.kind,
                nodekey: act.node_key,
                to: ActivityBody {
                    id: act.id,
                    name: &act.name,
                    precondition: &act.precondition,
                    postcondition: &act.postcondition,
                    is_read_only: act.is_read_only,
                    is_single_execution: act.is_single_execution,
                    action: &act.action,
                    retype: act.retype.as_deref(),
                },
            }
            .serialize(serializer),
            Change::Node(change) => NodeChangeRecord {
                change_type: format!("new-{}", change.node_type),
                node_key: change.node_key,
                key: None,
                to: NodeChangeBody {
                    id: change.id,
                    activity_id: change.activity_id,
                    name: &change.name,
                    description: &change.description,
                    position: Position {
                        x: change.x,
                        y: change.y,
                    },
                    node_type: change.node_type,
                },
            }
            .serialize(serializer),
            Change::Connection(change) => ConnectionChangeRecord {
                change_type: "new-connection",
                key: change.key,
                to: ConnectionChangeBody {
                    id: change.id,
                    guard: &change.guard,
                    weight: &change.weight,
                    activity_id: change.activity_id,
                    from: change.from_key,
                    to: change.to_key,
                },
            }
            .serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct NodeData {
    description: String,
    activity_id: ActivityId,
}

/// Backend shape of a node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRecord {
    #[serde(rename = "type")]
    node_type: NodeType,
    name: String,
    instances: BTreeMap<String, serde_json::Value>,
    id: u64,
    data: NodeData,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            node_type: node.node_type,
            name: node.name.clone(),
            instances: node.instances.clone(),
            id: node.id,
            data: NodeData {
                description: node.description.clone(),
                activity_id: node.activity_id,
            },
        }
    }
}

/// Backend shape of a connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRecord {
    guard: String,
    weight: String,
    from_id: u64,
    to_id: u64,
    id: u64,
    from: NodeKey,
    to: NodeKey,
}

impl From<&Connection> for ConnectionRecord {
    fn from(conn: &Connection) -> Self {
        Self {
            guard: conn.guard.clone(),
            weight: conn.weight.clone(),
            from_id: conn.from_id,
            to_id: conn.to_id,
            id: conn.id,
            from: conn.from_key,
            to: conn.to_key,
        }
    }
}

/// The single POST body handed to the persistence backend.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ActivityPayload {
    pub nodes: IndexMap<NodeKey, NodeRecord>,
    pub connections: IndexMap<ConnectionKey, ConnectionRecord>,
    pub changes: Vec<Change>,
}

impl ActivityPayload {
    /// Payload holding only activity changes
    #[must_use]
    pub fn for_changes(changes: Vec<Change>) -> Self {
        Self {
            changes,
            ..Self::default()
        }
    }
}
