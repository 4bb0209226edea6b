//! Node, connection and activity records

use crate::types::{ActivityId, NodeKey, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the activity graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub node_type: NodeType,
    pub name: String,
    pub activity_id: ActivityId,
    pub description: String,
    /// Runtime-instance bookkeeping; always empty here.
    pub instances: BTreeMap<String, serde_json::Value>,
    /// Numeric id for backend correlation, unique within one build
    pub id: u64,
}

/// Optional node fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeArgs {
    pub name: String,
    pub description: String,
    pub x: i64,
    pub y: i64,
}

impl NodeArgs {
    /// Args with only a display name
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With editor position
    #[inline]
    #[must_use]
    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// A directed, optionally guarded edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Empty means unconditional
    pub guard: String,
    pub weight: String,
    pub from_key: NodeKey,
    pub to_key: NodeKey,
    pub from_id: u64,
    pub to_id: u64,
    pub id: u64,
}

impl Connection {
    /// Whether the edge carries a guard
    #[inline]
    #[must_use]
    pub fn is_guarded(&self) -> bool {
        !self.guard.is_empty()
    }
}

/// Optional connection fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    pub guard: String,
    pub weight: String,
}

impl ConnectionArgs {
    /// Args carrying a guard
    #[inline]
    #[must_use]
    pub fn guarded(guard: impl Into<String>) -> Self {
        Self {
            guard: guard.into(),
            weight: String::new(),
        }
    }

    /// With weight
    #[inline]
    #[must_use]
    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = weight.into();
        self
    }
}

/// Whether an activity change creates or renames the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityChangeKind {
    NewActivity,
    RetypeActivity,
}

/// The activity that owns a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub kind: ActivityChangeKind,
    pub id: Option<ActivityId>,
    pub name: String,
    pub precondition: String,
    pub postcondition: String,
    pub is_read_only: bool,
    pub is_single_execution: bool,
    pub action: String,
    pub node_key: NodeKey,
    /// Field being retyped, for `retype-activity` changes
    pub retype: Option<String>,
}

/// Optional activity fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityOptions {
    pub precondition: String,
    pub postcondition: String,
    pub is_read_only: bool,
    pub is_single_execution: bool,
    pub action: String,
}

impl Activity {
    /// A `new-activity` record
    #[must_use]
    pub fn new(name: impl Into<String>, options: ActivityOptions) -> Self {
        Self {
            kind: ActivityChangeKind::NewActivity,
            id: None,
            name: name.into(),
            precondition: options.precondition,
            postcondition: options.postcondition,
            is_read_only: options.is_read_only,
            is_single_execution: options.is_single_execution,
            action: options.action,
            node_key: NodeKey::new(),
            retype: None,
        }
    }

    /// A `retype-activity` record renaming an existing activity
    #[must_use]
    pub fn retype(activity_id: ActivityId, name: impl Into<String>) -> Self {
        Self {
            kind: ActivityChangeKind::RetypeActivity,
            id: Some(activity_id),
            retype: Some("name".to_string()),
            ..Self::new(name, ActivityOptions::default())
        }
    }
}
