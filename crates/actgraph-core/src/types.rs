use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable node key. Assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub Uuid);

impl NodeKey {
    /// Generate a fresh key
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable connection key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionKey(pub Uuid);

impl ConnectionKey {
    /// Generate a fresh key
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the owning activity on the persistence backend.
///
/// `-1` is the sentinel the backend client hands out when the activity could not be
/// created remotely; graphs built under it are still valid locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub i64);

impl ActivityId {
    /// Sentinel for "backend did not resolve an id"
    pub const UNRESOLVED: ActivityId = ActivityId(-1);

    /// Read an activity id out of an untyped backend value.
    ///
    /// # Errors
    /// [`StoreError::InvalidActivityId`] when the value is not an integer.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, StoreError> {
        value.as_i64().map(Self).ok_or(StoreError::InvalidActivityId)
    }

    /// Whether this is a real backend id
    #[inline]
    #[must_use]
    pub fn is_resolved(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of UML activity node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Entry of the activity
    Initial,
    /// One clause of the process
    Action,
    /// Branch point opened by a condition
    Decision,
    /// Join of the branches of a decision
    Merge,
    /// End of a flow
    ActivityFinal,
}

impl NodeType {
    /// Backend spelling of the type
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Initial => "Initial",
            NodeType::Action => "Action",
            NodeType::Decision => "Decision",
            NodeType::Merge => "Merge",
            NodeType::ActivityFinal => "ActivityFinal",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn activity_id_from_json_accepts_integers_only() {
        assert_eq!(ActivityId::from_json(&json!(7)).unwrap(), ActivityId(7));
        assert_eq!(ActivityId::from_json(&json!(-1)).unwrap(), ActivityId::UNRESOLVED);
        assert_eq!(
            ActivityId::from_json(&json!("7")),
            Err(StoreError::InvalidActivityId)
        );
        assert_eq!(
            ActivityId::from_json(&json!(null)),
            Err(StoreError::InvalidActivityId)
        );
        assert_eq!(
            ActivityId::from_json(&json!(1.5)),
            Err(StoreError::InvalidActivityId)
        );
    }

    #[test]
    fn node_type_serializes_with_backend_names() {
        assert_eq!(
            serde_json::to_value(NodeType::ActivityFinal).unwrap(),
            json!("ActivityFinal")
        );
        assert_eq!(NodeType::Decision.to_string(), "Decision");
    }
}
