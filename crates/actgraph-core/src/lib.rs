//! actgraph core
//!
//! In-memory activity graph with an append-only change log:
//! 1. **GraphStore**: nodes, connections and changes with stable keys
//! 2. **ConditionStructureLocator**: Decision → Merge reconvergence lookup
//! 3. **Topology**: petgraph projection for invariant checks and DOT output
//!
//! # Quick Start
//!
//! ```rust
//! use actgraph_core::prelude::*;
//!
//! let mut store = GraphStore::new();
//! let activity = Some(ActivityId(1));
//! let start = store.create_node(activity, NodeType::Initial, NodeArgs::named("Initial")).unwrap();
//! let end = store.create_node(activity, NodeType::ActivityFinal, NodeArgs::named("Final")).unwrap();
//! store.create_connection(activity, start, end, ConnectionArgs::default()).unwrap();
//!
//! let replayed = GraphStore::replay(store.changes()).unwrap();
//! assert!(replayed.same_graph(&store));
//! ```

pub mod changes;
pub mod error;
pub mod locate;
pub mod model;
pub mod store;
pub mod topology;
pub mod types;

pub use changes::{ActivityPayload, Change, ChangeKind, ConnectionChange, NodeChange};
pub use error::StoreError;
pub use locate::{ConditionStructureLocator, ConditionalStructures, DEFAULT_MAX_DEPTH};
pub use model::{
    Activity, ActivityChangeKind, ActivityOptions, Connection, ConnectionArgs, Node, NodeArgs,
};
pub use store::GraphStore;
pub use topology::{Topology, TopologyViolation};
pub use types::{ActivityId, ConnectionKey, NodeKey, NodeType};

/// Common imports for building and inspecting activity graphs
pub mod prelude {
    pub use crate::{
        ActivityId, Change, ConditionStructureLocator, ConnectionArgs, ConnectionKey, GraphStore,
        NodeArgs, NodeKey, NodeType, StoreError, Topology,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
