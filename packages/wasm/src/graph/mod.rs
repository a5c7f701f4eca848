//! Graph data structures and visibility.
//!
//! This module turns a backend `{nodes, edges}` payload into an annotated
//! rooted forest (petgraph's StableGraph underneath) and keeps per-node
//! collapse flags separate from the immutable node records, so the store
//! and the visibility rules can be exercised without any renderer.

mod edge;
mod node;
mod payload;
mod store;
pub mod visibility;

pub use edge::{MindEdge, RawEdge};
pub use node::{MindNode, NodeRecord, NodeSlot, NodeState, RawNode};
pub use payload::GraphPayload;
pub use store::{GraphStore, ToggleEffect};
pub use visibility::{VisibleSet, visible_edges, visible_nodes};
