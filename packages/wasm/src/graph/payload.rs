//! Wire shape of a document graph: `{ nodes: [{id, label}], edges: [{source, target, relation}] }`.
//!
//! The same shape is what the persistence cache stores per document.

use serde::{Deserialize, Serialize};

use super::edge::RawEdge;
use super::node::RawNode;

/// Node/edge lists as fetched from the backend or read from the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl GraphPayload {
    pub fn new(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> Self {
        Self { nodes, edges }
    }

    /// The degenerate graph used when a fetch fails: one root labelled with
    /// the document's display name and no edges.
    pub fn fallback(display_name: &str) -> Self {
        Self {
            nodes: vec![RawNode::new("root", display_name)],
            edges: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
