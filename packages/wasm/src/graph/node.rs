//! Node types and related structures.
//!
//! A node arrives from the backend as a bare `{id, label}` pair and is
//! annotated by the [`GraphStore`](super::GraphStore) with:
//! - Its tree parent and depth ("level")
//! - Whether it has outgoing edges
//! - A stable slot (index into the store's arrays)
//!
//! Collapse state lives beside the node in [`NodeState`] so the annotated
//! graph itself never changes after construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node slot.
///
/// Indexes the store's node and state arrays. Slots are assigned in payload
/// order and never reused while a graph is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeSlot(pub u32);

impl NodeSlot {
    /// Get the slot as a usize for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Node as delivered by the graph backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    pub label: String,
}

impl RawNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Annotated node, immutable once the store is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MindNode {
    /// Unique identifier from the payload.
    pub id: String,
    /// Display text.
    pub label: String,
    /// Tree parent (None for roots and orphans).
    pub parent_id: Option<String>,
    /// BFS distance from the nearest root; -1 for nodes no root reaches.
    pub level: i32,
    /// True iff at least one edge has this node as source.
    pub has_children: bool,
}

impl MindNode {
    /// Roots have no parent and sit at level 0.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.level == 0 && self.parent_id.is_none()
    }

    /// Orphans are unreachable from every root and never rendered.
    #[inline]
    pub fn is_orphan(&self) -> bool {
        self.level < 0
    }
}

/// Node record in the shape exposed to the host: the annotated node plus
/// its current collapse flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
    pub level: i32,
    pub collapsed: bool,
    pub has_children: bool,
}

/// Per-node UI state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const COLLAPSED: u8 = 0b0000_0001;
    const COLLAPSE_PENDING: u8 = 0b0000_0010;

    /// Create a new expanded state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Create a collapsed state.
    #[inline]
    pub fn collapsed() -> Self {
        Self {
            flags: Self::COLLAPSED,
        }
    }

    /// Check if the node hides its descendants.
    #[inline]
    pub fn is_collapsed(self) -> bool {
        self.flags & Self::COLLAPSED != 0
    }

    /// Set the collapsed state.
    #[inline]
    pub fn set_collapsed(&mut self, collapsed: bool) {
        if collapsed {
            self.flags |= Self::COLLAPSED;
        } else {
            self.flags &= !Self::COLLAPSED;
        }
    }

    /// Check if a collapse is waiting on its exit animation.
    #[inline]
    pub fn is_collapse_pending(self) -> bool {
        self.flags & Self::COLLAPSE_PENDING != 0
    }

    /// Set the pending-collapse state.
    #[inline]
    pub fn set_collapse_pending(&mut self, pending: bool) {
        if pending {
            self.flags |= Self::COLLAPSE_PENDING;
        } else {
            self.flags &= !Self::COLLAPSE_PENDING;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_slot() {
        let slot = NodeSlot(42);
        assert_eq!(slot.index(), 42);
        assert_eq!(format!("{}", slot), "Node(42)");
    }

    #[test]
    fn test_node_state_default() {
        let state = NodeState::new();
        assert!(!state.is_collapsed());
        assert!(!state.is_collapse_pending());
        assert!(NodeState::collapsed().is_collapsed());
    }

    #[test]
    fn test_node_state_flags_independent() {
        let mut state = NodeState::collapsed();
        state.set_collapse_pending(true);
        assert!(state.is_collapsed());
        assert!(state.is_collapse_pending());

        state.set_collapsed(false);
        assert!(!state.is_collapsed());
        assert!(state.is_collapse_pending());

        state.set_collapse_pending(false);
        assert_eq!(state, NodeState::new());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = NodeRecord {
            id: "a".into(),
            label: "Topic A".into(),
            parent_id: Some("root".into()),
            level: 1,
            collapsed: true,
            has_children: false,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["parentId"], "root");
        assert_eq!(json["hasChildren"], false);
    }
}
