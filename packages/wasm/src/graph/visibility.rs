//! Visibility resolution from collapse flags.
//!
//! A node is visible iff it is a root, or every node on its ancestor chain
//! is expanded. The set is always recomputed from the full flag array, so
//! flags changed on hidden nodes are picked up the moment their ancestors
//! open again.

use std::collections::HashSet;

use super::edge::MindEdge;
use super::node::NodeSlot;
use super::store::GraphStore;

/// Visible node ids in graph order, with O(1) membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleSet {
    ids: Vec<String>,
    members: HashSet<String>,
}

impl VisibleSet {
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Membership as an owned set, handy for comparisons.
    pub fn to_set(&self) -> HashSet<String> {
        self.members.clone()
    }
}

/// Compute the visible nodes from the store's current collapse flags.
pub fn visible_nodes(store: &GraphStore) -> VisibleSet {
    // None = not yet resolved for this call
    let mut memo: Vec<Option<bool>> = vec![None; store.node_count()];
    let mut set = VisibleSet::default();

    for slot in 0..store.node_count() {
        if resolve(store, NodeSlot(slot as u32), &mut memo) {
            let id = store.node_at(NodeSlot(slot as u32)).id.clone();
            set.members.insert(id.clone());
            set.ids.push(id);
        }
    }
    set
}

/// Walk up the parent chain until a resolved node or a root, then fill in
/// the chain on the way back down.
fn resolve(store: &GraphStore, slot: NodeSlot, memo: &mut [Option<bool>]) -> bool {
    let mut chain: Vec<NodeSlot> = Vec::new();
    let mut current = slot;
    let mut visible = loop {
        if let Some(known) = memo[current.index()] {
            break known;
        }
        let node = store.node_at(current);
        if node.is_orphan() {
            break false;
        }
        let Some(parent_slot) = node.parent_id.as_deref().and_then(|p| store.slot_of(p)) else {
            // root
            memo[current.index()] = Some(true);
            break true;
        };
        chain.push(current);
        current = parent_slot;
    };

    // `current` is the resolved ancestor; each chain entry is visible iff its
    // parent is visible and expanded.
    let mut parent = current;
    for &child in chain.iter().rev() {
        visible = visible && !store.state_at(parent).is_collapsed();
        memo[child.index()] = Some(visible);
        parent = child;
    }
    memo[slot.index()].unwrap_or(visible)
}

/// Edges whose endpoints are both visible, in payload order.
pub fn visible_edges<'a>(store: &'a GraphStore, visible: &VisibleSet) -> Vec<&'a MindEdge> {
    store
        .edges()
        .iter()
        .filter(|edge| visible.contains(&edge.source_id) && visible.contains(&edge.target_id))
        .collect()
}
