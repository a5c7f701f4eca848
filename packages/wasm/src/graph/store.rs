//! GraphStore - annotated document graph.
//!
//! The store turns a flat `{nodes, edges}` payload into a rooted forest:
//! every node reachable from a root gets a parent, a level and a
//! `has_children` flag. Topology is kept in petgraph's StableGraph so slots
//! stay valid, with per-node collapse flags held in a parallel array.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use std::collections::{HashMap, HashSet, VecDeque};

use super::edge::{MindEdge, RawEdge};
use super::node::{MindNode, NodeRecord, NodeSlot, NodeState, RawNode};
use super::payload::GraphPayload;
use crate::error::{MindMapError, Result};

/// Effect of a collapse/expand toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEffect {
    /// The node now hides its descendants.
    Collapsed,
    /// The node now shows its children.
    Expanded,
    /// The node has no children; nothing changed.
    Ignored,
}

/// The annotated graph for one document.
pub struct GraphStore {
    /// Topology. Node weights are slots, edge weights index `edges`.
    graph: StableGraph<NodeSlot, usize, Directed>,

    /// Annotated nodes in payload order (indexed by slot).
    nodes: Vec<MindNode>,

    /// Petgraph index for each slot.
    indices: Vec<NodeIndex>,

    /// Map from node id to slot.
    id_to_slot: HashMap<String, NodeSlot>,

    /// Validated edges in payload order.
    edges: Vec<MindEdge>,

    /// Collapse flags (indexed by slot).
    states: Vec<NodeState>,
}

impl GraphStore {
    /// Build the annotated graph from a backend payload.
    ///
    /// Edges with unknown endpoints, self-loops and duplicate node ids are
    /// dropped. Roots are nodes without an incoming edge; when there are
    /// none every node becomes its own root. Nodes no root reaches keep
    /// level -1 and are never rendered.
    pub fn from_payload(payload: GraphPayload) -> Self {
        let GraphPayload {
            nodes: raw_nodes,
            edges: raw_edges,
        } = payload;

        let mut store = Self {
            graph: StableGraph::with_capacity(raw_nodes.len(), raw_edges.len()),
            nodes: Vec::with_capacity(raw_nodes.len()),
            indices: Vec::with_capacity(raw_nodes.len()),
            id_to_slot: HashMap::with_capacity(raw_nodes.len()),
            edges: Vec::with_capacity(raw_edges.len()),
            states: Vec::with_capacity(raw_nodes.len()),
        };

        for raw in raw_nodes {
            if let Some(kept) = store.id_to_slot.get(&raw.id) {
                log::warn!("duplicate node id {:?} ignored, keeping {kept}", raw.id);
                continue;
            }
            let slot = NodeSlot(store.nodes.len() as u32);
            let index = store.graph.add_node(slot);
            store.id_to_slot.insert(raw.id.clone(), slot);
            store.indices.push(index);
            store.nodes.push(MindNode {
                id: raw.id,
                label: raw.label,
                parent_id: None,
                level: -1,
                has_children: false,
            });
            store.states.push(NodeState::collapsed());
        }

        for raw in raw_edges {
            let (Some(&source), Some(&target)) = (
                store.id_to_slot.get(&raw.source),
                store.id_to_slot.get(&raw.target),
            ) else {
                log::warn!(
                    "edge {:?} -> {:?} references an unknown node; dropped",
                    raw.source,
                    raw.target
                );
                continue;
            };
            if source == target {
                log::warn!("self-loop on {:?} dropped", raw.source);
                continue;
            }
            let edge_index = store.edges.len();
            store.graph.add_edge(
                store.indices[source.index()],
                store.indices[target.index()],
                edge_index,
            );
            store.nodes[source.index()].has_children = true;
            store.edges.push(raw.into());
        }

        store.assign_levels();
        store
    }

    /// The single-root graph substituted when a fetch fails.
    pub fn fallback(display_name: &str) -> Self {
        Self::from_payload(GraphPayload::fallback(display_name))
    }

    /// Multi-source BFS from every root assigning parent and level.
    fn assign_levels(&mut self) {
        let targets: HashSet<usize> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(_, target)| self.graph[target].index())
            .collect();

        let mut roots: Vec<usize> = (0..self.nodes.len())
            .filter(|slot| !targets.contains(slot))
            .collect();
        if roots.is_empty() && !self.nodes.is_empty() {
            log::warn!("graph has no root; treating every node as its own root");
            roots = (0..self.nodes.len()).collect();
        }

        let mut queue = VecDeque::with_capacity(self.nodes.len());
        for &root in &roots {
            self.nodes[root].level = 0;
            self.states[root] = NodeState::new();
            queue.push_back(root);
        }

        while let Some(slot) = queue.pop_front() {
            let level = self.nodes[slot].level;
            for child in self.out_slots(slot) {
                if self.nodes[child].level >= 0 {
                    continue;
                }
                self.nodes[child].level = level + 1;
                self.nodes[child].parent_id = Some(self.nodes[slot].id.clone());
                queue.push_back(child);
            }
        }

        let orphans = self.nodes.iter().filter(|n| n.is_orphan()).count();
        if orphans > 0 {
            log::warn!("{orphans} node(s) unreachable from any root excluded from rendering");
        }
        log::debug!(
            "graph store built: {} nodes, {} edges, {} roots",
            self.nodes.len(),
            self.edges.len(),
            roots.len()
        );
    }

    /// Targets of a slot's outgoing edges in payload edge order.
    fn out_slots(&self, slot: usize) -> Vec<usize> {
        let mut out: Vec<(usize, usize)> = self
            .graph
            .edges_directed(self.indices[slot], Direction::Outgoing)
            .map(|e| (*e.weight(), self.graph[e.target()].index()))
            .collect();
        out.sort_unstable_by_key(|&(edge_index, _)| edge_index);
        out.into_iter().map(|(_, target)| target).collect()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Number of nodes, orphans included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of valid edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All annotated nodes in payload order.
    pub fn nodes(&self) -> &[MindNode] {
        &self.nodes
    }

    /// All valid edges in payload order.
    pub fn edges(&self) -> &[MindEdge] {
        &self.edges
    }

    pub fn slot_of(&self, id: &str) -> Option<NodeSlot> {
        self.id_to_slot.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&MindNode> {
        self.slot_of(id).map(|slot| &self.nodes[slot.index()])
    }

    pub(crate) fn node_at(&self, slot: NodeSlot) -> &MindNode {
        &self.nodes[slot.index()]
    }

    pub(crate) fn state_at(&self, slot: NodeSlot) -> NodeState {
        self.states[slot.index()]
    }

    /// Root nodes in payload order.
    pub fn roots(&self) -> Vec<&MindNode> {
        self.nodes.iter().filter(|n| n.is_root()).collect()
    }

    /// Children in the BFS tree, in edge order.
    ///
    /// An outgoing edge to a node that was reached through another parent
    /// is not a tree child.
    pub fn tree_children(&self, id: &str) -> Vec<&MindNode> {
        let Some(slot) = self.slot_of(id) else {
            return Vec::new();
        };
        self.out_slots(slot.index())
            .into_iter()
            .map(|child| &self.nodes[child])
            .filter(|child| child.parent_id.as_deref() == Some(id))
            .collect()
    }

    /// All tree descendants of a node, breadth first.
    pub fn descendants(&self, id: &str) -> Vec<&MindNode> {
        let mut result = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.tree_children(current) {
                result.push(child);
                queue.push_back(child.id.as_str());
            }
        }
        result
    }

    // =========================================================================
    // Collapse state
    // =========================================================================

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.slot_of(id)
            .map(|slot| self.states[slot.index()].is_collapsed())
            .unwrap_or(false)
    }

    /// Set a node's collapse flag, whether or not it is currently visible.
    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> Result<()> {
        let slot = self
            .slot_of(id)
            .ok_or_else(|| MindMapError::UnknownNode(id.to_string()))?;
        self.states[slot.index()].set_collapsed(collapsed);
        Ok(())
    }

    /// Flip a node's collapse flag. Nodes without children are left alone.
    pub fn toggle(&mut self, id: &str) -> Result<ToggleEffect> {
        let slot = self
            .slot_of(id)
            .ok_or_else(|| MindMapError::UnknownNode(id.to_string()))?;
        if !self.nodes[slot.index()].has_children {
            return Ok(ToggleEffect::Ignored);
        }
        let state = &mut self.states[slot.index()];
        let collapsed = !state.is_collapsed();
        state.set_collapsed(collapsed);
        Ok(if collapsed {
            ToggleEffect::Collapsed
        } else {
            ToggleEffect::Expanded
        })
    }

    pub fn is_collapse_pending(&self, id: &str) -> bool {
        self.slot_of(id)
            .map(|slot| self.states[slot.index()].is_collapse_pending())
            .unwrap_or(false)
    }

    pub fn set_collapse_pending(&mut self, id: &str, pending: bool) -> Result<()> {
        let slot = self
            .slot_of(id)
            .ok_or_else(|| MindMapError::UnknownNode(id.to_string()))?;
        self.states[slot.index()].set_collapse_pending(pending);
        Ok(())
    }

    /// Ids of nodes whose collapse waits on an exit animation.
    pub fn pending_collapses(&self) -> Vec<String> {
        self.nodes
            .iter()
            .zip(&self.states)
            .filter(|(_, state)| state.is_collapse_pending())
            .map(|(node, _)| node.id.clone())
            .collect()
    }

    /// Node records with their current collapse flag, in payload order.
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.nodes
            .iter()
            .zip(&self.states)
            .map(|(node, state)| NodeRecord {
                id: node.id.clone(),
                label: node.label.clone(),
                parent_id: node.parent_id.clone(),
                level: node.level,
                collapsed: state.is_collapsed(),
                has_children: node.has_children,
            })
            .collect()
    }

    /// The validated graph back in wire shape, for the persistence cache.
    pub fn to_payload(&self) -> GraphPayload {
        GraphPayload {
            nodes: self
                .nodes
                .iter()
                .map(|node| RawNode::new(node.id.clone(), node.label.clone()))
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|edge| {
                    RawEdge::new(edge.source_id.clone(), edge.target_id.clone())
                        .with_relation(edge.relation.clone())
                })
                .collect(),
        }
    }
}
