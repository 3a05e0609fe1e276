//! GraphIR (§4.1): a thin typed wrapper over a directed multigraph.
//!
//! One [`GraphIr`] instance exists per Sugiyama "level" — the top-level
//! document, and one more per collapsed subgraph recursed into during
//! phase 7 (expand). Each carries only the nodes/edges relevant to that
//! level; cross-level edges have already been rewritten to their compound
//! stand-ins by the time a level's `GraphIr` is built (see `sugiyama::collapse`).
//!
//! Iteration order is the determinism-critical property of this type: every
//! method that returns more than one id returns them in insertion order,
//! never petgraph's internal slot order, which is not guaranteed stable
//! across mutation.

use crate::ast::{EdgeType, Shape};
use crate::id::NodeId;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::Direction as PgDirection;
use std::collections::HashMap;

/// Per-node metadata threaded through every Sugiyama phase.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    pub label: String,
    pub shape: Shape,
    pub is_dummy: bool,
    pub is_compound: bool,
    /// Set by phase 3 (layer assignment).
    pub layer: i64,
    /// Set by phase 5 (crossing minimization): position within its layer.
    pub order: usize,
    /// Set by phase 6 (coordinate assignment), local to this level's origin.
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl NodeMeta {
    #[must_use]
    pub fn real(label: String, shape: Shape) -> Self {
        Self {
            label,
            shape,
            is_dummy: false,
            is_compound: false,
            layer: 0,
            order: 0,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        }
    }

    #[must_use]
    pub fn dummy() -> Self {
        Self {
            label: String::new(),
            shape: Shape::Rectangle,
            is_dummy: true,
            is_compound: false,
            layer: 0,
            order: 0,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        }
    }

    #[must_use]
    pub fn compound(label: String) -> Self {
        Self {
            label,
            shape: Shape::Rectangle,
            is_dummy: false,
            is_compound: true,
            layer: 0,
            order: 0,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        }
    }
}

/// Per-edge metadata. `origin` identifies which source-document edge (or
/// dummy-chain) this graph edge ultimately belongs to, so the router can
/// reconstruct one `RoutedEdge` per original edge even after phase 4 has
/// split it into a chain of unit-layer edges.
#[derive(Debug, Clone)]
pub struct EdgeMeta {
    pub edge_type: EdgeType,
    pub label: Option<String>,
    pub reversed: bool,
    pub origin: OriginEdge,
    /// Insertion sequence, used to keep iteration deterministic regardless
    /// of petgraph's internal edge storage order.
    pub(crate) seq: u64,
}

/// Identifies the original document edge a (possibly dummy-split,
/// possibly-reversed) GraphIR edge descends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginEdge(pub usize);

/// A directed multigraph over [`NodeMeta`]/[`EdgeMeta`], with deterministic
/// iteration order and the §4.1 operation set.
pub struct GraphIr {
    graph: StableDiGraph<NodeMeta, EdgeMeta>,
    id_index: HashMap<NodeId, NodeIndex>,
    index_id: HashMap<NodeIndex, NodeId>,
    insertion_order: Vec<NodeIndex>,
    next_seq: u64,
}

impl Default for GraphIr {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphIr {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            id_index: HashMap::new(),
            index_id: HashMap::new(),
            insertion_order: Vec::new(),
            next_seq: 0,
        }
    }

    /// Add a node. Re-adding an existing id returns its existing index
    /// unchanged (metadata is not overwritten) — callers that need to
    /// update metadata use [`Self::node_mut`] explicitly.
    pub fn add_node(&mut self, id: NodeId, meta: NodeMeta) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(meta);
        self.id_index.insert(id, idx);
        self.index_id.insert(idx, id);
        self.insertion_order.push(idx);
        idx
    }

    pub fn add_edge(&mut self, u: NodeIndex, v: NodeIndex, mut meta: EdgeMeta) -> EdgeIndex {
        meta.seq = self.next_seq;
        self.next_seq += 1;
        self.graph.add_edge(u, v, meta)
    }

    #[must_use]
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    #[must_use]
    pub fn id_of(&self, idx: NodeIndex) -> NodeId {
        self.index_id[&idx]
    }

    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> &NodeMeta {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut NodeMeta {
        &mut self.graph[idx]
    }

    /// All node indices in insertion order.
    #[must_use]
    pub fn node_indices(&self) -> &[NodeIndex] {
        &self.insertion_order
    }

    pub fn node_count(&self) -> usize {
        self.insertion_order.len()
    }

    /// Predecessors of `v`, in the order their edges were inserted.
    #[must_use]
    pub fn predecessors(&self, v: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_ordered(v, PgDirection::Incoming)
            .into_iter()
            .map(|(u, _)| u)
            .collect()
    }

    /// Successors of `v`, in the order their edges were inserted.
    #[must_use]
    pub fn successors(&self, v: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_ordered(v, PgDirection::Outgoing)
            .into_iter()
            .map(|(u, _)| u)
            .collect()
    }

    /// Edges incident on `v` in the given direction, sorted by insertion
    /// sequence for determinism. Returns `(other_endpoint, edge_index)`.
    fn neighbors_ordered(
        &self,
        v: NodeIndex,
        dir: PgDirection,
    ) -> Vec<(NodeIndex, EdgeIndex)> {
        let mut out: Vec<(NodeIndex, EdgeIndex, u64)> = self
            .graph
            .edges_directed(v, dir)
            .map(|edge_ref| {
                use petgraph::visit::EdgeRef;
                let other = match dir {
                    PgDirection::Incoming => edge_ref.source(),
                    PgDirection::Outgoing => edge_ref.target(),
                };
                (other, edge_ref.id(), edge_ref.weight().seq)
            })
            .collect();
        out.sort_by_key(|&(_, _, seq)| seq);
        out.into_iter().map(|(n, e, _)| (n, e)).collect()
    }

    /// Outgoing edges of `v` as `(target, edge_index)`, insertion order.
    #[must_use]
    pub fn out_edges(&self, v: NodeIndex) -> Vec<(NodeIndex, EdgeIndex)> {
        self.neighbors_ordered(v, PgDirection::Outgoing)
    }

    /// Incoming edges of `v` as `(source, edge_index)`, insertion order.
    #[must_use]
    pub fn in_edges(&self, v: NodeIndex) -> Vec<(NodeIndex, EdgeIndex)> {
        self.neighbors_ordered(v, PgDirection::Incoming)
    }

    #[must_use]
    pub fn edge(&self, e: EdgeIndex) -> &EdgeMeta {
        &self.graph[e]
    }

    pub fn edge_mut(&mut self, e: EdgeIndex) -> &mut EdgeMeta {
        &mut self.graph[e]
    }

    #[must_use]
    pub fn edge_endpoints(&self, e: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(e)
    }

    /// All edges in insertion order.
    #[must_use]
    pub fn edge_indices_ordered(&self) -> Vec<EdgeIndex> {
        let mut v: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        v.sort_by_key(|&e| self.graph[e].seq);
        v
    }

    /// Reverse an edge in place (cycle removal, §4.2 phase 2): removes it
    /// and re-inserts it with endpoints swapped and `reversed` set, keeping
    /// its original metadata and insertion sequence so downstream ordering
    /// is unaffected by the flip.
    pub fn reverse_edge(&mut self, e: EdgeIndex) -> EdgeIndex {
        let (u, v) = self
            .graph
            .edge_endpoints(e)
            .expect("reverse_edge: edge index must be valid");
        let mut meta = self.graph.remove_edge(e).expect("edge just looked up");
        meta.reversed = !meta.reversed;
        self.graph.add_edge(v, u, meta)
    }

    /// Remove an edge outright (phase 4 replaces a layer-spanning edge with
    /// a dummy chain and discards the original).
    pub fn remove_edge(&mut self, e: EdgeIndex) {
        self.graph.remove_edge(e);
    }

    pub fn remove_node(&mut self, idx: NodeIndex) {
        if let Some(id) = self.index_id.remove(&idx) {
            self.id_index.remove(&id);
        }
        self.insertion_order.retain(|&n| n != idx);
        self.graph.remove_node(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdInterner;

    #[test]
    fn insertion_order_is_preserved() {
        let mut interner = IdInterner::new();
        let mut g = GraphIr::new();
        let ids: Vec<NodeId> = ["C", "A", "B"].iter().map(|s| interner.intern(s)).collect();
        let idxs: Vec<NodeIndex> = ids
            .iter()
            .map(|&id| g.add_node(id, NodeMeta::real(String::new(), Shape::Rectangle)))
            .collect();
        assert_eq!(g.node_indices(), idxs.as_slice());
    }

    #[test]
    fn predecessors_and_successors_follow_edge_insertion_order() {
        let mut interner = IdInterner::new();
        let mut g = GraphIr::new();
        let a = g.add_node(interner.intern("A"), NodeMeta::real("A".into(), Shape::Rectangle));
        let b = g.add_node(interner.intern("B"), NodeMeta::real("B".into(), Shape::Rectangle));
        let c = g.add_node(interner.intern("C"), NodeMeta::real("C".into(), Shape::Rectangle));

        let meta = |origin| EdgeMeta {
            edge_type: EdgeType::Arrow,
            label: None,
            reversed: false,
            origin: OriginEdge(origin),
            seq: 0,
        };
        g.add_edge(c, a, meta(0));
        g.add_edge(b, a, meta(1));

        assert_eq!(g.predecessors(a), vec![c, b]);
        assert_eq!(g.successors(c), vec![a]);
    }

    #[test]
    fn reverse_edge_flips_endpoints_and_marks_reversed() {
        let mut interner = IdInterner::new();
        let mut g = GraphIr::new();
        let a = g.add_node(interner.intern("A"), NodeMeta::real("A".into(), Shape::Rectangle));
        let b = g.add_node(interner.intern("B"), NodeMeta::real("B".into(), Shape::Rectangle));
        let e = g.add_edge(
            a,
            b,
            EdgeMeta {
                edge_type: EdgeType::Arrow,
                label: None,
                reversed: false,
                origin: OriginEdge(0),
                seq: 0,
            },
        );
        let e2 = g.reverse_edge(e);
        assert_eq!(g.edge_endpoints(e2), Some((b, a)));
        assert!(g.edge(e2).reversed);
    }
}
