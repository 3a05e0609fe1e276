//! LayoutResult (§3): the immutable hand-off between Sugiyama+EdgeRouter and
//! the renderer. Once produced, nothing downstream mutates it.

use crate::ast::{Direction, EdgeType, Shape};
use crate::id::NodeId;
use std::collections::HashMap;

/// A corner of an orthogonal edge polyline, in character-cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// One real node or subgraph border, positioned in the final coordinate space.
///
/// `is_subgraph` distinguishes a subgraph's painted border rectangle (whose
/// `label` is the subgraph's declared label) from an ordinary node box.
/// Dummy nodes never appear here — the router consumes them into waypoints.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: NodeId,
    pub layer: i64,
    pub order: usize,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub label: String,
    pub shape: Shape,
    pub is_subgraph: bool,
}

/// One original document edge, routed to an orthogonal polyline. Waypoints
/// run from the source border to the target border; every consecutive pair
/// differs on exactly one axis.
#[derive(Debug, Clone)]
pub struct RoutedEdge {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub label: Option<String>,
    pub edge_type: EdgeType,
    pub waypoints: Vec<Point>,
}

/// The complete output of the layout/routing pipeline, consumed once by the
/// renderer. Produced bottom-up: each subgraph's fragment is computed at a
/// local origin, then translated into its parent's coordinate space as the
/// parent expands its compound node (§4.2 phase 7).
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<RoutedEdge>,
    pub subgraph_members: Vec<(NodeId, Vec<NodeId>)>,
    pub subgraph_descriptions: HashMap<NodeId, String>,
    pub direction: Direction,
}

impl LayoutResult {
    #[must_use]
    pub fn empty(direction: Direction) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            subgraph_members: Vec::new(),
            subgraph_descriptions: HashMap::new(),
            direction,
        }
    }

    /// The bounding box of all painted content: `(width, height)`. Used both
    /// to size a parent's compound node and to size the final canvas.
    #[must_use]
    pub fn content_bbox(&self) -> (i64, i64) {
        let mut w = 0;
        let mut h = 0;
        for n in &self.nodes {
            w = w.max(n.x + n.width);
            h = h.max(n.y + n.height);
        }
        (w, h)
    }

    /// Translate every coordinate in this fragment by `(dx, dy)`. Used when
    /// folding a recursively-laid-out subgraph fragment into its parent.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        for n in &mut self.nodes {
            n.x += dx;
            n.y += dy;
        }
        for e in &mut self.edges {
            for p in &mut e.waypoints {
                p.x += dx;
                p.y += dy;
            }
        }
    }
}
