//! Edge routing (§4.3): orthogonal polylines on the character grid laid out
//! by [`crate::sugiyama`].
//!
//! Two modes, in the order the spec prefers them:
//!
//! - A* over a 4-connected lattice with a Manhattan heuristic, used for the
//!   common case. Straight segments cost 1, turns cost 2 extra, passing
//!   through another node's interior is forbidden, and passing near another
//!   routed edge costs a +3 penalty (discourages overlap without forbidding
//!   it outright, since forbidding it can make a layout unsolvable).
//! - An orthogonal-waypoint fallback (a single midpoint dog-leg) used
//!   whenever A* exhausts its search space, so routing always terminates.
//!
//! Self-loops never enter either search: they get a fixed one-cell
//! clearance loop on the node's right side (§4.3 addendum).

use crate::graphir::GraphIr;
use crate::result::{Point, RoutedEdge};
use petgraph::stable_graph::NodeIndex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Penalty added per step for passing adjacent to another edge's path.
const CONGESTION_PENALTY: i64 = 3;
/// Penalty added for a turn (a step whose direction differs from the previous one).
const TURN_PENALTY: i64 = 2;
/// Hard cap on expanded nodes before falling back to the waypoint router.
const ASTAR_NODE_BUDGET: usize = 20_000;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct Cell {
    x: i64,
    y: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn step(self) -> (i64, i64) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

/// A rectangle in grid coordinates, half-open on neither edge (`x`/`y` in
/// `[x0, x1]` inclusive).
#[derive(Clone, Copy)]
struct Rect {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl Rect {
    fn contains(self, x: i64, y: i64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Route every original document edge in this scope's [`GraphIr`], collapsing
/// each dummy-split chain back into one [`RoutedEdge`] per `OriginEdge`.
///
/// `decycle` (§4.2 phase 2) may have reversed a back-edge's GraphIR endpoints
/// to break a cycle for layering purposes; `insert_dummies` carries that
/// edge's `reversed` flag onto every segment of its dummy chain unchanged.
/// A chain found reversed here is un-reversed back to the document's own
/// source→target order before it becomes a `RoutedEdge`, so `from_id`/`to_id`
/// and the waypoint order always match what the user wrote, regardless of
/// which direction Greedy-FAS actually stored it in.
pub fn route_all(g: &GraphIr, self_loop_nodes: &[NodeIndex]) -> Vec<RoutedEdge> {
    let obstacles: Vec<Rect> = g
        .node_indices()
        .iter()
        .filter(|&&v| !g.node(v).is_dummy)
        .map(|&v| {
            let m = g.node(v);
            Rect {
                x0: m.x,
                y0: m.y,
                x1: m.x + m.width - 1,
                y1: m.y + m.height - 1,
            }
        })
        .collect();

    // Group edges by OriginEdge so a dummy-split chain reassembles into one
    // RoutedEdge; self-loops are single-edge "chains" of length one. Only
    // the final segment of a dummy-split chain carries the original label
    // (see `sugiyama::insert_dummies`), so the label/edge_type are taken
    // from whichever segment actually has one, not the first segment seen.
    let mut chains: HashMap<usize, Vec<(NodeIndex, NodeIndex)>> = HashMap::new();
    let mut chain_label: HashMap<usize, Option<String>> = HashMap::new();
    let mut chain_type: HashMap<usize, crate::ast::EdgeType> = HashMap::new();
    let mut chain_reversed: HashMap<usize, bool> = HashMap::new();
    for e in g.edge_indices_ordered() {
        let (u, v) = match g.edge_endpoints(e) {
            Some(uv) => uv,
            None => continue,
        };
        let meta = g.edge(e);
        let origin = meta.origin.0;
        chains.entry(origin).or_default().push((u, v));
        chain_type.insert(origin, meta.edge_type);
        chain_reversed.insert(origin, meta.reversed);
        if meta.label.is_some() {
            chain_label.insert(origin, meta.label.clone());
        } else {
            chain_label.entry(origin).or_insert(None);
        }
    }

    let mut routed_paths: Vec<Vec<Point>> = Vec::new();
    let mut results = Vec::new();

    let self_loop_set: HashSet<NodeIndex> = self_loop_nodes.iter().copied().collect();

    let mut origins: Vec<usize> = chains.keys().copied().collect();
    origins.sort_unstable();

    for origin in origins {
        let edges = &chains[&origin];
        let first_u = edges.first().unwrap().0;
        let last_v = edges.last().unwrap().1;

        if self_loop_set.contains(&first_u) && first_u == last_v {
            let rect = obstacles
                .iter()
                .zip(g.node_indices().iter().filter(|&&v| !g.node(v).is_dummy))
                .find(|(_, &v)| v == first_u)
                .map(|(r, _)| *r);
            if let Some(rect) = rect {
                let waypoints = self_loop_path(rect);
                let from_id = g.id_of(first_u);
                let to_id = g.id_of(last_v);
                let label = chain_label[&origin].clone();
                let edge_type = chain_type[&origin];
                results.push(RoutedEdge {
                    from_id,
                    to_id,
                    label,
                    edge_type,
                    waypoints,
                });
                continue;
            }
        }

        let source_rect = rect_of(g, &obstacles, first_u);
        let target_rect = rect_of(g, &obstacles, last_v);
        let label = chain_label[&origin].clone();
        let edge_type = chain_type[&origin];
        let reversed = chain_reversed.get(&origin).copied().unwrap_or(false);

        let waypoints = match (source_rect, target_rect) {
            (Some(sr), Some(tr)) => {
                let start = exit_point(sr, tr);
                let end = entry_point(tr, sr);
                route_path(start, end, &obstacles, &routed_paths).unwrap_or_else(|| waypoint_fallback(start, end))
            }
            _ => Vec::new(),
        };
        routed_paths.push(waypoints.clone());

        // `first_u`/`last_v` are the GraphIR's own (possibly decycle-reversed)
        // physical endpoints; un-reverse both the ids and the polyline so a
        // reversed chain still reports the document's own source→target order.
        let (from_id, to_id, waypoints) = if reversed {
            let mut w = waypoints;
            w.reverse();
            (g.id_of(last_v), g.id_of(first_u), w)
        } else {
            (g.id_of(first_u), g.id_of(last_v), waypoints)
        };
        results.push(RoutedEdge {
            from_id,
            to_id,
            label,
            edge_type,
            waypoints,
        });
    }

    results
}

fn rect_of(g: &GraphIr, obstacles: &[Rect], v: NodeIndex) -> Option<Rect> {
    let real_nodes: Vec<NodeIndex> = g.node_indices().iter().copied().filter(|&n| !g.node(n).is_dummy).collect();
    real_nodes.iter().position(|&n| n == v).map(|i| obstacles[i])
}

/// Pick the point on `from`'s bottom border closest to `to`'s center.
///
/// Routing always happens in TD shape — layer increases downward — no
/// matter the document's declared direction; LR/RL/BT are transforms the
/// renderer applies to the whole painted canvas afterward (§4.6 phase 1/7),
/// so the router never needs to know the final direction.
fn exit_point(from: Rect, to: Rect) -> Point {
    border_point(from, to, true)
}

fn entry_point(to: Rect, from: Rect) -> Point {
    border_point(to, from, false)
}

fn border_point(rect: Rect, toward: Rect, is_source: bool) -> Point {
    let toward_center_x = (toward.x0 + toward.x1) / 2;
    let y = if is_source { rect.y1 } else { rect.y0 };
    Point::new(toward_center_x.clamp(rect.x0, rect.x1), y)
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct Scored {
    cost: i64,
    tie: (i64, i64),
}
impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the lowest cost pops first,
        // with deterministic tie-breaking on coordinates.
        other.cost.cmp(&self.cost).then_with(|| other.tie.cmp(&self.tie))
    }
}
impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* search over the character grid from `start` to `end`, both assumed to
/// sit exactly on an obstacle's border (the endpoints themselves are never
/// treated as blocked).
fn route_path(start: Point, end: Point, obstacles: &[Rect], prior_paths: &[Vec<Point>]) -> Option<Vec<Point>> {
    let occupied: HashSet<Cell> = prior_paths
        .iter()
        .flat_map(|path| path.iter().map(|p| Cell { x: p.x, y: p.y }))
        .collect();

    let blocked = |x: i64, y: i64| -> bool {
        if (x, y) == (start.x, start.y) || (x, y) == (end.x, end.y) {
            return false;
        }
        obstacles.iter().any(|r| r.contains(x, y))
    };

    let heuristic = |x: i64, y: i64| -> i64 { (x - end.x).abs() + (y - end.y).abs() };

    let start_cell = Cell { x: start.x, y: start.y };
    let end_cell = Cell { x: end.x, y: end.y };

    let mut open = BinaryHeap::new();
    open.push((
        Scored {
            cost: heuristic(start.x, start.y),
            tie: (start.x, start.y),
        },
        start_cell,
        None::<Dir>,
    ));
    let mut best_cost: HashMap<(Cell, Option<Dir>), i64> = HashMap::new();
    best_cost.insert((start_cell, None), 0);
    let mut came_from: HashMap<(Cell, Option<Dir>), (Cell, Option<Dir>)> = HashMap::new();
    let mut expansions = 0usize;

    while let Some((_, cell, from_dir)) = open.pop() {
        expansions += 1;
        if expansions > ASTAR_NODE_BUDGET {
            return None;
        }
        if cell == end_cell {
            return Some(reconstruct(came_from, (cell, from_dir), start_cell));
        }
        let g_here = best_cost[&(cell, from_dir)];
        for dir in [Dir::Up, Dir::Down, Dir::Left, Dir::Right] {
            let (dx, dy) = dir.step();
            let nx = cell.x + dx;
            let ny = cell.y + dy;
            if blocked(nx, ny) {
                continue;
            }
            let mut step_cost = 1;
            if let Some(prev) = from_dir {
                if prev != dir {
                    step_cost += TURN_PENALTY;
                }
            }
            if occupied.contains(&Cell { x: nx, y: ny }) {
                step_cost += CONGESTION_PENALTY;
            }
            let next_g = g_here + step_cost;
            let key = (Cell { x: nx, y: ny }, Some(dir));
            if best_cost.get(&key).map_or(true, |&c| next_g < c) {
                best_cost.insert(key, next_g);
                came_from.insert(key, (cell, from_dir));
                open.push((
                    Scored {
                        cost: next_g + heuristic(nx, ny),
                        tie: (nx, ny),
                    },
                    Cell { x: nx, y: ny },
                    Some(dir),
                ));
            }
        }
    }
    None
}

fn reconstruct(
    came_from: HashMap<(Cell, Option<Dir>), (Cell, Option<Dir>)>,
    end_key: (Cell, Option<Dir>),
    start_cell: Cell,
) -> Vec<Point> {
    let mut path = vec![end_key.0];
    let mut key = end_key;
    while path.last() != Some(&start_cell) {
        match came_from.get(&key) {
            Some(&prev) => {
                path.push(prev.0);
                key = prev;
            }
            None => break,
        }
    }
    path.reverse();
    simplify_collinear(path.into_iter().map(|c| Point::new(c.x, c.y)).collect())
}

/// Drop intermediate points that don't represent a direction change — keeps
/// `RoutedEdge::waypoints` to actual polyline corners.
fn simplify_collinear(points: Vec<Point>) -> Vec<Point> {
    if points.len() <= 2 {
        return points;
    }
    let mut out = vec![points[0]];
    for i in 1..points.len() - 1 {
        let (a, b, c) = (out[out.len() - 1], points[i], points[i + 1]);
        let same_dir = (b.x - a.x).signum() == (c.x - b.x).signum() && (b.y - a.y).signum() == (c.y - b.y).signum();
        if !same_dir {
            out.push(b);
        }
    }
    out.push(points[points.len() - 1]);
    out
}

/// Single-midpoint orthogonal dog-leg, used when A* can't find a path (dense
/// or pathological layouts). Always terminates, never checked against
/// obstacles — it may overlap a box, which is an acceptable degradation for
/// an already-exceptional case.
fn waypoint_fallback(start: Point, end: Point) -> Vec<Point> {
    if start.x == end.x || start.y == end.y {
        return vec![start, end];
    }
    let mid = Point::new(start.x, end.y);
    vec![start, mid, end]
}

/// One-cell clearance loop off the right side of `rect`, re-entering at a
/// point one row below the exit so the arrowhead lands on a distinct cell
/// from the departure stub.
fn self_loop_path(rect: Rect) -> Vec<Point> {
    let exit_y = rect.y0 + (rect.height_mid());
    let reentry_y = (exit_y + 1).min(rect.y1);
    let out_x = rect.x1 + 2;
    vec![
        Point::new(rect.x1, exit_y),
        Point::new(out_x, exit_y),
        Point::new(out_x, reentry_y),
        Point::new(rect.x1, reentry_y),
    ]
}

impl Rect {
    fn height_mid(self) -> i64 {
        (self.y1 - self.y0) / 2
    }
}
