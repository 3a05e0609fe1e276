//! Sugiyama layout engine (§4.2): eight phases over [`GraphIr`], recursing
//! once per subgraph level (phase 7's "recursive sub-invocation").
//!
//! Subgraphs are handled bottom-up: [`layout_scope`] first recurses into
//! every direct child subgraph (producing each child's complete internal
//! layout at a local origin), uses each child's resulting bounding box as
//! the measured size of a compound node standing in for it, then runs
//! phases 2–6 once at this level treating those compounds as ordinary sized
//! leaves. The already-computed child fragments are then translated into
//! this level's coordinate space and folded into the result — no child is
//! ever laid out twice.

use crate::ast::{self, Direction, Shape};
use crate::config::RenderConfig;
use crate::error::layout_bug;
use crate::graphir::{EdgeMeta, GraphIr, NodeMeta, OriginEdge};
use crate::id::{IdInterner, NodeId};
use crate::result::{LayoutNode, LayoutResult};
use crate::router;
use petgraph::stable_graph::NodeIndex;
use std::collections::{HashMap, HashSet};

/// Horizontal gap between sibling nodes in the same layer.
const SIBLING_GAP: i64 = 3;
/// Vertical gap between layers for TD/BT.
const LAYER_GAP_TD: i64 = 3;
/// Vertical gap between layers for LR/RL (wider: room for arrowheads/labels).
const LAYER_GAP_LR: i64 = 5;
/// Cells of margin between a subgraph's border and its content, on each side.
const SUBGRAPH_INSET: i64 = 2;
/// Fixed iteration count for barycenter crossing minimization (§4.2 phase 5).
const BARYCENTER_PASSES: usize = 24;

/// Entry point: lay out a complete parsed document.
pub fn layout(ast_graph: &ast::Graph, config: &RenderConfig, interner: &mut IdInterner) -> LayoutResult {
    let direction = config.direction.unwrap_or(ast_graph.direction);
    if ast_graph.nodes.is_empty() && ast_graph.subgraphs.is_empty() {
        return LayoutResult::empty(direction);
    }
    let global = resolve_implicit_nodes(ast_graph);
    layout_scope(
        &direct_members(&ast_graph.nodes, &ast_graph.subgraphs),
        &ast_graph.edges,
        &ast_graph.subgraphs,
        direction,
        config,
        interner,
        &global,
    )
}

/// Every node id declared anywhere in the document, synthesizing a bare
/// Rectangle for any id an edge references but no `Node` ever declares
/// (§7 `ReferenceError` recovery — silent, logged at `warn`).
fn resolve_implicit_nodes(ast_graph: &ast::Graph) -> HashMap<String, ast::Node> {
    let mut table: HashMap<String, ast::Node> = ast_graph.nodes.iter().cloned().map(|n| (n.id.clone(), n)).collect();

    fn visit(edges: &[ast::Edge], subgraphs: &[ast::Subgraph], table: &mut HashMap<String, ast::Node>) {
        for e in edges {
            for id in [&e.from_id, &e.to_id] {
                table.entry(id.clone()).or_insert_with(|| {
                    log::warn!("node `{id}` referenced but never declared; implicitly declaring a Rectangle");
                    ast::Node {
                        id: id.clone(),
                        label: id.clone(),
                        shape: Shape::Rectangle,
                        attrs: HashMap::new(),
                    }
                });
            }
        }
        for sg in subgraphs {
            for id in &sg.nodes {
                table.entry(id.clone()).or_insert_with(|| ast::Node {
                    id: id.clone(),
                    label: id.clone(),
                    shape: Shape::Rectangle,
                    attrs: HashMap::new(),
                });
            }
            visit(&sg.edges, &sg.subgraphs, table);
        }
    }
    visit(&ast_graph.edges, &ast_graph.subgraphs, &mut table);
    table
}

/// Ids that belong directly to the top level (i.e. not claimed by any
/// top-level subgraph's direct membership).
fn direct_members(nodes: &[ast::Node], subgraphs: &[ast::Subgraph]) -> Vec<String> {
    let claimed: HashSet<&str> = subgraphs.iter().flat_map(|sg| sg.nodes.iter().map(String::as_str)).collect();
    nodes.iter().map(|n| n.id.clone()).filter(|id| !claimed.contains(id.as_str())).collect()
}

/// Does `sg` (directly or via a descendant subgraph) claim `id` as a member?
fn subgraph_contains(sg: &ast::Subgraph, id: &str) -> bool {
    sg.nodes.iter().any(|m| m == id) || sg.subgraphs.iter().any(|child| subgraph_contains(child, id))
}

fn measure(label: &str, shape: Shape, padding: i64) -> (i64, i64) {
    let lines: Vec<&str> = if label.is_empty() { vec![""] } else { label.split('\n').collect() };
    let max_line = lines.iter().map(|l| l.chars().count() as i64).max().unwrap_or(0);
    let mut width = 2 + padding * 2 + max_line;
    if matches!(shape, Shape::Diamond | Shape::Circle) {
        width += 2;
    }
    let height = 2 + lines.len() as i64;
    (width.max(3), height.max(3))
}

/// Lay out one scope (the top level, or the inside of one subgraph), given
/// the ids directly owned here, the edges textually declared here, and the
/// direct child subgraphs. Returns a self-contained fragment at local
/// origin `(0, 0)`.
#[allow(clippy::too_many_arguments)]
fn layout_scope(
    direct_ids: &[String],
    local_edges: &[ast::Edge],
    children: &[ast::Subgraph],
    direction: Direction,
    config: &RenderConfig,
    interner: &mut IdInterner,
    global: &HashMap<String, ast::Node>,
) -> LayoutResult {
    // 1. Recurse into children first so their content size is known.
    let mut child_results: HashMap<String, LayoutResult> = HashMap::new();
    for sg in children {
        let child_direction = sg.direction.unwrap_or(direction);
        let child_direct = direct_members_for_subgraph(sg);
        let child_layout = layout_scope(&child_direct, &sg.edges, &sg.subgraphs, child_direction, config, interner, global);
        child_results.insert(sg.id.clone(), child_layout);
    }

    // 2. Build this level's GraphIr: direct real nodes + one compound per child.
    let mut g = GraphIr::new();
    let mut compound_of: HashMap<NodeIndex, String> = HashMap::new();

    for id in direct_ids {
        let node = global.get(id).expect("implicit nodes resolved up-front");
        let nid = interner.intern(id);
        g.add_node(nid, NodeMeta::real(node.label.clone(), node.shape));
    }
    for sg in children {
        let nid = interner.subgraph_compound_id(&sg.id);
        let child = &child_results[&sg.id];
        let (content_w, content_h) = child.content_bbox();
        let label_w = sg.label.chars().count() as i64 + 2 * SUBGRAPH_INSET;
        let width = (content_w + 2 * SUBGRAPH_INSET).max(label_w).max(5);
        let height = content_h + 2 * SUBGRAPH_INSET + 1;
        let idx = g.add_node(nid, NodeMeta::compound(sg.label.clone()));
        {
            let meta = g.node_mut(idx);
            meta.width = width;
            meta.height = height;
        }
        compound_of.insert(idx, sg.id.clone());
    }

    let resolve_endpoint = |g: &mut GraphIr, interner: &mut IdInterner, id: &str| -> NodeIndex {
        if let Some(idx) = direct_ids.iter().position(|d| d == id) {
            let _ = idx;
            return g.node_index(interner.intern(id)).expect("direct node already added");
        }
        for sg in children {
            if subgraph_contains(sg, id) {
                let cid = interner.subgraph_compound_id(&sg.id);
                return g.node_index(cid).expect("compound already added");
            }
        }
        // Cross-reference to an id outside this scope's subtree: treat it as
        // an implicit local member (defensive fallback for malformed nesting).
        let node = global.get(id).cloned().unwrap_or_else(|| ast::Node {
            id: id.to_string(),
            label: id.to_string(),
            shape: Shape::Rectangle,
            attrs: HashMap::new(),
        });
        let nid = interner.intern(id);
        g.add_node(nid, NodeMeta::real(node.label, node.shape))
    };

    for (seq, e) in local_edges.iter().enumerate() {
        let u = resolve_endpoint(&mut g, interner, &e.from_id);
        let v = resolve_endpoint(&mut g, interner, &e.to_id);
        g.add_edge(
            u,
            v,
            EdgeMeta {
                edge_type: e.edge_type,
                label: e.label.clone(),
                reversed: false,
                origin: OriginEdge(seq),
                seq: 0,
            },
        );
    }

    log::debug!(
        "sugiyama: scope with {} nodes, {} edges before decycling",
        g.node_count(),
        local_edges.len()
    );

    // 3. Remove cycles.
    let self_loops = decycle(&mut g);
    // 4. Layer assignment.
    assign_layers(&mut g);
    // 5. Dummy insertion.
    insert_dummies(&mut g, interner);
    // 6. Crossing minimization.
    minimize_crossings(&mut g);
    // 7. Coordinate assignment (measurement + placement + refinement).
    assign_coordinates(&mut g, direction, config.padding);

    // 8. Route edges at this level (always TD-shaped; direction is a
    // whole-canvas transform applied later by the renderer).
    let routed = router::route_all(&g, &self_loops);

    let mut result = LayoutResult::empty(direction);
    result.edges = routed;

    for &idx in g.node_indices() {
        let meta = g.node(idx);
        if meta.is_dummy {
            continue;
        }
        let id = g.id_of(idx);
        if meta.is_compound {
            let sg_id = &compound_of[&idx];
            let mut child = child_results.remove(sg_id).expect("child computed above");
            child.translate(meta.x + SUBGRAPH_INSET, meta.y + SUBGRAPH_INSET + 1);
            let member_ids: Vec<NodeId> = child.nodes.iter().filter(|n| !n.is_subgraph).map(|n| n.id).collect();
            result.nodes.extend(child.nodes);
            result.edges.extend(child.edges);
            result.subgraph_members.extend(child.subgraph_members);
            result.subgraph_descriptions.extend(child.subgraph_descriptions);
            result.nodes.push(LayoutNode {
                id,
                layer: meta.layer,
                order: meta.order,
                x: meta.x,
                y: meta.y,
                width: meta.width,
                height: meta.height,
                label: meta.label.clone(),
                shape: Shape::Rectangle,
                is_subgraph: true,
            });
            result.subgraph_members.push((id, member_ids));
            result.subgraph_descriptions.insert(id, meta.label.clone());
        } else {
            result.nodes.push(LayoutNode {
                id,
                layer: meta.layer,
                order: meta.order,
                x: meta.x,
                y: meta.y,
                width: meta.width,
                height: meta.height,
                label: meta.label.clone(),
                shape: meta.shape,
                is_subgraph: false,
            });
        }
    }

    normalize_origin(&mut result);
    result
}

/// Direct (non-transitive) membership ids for one subgraph, mirroring
/// `direct_members` at the top level.
fn direct_members_for_subgraph(sg: &ast::Subgraph) -> Vec<String> {
    let claimed: HashSet<&str> = sg.subgraphs.iter().flat_map(|c| c.nodes.iter().map(String::as_str)).collect();
    sg.nodes.iter().cloned().filter(|id| !claimed.contains(id.as_str())).collect()
}

/// Shift every coordinate so the minimum is `(0, 0)` — keeps nested-subgraph
/// arithmetic (and canvas sizing) independent of any negative drift the
/// barycenter refinement pass might otherwise introduce.
fn normalize_origin(result: &mut LayoutResult) {
    let min_x = result.nodes.iter().map(|n| n.x).min().unwrap_or(0);
    let min_y = result.nodes.iter().map(|n| n.y).min().unwrap_or(0);
    if min_x != 0 || min_y != 0 {
        result.translate(-min_x, -min_y);
    }
}

/// Phase 2: Greedy-FAS cycle removal. Self-loops are set aside (they can
/// never be "backward" in a linear order) and returned separately so later
/// phases and the router can special-case them.
fn decycle(g: &mut GraphIr) -> Vec<NodeIndex> {
    let self_loops: Vec<NodeIndex> = g
        .node_indices()
        .iter()
        .copied()
        .filter(|&v| g.out_edges(v).iter().any(|&(u, _)| u == v))
        .collect();

    let mut remaining: Vec<NodeIndex> = g.node_indices().to_vec();
    let mut left: Vec<NodeIndex> = Vec::new();
    let mut right: Vec<NodeIndex> = Vec::new();

    // Removed-node bookkeeping lets us recompute degrees against only the
    // still-remaining subgraph without mutating `g` during the scan.
    let mut removed: HashSet<NodeIndex> = HashSet::new();
    let live_out = |g: &GraphIr, v: NodeIndex, removed: &HashSet<NodeIndex>| -> i64 {
        g.out_edges(v).iter().filter(|&&(u, _)| u != v && !removed.contains(&u)).count() as i64
    };
    let live_in = |g: &GraphIr, v: NodeIndex, removed: &HashSet<NodeIndex>| -> i64 {
        g.in_edges(v).iter().filter(|&&(u, _)| u != v && !removed.contains(&u)).count() as i64
    };

    while !remaining.is_empty() {
        // Repeatedly strip sinks (out-degree 0) and sources (in-degree 0).
        let mut progressed = true;
        while progressed {
            progressed = false;
            let mut i = 0;
            while i < remaining.len() {
                let v = remaining[i];
                if live_out(g, v, &removed) == 0 && live_in(g, v, &removed) > 0 {
                    right.insert(0, v);
                    removed.insert(v);
                    remaining.remove(i);
                    progressed = true;
                    continue;
                }
                if live_in(g, v, &removed) == 0 && live_out(g, v, &removed) > 0 {
                    left.push(v);
                    removed.insert(v);
                    remaining.remove(i);
                    progressed = true;
                    continue;
                }
                i += 1;
            }
        }
        if remaining.is_empty() {
            break;
        }
        // No sink/source left: pick the node maximizing out-degree - in-degree,
        // breaking ties by insertion order for determinism.
        let best = remaining
            .iter()
            .copied()
            .max_by_key(|&v| live_out(g, v, &removed) - live_in(g, v, &removed))
            .unwrap_or_else(|| layout_bug!("decycle: remaining vertex set empty in max-degree step"));
        left.push(best);
        removed.insert(best);
        remaining.retain(|&v| v != best);
    }

    left.extend(right);
    let order: HashMap<NodeIndex, usize> = left.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    let edges = g.edge_indices_ordered();
    for e in edges {
        let (u, v) = g.edge_endpoints(e).unwrap_or_else(|| layout_bug!("dangling edge in decycle"));
        if u == v {
            continue;
        }
        if order[&u] > order[&v] {
            g.reverse_edge(e);
        }
    }
    self_loops
}

/// Phase 3: longest-path layering. Self-loops don't constrain layering.
fn assign_layers(g: &mut GraphIr) {
    let nodes = g.node_indices().to_vec();
    for &v in &nodes {
        g.node_mut(v).layer = 0;
    }
    let mut changed = true;
    let mut guard = 0;
    while changed {
        changed = false;
        guard += 1;
        if guard > nodes.len() + 2 {
            layout_bug!("layer assignment did not converge — cyclic input after decycling");
        }
        for &v in &nodes {
            let preds = g.predecessors(v);
            let mut want = 0i64;
            for u in preds {
                if u == v {
                    continue;
                }
                want = want.max(g.node(u).layer + 1);
            }
            if g.node(v).layer != want {
                g.node_mut(v).layer = want;
                changed = true;
            }
        }
    }
}

/// Phase 4: split edges spanning more than one layer into unit-layer chains
/// through `__dummy_<n>` nodes, all sharing the original edge's `origin`.
fn insert_dummies(g: &mut GraphIr, interner: &mut IdInterner) {
    let edges = g.edge_indices_ordered();
    for e in edges {
        let (u, v) = g.edge_endpoints(e).unwrap_or_else(|| layout_bug!("dangling edge"));
        if u == v {
            continue; // self-loop: not layer-spanning by construction
        }
        let lu = g.node(u).layer;
        let lv = g.node(v).layer;
        let span = lv - lu;
        if span <= 1 {
            if span < 1 {
                layout_bug!("edge does not connect strictly increasing layers after layering");
            }
            continue;
        }
        let meta = g.edge(e).clone();
        let mut prev = u;
        for i in 1..span {
            let dummy_id = interner.fresh_dummy();
            let mut dmeta = NodeMeta::dummy();
            dmeta.layer = lu + i;
            let didx = g.add_node(dummy_id, dmeta);
            g.add_edge(
                prev,
                didx,
                EdgeMeta {
                    edge_type: meta.edge_type,
                    label: None,
                    reversed: meta.reversed,
                    origin: meta.origin,
                    seq: 0,
                },
            );
            prev = didx;
        }
        g.add_edge(
            prev,
            v,
            EdgeMeta {
                edge_type: meta.edge_type,
                label: meta.label.clone(),
                reversed: meta.reversed,
                origin: meta.origin,
                seq: 0,
            },
        );
        g.remove_edge(e);
    }
}

/// Phase 5: barycenter crossing minimization, exactly 24 alternating passes.
fn minimize_crossings(g: &mut GraphIr) {
    let layers = layers_of(g);
    if layers.is_empty() {
        return;
    }
    let max_layer = *layers.keys().max().unwrap();
    let mut order: HashMap<i64, Vec<NodeIndex>> = layers;
    for nodes in order.values_mut() {
        nodes.sort_by_key(|&v| g.id_of(v));
    }

    for pass in 0..BARYCENTER_PASSES {
        let downward = pass % 2 == 0;
        let layer_range: Vec<i64> = if downward { (1..=max_layer).collect() } else { (0..max_layer).rev().collect() };
        for layer in layer_range {
            let nodes = order.get(&layer).cloned().unwrap_or_default();
            if nodes.is_empty() {
                continue;
            }
            let prev_index: HashMap<NodeIndex, usize> = nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();
            let mut scored: Vec<(NodeIndex, f64, usize)> = nodes
                .iter()
                .map(|&v| {
                    let neighbors = if downward { g.predecessors(v) } else { g.successors(v) };
                    let neighbor_layer = if downward { layer - 1 } else { layer + 1 };
                    let neighbor_order = order.get(&neighbor_layer);
                    let positions: Vec<f64> = neighbors
                        .iter()
                        .filter_map(|n| neighbor_order.and_then(|o| o.iter().position(|x| x == n)).map(|p| p as f64))
                        .collect();
                    let bary = if positions.is_empty() {
                        prev_index[&v] as f64
                    } else {
                        positions.iter().sum::<f64>() / positions.len() as f64
                    };
                    (v, bary, prev_index[&v])
                })
                .collect();
            scored.sort_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.2.cmp(&b.2))
                    .then_with(|| g.id_of(a.0).cmp(&g.id_of(b.0)))
            });
            order.insert(layer, scored.into_iter().map(|(v, _, _)| v).collect());
        }
    }

    for (_, nodes) in order {
        for (i, v) in nodes.into_iter().enumerate() {
            g.node_mut(v).order = i;
        }
    }
}

fn layers_of(g: &GraphIr) -> HashMap<i64, Vec<NodeIndex>> {
    let mut out: HashMap<i64, Vec<NodeIndex>> = HashMap::new();
    for &v in g.node_indices() {
        out.entry(g.node(v).layer).or_default().push(v);
    }
    out
}

/// Phase 6: measurement, layer-centered placement, and one barycenter
/// refinement pass on x.
fn assign_coordinates(g: &mut GraphIr, direction: Direction, padding: usize) {
    for &v in g.node_indices() {
        let meta = g.node(v);
        if meta.is_dummy {
            continue;
        }
        let (w, h) = measure(&meta.label, meta.shape, padding as i64);
        let meta = g.node_mut(v);
        meta.width = meta.width.max(w);
        meta.height = meta.height.max(h);
    }
    for &v in g.node_indices() {
        if g.node(v).is_dummy {
            let meta = g.node_mut(v);
            meta.width = 1;
            meta.height = 1;
        }
    }

    let mut layers = layers_of(g);
    for nodes in layers.values_mut() {
        nodes.sort_by_key(|&v| g.node(v).order);
    }
    let layer_gap = match direction {
        Direction::Td | Direction::Bt => LAYER_GAP_TD,
        Direction::Lr | Direction::Rl => LAYER_GAP_LR,
    };

    let widest_layer_width: i64 = layers
        .values()
        .map(|nodes| {
            let n = nodes.len() as i64;
            let sum: i64 = nodes.iter().map(|&v| g.node(v).width).sum();
            sum + SIBLING_GAP * (n - 1).max(0)
        })
        .max()
        .unwrap_or(0);

    let mut layer_y: HashMap<i64, i64> = HashMap::new();
    let mut y_cursor = 0i64;
    let mut sorted_layers: Vec<i64> = layers.keys().copied().collect();
    sorted_layers.sort_unstable();
    for &layer in &sorted_layers {
        layer_y.insert(layer, y_cursor);
        let h = layers[&layer].iter().map(|&v| g.node(v).height).max().unwrap_or(0);
        y_cursor += h + layer_gap;
    }

    for &layer in &sorted_layers {
        let nodes = &layers[&layer];
        let row_width: i64 = {
            let n = nodes.len() as i64;
            let sum: i64 = nodes.iter().map(|&v| g.node(v).width).sum();
            sum + SIBLING_GAP * (n - 1).max(0)
        };
        let mut x_cursor = (widest_layer_width - row_width) / 2;
        let y = layer_y[&layer];
        for &v in nodes {
            let w = g.node(v).width;
            let meta = g.node_mut(v);
            meta.x = x_cursor;
            meta.y = y;
            x_cursor += w + SIBLING_GAP;
        }
    }

    refine_x(g, &sorted_layers, &layers);
}

/// Single barycenter refinement pass on x: nudge each non-terminal-layer
/// node toward the mean center of its predecessors/successors, clamped to
/// preserve ordering and the minimum sibling gap.
fn refine_x(g: &mut GraphIr, sorted_layers: &[i64], layers: &HashMap<i64, Vec<NodeIndex>>) {
    if sorted_layers.len() < 2 {
        return;
    }
    for &layer in sorted_layers {
        let nodes = &layers[&layer];
        let mut desired: Vec<i64> = Vec::with_capacity(nodes.len());
        for &v in nodes {
            let preds = g.predecessors(v);
            let succs = g.successors(v);
            let centers: Vec<i64> = preds
                .iter()
                .chain(succs.iter())
                .filter(|&&n| n != v)
                .map(|&n| {
                    let m = g.node(n);
                    m.x + m.width / 2
                })
                .collect();
            let cur = g.node(v);
            let cur_center = cur.x + cur.width / 2;
            let target_center = if centers.is_empty() {
                cur_center
            } else {
                centers.iter().sum::<i64>() / centers.len() as i64
            };
            desired.push(target_center - cur.width / 2);
        }
        // Clamp left-to-right so ordering and minimum gaps survive the nudge.
        let mut min_x = i64::MIN;
        for (i, &v) in nodes.iter().enumerate() {
            let w = g.node(v).width;
            let x = desired[i].max(min_x);
            g.node_mut(v).x = x;
            min_x = x + w + SIBLING_GAP;
        }
    }
}
