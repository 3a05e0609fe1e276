//! Integration tests: source text → `render_dsl` → character grid.
//!
//! Covers the §8 boundary behaviors and concrete end-to-end scenarios: each
//! test drives the whole pipeline (parse → GraphIR → Sugiyama → EdgeRouter →
//! Canvas → text) and asserts on shape-level properties of the output rather
//! than pinning exact byte grids, since those constants (gap widths, barycenter
//! tie-breaks) are this crate's own implementation-defined choices, not a
//! contract a test should freeze independently of the code that produces them.

use mmgrid_core::{render_dsl, Direction, RenderConfig};

fn lines_of(s: &str) -> Vec<&str> {
    s.lines().collect()
}

fn is_rectangular(s: &str) -> bool {
    let lines = lines_of(s);
    let Some(&first) = lines.first() else { return true };
    let width = first.chars().count();
    lines.iter().all(|l| l.chars().count() == width)
}

// ─── Boundary behaviors ──────────────────────────────────────────────────

#[test]
fn empty_body_is_a_single_newline() {
    let out = render_dsl("graph TD", &RenderConfig::default()).unwrap();
    assert_eq!(out, "\n");
}

#[test]
fn single_node_is_a_three_by_three_rectangle() {
    let out = render_dsl("graph TD\nA", &RenderConfig::default()).unwrap();
    assert_eq!(out, "┌─┐\n│A│\n└─┘\n");
}

#[test]
fn single_node_ascii_matches_plus_minus_pipe() {
    let mut cfg = RenderConfig::default();
    cfg.ascii = true;
    let out = render_dsl("graph TD\nA", &cfg).unwrap();
    assert_eq!(out, "+-+\n|A|\n+-+\n");
}

#[test]
fn self_loop_preserves_arrowhead_and_edge_type() {
    let out = render_dsl("graph TD\nA --> A", &RenderConfig::default()).unwrap();
    assert_eq!(out.matches('▼').count() + out.matches('◄').count() + out.matches('►').count(), 1);
}

#[test]
fn cyclic_triple_decycles_without_losing_a_reversed_arrowhead() {
    let out = render_dsl("graph TD\nA --> B --> C --> A", &RenderConfig::default()).unwrap();
    // Three edges, each with one target arrowhead, regardless of which one
    // Greedy-FAS reversed internally for layering purposes.
    let arrows = out.matches('▼').count() + out.matches('▲').count() + out.matches('◄').count() + out.matches('►').count();
    assert_eq!(arrows, 3);
}

#[test]
fn subgraph_with_one_member_draws_a_border_with_the_label_on_top() {
    let src = "graph TD\nsubgraph G\n  X\nend";
    let out = render_dsl(src, &RenderConfig::default()).unwrap();
    assert!(out.contains('G'));
    assert!(out.contains('X'));
    assert!(out.contains('╭') || out.contains('╮'));
}

// ─── Concrete end-to-end scenarios (§8) ─────────────────────────────────

#[test]
fn scenario_one_td_chain_of_two() {
    let out = render_dsl("graph TD\n  A --> B", &RenderConfig::default()).unwrap();
    assert!(is_rectangular(&out));
    assert_eq!(out.matches('▼').count(), 1);
    assert!(out.lines().count() >= 7);
}

#[test]
fn scenario_two_lr_chain_transposes_without_a_down_arrow() {
    let out = render_dsl("graph LR\n  A --> B", &RenderConfig::default()).unwrap();
    assert!(is_rectangular(&out));
    assert_eq!(out.matches('►').count(), 1);
    assert_eq!(out.matches('▼').count(), 0);
}

#[test]
fn scenario_three_td_chain_of_three_has_two_arrowheads() {
    let out = render_dsl("graph TD\n  A --> B --> C", &RenderConfig::default()).unwrap();
    assert_eq!(out.matches('▼').count(), 2);
    for id in ["A", "B", "C"] {
        assert!(out.contains(id));
    }
}

#[test]
fn scenario_four_diamond_split_carries_both_branch_labels() {
    let src = "graph TD\n  A{Decision} -->|yes| B\n  A -->|no| C";
    let out = render_dsl(src, &RenderConfig::default()).unwrap();
    assert!(out.contains("yes"));
    assert!(out.contains("no"));
    assert!(out.contains('/') && out.contains('\\'));
}

#[test]
fn scenario_five_nested_subgraph_edge_reaches_outside_node() {
    let src = "graph TD\n  subgraph G\n    X --> Y\n  end\n  Y --> Z";
    let out = render_dsl(src, &RenderConfig::default()).unwrap();
    for id in ["X", "Y", "Z", "G"] {
        assert!(out.contains(id));
    }
    assert_eq!(out.matches('▼').count(), 2);
}

#[test]
fn scenario_six_mutual_edges_each_keep_their_own_arrowhead() {
    let out = render_dsl("graph TD\n  A --> B\n  B --> A", &RenderConfig::default()).unwrap();
    let arrows = out.matches('▼').count() + out.matches('▲').count();
    assert_eq!(arrows, 2);
}

// §9 ("rendering flips the arrowhead back"): whichever of the two mutual
// edges Greedy-FAS reverses internally to break the cycle, the routed
// waypoints and from_id/to_id must still describe the document's own
// source -> target order, so each arrowhead lands on its own declared
// target's box border rather than both converging on the same node.
#[test]
fn scenario_six_mutual_edges_point_at_their_own_declared_targets() {
    let ast = mmgrid_core::parser::parse_document("graph TD\n  A --> B\n  B --> A").unwrap();
    let mut interner = mmgrid_core::id::IdInterner::new();
    let layout = mmgrid_core::sugiyama::layout(&ast, &RenderConfig::default(), &mut interner);

    let mut boxes: std::collections::HashMap<String, (i64, i64, i64, i64)> = std::collections::HashMap::new();
    for node in &layout.nodes {
        let id = interner.resolve(node.id).to_string();
        boxes.insert(id, (node.x, node.y, node.x + node.width - 1, node.y + node.height - 1));
    }

    let on_border = |p: mmgrid_core::Point, rect: (i64, i64, i64, i64)| {
        let (x0, y0, x1, y1) = rect;
        p.x >= x0 && p.x <= x1 && p.y >= y0 && p.y <= y1 && (p.x == x0 || p.x == x1 || p.y == y0 || p.y == y1)
    };

    assert_eq!(layout.edges.len(), 2);
    for edge in &layout.edges {
        let from = interner.resolve(edge.from_id).to_string();
        let to = interner.resolve(edge.to_id).to_string();
        let first = *edge.waypoints.first().expect("edge has waypoints");
        let last = *edge.waypoints.last().expect("edge has waypoints");
        assert!(
            on_border(first, boxes[&from]),
            "edge {from}->{to}: source end {first:?} is not on {from}'s own box border"
        );
        assert!(
            on_border(last, boxes[&to]),
            "edge {from}->{to}: arrowhead end {last:?} is not on {to}'s own box border"
        );
    }
}

// ─── Direction overrides & BT/RL glyph remaps ───────────────────────────

#[test]
fn bt_override_flips_corners_and_arrow_direction() {
    let mut cfg = RenderConfig::default();
    cfg.direction = Some(Direction::Bt);
    let out = render_dsl("graph TD\n  A --> B", &cfg).unwrap();
    assert!(is_rectangular(&out));
    assert_eq!(out.matches('▲').count(), 1);
    assert_eq!(out.matches('▼').count(), 0);
}

#[test]
fn rl_override_flips_arrow_direction() {
    let mut cfg = RenderConfig::default();
    cfg.direction = Some(Direction::Rl);
    let out = render_dsl("graph TD\n  A --> B", &cfg).unwrap();
    assert!(is_rectangular(&out));
    assert_eq!(out.matches('◄').count(), 1);
    assert_eq!(out.matches('►').count(), 0);
}

// ─── Reference-error recovery ────────────────────────────────────────────

#[test]
fn referencing_an_undeclared_id_implicitly_declares_a_rectangle() {
    let out = render_dsl("graph TD\n  A --> Ghost", &RenderConfig::default()).unwrap();
    assert!(out.contains("Ghost"));
}

// ─── Every output is a padded rectangle, for every scenario above ────────

#[test]
fn every_scenario_output_is_rectangular() {
    let sources = [
        "graph TD",
        "graph TD\nA",
        "graph TD\n  A --> B",
        "graph LR\n  A --> B",
        "graph BT\n  A --> B",
        "graph RL\n  A --> B",
        "graph TD\n  A --> B --> C",
        "graph TD\n  A{D} -->|yes| B\n  A -->|no| C",
        "graph TD\n  subgraph G\n    X --> Y\n  end\n  Y --> Z",
        "graph TD\n  A --> B\n  B --> A",
        "graph TD\n  A --> A",
    ];
    for src in sources {
        let out = render_dsl(src, &RenderConfig::default()).unwrap();
        assert!(is_rectangular(&out), "non-rectangular output for `{src}`:\n{out}");
    }
}
