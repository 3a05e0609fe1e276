//! Canvas renderer (§4.6): seven painting phases turning a [`LayoutResult`]
//! into the final character grid.
//!
//! Direction is handled entirely as a transform around a TD-shaped paint:
//! LR/RL transpose coordinates before painting (phase 1), BT/RL flip the
//! finished canvas and remap direction-sensitive glyphs afterward (phase 7).
//! Nothing between those two phases ever looks at `direction` again.

use crate::ast::{Direction, LineFamily, Shape};
use crate::canvas::Canvas;
use crate::charset::{ArrowDir, Charset, Corner, Family};
use crate::config::RenderConfig;
use crate::result::{LayoutNode, LayoutResult, Point, RoutedEdge};

pub fn render(layout: &LayoutResult, config: &RenderConfig) -> String {
    let charset = Charset::new(config.ascii);
    let mut working = layout.clone();

    // Phase 1: pre-transform.
    if matches!(working.direction, Direction::Lr | Direction::Rl) {
        transpose(&mut working);
    }

    let mut canvas = Canvas::new();

    // Phase 2: subgraph borders.
    for node in working.nodes.iter().filter(|n| n.is_subgraph) {
        paint_subgraph_border(&mut canvas, node, charset);
    }

    // Phase 3: node boxes.
    for node in working.nodes.iter().filter(|n| !n.is_subgraph) {
        paint_node_box(&mut canvas, node, charset);
    }

    // Phase 4: edges.
    for edge in &working.edges {
        paint_edge_path(&mut canvas, edge, charset);
    }

    // Phase 5: arrowheads & labels.
    for edge in &working.edges {
        paint_arrowheads(&mut canvas, edge, charset);
        paint_edge_label(&mut canvas, edge);
    }

    // Phase 6: exit stubs — force the correct junction glyph at every
    // attach cell, independent of paint order in phase 4.
    for edge in &working.edges {
        paint_exit_stubs(&mut canvas, edge, &working.nodes, charset);
    }

    // Phase 7: post-transform.
    match working.direction {
        Direction::Bt => {
            canvas.flip_vertical();
            canvas.remap(&bt_remap_table(config.ascii));
        }
        Direction::Rl => {
            canvas.flip_horizontal();
            canvas.remap(&rl_remap_table(config.ascii));
        }
        Direction::Td | Direction::Lr => {}
    }

    canvas.to_string_trimmed()
}

fn transpose(result: &mut LayoutResult) {
    for n in &mut result.nodes {
        std::mem::swap(&mut n.x, &mut n.y);
        std::mem::swap(&mut n.width, &mut n.height);
    }
    for e in &mut result.edges {
        for p in &mut e.waypoints {
            std::mem::swap(&mut p.x, &mut p.y);
        }
    }
}

fn line_family_of(lf: LineFamily) -> Family {
    match lf {
        LineFamily::Solid => Family::Solid,
        LineFamily::Dotted => Family::Dotted,
        LineFamily::Thick => Family::Thick,
    }
}

fn paint_subgraph_border(canvas: &mut Canvas, node: &LayoutNode, charset: Charset) {
    let (x0, y0) = (node.x, node.y);
    let (x1, y1) = (node.x + node.width - 1, node.y + node.height - 1);

    canvas.put_forced(x0, y0, charset.rounded_corner(Corner::TopLeft));
    canvas.put_forced(x1, y0, charset.rounded_corner(Corner::TopRight));
    canvas.put_forced(x0, y1, charset.rounded_corner(Corner::BottomLeft));
    canvas.put_forced(x1, y1, charset.rounded_corner(Corner::BottomRight));

    for x in (x0 + 1)..x1 {
        canvas.put(x, y0, charset.horizontal(), Family::Solid, crate::charset::Arms::LEFT | crate::charset::Arms::RIGHT, charset);
        canvas.put(x, y1, charset.horizontal(), Family::Solid, crate::charset::Arms::LEFT | crate::charset::Arms::RIGHT, charset);
    }
    for y in (y0 + 1)..y1 {
        canvas.put(x0, y, charset.vertical(), Family::Solid, crate::charset::Arms::UP | crate::charset::Arms::DOWN, charset);
        canvas.put(x1, y, charset.vertical(), Family::Solid, crate::charset::Arms::UP | crate::charset::Arms::DOWN, charset);
    }

    if !node.label.is_empty() {
        canvas.put_string(x0 + 2, y0, &node.label);
    }
}

fn paint_node_box(canvas: &mut Canvas, node: &LayoutNode, charset: Charset) {
    let (x0, y0) = (node.x, node.y);
    let (x1, y1) = (node.x + node.width - 1, node.y + node.height - 1);

    match node.shape {
        Shape::Rectangle => {
            canvas.put_forced(x0, y0, charset.rect_corner(Corner::TopLeft));
            canvas.put_forced(x1, y0, charset.rect_corner(Corner::TopRight));
            canvas.put_forced(x0, y1, charset.rect_corner(Corner::BottomLeft));
            canvas.put_forced(x1, y1, charset.rect_corner(Corner::BottomRight));
            paint_straight_sides(canvas, x0, y0, x1, y1, charset);
        }
        Shape::Rounded => {
            canvas.put_forced(x0, y0, charset.rounded_corner(Corner::TopLeft));
            canvas.put_forced(x1, y0, charset.rounded_corner(Corner::TopRight));
            canvas.put_forced(x0, y1, charset.rounded_corner(Corner::BottomLeft));
            canvas.put_forced(x1, y1, charset.rounded_corner(Corner::BottomRight));
            paint_straight_sides(canvas, x0, y0, x1, y1, charset);
        }
        Shape::Diamond => {
            canvas.put_forced(x0, y0, '/');
            canvas.put_forced(x1, y0, '\\');
            canvas.put_forced(x0, y1, '\\');
            canvas.put_forced(x1, y1, '/');
            for x in (x0 + 1)..x1 {
                canvas.put_forced(x, y0, charset.horizontal());
                canvas.put_forced(x, y1, charset.horizontal());
            }
            for y in (y0 + 1)..y1 {
                canvas.put_forced(x0, y, charset.vertical());
                canvas.put_forced(x1, y, charset.vertical());
            }
        }
        Shape::Circle => {
            canvas.put_forced(x0, y0, charset.rounded_corner(Corner::TopLeft));
            canvas.put_forced(x1, y0, charset.rounded_corner(Corner::TopRight));
            canvas.put_forced(x0, y1, charset.rounded_corner(Corner::BottomLeft));
            canvas.put_forced(x1, y1, charset.rounded_corner(Corner::BottomRight));
            for x in (x0 + 1)..x1 {
                canvas.put_forced(x, y0, charset.horizontal());
                canvas.put_forced(x, y1, charset.horizontal());
            }
            for y in (y0 + 1)..y1 {
                canvas.put_forced(x0, y, '(');
                canvas.put_forced(x1, y, ')');
            }
        }
    }

    paint_label(canvas, node, x0, y0, x1, y1);
}

fn paint_straight_sides(canvas: &mut Canvas, x0: i64, y0: i64, x1: i64, y1: i64, charset: Charset) {
    use crate::charset::Arms;
    for x in (x0 + 1)..x1 {
        canvas.put(x, y0, charset.horizontal(), Family::Solid, Arms::LEFT | Arms::RIGHT, charset);
        canvas.put(x, y1, charset.horizontal(), Family::Solid, Arms::LEFT | Arms::RIGHT, charset);
    }
    for y in (y0 + 1)..y1 {
        canvas.put(x0, y, charset.vertical(), Family::Solid, Arms::UP | Arms::DOWN, charset);
        canvas.put(x1, y, charset.vertical(), Family::Solid, Arms::UP | Arms::DOWN, charset);
    }
}

fn paint_label(canvas: &mut Canvas, node: &LayoutNode, x0: i64, y0: i64, x1: i64, y1: i64) {
    if node.label.is_empty() {
        return;
    }
    let inner_width = (x1 - x0 - 1).max(0);
    let inner_height = (y1 - y0 - 1).max(0);
    let lines: Vec<&str> = node.label.split('\n').collect();
    let start_row = y0 + 1 + ((inner_height - lines.len() as i64).max(0) / 2);
    for (i, line) in lines.iter().enumerate() {
        let char_count = line.chars().count() as i64;
        let pad = ((inner_width - char_count).max(0)) / 2;
        canvas.put_string(x0 + 1 + pad, start_row + i as i64, line);
    }
}

fn paint_edge_path(canvas: &mut Canvas, edge: &RoutedEdge, charset: Charset) {
    let family = line_family_of(edge.edge_type.line_family());
    for pair in edge.waypoints.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        paint_segment(canvas, a, b, family, charset);
    }
}

fn paint_segment(canvas: &mut Canvas, a: Point, b: Point, family: Family, charset: Charset) {
    let (dx, dy) = ((b.x - a.x).signum(), (b.y - a.y).signum());
    let forward = arms_for_step(dx, dy);
    let backward = arms_for_step(-dx, -dy);

    let mut cx = a.x;
    let mut cy = a.y;
    loop {
        let nx = cx + dx;
        let ny = cy + dy;
        let exit_arms = forward;
        let entry_arms = backward;
        canvas.put(cx, cy, charset.glyph_for(family, exit_arms), family, exit_arms, charset);
        canvas.put(nx, ny, charset.glyph_for(family, entry_arms), family, entry_arms, charset);
        cx = nx;
        cy = ny;
        if cx == b.x && cy == b.y {
            break;
        }
    }
}

fn arms_for_step(dx: i64, dy: i64) -> crate::charset::Arms {
    use crate::charset::Arms;
    match (dx, dy) {
        (1, 0) => Arms::RIGHT,
        (-1, 0) => Arms::LEFT,
        (0, 1) => Arms::DOWN,
        (0, -1) => Arms::UP,
        _ => Arms::NONE,
    }
}

fn step_vec(a: Point, b: Point) -> (i64, i64) {
    ((b.x - a.x).signum(), (b.y - a.y).signum())
}

fn arrow_dir_for(dx: i64, dy: i64) -> Option<ArrowDir> {
    match (dx, dy) {
        (1, 0) => Some(ArrowDir::Right),
        (-1, 0) => Some(ArrowDir::Left),
        (0, 1) => Some(ArrowDir::Down),
        (0, -1) => Some(ArrowDir::Up),
        _ => None,
    }
}

fn opposite(dir: ArrowDir) -> ArrowDir {
    match dir {
        ArrowDir::Up => ArrowDir::Down,
        ArrowDir::Down => ArrowDir::Up,
        ArrowDir::Left => ArrowDir::Right,
        ArrowDir::Right => ArrowDir::Left,
    }
}

fn paint_arrowheads(canvas: &mut Canvas, edge: &RoutedEdge, charset: Charset) {
    if edge.waypoints.len() < 2 {
        return;
    }
    let n = edge.waypoints.len();
    if edge.edge_type.has_target_arrow() {
        let (a, b) = (edge.waypoints[n - 2], edge.waypoints[n - 1]);
        let (dx, dy) = step_vec(a, b);
        if let Some(dir) = arrow_dir_for(dx, dy) {
            let pos = Point::new(b.x - dx, b.y - dy);
            canvas.put_forced(pos.x, pos.y, charset.arrow(dir));
        }
    }
    if edge.edge_type.has_source_arrow() {
        let (a, b) = (edge.waypoints[0], edge.waypoints[1]);
        let (dx, dy) = step_vec(a, b);
        if let Some(dir) = arrow_dir_for(dx, dy) {
            let pos = Point::new(a.x + dx, a.y + dy);
            canvas.put_forced(pos.x, pos.y, charset.arrow(opposite(dir)));
        }
    }
}

fn paint_edge_label(canvas: &mut Canvas, edge: &RoutedEdge) {
    let Some(label) = &edge.label else { return };
    if edge.waypoints.len() < 2 {
        return;
    }
    let anchor_idx = (edge.waypoints.len() - 1) / 2;
    let anchor = edge.waypoints[anchor_idx];
    let next = edge.waypoints[(anchor_idx + 1).min(edge.waypoints.len() - 1)];
    let horizontal = anchor.y == next.y;
    if horizontal {
        canvas.put_string(anchor.x.min(next.x) + 1, anchor.y - 1, label);
    } else {
        canvas.put_string(anchor.x + 2, anchor.y, label);
    }
}

/// Recompute the correct junction glyph at every edge's source/target
/// attach cell as a targeted overwrite, independent of phase 4's paint
/// order (§4.6 phase 6).
fn paint_exit_stubs(canvas: &mut Canvas, edge: &RoutedEdge, nodes: &[LayoutNode], charset: Charset) {
    if edge.waypoints.len() < 2 {
        return;
    }
    let n = edge.waypoints.len();

    let source = edge.waypoints[0];
    let (dx0, dy0) = step_vec(edge.waypoints[0], edge.waypoints[1]);
    if let Some(border_arms) = border_arms_at(nodes, source) {
        let exit = arms_for_step(dx0, dy0);
        let glyph = charset.stub(border_arms, exit);
        canvas.put_forced(source.x, source.y, glyph);
    }

    let target = edge.waypoints[n - 1];
    let (dxn, dyn_) = step_vec(edge.waypoints[n - 2], edge.waypoints[n - 1]);
    if let Some(border_arms) = border_arms_at(nodes, target) {
        let entry = arms_for_step(-dxn, -dyn_);
        let glyph = charset.stub(border_arms, entry);
        canvas.put_forced(target.x, target.y, glyph);
    }
}

/// The arms a plain border segment would carry at `(p.x, p.y)` if it sits on
/// one of a node's four sides (not a corner): `LEFT|RIGHT` on the top/bottom
/// row, `UP|DOWN` on the left/right column.
fn border_arms_at(nodes: &[LayoutNode], p: Point) -> Option<crate::charset::Arms> {
    use crate::charset::Arms;
    for n in nodes {
        let (x0, y0) = (n.x, n.y);
        let (x1, y1) = (n.x + n.width - 1, n.y + n.height - 1);
        let on_top_or_bottom = (p.y == y0 || p.y == y1) && p.x > x0 && p.x < x1;
        let on_left_or_right = (p.x == x0 || p.x == x1) && p.y > y0 && p.y < y1;
        if on_top_or_bottom {
            return Some(Arms::LEFT | Arms::RIGHT);
        }
        if on_left_or_right {
            return Some(Arms::UP | Arms::DOWN);
        }
    }
    None
}

fn bt_remap_table(ascii: bool) -> Vec<(char, char)> {
    if ascii {
        vec![('v', '^'), ('^', 'v')]
    } else {
        vec![
            ('▼', '▲'),
            ('▲', '▼'),
            ('┌', '└'),
            ('└', '┌'),
            ('┐', '┘'),
            ('┘', '┐'),
            ('╭', '╰'),
            ('╰', '╭'),
            ('╮', '╯'),
            ('╯', '╮'),
        ]
    }
}

fn rl_remap_table(ascii: bool) -> Vec<(char, char)> {
    if ascii {
        vec![('>', '<'), ('<', '>')]
    } else {
        vec![
            ('►', '◄'),
            ('◄', '►'),
            ('┌', '┐'),
            ('┐', '┌'),
            ('└', '┘'),
            ('┘', '└'),
            ('╭', '╮'),
            ('╮', '╭'),
            ('╰', '╯'),
            ('╯', '╰'),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EdgeType, Shape};
    use crate::id::IdInterner;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn sample_node(interner: &mut IdInterner, id: &str, x: i64, y: i64, w: i64, h: i64, label: &str) -> LayoutNode {
        LayoutNode {
            id: interner.intern(id),
            layer: 0,
            order: 0,
            x,
            y,
            width: w,
            height: h,
            label: label.to_string(),
            shape: Shape::Rectangle,
            is_subgraph: false,
        }
    }

    #[test]
    fn single_node_renders_a_three_by_three_box() {
        let mut interner = IdInterner::new();
        let node = sample_node(&mut interner, "A", 0, 0, 3, 3, "A");
        let layout = LayoutResult {
            nodes: vec![node],
            edges: vec![],
            subgraph_members: vec![],
            subgraph_descriptions: HashMap::new(),
            direction: Direction::Td,
        };
        let out = render(&layout, &RenderConfig::default());
        assert_eq!(out, "┌─┐\n│A│\n└─┘\n");
    }

    #[test]
    fn ascii_mode_uses_plus_corners() {
        let mut interner = IdInterner::new();
        let node = sample_node(&mut interner, "A", 0, 0, 3, 3, "A");
        let layout = LayoutResult {
            nodes: vec![node],
            edges: vec![],
            subgraph_members: vec![],
            subgraph_descriptions: HashMap::new(),
            direction: Direction::Td,
        };
        let mut config = RenderConfig::default();
        config.ascii = true;
        let out = render(&layout, &config);
        assert_eq!(out, "+-+\n|A|\n+-+\n");
    }

    #[test]
    fn edge_with_target_arrow_renders_a_down_arrow() {
        let mut interner = IdInterner::new();
        let a = sample_node(&mut interner, "A", 0, 0, 3, 3, "A");
        let b = sample_node(&mut interner, "B", 0, 6, 3, 3, "B");
        let edge = RoutedEdge {
            from_id: a.id,
            to_id: b.id,
            label: None,
            edge_type: EdgeType::Arrow,
            waypoints: vec![Point::new(1, 2), Point::new(1, 6)],
        };
        let layout = LayoutResult {
            nodes: vec![a, b],
            edges: vec![edge],
            subgraph_members: vec![],
            subgraph_descriptions: HashMap::new(),
            direction: Direction::Td,
        };
        let out = render(&layout, &RenderConfig::default());
        assert!(out.contains('▼'));
    }

    #[test]
    fn empty_layout_renders_single_newline() {
        let layout = LayoutResult::empty(Direction::Td);
        assert_eq!(render(&layout, &RenderConfig::default()), "\n");
    }
}
