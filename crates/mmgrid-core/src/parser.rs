//! Parser for the Mermaid `graph`/`flowchart` subset (§3a) → [`ast::Graph`].
//!
//! Line-oriented like the source dialect itself: each source line is either
//! a header, a comment, a `subgraph`/`end`/`direction` control line, a bare
//! node declaration, or an edge statement (possibly chained: `A --> B --> C`).
//! Individual line fragments (identifiers, bracketed labels, edge operators)
//! are tokenized with `winnow`; line-to-line dispatch is plain `match`/
//! `starts_with`, since the grammar's structure lives in line boundaries,
//! not in a single recursive expression grammar.

use crate::ast::{Direction, Edge, EdgeType, Graph, Node, Shape, Subgraph};
use crate::error::ParseError;
use std::collections::{HashMap, HashSet};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

/// Parse a complete Mermaid flowchart source string.
#[must_use = "parsing result should be used"]
pub fn parse_document(source: &str) -> Result<Graph, ParseError> {
    let lines: Vec<(usize, &str)> = source.lines().enumerate().map(|(i, l)| (i + 1, l)).collect();
    let mut idx = 0;

    // Skip leading blank/comment lines to find the header (if any).
    let mut direction = Direction::Td;
    while idx < lines.len() {
        let (_, raw) = lines[idx];
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            idx += 1;
            continue;
        }
        if let Some(d) = parse_header(trimmed, lines[idx].0)? {
            direction = d;
            idx += 1;
        }
        break;
    }

    let mut global_nodes: Vec<Node> = Vec::new();
    let mut global_index: HashMap<String, usize> = HashMap::new();
    let mut explicit_shapes: HashSet<String> = HashSet::new();

    let mut stack: Vec<ScopeBuilder> = vec![ScopeBuilder::root()];

    for &(line_no, raw) in &lines[idx..] {
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("subgraph") {
            let rest = rest.trim_start();
            let (id, label) = parse_subgraph_header(rest);
            stack.push(ScopeBuilder::new(id, label));
            continue;
        }

        if trimmed == "end" {
            if stack.len() <= 1 {
                return Err(ParseError::Malformed {
                    line: line_no,
                    message: "unmatched `end` with no open subgraph".to_string(),
                    context: context_snippet(trimmed),
                });
            }
            let finished = stack.pop().unwrap();
            let sg = finished.finish();
            stack.last_mut().unwrap().subgraphs.push(sg);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("direction") {
            if stack.len() > 1 {
                if let Some(d) = direction_from_str(rest.trim()) {
                    stack.last_mut().unwrap().direction = Some(d);
                    continue;
                }
            }
            // A bare node literally named "direction..." falls through below.
        }

        let scope = stack.last_mut().unwrap();
        parse_statement_line(
            trimmed,
            line_no,
            scope,
            &mut global_nodes,
            &mut global_index,
            &mut explicit_shapes,
        )?;
    }

    if stack.len() > 1 {
        return Err(ParseError::UnclosedSubgraph {
            start_line: lines.last().map_or(1, |&(n, _)| n),
        });
    }

    let top = stack.pop().unwrap();
    Ok(Graph {
        direction,
        nodes: global_nodes,
        edges: top.edges,
        subgraphs: top.subgraphs,
    })
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("%%")
}

fn context_snippet(s: &str) -> String {
    let max = s.len().min(40);
    let mut e = max;
    while e > 0 && !s.is_char_boundary(e) {
        e -= 1;
    }
    s[..e].to_string()
}

fn direction_from_str(s: &str) -> Option<Direction> {
    match s {
        "TD" | "TB" => Some(Direction::Td),
        "BT" => Some(Direction::Bt),
        "LR" => Some(Direction::Lr),
        "RL" => Some(Direction::Rl),
        _ => None,
    }
}

/// `graph <DIR>` / `flowchart <DIR>`. Returns `Ok(None)` if `trimmed` isn't a
/// header at all (a bare body with no header, accepted per §3a), `Err` if it
/// looks like a header but names an unknown direction.
fn parse_header(trimmed: &str, line: usize) -> Result<Option<Direction>, ParseError> {
    let rest = if let Some(r) = trimmed.strip_prefix("graph") {
        r
    } else if let Some(r) = trimmed.strip_prefix("flowchart") {
        r
    } else {
        return Ok(None);
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Some(Direction::Td));
    }
    direction_from_str(rest).map(Some).ok_or_else(|| ParseError::Malformed {
        line,
        message: format!("unknown direction `{rest}`"),
        context: context_snippet(trimmed),
    })
}

/// `subgraph <id>` / `subgraph <id>[<label>]` / `subgraph <label with spaces>`.
fn parse_subgraph_header(rest: &str) -> (String, String) {
    let rest = rest.trim();
    if let Some(bracket_start) = rest.find('[') {
        if let Some(bracket_end) = rest[bracket_start..].find(']') {
            let id = rest[..bracket_start].trim().to_string();
            let label = rest[bracket_start + 1..bracket_start + bracket_end].to_string();
            let id = if id.is_empty() { label.clone() } else { id };
            return (id, label);
        }
    }
    (rest.to_string(), rest.to_string())
}

#[derive(Clone, Default)]
struct ScopeBuilder {
    id: String,
    label: String,
    direction: Option<Direction>,
    members: Vec<String>,
    member_set: HashSet<String>,
    edges: Vec<Edge>,
    subgraphs: Vec<Subgraph>,
}

impl ScopeBuilder {
    fn root() -> Self {
        Self::default()
    }

    fn new(id: String, label: String) -> Self {
        Self {
            id,
            label,
            ..Self::default()
        }
    }

    fn note_member(&mut self, id: &str) {
        if self.member_set.insert(id.to_string()) {
            self.members.push(id.to_string());
        }
    }

    fn finish(self) -> Subgraph {
        Subgraph {
            id: self.id,
            label: self.label,
            nodes: self.members,
            edges: self.edges,
            subgraphs: self.subgraphs,
            direction: self.direction,
        }
    }
}

fn register_node(
    global_nodes: &mut Vec<Node>,
    global_index: &mut HashMap<String, usize>,
    explicit_shapes: &mut HashSet<String>,
    line_no: usize,
    id: String,
    label: Option<String>,
    shape: Option<Shape>,
) -> Result<(), ParseError> {
    if let Some(&i) = global_index.get(&id) {
        if let Some(shape) = shape {
            if explicit_shapes.contains(&id) && global_nodes[i].shape != shape {
                return Err(ParseError::ConflictingShape { line: line_no, id });
            }
            // First declaration wins; a later bare reference is a no-op, a
            // later *matching* shape re-declaration is harmless, but a first
            // real shape after only bare mentions upgrades the placeholder.
            if !explicit_shapes.contains(&id) {
                global_nodes[i].label = label.unwrap_or(id.clone());
                global_nodes[i].shape = shape;
            }
            explicit_shapes.insert(id);
        }
        return Ok(());
    }
    let had_explicit_shape = shape.is_some();
    let label = label.unwrap_or_else(|| id.clone());
    let shape = shape.unwrap_or_default();
    if had_explicit_shape {
        explicit_shapes.insert(id.clone());
    }
    global_index.insert(id.clone(), global_nodes.len());
    global_nodes.push(Node {
        id,
        label,
        shape,
        attrs: HashMap::new(),
    });
    Ok(())
}

/// A single edge-statement node term: `<id>`, `<id>[label]`, `<id>(label)`,
/// `<id>((label))`, `<id>{label}`.
struct NodeTerm {
    id: String,
    label: Option<String>,
    shape: Option<Shape>,
}

fn ident(input: &mut &str) -> ModalResult<String> {
    let s: &str = take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        .parse_next(input)?;
    Ok(s.to_string())
}

type ModalResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

fn parse_node_term(input: &mut &str) -> ModalResult<NodeTerm> {
    let id = ident(input)?;
    if let Some(rest) = input.strip_prefix("((") {
        if let Some(end) = rest.find("))") {
            let label = rest[..end].to_string();
            *input = &rest[end + 2..];
            return Ok(NodeTerm {
                id,
                label: Some(label),
                shape: Some(Shape::Circle),
            });
        }
    }
    if let Some(rest) = input.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let label = rest[..end].to_string();
            *input = &rest[end + 1..];
            return Ok(NodeTerm {
                id,
                label: Some(label),
                shape: Some(Shape::Rectangle),
            });
        }
    }
    if let Some(rest) = input.strip_prefix('(') {
        if let Some(end) = rest.find(')') {
            let label = rest[..end].to_string();
            *input = &rest[end + 1..];
            return Ok(NodeTerm {
                id,
                label: Some(label),
                shape: Some(Shape::Rounded),
            });
        }
    }
    if let Some(rest) = input.strip_prefix('{') {
        if let Some(end) = rest.find('}') {
            let label = rest[..end].to_string();
            *input = &rest[end + 1..];
            return Ok(NodeTerm {
                id,
                label: Some(label),
                shape: Some(Shape::Diamond),
            });
        }
    }
    Ok(NodeTerm {
        id,
        label: None,
        shape: None,
    })
}

/// Fixed-text edge operators, longest-prefix-first so `<-->`/`-->` etc don't
/// shadow each other.
const OPERATORS: &[(&str, EdgeType)] = &[
    ("<-.->", EdgeType::BidirDotted),
    ("<==>", EdgeType::BidirThick),
    ("<-->", EdgeType::BidirArrow),
    ("-.->", EdgeType::DottedArrow),
    ("-.-", EdgeType::DottedLine),
    ("==>", EdgeType::ThickArrow),
    ("===", EdgeType::ThickLine),
    ("-->", EdgeType::Arrow),
    ("---", EdgeType::Line),
];

/// Try to match a fixed operator token at the start of `input`.
fn match_operator(input: &str) -> Option<(EdgeType, &str)> {
    for &(tok, ty) in OPERATORS {
        if let Some(rest) = input.strip_prefix(tok) {
            return Some((ty, rest));
        }
    }
    None
}

/// Try the "`-- text -->`" / "`-- text ---`" embedded-label form.
fn match_embedded_label_operator(input: &str) -> Option<(EdgeType, String, &str)> {
    let rest = input.strip_prefix("--")?;
    if rest.starts_with('-') || rest.starts_with('.') || rest.starts_with('>') {
        return None; // that's one of the fixed tokens instead
    }
    if let Some(end) = rest.find("-->") {
        let label = rest[..end].trim().to_string();
        return Some((EdgeType::Arrow, label, &rest[end + 3..]));
    }
    if let Some(end) = rest.find("---") {
        let label = rest[..end].trim().to_string();
        return Some((EdgeType::Line, label, &rest[end + 3..]));
    }
    None
}

/// `|label|` immediately following an operator.
fn match_pipe_label(input: &str) -> Option<(String, &str)> {
    let rest = input.strip_prefix('|')?;
    let end = rest.find('|')?;
    Some((rest[..end].to_string(), &rest[end + 1..]))
}

fn looks_like_edge_line(trimmed: &str) -> bool {
    ["-->", "---", "-.->", "-.-", "==>", "===", "<-->", "<-.->", "<==>", "--"]
        .iter()
        .any(|op| trimmed.contains(op))
}

fn parse_statement_line(
    trimmed: &str,
    line_no: usize,
    scope: &mut ScopeBuilder,
    global_nodes: &mut Vec<Node>,
    global_index: &mut HashMap<String, usize>,
    explicit_shapes: &mut HashSet<String>,
) -> Result<(), ParseError> {
    if !looks_like_edge_line(trimmed) {
        // Bare node declaration: exactly one term, no trailing garbage.
        let mut rest: &str = trimmed;
        let term = parse_node_term(&mut rest).map_err(|_| ParseError::Malformed {
            line: line_no,
            message: "expected a node declaration or edge statement".to_string(),
            context: context_snippet(trimmed),
        })?;
        if !rest.trim().is_empty() {
            return Err(ParseError::UnknownEdgeSyntax {
                line: line_no,
                context: context_snippet(trimmed),
            });
        }
        register_node(
            global_nodes,
            global_index,
            explicit_shapes,
            line_no,
            term.id.clone(),
            term.label,
            term.shape,
        )?;
        scope.note_member(&term.id);
        return Ok(());
    }

    let mut rest: &str = trimmed;
    let mut prev = parse_node_term(&mut rest).map_err(|_| ParseError::Malformed {
        line: line_no,
        message: "expected a node at the start of an edge statement".to_string(),
        context: context_snippet(trimmed),
    })?;
    register_node(
        global_nodes,
        global_index,
        explicit_shapes,
        line_no,
        prev.id.clone(),
        prev.label.clone(),
        prev.shape,
    )?;
    scope.note_member(&prev.id);

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let (edge_type, label, after_op) = if let Some((ty, after)) = match_operator(rest) {
            (ty, None, after)
        } else if let Some((ty, label, after)) = match_embedded_label_operator(rest) {
            (ty, Some(label), after)
        } else {
            return Err(ParseError::UnknownEdgeSyntax {
                line: line_no,
                context: context_snippet(rest),
            });
        };
        rest = after_op;
        let mut label = label;
        if label.is_none() {
            if let Some((l, after)) = match_pipe_label(rest.trim_start()) {
                label = Some(l);
                rest = after;
            }
        }
        rest = rest.trim_start();
        let next = parse_node_term(&mut rest).map_err(|_| ParseError::Malformed {
            line: line_no,
            message: "expected a node after an edge operator".to_string(),
            context: context_snippet(rest),
        })?;
        register_node(
            global_nodes,
            global_index,
            explicit_shapes,
            line_no,
            next.id.clone(),
            next.label.clone(),
            next.shape,
        )?;
        scope.note_member(&next.id);

        scope.edges.push(Edge {
            from_id: prev.id.clone(),
            to_id: next.id.clone(),
            edge_type,
            label,
            attrs: HashMap::new(),
        });
        prev = next;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_arrow() {
        let g = parse_document("graph TD\n  A --> B").unwrap();
        assert_eq!(g.direction, Direction::Td);
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].from_id, "A");
        assert_eq!(g.edges[0].to_id, "B");
        assert_eq!(g.edges[0].edge_type, EdgeType::Arrow);
    }

    #[test]
    fn tb_is_an_alias_for_td() {
        let g = parse_document("graph TB\nA --> B").unwrap();
        assert_eq!(g.direction, Direction::Td);
    }

    #[test]
    fn missing_header_defaults_to_td() {
        let g = parse_document("A --> B").unwrap();
        assert_eq!(g.direction, Direction::Td);
    }

    #[test]
    fn parses_shapes_and_pipe_label() {
        let g = parse_document("graph TD\nA{Decision} -->|yes| B").unwrap();
        let a = g.nodes.iter().find(|n| n.id == "A").unwrap();
        assert_eq!(a.shape, Shape::Diamond);
        assert_eq!(a.label, "Decision");
        assert_eq!(g.edges[0].label.as_deref(), Some("yes"));
    }

    #[test]
    fn parses_embedded_label_form() {
        let g = parse_document("graph TD\nA -- hello --> B").unwrap();
        assert_eq!(g.edges[0].label.as_deref(), Some("hello"));
        assert_eq!(g.edges[0].edge_type, EdgeType::Arrow);
    }

    #[test]
    fn parses_chained_edge_line() {
        let g = parse_document("graph TD\nA --> B --> C").unwrap();
        assert_eq!(g.edges.len(), 2);
        assert_eq!(g.edges[1].from_id, "B");
        assert_eq!(g.edges[1].to_id, "C");
    }

    #[test]
    fn parses_subgraph_with_direction_override() {
        let g = parse_document("graph TD\nsubgraph G\ndirection LR\nX --> Y\nend\nY --> Z").unwrap();
        assert_eq!(g.subgraphs.len(), 1);
        let sg = &g.subgraphs[0];
        assert_eq!(sg.id, "G");
        assert_eq!(sg.direction, Some(Direction::Lr));
        assert!(sg.nodes.contains(&"X".to_string()));
        assert!(sg.nodes.contains(&"Y".to_string()));
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].from_id, "Y");
    }

    #[test]
    fn unclosed_subgraph_is_a_parse_error() {
        let err = parse_document("graph TD\nsubgraph G\nA --> B").unwrap_err();
        assert!(matches!(err, ParseError::UnclosedSubgraph { .. }));
    }

    #[test]
    fn comment_lines_are_skipped() {
        let g = parse_document("graph TD\n%% a comment\nA --> B").unwrap();
        assert_eq!(g.edges.len(), 1);
    }

    #[test]
    fn bidirectional_operators_parse() {
        let g = parse_document("graph TD\nA <--> B\nC <-.-> D\nE <==> F").unwrap();
        assert_eq!(g.edges[0].edge_type, EdgeType::BidirArrow);
        assert_eq!(g.edges[1].edge_type, EdgeType::BidirDotted);
        assert_eq!(g.edges[2].edge_type, EdgeType::BidirThick);
    }
}
