//! `mmgrid-core`: a Mermaid `graph`/`flowchart` compiler — parses the
//! Mermaid flowchart subset (§3a), lays it out with the Sugiyama method
//! plus orthogonal edge routing (§4.2/§4.3), and paints the result to an
//! ASCII/Unicode character grid (§4.4–§4.6).
//!
//! The single public entry point is [`render_dsl`]. Everything else in this
//! crate is exposed so `mmgrid-cli` (and tests) can drive the pipeline
//! stage-by-stage, but `render_dsl` is the only function most callers need.

pub mod ast;
pub mod canvas;
pub mod charset;
pub mod config;
pub mod error;
pub mod graphir;
pub mod id;
pub mod parser;
pub mod renderer;
pub mod result;
pub mod router;
pub mod sugiyama;

pub use ast::{Direction, Edge, EdgeType, Graph, Node, Shape};
pub use config::RenderConfig;
pub use error::ParseError;
pub use id::NodeId;
pub use result::{LayoutNode, LayoutResult, Point, RoutedEdge};

/// Render Mermaid flowchart source to a character grid (§6).
///
/// The only fallible step is parsing: a malformed document returns
/// `Err(ParseError)` (§7). Everything past that point — implicit node
/// recovery, layout, routing, painting — always succeeds for any `Graph`
/// the parser can produce.
pub fn render_dsl(source: &str, config: &RenderConfig) -> Result<String, ParseError> {
    let ast_graph = parser::parse_document(source)?;
    let mut interner = id::IdInterner::new();
    let layout = sugiyama::layout(&ast_graph, config, &mut interner);
    Ok(renderer::render(&layout, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_renders_a_single_newline() {
        let out = render_dsl("graph TD", &RenderConfig::default()).unwrap();
        assert_eq!(out, "\n");
    }

    #[test]
    fn single_node_is_a_three_by_three_box() {
        let out = render_dsl("graph TD\nA", &RenderConfig::default()).unwrap();
        assert_eq!(out, "┌─┐\n│A│\n└─┘\n");
    }

    #[test]
    fn malformed_header_is_a_parse_error() {
        let err = render_dsl("graph NOPE\nA --> B", &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn two_node_chain_has_exactly_one_arrowhead() {
        let out = render_dsl("graph TD\nA --> B", &RenderConfig::default()).unwrap();
        assert_eq!(out.matches('▼').count(), 1);
    }

    #[test]
    fn reference_error_implicitly_declares_a_rectangle() {
        // B is never declared with a shape; it still gets a box in the output.
        let out = render_dsl("graph TD\nA --> B", &RenderConfig::default()).unwrap();
        assert!(out.contains('B'));
    }

    #[test]
    fn render_dsl_is_deterministic_across_calls() {
        let src = "graph TD\nA --> B --> C\nA --> C";
        let cfg = RenderConfig::default();
        let first = render_dsl(src, &cfg).unwrap();
        let second = render_dsl(src, &cfg).unwrap();
        assert_eq!(first, second);
    }
}
