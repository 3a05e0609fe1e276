//! Integration tests: the §5/§8 determinism contract — identical input and
//! config must render byte-identical output, across repeated calls and
//! across calls made with freshly constructed `IdInterner`/`RenderConfig`
//! values (nothing here is shared process-global state).

use mmgrid_core::{render_dsl, Direction, RenderConfig};

fn assert_stable(src: &str, config: &RenderConfig) {
    let first = render_dsl(src, config).unwrap();
    for _ in 0..5 {
        let again = render_dsl(src, config).unwrap();
        assert_eq!(first, again, "render_dsl was not deterministic for `{src}`");
    }
}

#[test]
fn simple_chain_is_deterministic() {
    assert_stable("graph TD\nA --> B --> C\nA --> C", &RenderConfig::default());
}

#[test]
fn cyclic_graph_is_deterministic_across_repeated_decycling() {
    assert_stable("graph TD\nA --> B --> C --> A\nA --> C", &RenderConfig::default());
}

#[test]
fn wide_fanout_is_deterministic_through_barycenter_passes() {
    let src = "graph TD\nA --> B\nA --> C\nA --> D\nA --> E\nB --> F\nC --> F\nD --> F\nE --> F";
    assert_stable(src, &RenderConfig::default());
}

#[test]
fn nested_subgraphs_are_deterministic() {
    let src = "graph TD\nsubgraph Outer\n  subgraph Inner\n    X --> Y\n  end\n  Y --> Z\nend\nZ --> W";
    assert_stable(src, &RenderConfig::default());
}

#[test]
fn every_direction_is_deterministic() {
    for dir in [Direction::Td, Direction::Bt, Direction::Lr, Direction::Rl] {
        let mut cfg = RenderConfig::default();
        cfg.direction = Some(dir);
        assert_stable("graph TD\nA --> B --> C\nA --> C", &cfg);
    }
}

#[test]
fn ascii_and_unicode_charsets_are_each_deterministic() {
    let src = "graph TD\nA{D} -->|yes| B\nA -->|no| C\nB --> C";
    let mut ascii_cfg = RenderConfig::default();
    ascii_cfg.ascii = true;
    assert_stable(src, &RenderConfig::default());
    assert_stable(src, &ascii_cfg);
}

#[test]
fn self_loop_and_reference_recovery_are_deterministic() {
    assert_stable("graph TD\nA --> A\nA --> Ghost", &RenderConfig::default());
}
