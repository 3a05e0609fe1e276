//! `RenderConfig` — the library's only configuration surface (§6, §10d).
//!
//! Plain struct, explicit construction, no file format, no environment
//! variables read inside the core: configuration is an explicit parameter,
//! per §5's "no global mutable state" contract.

use crate::ast::Direction;

/// Options accepted by [`crate::render_dsl`].
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Select the ASCII charset instead of the Unicode box-drawing one.
    pub ascii: bool,
    /// Override the direction declared by the source (`None` = use the source's).
    pub direction: Option<Direction>,
    /// Horizontal label padding inside each node box.
    pub padding: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ascii: false,
            direction: None,
            padding: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec() {
        let c = RenderConfig::default();
        assert!(!c.ascii);
        assert!(c.direction.is_none());
        assert_eq!(c.padding, 1);
    }
}
