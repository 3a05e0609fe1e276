//! Interned node identifiers.
//!
//! Every id that flows through the pipeline — user-declared node ids,
//! `__dummy_<n>` edge-split stand-ins, and `__sg_<n>` subgraph compounds —
//! is interned through a [`lasso::Rodeo`] scoped to a single [`IdInterner`].
//!
//! Unlike a process-global interner, this one is created fresh by each
//! [`crate::render_dsl`] call and threaded through the pipeline explicitly.
//! A global interner would make dummy/compound counters depend on how many
//! renders happened earlier in the process, which would break the
//! byte-identical-output-across-runs contract.

use lasso::{Rodeo, Spur};
use std::fmt;

/// Reserved prefix for edge-splitting dummy nodes (Sugiyama phase 4).
pub const DUMMY_PREFIX: &str = "__dummy_";
/// Reserved prefix for subgraph-collapse compound nodes (Sugiyama phase 1).
pub const SUBGRAPH_PREFIX: &str = "__sg_";

/// An interned node id. Cheap to copy and compare.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Spur);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:?})", self.0)
    }
}

/// Owns the string table for one render call and the dummy/compound serial counters.
///
/// The counters are plain `u64`s (not atomics) precisely because this struct
/// is never shared across threads or across calls.
pub struct IdInterner {
    rodeo: Rodeo,
    dummy_counter: u64,
    subgraph_counter: u64,
}

impl Default for IdInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl IdInterner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
            dummy_counter: 0,
            subgraph_counter: 0,
        }
    }

    /// Intern a user-supplied or already-known id string.
    pub fn intern(&mut self, s: &str) -> NodeId {
        NodeId(self.rodeo.get_or_intern(s))
    }

    /// Resolve an interned id back to its string.
    #[must_use]
    pub fn resolve(&self, id: NodeId) -> &str {
        self.rodeo.resolve(&id.0)
    }

    /// Mint the next `__dummy_<n>` id.
    pub fn fresh_dummy(&mut self) -> NodeId {
        let n = self.dummy_counter;
        self.dummy_counter += 1;
        self.intern(&format!("{DUMMY_PREFIX}{n}"))
    }

    /// Mint the `__sg_<subgraph_source_id>` compound id for a subgraph.
    ///
    /// Uses the subgraph's own declared id (stable across runs) rather than
    /// a counter, so compound ids stay deterministic independent of visit
    /// order; the counter is kept only as a fallback for anonymous subgraphs.
    pub fn subgraph_compound_id(&mut self, subgraph_id: &str) -> NodeId {
        if subgraph_id.is_empty() {
            let n = self.subgraph_counter;
            self.subgraph_counter += 1;
            self.intern(&format!("{SUBGRAPH_PREFIX}{n}"))
        } else {
            self.intern(&format!("{SUBGRAPH_PREFIX}{subgraph_id}"))
        }
    }

    /// True if a previously-interned id carries the dummy-node prefix.
    #[must_use]
    pub fn is_dummy(&self, id: NodeId) -> bool {
        self.resolve(id).starts_with(DUMMY_PREFIX)
    }

    /// True if a previously-interned id carries the compound-node prefix.
    #[must_use]
    pub fn is_subgraph_compound(&self, id: NodeId) -> bool {
        self.resolve(id).starts_with(SUBGRAPH_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let mut interner = IdInterner::new();
        let a = interner.intern("A");
        let b = interner.intern("A");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "A");
    }

    #[test]
    fn dummy_ids_are_sequential_and_prefixed() {
        let mut interner = IdInterner::new();
        let d0 = interner.fresh_dummy();
        let d1 = interner.fresh_dummy();
        assert_eq!(interner.resolve(d0), "__dummy_0");
        assert_eq!(interner.resolve(d1), "__dummy_1");
        assert!(interner.is_dummy(d0));
    }

    #[test]
    fn subgraph_compound_ids_are_stable_by_source_id() {
        let mut interner = IdInterner::new();
        let a = interner.subgraph_compound_id("cluster1");
        let b = interner.subgraph_compound_id("cluster1");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "__sg_cluster1");
        assert!(interner.is_subgraph_compound(a));
    }

    #[test]
    fn fresh_interner_counters_start_at_zero() {
        let mut first = IdInterner::new();
        let _ = first.intern("A");
        let _ = first.intern("B");
        let d = first.fresh_dummy();
        assert_eq!(first.resolve(d), "__dummy_0");

        // A brand new interner for a second render call is unaffected by the first.
        let mut second = IdInterner::new();
        let d2 = second.fresh_dummy();
        assert_eq!(second.resolve(d2), "__dummy_0");
    }
}
