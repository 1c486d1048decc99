//! Core data types shared by every component (spec §3).

use std::cmp::Ordering;

/// A canonical undirected edge: invariant `u < v` is enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub u: u32,
    pub v: u32,
}

impl Edge {
    /// Builds a canonical edge, swapping endpoints if necessary.
    /// Returns `None` for self-loops, which are rejected at input (spec §3).
    pub fn canonical(a: u32, b: u32) -> Option<Self> {
        match a.cmp(&b) {
            Ordering::Less => Some(Edge { u: a, v: b }),
            Ordering::Greater => Some(Edge { u: b, v: a }),
            Ordering::Equal => None,
        }
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.u, self.v).cmp(&(other.u, other.v))
    }
}

/// A node color in `[0, C)`.
pub type Color = u32;

/// The pair of colors `(c_u, c_v)` an edge's endpoints resolve to, with
/// `c_u <= c_v` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeColors {
    pub c_u: Color,
    pub c_v: Color,
}

impl EdgeColors {
    pub fn new(a: Color, b: Color) -> Self {
        if a <= b {
            EdgeColors { c_u: a, c_v: b }
        } else {
            EdgeColors { c_u: b, c_v: a }
        }
    }
}

/// An unordered color triplet `(c1 <= c2 <= c3)`, identified by its
/// lexicographic rank among all triplets for a fixed color count `C`
/// (spec §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triplet {
    pub c1: Color,
    pub c2: Color,
    pub c3: Color,
}

impl Triplet {
    /// `true` when the triplet is monochromatic, i.e. all three colors
    /// coincide (spec §4.10's color-multiplicity correction fires on these).
    pub fn is_monochromatic(&self) -> bool {
        self.c1 == self.c2 && self.c2 == self.c3
    }

    /// `true` when this triplet's color set is a superset of `{a, b}`
    /// (spec §3's `EdgeColors` coverage rule).
    pub fn covers(&self, colors: EdgeColors) -> bool {
        let members = [self.c1, self.c2, self.c3];
        members.contains(&colors.c_u) && members.contains(&colors.c_v)
    }
}

/// Number of triplets `(c1<=c2<=c3)` over `C` colors: `binom(C+2, 3)`.
pub fn triplet_count(colors: u32) -> u64 {
    let c = colors as u64 + 2;
    c * (c - 1) * (c - 2) / 6
}

/// One entry in the node-location index (spec §3, §4.8): the offset of the
/// first edge in the sorted sample whose `u` field equals `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLocation {
    pub id: u32,
    pub index_in_sample: i64,
}

/// A sub-phase the orchestrator drives an accelerator through (spec §3's
/// `execution_code`, generalized per spec §9's design note into a tagged
/// variant instead of a bare integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    ReverseRemap,
    Reset,
    Ingest(u32),
    Count(u32),
}

/// The control word broadcast to every accelerator between phases (spec §3,
/// §6's `execution_config`).
#[derive(Debug, Clone, Copy)]
pub struct ExecutionConfig {
    pub phase: Phase,
    pub max_node_id: u32,
}

/// Mirrors the original's `DPU_INPUT_ARGUMENTS` wire struct (spec §6,
/// `original_source/common/common.h`'s `dpu_arguments_t`): broadcast once at
/// startup and held fixed across updates.
#[derive(Debug, Clone, Copy)]
pub struct AcceleratorArguments {
    pub seed: u64,
    pub sample_size: u32,
    pub max_node_id: u32,
    pub top_t: u32,
}

/// Parameters of the universal hash used by the colorer (spec §3, §4.1).
#[derive(Debug, Clone, Copy)]
pub struct HashParams {
    pub p: u32,
    pub a: u32,
    pub b: u32,
    pub colors: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_rejects_self_loop() {
        assert!(Edge::canonical(4, 4).is_none());
    }

    #[test]
    fn canonical_orders_endpoints() {
        let e = Edge::canonical(9, 3).unwrap();
        assert_eq!((e.u, e.v), (3, 9));
        let e = Edge::canonical(3, 9).unwrap();
        assert_eq!((e.u, e.v), (3, 9));
    }

    #[test]
    fn edge_colors_orders_pair() {
        let c = EdgeColors::new(5, 2);
        assert_eq!((c.c_u, c.c_v), (2, 5));
    }

    #[test]
    fn triplet_covers_requires_both_colors_present() {
        let t = Triplet { c1: 0, c2: 1, c3: 2 };
        assert!(t.covers(EdgeColors::new(0, 2)));
        assert!(t.covers(EdgeColors::new(1, 2)));
        assert!(!t.covers(EdgeColors::new(0, 3)));
    }

    #[test]
    fn triplet_count_matches_binomial() {
        assert_eq!(triplet_count(1), 1);
        assert_eq!(triplet_count(2), 4);
        assert_eq!(triplet_count(3), 10);
    }
}
