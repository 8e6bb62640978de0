//! Energy model and its incremental cache
//!
//! Energy = overlap penalty + unsatisfied-edge penalty.
//!
//! - Overlap: [`OVERLAP_WEIGHT`] per illegal cell, for every placed pair.
//! - Edge: for graph-adjacent placed pairs that do not touch,
//!   [`UNSATISFIED_EDGE_BASE`] plus the squared bounding-box gap.
//!
//! Every term is a whole number, so incremental sums stay exact and a
//! rebuilt cache compares equal to an incrementally maintained one.

use crate::core::config::{GeneratorSettings, OVERLAP_WEIGHT, UNSATISFIED_EDGE_BASE};
use crate::graph::LayoutGraph;
use crate::layout::bite::{try_get_bite_allowance, BiteAllowance};
use crate::layout::overlap::count_illegal_overlap;
use crate::layout::placement::{MoveUndo, PlacementPatch, RoomPlacement};
use crate::shapes::{ConfigurationSpaceSource, ShapeSource};

/// Read-only inputs shared by every part of the search
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    pub graph: &'a LayoutGraph,
    pub shapes: &'a dyn ShapeSource,
    pub spaces: &'a dyn ConfigurationSpaceSource,
    pub settings: &'a GeneratorSettings,
}

impl<'a> LayoutContext<'a> {
    /// Whether `b` sits in one of `a`'s configuration-space offsets
    pub fn in_configuration_space(&self, a: &RoomPlacement, b: &RoomPlacement) -> bool {
        self.spaces
            .space(a.template, b.template)
            .map(|space| space.contains(b.root - a.root))
            .unwrap_or(false)
    }

    /// Bite allowance for a pair; only graph neighbors may bite
    pub fn allowance(&self, a: &RoomPlacement, b: &RoomPlacement) -> BiteAllowance {
        if !self.graph.is_adjacent(a.node, b.node) {
            return BiteAllowance::NONE;
        }
        try_get_bite_allowance(&a.shape, a.root, &b.shape, b.root).unwrap_or(BiteAllowance::NONE)
    }
}

/// Overlap penalty between two placements
pub fn pair_penalty(ctx: &LayoutContext<'_>, a: &RoomPlacement, b: &RoomPlacement) -> f64 {
    let (a, b) = ordered(a, b);
    let (fa, ba) = (a.floor_bounds(), a.bounds());
    let (fb, bb) = (b.floor_bounds(), b.bounds());
    if !fa.intersects(&bb) && !fb.intersects(&ba) {
        return 0.0;
    }
    let allowance = ctx.allowance(a, b);
    let cells = count_illegal_overlap(
        &a.shape,
        a.root,
        &b.shape,
        b.root,
        &allowance,
        ctx.settings.use_bitset_overlap,
        false,
    );
    cells as f64 * OVERLAP_WEIGHT
}

/// Distance penalty for a graph edge; zero when the endpoints touch
pub fn edge_penalty(ctx: &LayoutContext<'_>, a: &RoomPlacement, b: &RoomPlacement) -> f64 {
    let (a, b) = ordered(a, b);
    if ctx.in_configuration_space(a, b) {
        return 0.0;
    }
    let gap = a.bounds().gap(&b.bounds());
    UNSATISFIED_EDGE_BASE + (gap.x as f64).powi(2) + (gap.y as f64).powi(2)
}

/// Lower node index first, so a pair scores the same from either side
#[inline]
fn ordered<'p>(a: &'p RoomPlacement, b: &'p RoomPlacement) -> (&'p RoomPlacement, &'p RoomPlacement) {
    if a.node <= b.node {
        (a, b)
    } else {
        (b, a)
    }
}

/// Per-state energy cache over dense node indices
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCache {
    n: usize,
    /// Packed upper triangle, see [`EnergyCache::pair_index`]
    pair_penalty: Vec<f64>,
    edge_penalty: Vec<f64>,
    overlap_sum: f64,
    distance_sum: f64,
}

impl EnergyCache {
    /// Cache for `n` nodes with nothing placed
    pub fn new(n: usize) -> Self {
        let pairs = n * n.saturating_sub(1) / 2;
        Self {
            n,
            pair_penalty: vec![0.0; pairs],
            edge_penalty: vec![0.0; pairs],
            overlap_sum: 0.0,
            distance_sum: 0.0,
        }
    }

    /// Full O(n²) rebuild from a placement map
    pub fn build(ctx: &LayoutContext<'_>, rooms: &[Option<RoomPlacement>]) -> Self {
        let mut cache = Self::new(rooms.len());
        for i in 0..rooms.len() {
            let Some(a) = &rooms[i] else { continue };
            for (j, b) in rooms.iter().enumerate().skip(i + 1) {
                let Some(b) = b else { continue };
                let idx = cache.pair_index(i, j);
                let overlap = pair_penalty(ctx, a, b);
                cache.pair_penalty[idx] = overlap;
                cache.overlap_sum += overlap;
                if ctx.graph.is_adjacent(i, j) {
                    let distance = edge_penalty(ctx, a, b);
                    cache.edge_penalty[idx] = distance;
                    cache.distance_sum += distance;
                }
            }
        }
        cache
    }

    /// Index of unordered pair `{i, j}` (`i != j`) in the packed triangle
    #[inline]
    pub fn pair_index(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        i * (2 * self.n - i - 1) / 2 + (j - i - 1)
    }

    pub fn total(&self) -> f64 {
        self.overlap_sum + self.distance_sum
    }

    pub fn overlap_sum(&self) -> f64 {
        self.overlap_sum
    }

    pub fn distance_sum(&self) -> f64 {
        self.distance_sum
    }

    /// Cheap necessary condition for a valid layout
    pub fn is_solved(&self) -> bool {
        self.overlap_sum == 0.0 && self.distance_sum == 0.0
    }

    pub fn pair(&self, i: usize, j: usize) -> f64 {
        self.pair_penalty[self.pair_index(i, j)]
    }

    pub fn edge(&self, i: usize, j: usize) -> f64 {
        self.edge_penalty[self.pair_index(i, j)]
    }

    /// Place or move `node` in `rooms` and refresh only its terms
    pub fn apply_move(
        &mut self,
        ctx: &LayoutContext<'_>,
        rooms: &mut [Option<RoomPlacement>],
        node: usize,
        patch: PlacementPatch,
    ) -> MoveUndo {
        let inverse = match rooms[node].as_mut() {
            Some(placement) => Some(placement.apply(patch)),
            None => {
                rooms[node] = Some(RoomPlacement::new(node, patch.shape, patch.root));
                None
            }
        };
        let mut undo = MoveUndo {
            node,
            inverse,
            pair_entries: Vec::new(),
            edge_entries: Vec::new(),
            overlap_sum: self.overlap_sum,
            distance_sum: self.distance_sum,
        };
        self.update_in_place(ctx, rooms, node, Some(&mut undo));
        undo
    }

    /// Recompute every pair and edge term involving `node`
    ///
    /// Old entry values are recorded in `undo` when given.
    pub fn update_in_place(
        &mut self,
        ctx: &LayoutContext<'_>,
        rooms: &[Option<RoomPlacement>],
        node: usize,
        mut undo: Option<&mut MoveUndo>,
    ) {
        let Some(moved) = &rooms[node] else { return };

        for (other, placement) in rooms.iter().enumerate() {
            if other == node {
                continue;
            }
            let Some(placement) = placement else { continue };
            let idx = self.pair_index(node, other);

            let overlap = pair_penalty(ctx, moved, placement);
            let old = self.pair_penalty[idx];
            if old != overlap {
                if let Some(undo) = undo.as_deref_mut() {
                    undo.pair_entries.push((idx, old));
                }
                self.pair_penalty[idx] = overlap;
                self.overlap_sum += overlap - old;
            }

            if ctx.graph.is_adjacent(node, other) {
                let distance = edge_penalty(ctx, moved, placement);
                let old = self.edge_penalty[idx];
                if old != distance {
                    if let Some(undo) = undo.as_deref_mut() {
                        undo.edge_entries.push((idx, old));
                    }
                    self.edge_penalty[idx] = distance;
                    self.distance_sum += distance - old;
                }
            }
        }
    }

    /// Undo a move recorded by [`EnergyCache::apply_move`]
    pub fn revert(&mut self, rooms: &mut [Option<RoomPlacement>], undo: MoveUndo) {
        let node = undo.node;
        match undo.inverse {
            Some(inverse) => {
                if let Some(placement) = &mut rooms[node] {
                    placement.apply(inverse);
                }
            }
            None => rooms[node] = None,
        }
        for (idx, value) in undo.pair_entries {
            self.pair_penalty[idx] = value;
        }
        for (idx, value) in undo.edge_entries {
            self.edge_penalty[idx] = value;
        }
        self.overlap_sum = undo.overlap_sum;
        self.distance_sum = undo.distance_sum;
    }
}
