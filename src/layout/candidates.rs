//! Position candidates for a node given its placed neighbors
//!
//! A position is consistent with a placed neighbor when it lies in that
//! neighbor's configuration space (neighbor fixed, node moving). Candidates
//! are the intersection over all placed neighbors, smallest space first.

use std::sync::Arc;

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::{manhattan, CellBounds, IntVec2, TemplateId};
use crate::layout::energy::LayoutContext;
use crate::layout::placement::RoomPlacement;
use crate::shapes::{ConfigurationSpace, ModuleShape};

/// Reusable candidate search with scratch buffers
#[derive(Debug, Default)]
pub struct CandidateFinder {
    neighbors: Vec<(usize, IntVec2, Arc<ConfigurationSpace>)>,
    seen: AHashSet<IntVec2>,
}

impl CandidateFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// World positions for `node` using `shape`
    ///
    /// Pinned nodes get their pin. With placed neighbors: the intersection
    /// of their spaces, or the best-effort union when it is empty. Without:
    /// the origin for the very first node, else a ring search.
    pub fn find<R: Rng + ?Sized>(
        &mut self,
        ctx: &LayoutContext<'_>,
        rooms: &[Option<RoomPlacement>],
        node: usize,
        shape: &ModuleShape,
        rng: &mut R,
    ) -> Vec<IntVec2> {
        if let Some(pin) = ctx.graph.node(node).pinned {
            return vec![pin];
        }
        if !self.collect_neighbors(ctx, rooms, node, shape.template()) {
            return Vec::new();
        }
        if self.neighbors.is_empty() {
            if rooms.iter().enumerate().all(|(i, r)| i == node || r.is_none()) {
                return vec![IntVec2::ZERO];
            }
            return ring_search(ctx, rooms, node, shape);
        }

        let mut out = if ctx.settings.use_bitset_overlap && self.neighbors.len() >= 2 {
            self.intersect_bits()
        } else {
            self.intersect_lists()
        };
        if out.is_empty() {
            out = self.best_effort_union(ctx.settings.max_fallback_candidates, rng);
        }
        out
    }

    /// Cheap local candidates near `current`
    ///
    /// Uses only the two smallest neighbor spaces, falling back to the
    /// smallest one alone, and keeps the candidates closest to `current`.
    pub fn wiggle<R: Rng + ?Sized>(
        &mut self,
        ctx: &LayoutContext<'_>,
        rooms: &[Option<RoomPlacement>],
        node: usize,
        shape: &ModuleShape,
        current: IntVec2,
        rng: &mut R,
    ) -> Vec<IntVec2> {
        if ctx.graph.node(node).pinned.is_some() {
            return self.find(ctx, rooms, node, shape, rng);
        }
        if !self.collect_neighbors(ctx, rooms, node, shape.template()) {
            return Vec::new();
        }
        if self.neighbors.is_empty() {
            return self.find(ctx, rooms, node, shape, rng);
        }

        let (_, root0, space0) = &self.neighbors[0];
        let mut out: Vec<IntVec2> = match self.neighbors.get(1) {
            Some((_, root1, space1)) => space0
                .offsets()
                .iter()
                .map(|&o| *root0 + o)
                .filter(|&p| space1.contains(p - *root1))
                .collect(),
            None => Vec::new(),
        };
        if out.is_empty() {
            out = space0.offsets().iter().map(|&o| *root0 + o).collect();
        }
        out.sort_by_key(|&p| (manhattan(p, current), p.y, p.x));
        out.truncate(ctx.settings.max_wiggle_candidates.max(1));
        out
    }

    /// Placed neighbors with their spaces, smallest space first
    ///
    /// Returns `false` when a neighbor pair has no space at all.
    fn collect_neighbors(
        &mut self,
        ctx: &LayoutContext<'_>,
        rooms: &[Option<RoomPlacement>],
        node: usize,
        template: TemplateId,
    ) -> bool {
        self.neighbors.clear();
        for &(other, _) in ctx.graph.neighbors(node) {
            let Some(placed) = &rooms[other] else { continue };
            let Some(space) = ctx.spaces.space(placed.template, template) else {
                return false;
            };
            self.neighbors.push((other, placed.root, space));
        }
        self.neighbors.sort_by_key(|(other, _, space)| (space.len(), *other));
        true
    }

    fn intersect_lists(&self) -> Vec<IntVec2> {
        let (_, base_root, base) = &self.neighbors[0];
        let mut out: Vec<IntVec2> = base
            .offsets()
            .iter()
            .map(|&o| *base_root + o)
            .filter(|&p| {
                self.neighbors[1..]
                    .iter()
                    .all(|(_, root, space)| space.contains(p - *root))
            })
            .collect();
        out.sort_by_key(|p| (p.y, p.x));
        out
    }

    /// Same result as [`Self::intersect_lists`], narrowing a bitset of the
    /// smallest space by every other space in turn
    fn intersect_bits(&self) -> Vec<IntVec2> {
        let (_, base_root, base) = &self.neighbors[0];
        let mut grid = base.bits().translated(*base_root);
        for (_, root, space) in &self.neighbors[1..] {
            let other = space.bits();
            let shift = *root + other.min() - grid.min();
            grid.and_shifted(other, shift);
            if grid.is_empty() {
                return Vec::new();
            }
        }
        grid.cells().collect()
    }

    /// Positions satisfying the most neighbors, reservoir-sampled down to
    /// `limit`
    fn best_effort_union<R: Rng + ?Sized>(&mut self, limit: usize, rng: &mut R) -> Vec<IntVec2> {
        let limit = limit.max(1);
        self.seen.clear();
        let mut best = 0;
        let mut seen_at_best = 0usize;
        let mut reservoir: Vec<IntVec2> = Vec::with_capacity(limit);

        for (_, root, space) in &self.neighbors {
            for &offset in space.offsets() {
                let p = *root + offset;
                if !self.seen.insert(p) {
                    continue;
                }
                let score = self
                    .neighbors
                    .iter()
                    .filter(|(_, r, s)| s.contains(p - *r))
                    .count();
                if score < best {
                    continue;
                }
                if score > best {
                    best = score;
                    seen_at_best = 0;
                    reservoir.clear();
                }
                seen_at_best += 1;
                if reservoir.len() < limit {
                    reservoir.push(p);
                } else {
                    let slot = rng.gen_range(0..seen_at_best);
                    if slot < limit {
                        reservoir[slot] = p;
                    }
                }
            }
        }
        reservoir
    }
}

/// Positions on rings of growing radius around the origin, spaced so the
/// node's bounds clear every placed module; the first ring with any free
/// spot wins
fn ring_search(
    ctx: &LayoutContext<'_>,
    rooms: &[Option<RoomPlacement>],
    node: usize,
    shape: &ModuleShape,
) -> Vec<IntVec2> {
    let local = shape.bounds();
    let spacing = local.width().max(local.height()) + 1;
    let placed: Vec<CellBounds> = rooms
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != node)
        .filter_map(|(_, r)| r.as_ref().map(RoomPlacement::bounds))
        .collect();

    let mut last_ring = Vec::new();
    for radius in 1..=ctx.settings.ring_search_rings.max(1) as i32 {
        last_ring = ring(radius).map(|step| step * spacing).collect();
        let free: Vec<IntVec2> = last_ring
            .iter()
            .copied()
            .filter(|&p| {
                let at = local.translate(p);
                placed.iter().all(|b| !b.intersects(&at))
            })
            .collect();
        if !free.is_empty() {
            return free;
        }
    }
    last_ring
}

/// Cells at Chebyshev distance `radius` from the origin, row by row
fn ring(radius: i32) -> impl Iterator<Item = IntVec2> {
    (-radius..=radius).flat_map(move |y| {
        (-radius..=radius)
            .filter(move |&x| x.abs() == radius || y.abs() == radius)
            .map(move |x| IntVec2::new(x, y))
    })
}

/// Shuffle candidates so equal-energy choices vary with the seed
pub fn shuffled<R: Rng + ?Sized>(mut candidates: Vec<IntVec2>, rng: &mut R) -> Vec<IntVec2> {
    candidates.shuffle(rng);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::NodeId;
    use crate::graph::LevelGraph;
    use crate::layout::energy::EnergyCache;
    use crate::layout::placement::PlacementPatch;
    use crate::layout::test_support::Fixture;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_first_node_goes_to_origin() {
        let fx = Fixture::pair_of_rooms();
        let rooms = vec![None, None];
        let out = CandidateFinder::new().find(&fx.ctx(), &rooms, 0, &fx.room(), &mut rng());
        assert_eq!(out, vec![IntVec2::ZERO]);
    }

    #[test]
    fn test_single_neighbor_gives_its_space() {
        let fx = Fixture::pair_of_rooms();
        let ctx = fx.ctx();
        let mut rooms = vec![None, None];
        let mut cache = EnergyCache::new(2);
        cache.apply_move(&ctx, &mut rooms, 0, PlacementPatch::new(fx.room(), IntVec2::new(10, 10)));

        let out = CandidateFinder::new().find(&ctx, &rooms, 1, &fx.room(), &mut rng());
        assert_eq!(
            out,
            vec![
                IntVec2::new(10, 6),
                IntVec2::new(6, 10),
                IntVec2::new(14, 10),
                IntVec2::new(10, 14),
            ]
        );
    }

    #[test]
    fn test_two_neighbors_intersect_identically_on_both_paths() {
        let mut fx = Fixture::cycle_of_four();
        let mut rooms = vec![None; 4];
        let mut cache = EnergyCache::new(4);
        {
            let ctx = fx.ctx();
            cache.apply_move(&ctx, &mut rooms, 0, PlacementPatch::new(fx.room(), IntVec2::ZERO));
            cache.apply_move(&ctx, &mut rooms, 2, PlacementPatch::new(fx.room(), IntVec2::new(4, 4)));
        }

        fx.settings.use_bitset_overlap = true;
        let bits = CandidateFinder::new().find(&fx.ctx(), &rooms, 1, &fx.room(), &mut rng());
        fx.settings.use_bitset_overlap = false;
        let lists = CandidateFinder::new().find(&fx.ctx(), &rooms, 1, &fx.room(), &mut rng());

        // Room 1 must share a wall with both: east of 0 or south of 2
        assert_eq!(bits, lists);
        assert_eq!(bits, vec![IntVec2::new(4, 0), IntVec2::new(0, 4)]);
    }

    #[test]
    fn test_disagreeing_neighbors_fall_back_to_best_effort() {
        let fx = Fixture::cycle_of_four();
        let ctx = fx.ctx();
        let mut rooms = vec![None; 4];
        let mut cache = EnergyCache::new(4);
        cache.apply_move(&ctx, &mut rooms, 0, PlacementPatch::new(fx.room(), IntVec2::ZERO));
        cache.apply_move(&ctx, &mut rooms, 2, PlacementPatch::new(fx.room(), IntVec2::new(40, 0)));

        let out = CandidateFinder::new().find(&ctx, &rooms, 1, &fx.room(), &mut rng());
        assert_eq!(out.len(), 8);
        let mut finder = CandidateFinder::new();
        let capped = {
            let mut fx = Fixture::cycle_of_four();
            fx.settings.max_fallback_candidates = 3;
            finder.find(&fx.ctx(), &rooms, 1, &fx.room(), &mut rng())
        };
        assert_eq!(capped.len(), 3);
    }

    #[test]
    fn test_unconnected_node_uses_ring_search() {
        let mut level = LevelGraph::new();
        level.add_node(NodeId(0), None).add_node(NodeId(1), None).add_node(NodeId(2), None);
        level.add_edge(NodeId(0), NodeId(1), None);
        level.add_edge(NodeId(1), NodeId(2), None);
        let fx = Fixture::from_level(&level);
        let ctx = fx.ctx();
        let mut rooms = vec![None; 3];
        let mut cache = EnergyCache::new(3);
        cache.apply_move(&ctx, &mut rooms, 0, PlacementPatch::new(fx.room(), IntVec2::ZERO));

        let out = CandidateFinder::new().find(&ctx, &rooms, 2, &fx.room(), &mut rng());
        // spacing 6: the whole first ring clears a 5x5 room at the origin
        assert_eq!(out.len(), 8);
        assert!(out.contains(&IntVec2::new(-6, -6)));
        assert!(!out.contains(&IntVec2::ZERO));
    }

    #[test]
    fn test_pinned_node_has_one_candidate() {
        let mut level = LevelGraph::new();
        level.add_pinned_node(NodeId(0), None, IntVec2::new(3, 3));
        let fx = Fixture::from_level(&level);
        let out = CandidateFinder::new().find(&fx.ctx(), &[None], 0, &fx.room(), &mut rng());
        assert_eq!(out, vec![IntVec2::new(3, 3)]);
    }

    #[test]
    fn test_wiggle_prefers_nearby_positions() {
        let mut fx = Fixture::cycle_of_four();
        fx.settings.max_wiggle_candidates = 2;
        let ctx = fx.ctx();
        let mut rooms = vec![None; 4];
        let mut cache = EnergyCache::new(4);
        cache.apply_move(&ctx, &mut rooms, 0, PlacementPatch::new(fx.room(), IntVec2::ZERO));

        let out = CandidateFinder::new().wiggle(&ctx, &rooms, 1, &fx.room(), IntVec2::new(5, 1), &mut rng());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], IntVec2::new(4, 0));
    }
}
