//! Exact layout validation
//!
//! The energy cache only says a layout *might* be valid. These checks are
//! the ground truth: no illegal overlap anywhere, every placed edge touches
//! through a real socket pairing, and (globally) everything is placed and
//! connected.

use std::collections::VecDeque;

use thiserror::Error;

use crate::graph::LayoutGraph;
use crate::layout::bite::try_get_bite_allowance;
use crate::layout::energy::LayoutContext;
use crate::layout::overlap::count_illegal_overlap;
use crate::layout::placement::RoomPlacement;

/// Why a layout was rejected; indices are layout node indices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("nodes {a} and {b} overlap illegally")]
    IllegalOverlap { a: usize, b: usize },

    #[error("edge between nodes {a} and {b} does not touch")]
    EdgeNotTouching { a: usize, b: usize },

    #[error("node {node} is not placed")]
    NodeNotPlaced { node: usize },

    #[error("node {node} is not reachable through touching edges")]
    Disconnected { node: usize },
}

impl ValidationIssue {
    /// Message naming nodes by their labels
    pub fn describe(&self, graph: &LayoutGraph) -> String {
        match *self {
            ValidationIssue::IllegalOverlap { a, b } => {
                format!("{} and {} overlap illegally", graph.label(a), graph.label(b))
            }
            ValidationIssue::EdgeNotTouching { a, b } => {
                format!("{} and {} do not touch", graph.label(a), graph.label(b))
            }
            ValidationIssue::NodeNotPlaced { node } => format!("{} is not placed", graph.label(node)),
            ValidationIssue::Disconnected { node } => {
                format!("{} is not connected to the rest of the layout", graph.label(node))
            }
        }
    }
}

/// Whether two placed graph neighbors actually touch: `b` sits in `a`'s
/// configuration space and a socket pairing exists within bite depth
pub fn edge_touches(ctx: &LayoutContext<'_>, a: &RoomPlacement, b: &RoomPlacement) -> bool {
    ctx.in_configuration_space(a, b)
        && try_get_bite_allowance(&a.shape, a.root, &b.shape, b.root).is_some()
}

/// Check every placed pair for illegal overlap and every edge between
/// placed nodes for touching
pub fn try_validate_layout(
    ctx: &LayoutContext<'_>,
    rooms: &[Option<RoomPlacement>],
) -> Result<(), ValidationIssue> {
    for (i, a) in rooms.iter().enumerate() {
        let Some(a) = a else { continue };
        for b in rooms.iter().skip(i + 1).flatten() {
            if !a.bounds().intersects(&b.bounds()) {
                continue;
            }
            let allowance = ctx.allowance(a, b);
            let cells = count_illegal_overlap(
                &a.shape,
                a.root,
                &b.shape,
                b.root,
                &allowance,
                ctx.settings.use_bitset_overlap,
                true,
            );
            if cells > 0 {
                return Err(ValidationIssue::IllegalOverlap { a: a.node, b: b.node });
            }
        }
    }

    for edge in ctx.graph.edges() {
        let (Some(a), Some(b)) = (&rooms[edge.a], &rooms[edge.b]) else {
            continue;
        };
        if !edge_touches(ctx, a, b) {
            return Err(ValidationIssue::EdgeNotTouching { a: edge.a, b: edge.b });
        }
    }
    Ok(())
}

/// Full check for a finished layout: everything placed, locally valid and
/// connected through touching edges
pub fn try_validate_global(
    ctx: &LayoutContext<'_>,
    rooms: &[Option<RoomPlacement>],
) -> Result<(), ValidationIssue> {
    if let Some(node) = rooms.iter().position(Option::is_none) {
        return Err(ValidationIssue::NodeNotPlaced { node });
    }
    try_validate_layout(ctx, rooms)?;

    let mut seen = vec![false; rooms.len()];
    let mut queue = VecDeque::new();
    if !rooms.is_empty() {
        seen[0] = true;
        queue.push_back(0);
    }
    while let Some(node) = queue.pop_front() {
        for &(next, _) in ctx.graph.neighbors(node) {
            if seen[next] {
                continue;
            }
            let (Some(a), Some(b)) = (&rooms[node], &rooms[next]) else {
                continue;
            };
            if edge_touches(ctx, a, b) {
                seen[next] = true;
                queue.push_back(next);
            }
        }
    }
    match seen.iter().position(|s| !s) {
        Some(node) => Err(ValidationIssue::Disconnected { node }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IntVec2;
    use crate::layout::energy::EnergyCache;
    use crate::layout::placement::PlacementPatch;
    use crate::layout::test_support::{Fixture, CORRIDOR_H, CORRIDOR_V, ROOM};
    use crate::shapes::ModuleShape;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn place(fx: &Fixture, roots: &[(usize, IntVec2, bool)]) -> Vec<Option<RoomPlacement>> {
        let ctx = fx.ctx();
        let mut rooms = vec![None; fx.graph.node_count()];
        let mut cache = EnergyCache::new(rooms.len());
        for &(node, root, corridor) in roots {
            let shape = if corridor { fx.corridor_h() } else { fx.room() };
            cache.apply_move(&ctx, &mut rooms, node, PlacementPatch::new(shape, root));
        }
        rooms
    }

    #[test]
    fn test_square_of_rooms_is_valid() {
        let fx = Fixture::cycle_of_four();
        let rooms = place(
            &fx,
            &[
                (0, IntVec2::ZERO, false),
                (1, IntVec2::new(4, 0), false),
                (2, IntVec2::new(4, 4), false),
                (3, IntVec2::new(0, 4), false),
            ],
        );
        assert_eq!(try_validate_layout(&fx.ctx(), &rooms), Ok(()));
        assert_eq!(try_validate_global(&fx.ctx(), &rooms), Ok(()));
    }

    #[test]
    fn test_overlap_is_reported() {
        let fx = Fixture::cycle_of_four();
        let rooms = place(&fx, &[(0, IntVec2::ZERO, false), (2, IntVec2::new(1, 1), false)]);
        assert_eq!(
            try_validate_layout(&fx.ctx(), &rooms),
            Err(ValidationIssue::IllegalOverlap { a: 0, b: 2 })
        );
    }

    #[test]
    fn test_untouching_edge_is_reported() {
        let fx = Fixture::pair_of_rooms();
        let rooms = place(&fx, &[(0, IntVec2::ZERO, false), (1, IntVec2::new(9, 0), false)]);
        let issue = try_validate_layout(&fx.ctx(), &rooms).unwrap_err();
        assert_eq!(issue, ValidationIssue::EdgeNotTouching { a: 0, b: 1 });
        assert_eq!(issue.describe(&fx.graph), "room 0 and room 1 do not touch");
    }

    #[test]
    fn test_global_requires_every_node() {
        let fx = Fixture::pair_of_rooms();
        let rooms = place(&fx, &[(0, IntVec2::ZERO, false)]);
        assert_eq!(try_validate_layout(&fx.ctx(), &rooms), Ok(()));
        assert_eq!(
            try_validate_global(&fx.ctx(), &rooms),
            Err(ValidationIssue::NodeNotPlaced { node: 1 })
        );
    }

    #[test]
    fn test_corridor_bite_is_legal() {
        let fx = Fixture::rooms_with_corridor();
        // Corridor telescoped one cell into room 0, flush with room 1
        let rooms = place(
            &fx,
            &[
                (0, IntVec2::ZERO, false),
                (2, IntVec2::new(3, 2), true),
                (1, IntVec2::new(5, 0), false),
            ],
        );
        assert_eq!(try_validate_global(&fx.ctx(), &rooms), Ok(()));
    }

    /// Place `moves` through the energy cache; a solved cache must validate
    ///
    /// Returns whether the cache reported the layout solved.
    fn solved_implies_valid(fx: &Fixture, moves: &[(usize, Arc<ModuleShape>, IntVec2)]) -> bool {
        let ctx = fx.ctx();
        let mut rooms = vec![None; fx.graph.node_count()];
        let mut cache = EnergyCache::new(rooms.len());
        for (node, shape, root) in moves {
            cache.apply_move(&ctx, &mut rooms, *node, PlacementPatch::new(shape.clone(), *root));
        }
        if !cache.is_solved() {
            return false;
        }
        assert_eq!(
            try_validate_layout(&ctx, &rooms),
            Ok(()),
            "energy says solved: {:?}",
            moves.iter().map(|(n, s, r)| (*n, s.name().to_string(), *r)).collect::<Vec<_>>()
        );
        true
    }

    #[test]
    fn test_every_solved_corridor_layout_validates() {
        let fx = Fixture::rooms_with_corridor();
        let ctx = fx.ctx();
        let room = fx.room();
        let mut solved = 0;
        for corridor in [CORRIDOR_H, CORRIDOR_V] {
            let shape = fx.shape(corridor);
            let space = ctx.spaces.space(ROOM, corridor).unwrap();
            // Corridor touching room 0, then room 1 anywhere touching the corridor
            for &near in space.offsets() {
                for &far in space.offsets() {
                    let moves = [
                        (0, room.clone(), IntVec2::ZERO),
                        (2, shape.clone(), near),
                        (1, room.clone(), near - far),
                    ];
                    if solved_implies_valid(&fx, &moves) {
                        solved += 1;
                    }
                }
            }
        }
        assert!(solved > 0);
    }

    proptest! {
        #[test]
        fn prop_solved_corridor_layout_validates(
            room_at in (-10i32..11, -10i32..11),
            corridor_at in (-8i32..9, -8i32..9),
            vertical in any::<bool>(),
        ) {
            let fx = Fixture::rooms_with_corridor();
            let corridor = fx.shape(if vertical { CORRIDOR_V } else { CORRIDOR_H });
            solved_implies_valid(
                &fx,
                &[
                    (0, fx.room(), IntVec2::ZERO),
                    (2, corridor, IntVec2::new(corridor_at.0, corridor_at.1)),
                    (1, fx.room(), IntVec2::new(room_at.0, room_at.1)),
                ],
            );
        }

        #[test]
        fn prop_solved_cycle_validates(
            roots in prop::collection::vec((-6i32..7, -6i32..7, any::<bool>()), 4),
        ) {
            let fx = Fixture::cycle_of_four();
            let moves: Vec<_> = roots
                .iter()
                .enumerate()
                .map(|(node, &(x, y, big))| {
                    (node, if big { fx.big_room() } else { fx.room() }, IntVec2::new(x, y))
                })
                .collect();
            solved_implies_valid(&fx, &moves);
        }
    }
}
