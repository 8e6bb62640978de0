//! Bite allowance: where a connector's mouth may sink into a neighbor
//!
//! A connector socket may telescope up to its bite depth into the module it
//! joins. The cells it swallows are legal overlap:
//!
//! - floor on floor along the socket ray (`k` in `0..=depth`),
//! - connector side walls on the neighbor's floor, one lane either side of
//!   the ray,
//! - the neighbor's wall on the connector floor at the door cells, where the
//!   ray meets the neighbor's socket.
//!
//! Nothing is cached: placements move every iteration, so the predicate is
//! evaluated fresh for each pair.

use std::cmp::Ordering;

use crate::core::types::IntVec2;
use crate::shapes::{ModuleKind, ModuleShape, Socket};
use crate::spatial::{AllowedWorldCells, RayLanes, RayMask};

/// Legal-overlap masks for one ordered pair `(a, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BiteAllowance {
    pub floor_floor: AllowedWorldCells,
    pub a_wall_on_b_floor: AllowedWorldCells,
    pub b_wall_on_a_floor: AllowedWorldCells,
    /// How far the connector telescoped (0 = sockets coincide)
    pub depth: i32,
}

impl BiteAllowance {
    /// No legal overlap at all
    pub const NONE: BiteAllowance = BiteAllowance {
        floor_floor: AllowedWorldCells::Empty,
        a_wall_on_b_floor: AllowedWorldCells::Empty,
        b_wall_on_a_floor: AllowedWorldCells::Empty,
        depth: 0,
    };

    fn swapped(self) -> Self {
        Self {
            a_wall_on_b_floor: self.b_wall_on_a_floor,
            b_wall_on_a_floor: self.a_wall_on_b_floor,
            ..self
        }
    }
}

/// Find a socket pairing between two placed modules and the cells it makes
/// legal
///
/// The connector (if exactly one module is a connector) probes with its
/// sockets; for two modules of the same kind the probing side is chosen by a
/// fixed ordering, so `(a, b)` and `(b, a)` always agree on the cells.
/// Returns `None` when no socket pair lines up within bite depth.
pub fn try_get_bite_allowance(
    a: &ModuleShape,
    a_root: IntVec2,
    b: &ModuleShape,
    b_root: IntVec2,
) -> Option<BiteAllowance> {
    let a_probes_first = match (a.kind(), b.kind()) {
        (ModuleKind::Connector, ModuleKind::Room) => true,
        (ModuleKind::Room, ModuleKind::Connector) => false,
        _ => canonical_order(a, a_root, b, b_root) != Ordering::Greater,
    };

    if a_probes_first {
        probe(a, a_root, b, b_root).or_else(|| probe(b, b_root, a, a_root).map(BiteAllowance::swapped))
    } else {
        probe(b, b_root, a, a_root)
            .map(BiteAllowance::swapped)
            .or_else(|| probe(a, a_root, b, b_root))
    }
}

fn canonical_order(a: &ModuleShape, a_root: IntVec2, b: &ModuleShape, b_root: IntVec2) -> Ordering {
    (a.template(), a_root.x, a_root.y).cmp(&(b.template(), b_root.x, b_root.y))
}

/// Allowance with `prober` as `a`: the prober's socket ray must hit a facing
/// socket of `target` within the prober socket's bite depth
fn probe(
    prober: &ModuleShape,
    prober_root: IntVec2,
    target: &ModuleShape,
    target_root: IntVec2,
) -> Option<BiteAllowance> {
    for socket in prober.sockets() {
        let origin = socket.world_origin(prober_root);
        let inward = socket.side.inward();
        for other in target.sockets() {
            if !socket.can_face(other) {
                continue;
            }
            let Some(depth) = ray_depth(socket, origin, inward, other.world_origin(target_root))
            else {
                continue;
            };
            return Some(masks(socket, origin, inward, depth));
        }
    }
    None
}

/// `k` such that `target == origin + k * inward` with `0 <= k <= bite_depth`
#[inline]
fn ray_depth(socket: &Socket, origin: IntVec2, inward: IntVec2, target: IntVec2) -> Option<i32> {
    let d = target - origin;
    let k = d.dot(inward);
    if k < 0 || k > socket.bite_depth as i32 || d != inward * k {
        return None;
    }
    Some(k)
}

fn masks(socket: &Socket, origin: IntVec2, inward: IntVec2, depth: i32) -> BiteAllowance {
    let tangent = socket.side.tangent();
    let width = socket.width as i32;
    let ray = |lanes| RayMask {
        origin,
        inward,
        tangent,
        depth,
        width,
        lanes,
    };

    let door = origin + inward * depth;
    let door_cells = if width <= 3 {
        let cells: Vec<IntVec2> = (0..width).map(|lane| door + tangent * lane).collect();
        AllowedWorldCells::from_cells(&cells)
    } else {
        AllowedWorldCells::Ray(RayMask {
            origin: door,
            depth: 0,
            ..ray(RayLanes::Body)
        })
    };

    BiteAllowance {
        floor_floor: AllowedWorldCells::Ray(ray(RayLanes::Body)),
        a_wall_on_b_floor: AllowedWorldCells::Ray(ray(RayLanes::Flanks)),
        b_wall_on_a_floor: door_cells,
        depth,
    }
}
