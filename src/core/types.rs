//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Integer grid vector (cells, offsets, roots)
pub type IntVec2 = glam::IVec2;

/// Identifier of a node in the caller's level graph
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct NodeId(pub u32);

/// Index of an edge in the caller's level graph
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display(fmt = "e{}", _0)]
pub struct EdgeId(pub u32);

/// Opaque handle for a module template (room or connector blueprint)
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display(fmt = "t{}", _0)]
pub struct TemplateId(pub u32);

/// Opaque identifier of the target world a set of libraries was resolved for
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display(fmt = "world{}", _0)]
pub struct WorldId(pub u64);

/// Side of a module footprint
///
/// `y` grows north, `x` grows east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::East => Side::West,
            Side::South => Side::North,
            Side::West => Side::East,
        }
    }

    /// Unit vector pointing out of the footprint through this side
    pub fn outward(self) -> IntVec2 {
        match self {
            Side::North => IntVec2::new(0, 1),
            Side::East => IntVec2::new(1, 0),
            Side::South => IntVec2::new(0, -1),
            Side::West => IntVec2::new(-1, 0),
        }
    }

    /// Unit vector pointing from this side into the footprint
    pub fn inward(self) -> IntVec2 {
        -self.outward()
    }

    /// Direction a socket's width extends along
    ///
    /// Always +x for north/south and +y for east/west, so opposing sockets
    /// share the same tangent and their first cells line up.
    pub fn tangent(self) -> IntVec2 {
        match self {
            Side::North | Side::South => IntVec2::new(1, 0),
            Side::East | Side::West => IntVec2::new(0, 1),
        }
    }
}

/// Inclusive axis-aligned cell rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellBounds {
    pub min: IntVec2,
    pub max: IntVec2,
}

impl CellBounds {
    pub fn new(min: IntVec2, max: IntVec2) -> Self {
        Self { min, max }
    }

    /// Bounds of a cell set, or `None` when it is empty
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a IntVec2>) -> Option<Self> {
        let mut iter = cells.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self::new(first, first);
        for &cell in iter {
            bounds.min = bounds.min.min(cell);
            bounds.max = bounds.max.max(cell);
        }
        Some(bounds)
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    pub fn translate(&self, by: IntVec2) -> Self {
        Self::new(self.min + by, self.max + by)
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn contains(&self, cell: IntVec2) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Per-axis gap between two rectangles (zero when they overlap on that axis)
    pub fn gap(&self, other: &Self) -> IntVec2 {
        let gx = (other.min.x - self.max.x).max(self.min.x - other.max.x).max(0);
        let gy = (other.min.y - self.max.y).max(self.min.y - other.max.y).max(0);
        IntVec2::new(gx, gy)
    }
}

/// Chebyshev (king-move) distance between two cells
pub fn chebyshev(a: IntVec2, b: IntVec2) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}

/// Manhattan distance between two cells
pub fn manhattan(a: IntVec2, b: IntVec2) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_vectors_are_consistent() {
        for side in Side::ALL {
            assert_eq!(side.outward(), -side.opposite().outward());
            assert_eq!(side.tangent(), side.opposite().tangent());
            assert_eq!(side.outward().dot(side.tangent()), 0);
        }
    }

    #[test]
    fn test_bounds_gap_and_intersection() {
        let a = CellBounds::new(IntVec2::new(0, 0), IntVec2::new(4, 4));
        let b = CellBounds::new(IntVec2::new(4, 0), IntVec2::new(8, 4));
        let c = CellBounds::new(IntVec2::new(10, 7), IntVec2::new(12, 9));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.gap(&b), IntVec2::ZERO);
        assert_eq!(a.gap(&c), IntVec2::new(6, 3));
        assert_eq!(c.gap(&a), IntVec2::new(6, 3));
    }

    #[test]
    fn test_bounds_from_cells() {
        let cells = [IntVec2::new(2, -1), IntVec2::new(-3, 5), IntVec2::new(0, 0)];
        let bounds = CellBounds::from_cells(cells.iter()).unwrap();
        assert_eq!(bounds.min, IntVec2::new(-3, -1));
        assert_eq!(bounds.max, IntVec2::new(2, 5));
        assert_eq!(bounds.width(), 6);
        assert_eq!(bounds.height(), 7);
        assert!(CellBounds::from_cells([].iter()).is_none());
    }

    #[test]
    fn test_distances() {
        let a = IntVec2::new(1, 2);
        let b = IntVec2::new(4, -2);
        assert_eq!(chebyshev(a, b), 4);
        assert_eq!(manhattan(a, b), 7);
    }
}
