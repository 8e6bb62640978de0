//! Legal-overlap predicates in world space

use crate::core::types::IntVec2;

/// Which lanes of a ray mask are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayLanes {
    /// Lanes `0..width` (the socket mouth itself)
    Body,
    /// Lanes `-1` and `width` (the flanking side walls)
    Flanks,
}

/// Cells `origin + k * inward + lane * tangent` for `k` in `0..=depth`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayMask {
    pub origin: IntVec2,
    pub inward: IntVec2,
    pub tangent: IntVec2,
    pub depth: i32,
    pub width: i32,
    pub lanes: RayLanes,
}

impl RayMask {
    #[inline]
    pub fn contains(&self, cell: IntVec2) -> bool {
        let d = cell - self.origin;
        let k = d.dot(self.inward);
        if k < 0 || k > self.depth {
            return false;
        }
        let lane = d.dot(self.tangent);
        match self.lanes {
            RayLanes::Body => lane >= 0 && lane < self.width,
            RayLanes::Flanks => lane == -1 || lane == self.width,
        }
    }

    fn lanes(&self) -> Vec<i32> {
        match self.lanes {
            RayLanes::Body => (0..self.width).collect(),
            RayLanes::Flanks => vec![-1, self.width],
        }
    }
}

/// World cells where an otherwise illegal overlap is tolerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowedWorldCells {
    #[default]
    Empty,
    /// Up to three explicit cells
    Cells { cells: [IntVec2; 3], len: u8 },
    Ray(RayMask),
}

impl AllowedWorldCells {
    /// Explicit cells; anything past the third is dropped
    pub fn from_cells(cells: &[IntVec2]) -> Self {
        if cells.is_empty() {
            return Self::Empty;
        }
        let mut packed = [IntVec2::ZERO; 3];
        let len = cells.len().min(3);
        packed[..len].copy_from_slice(&cells[..len]);
        Self::Cells {
            cells: packed,
            len: len as u8,
        }
    }

    pub fn single(cell: IntVec2) -> Self {
        Self::from_cells(&[cell])
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub fn contains(&self, cell: IntVec2) -> bool {
        match self {
            Self::Empty => false,
            Self::Cells { cells, len } => cells[..*len as usize].contains(&cell),
            Self::Ray(mask) => mask.contains(cell),
        }
    }

    /// Every allowed cell, sorted by (y, x)
    pub fn world_cells(&self) -> Vec<IntVec2> {
        let mut out = match self {
            Self::Empty => Vec::new(),
            Self::Cells { cells, len } => cells[..*len as usize].to_vec(),
            Self::Ray(mask) => {
                let mut out = Vec::new();
                for k in 0..=mask.depth {
                    for lane in mask.lanes() {
                        out.push(mask.origin + mask.inward * k + mask.tangent * lane);
                    }
                }
                out
            }
        };
        out.sort_by_key(|c| (c.y, c.x));
        out.dedup();
        out
    }
}
