//! Connection points on a module boundary

use serde::{Deserialize, Serialize};

use crate::core::types::{IntVec2, Side};

/// A door-capable opening on one side of a module footprint
///
/// `offset` is the first socket cell in local coordinates; the socket covers
/// `width` cells along [`Side::tangent`]. For rooms the socket cells sit in
/// the wall ring, for connectors they are the mouth floor cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Socket {
    pub side: Side,
    pub offset: IntVec2,
    #[serde(default = "default_width")]
    pub width: u32,
    /// How many cells this socket may telescope into the module it joins
    #[serde(default)]
    pub bite_depth: u32,
}

fn default_width() -> u32 {
    1
}

impl Socket {
    pub fn new(side: Side, offset: IntVec2) -> Self {
        Self {
            side,
            offset,
            width: 1,
            bite_depth: 0,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_bite_depth(mut self, bite_depth: u32) -> Self {
        self.bite_depth = bite_depth;
        self
    }

    /// Local cells covered by the socket
    pub fn cells(&self) -> impl Iterator<Item = IntVec2> + '_ {
        let tangent = self.side.tangent();
        (0..self.width as i32).map(move |lane| self.offset + tangent * lane)
    }

    /// World position of the first socket cell for a module rooted at `root`
    #[inline]
    pub fn world_origin(&self, root: IntVec2) -> IntVec2 {
        root + self.offset
    }

    /// Whether two sockets can face each other at all
    pub fn can_face(&self, other: &Socket) -> bool {
        self.side.opposite() == other.side && self.width == other.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_cells_follow_tangent() {
        let socket = Socket::new(Side::North, IntVec2::new(2, 4)).with_width(3);
        let cells: Vec<IntVec2> = socket.cells().collect();
        assert_eq!(
            cells,
            vec![IntVec2::new(2, 4), IntVec2::new(3, 4), IntVec2::new(4, 4)]
        );
    }

    #[test]
    fn test_can_face_requires_opposite_side_and_width() {
        let east = Socket::new(Side::East, IntVec2::ZERO);
        let west = Socket::new(Side::West, IntVec2::ZERO);
        let wide_west = west.with_width(2);
        assert!(east.can_face(&west));
        assert!(!east.can_face(&east));
        assert!(!east.can_face(&wide_west));
    }
}
