//! Resolved module footprints

use std::sync::OnceLock;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::error::{LayoutError, Result};
use crate::core::types::{CellBounds, IntVec2, Side, TemplateId};
use crate::shapes::socket::Socket;
use crate::spatial::BitGrid;

/// Whether a module is a room or a connector that joins two rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    #[default]
    Room,
    Connector,
}

/// Footprint of one template: floor cells, wall cells and sockets in local
/// coordinates
///
/// Bitset rasters of the floor and wall sets are built on first use and
/// kept for the lifetime of the shape.
#[derive(Debug)]
pub struct ModuleShape {
    template: TemplateId,
    name: String,
    kind: ModuleKind,
    floor: Vec<IntVec2>,
    walls: Vec<IntVec2>,
    sockets: Vec<Socket>,
    floor_bounds: CellBounds,
    wall_bounds: Option<CellBounds>,
    bounds: CellBounds,
    floor_lookup: AHashSet<IntVec2>,
    wall_lookup: AHashSet<IntVec2>,
    floor_bits: OnceLock<BitGrid>,
    wall_bits: OnceLock<BitGrid>,
}

impl ModuleShape {
    /// Build a shape from explicit cell lists
    ///
    /// Cells are sorted and deduplicated. A cell listed as both floor and
    /// wall is kept as wall. The floor must not be empty.
    pub fn new(
        template: TemplateId,
        name: impl Into<String>,
        kind: ModuleKind,
        floor: Vec<IntVec2>,
        walls: Vec<IntVec2>,
        sockets: Vec<Socket>,
    ) -> Result<Self> {
        let name = name.into();
        let mut walls = walls;
        walls.sort_by_key(|c| (c.y, c.x));
        walls.dedup();
        let wall_lookup: AHashSet<IntVec2> = walls.iter().copied().collect();

        let mut floor: Vec<IntVec2> = floor
            .into_iter()
            .filter(|c| !wall_lookup.contains(c))
            .collect();
        floor.sort_by_key(|c| (c.y, c.x));
        floor.dedup();

        let Some(floor_bounds) = CellBounds::from_cells(floor.iter()) else {
            return Err(LayoutError::InvalidShape {
                template,
                reason: format!("'{}' has no floor cells", name),
            });
        };
        let wall_bounds = CellBounds::from_cells(walls.iter());
        let bounds = wall_bounds
            .map(|w| w.union(&floor_bounds))
            .unwrap_or(floor_bounds);

        for socket in &sockets {
            if socket.width == 0 {
                return Err(LayoutError::InvalidShape {
                    template,
                    reason: format!("'{}' has a zero-width socket", name),
                });
            }
        }

        Ok(Self {
            template,
            name,
            kind,
            floor_lookup: floor.iter().copied().collect(),
            floor,
            walls,
            sockets,
            floor_bounds,
            wall_bounds,
            bounds,
            wall_lookup,
            floor_bits: OnceLock::new(),
            wall_bits: OnceLock::new(),
        })
    }

    /// Parse an ASCII footprint: `#` wall, `.` floor, anything else empty
    ///
    /// The first row is the northernmost (highest `y`); column 0 is `x = 0`.
    pub fn from_rows(
        template: TemplateId,
        name: impl Into<String>,
        kind: ModuleKind,
        rows: &[&str],
        sockets: Vec<Socket>,
    ) -> Result<Self> {
        let mut floor = Vec::new();
        let mut walls = Vec::new();
        let top = rows.len() as i32 - 1;
        for (r, row) in rows.iter().enumerate() {
            let y = top - r as i32;
            for (x, ch) in row.chars().enumerate() {
                let cell = IntVec2::new(x as i32, y);
                match ch {
                    '#' => walls.push(cell),
                    '.' => floor.push(cell),
                    _ => {}
                }
            }
        }
        Self::new(template, name, kind, floor, walls, sockets)
    }

    /// Rectangular room: `width` x `height` including a one-cell wall ring,
    /// with a single-cell socket centred on each requested side
    pub fn rectangle_room(
        template: TemplateId,
        name: impl Into<String>,
        width: i32,
        height: i32,
        sides: &[Side],
    ) -> Result<Self> {
        let mut floor = Vec::new();
        let mut walls = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let cell = IntVec2::new(x, y);
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    walls.push(cell);
                } else {
                    floor.push(cell);
                }
            }
        }
        let sockets = sides
            .iter()
            .map(|&side| {
                let offset = match side {
                    Side::North => IntVec2::new(width / 2, height - 1),
                    Side::South => IntVec2::new(width / 2, 0),
                    Side::East => IntVec2::new(width - 1, height / 2),
                    Side::West => IntVec2::new(0, height / 2),
                };
                Socket::new(side, offset)
            })
            .collect();
        Self::new(template, name, ModuleKind::Room, floor, walls, sockets)
    }

    /// Straight one-cell-wide corridor of `length` floor cells with side
    /// walls and a socket at each open end
    pub fn corridor(
        template: TemplateId,
        name: impl Into<String>,
        length: i32,
        horizontal: bool,
        bite_depth: u32,
    ) -> Result<Self> {
        let mut floor = Vec::new();
        let mut walls = Vec::new();
        for i in 0..length.max(1) {
            if horizontal {
                floor.push(IntVec2::new(i, 0));
                walls.push(IntVec2::new(i, -1));
                walls.push(IntVec2::new(i, 1));
            } else {
                floor.push(IntVec2::new(0, i));
                walls.push(IntVec2::new(-1, i));
                walls.push(IntVec2::new(1, i));
            }
        }
        let last = length.max(1) - 1;
        let sockets = if horizontal {
            vec![
                Socket::new(Side::West, IntVec2::new(0, 0)).with_bite_depth(bite_depth),
                Socket::new(Side::East, IntVec2::new(last, 0)).with_bite_depth(bite_depth),
            ]
        } else {
            vec![
                Socket::new(Side::South, IntVec2::new(0, 0)).with_bite_depth(bite_depth),
                Socket::new(Side::North, IntVec2::new(0, last)).with_bite_depth(bite_depth),
            ]
        };
        Self::new(template, name, ModuleKind::Connector, floor, walls, sockets)
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn is_connector(&self) -> bool {
        self.kind == ModuleKind::Connector
    }

    pub fn floor(&self) -> &[IntVec2] {
        &self.floor
    }

    pub fn walls(&self) -> &[IntVec2] {
        &self.walls
    }

    pub fn sockets(&self) -> &[Socket] {
        &self.sockets
    }

    pub fn floor_bounds(&self) -> CellBounds {
        self.floor_bounds
    }

    pub fn wall_bounds(&self) -> Option<CellBounds> {
        self.wall_bounds
    }

    /// Bounds of floor and walls together
    pub fn bounds(&self) -> CellBounds {
        self.bounds
    }

    pub fn has_floor(&self, local: IntVec2) -> bool {
        self.floor_lookup.contains(&local)
    }

    pub fn has_wall(&self, local: IntVec2) -> bool {
        self.wall_lookup.contains(&local)
    }

    pub fn floor_bits(&self) -> &BitGrid {
        self.floor_bits.get_or_init(|| BitGrid::from_cells(&self.floor))
    }

    pub fn wall_bits(&self) -> &BitGrid {
        self.wall_bits.get_or_init(|| BitGrid::from_cells(&self.walls))
    }

    /// Socket count per side, in `Side::ALL` order
    pub fn sockets_per_side(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for socket in &self.sockets {
            let slot = Side::ALL.iter().position(|&s| s == socket.side).unwrap_or(0);
            counts[slot] += 1;
        }
        counts
    }
}
