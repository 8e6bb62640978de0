//! ASCII preview of a finished layout
//!
//! `#` wall, `.` floor, space for empty. Floor wins over wall so doors cut
//! through shared walls show up. North is up.

use ahash::AHashSet;

use crate::core::types::{CellBounds, IntVec2};
use crate::layout::placement::LayoutResult;

const WALL: char = '#';
const FLOOR: char = '.';
const EMPTY: char = ' ';

/// Render every module of `result` into a text grid, one line per row
pub fn render_ascii(result: &LayoutResult) -> String {
    let floor: AHashSet<IntVec2> = result.modules().flat_map(|m| m.world_floor()).collect();
    let walls: AHashSet<IntVec2> = result.modules().flat_map(|m| m.world_walls()).collect();

    let Some(bounds) = CellBounds::from_cells(floor.iter().chain(walls.iter())) else {
        return String::new();
    };

    let mut out = String::with_capacity(((bounds.width() + 1) * bounds.height()) as usize);
    for y in (bounds.min.y..=bounds.max.y).rev() {
        let mut row = String::with_capacity(bounds.width() as usize);
        for x in bounds.min.x..=bounds.max.x {
            let cell = IntVec2::new(x, y);
            let ch = if floor.contains(&cell) {
                FLOOR
            } else if walls.contains(&cell) {
                WALL
            } else {
                EMPTY
            };
            row.push(ch);
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}
