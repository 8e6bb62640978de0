//! Dense row-major bitset grid with shifted intersection kernels
//!
//! Every footprint (floor or wall cell set) is rasterized once into a
//! `BitGrid`. Overlap questions between two placed footprints then reduce to
//! word-level ANDs between rows, with the moving grid's row re-aligned to
//! the fixed grid's word boundaries on the fly.

use crate::core::types::{CellBounds, IntVec2};
use crate::spatial::allowed::AllowedWorldCells;

const WORD_BITS: i64 = 64;

/// Dense bitset over a `width` x `height` cell rectangle starting at `min`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitGrid {
    min: IntVec2,
    width: i32,
    height: i32,
    words_per_row: usize,
    words: Vec<u64>,
}

impl BitGrid {
    /// Create an empty grid covering the given rectangle
    pub fn new(min: IntVec2, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let words_per_row = (width as usize).div_ceil(WORD_BITS as usize);
        Self {
            min,
            width,
            height,
            words_per_row,
            words: vec![0; words_per_row * height as usize],
        }
    }

    /// Rasterize a cell set into the tightest grid covering it
    pub fn from_cells(cells: &[IntVec2]) -> Self {
        let Some(bounds) = CellBounds::from_cells(cells.iter()) else {
            return Self::new(IntVec2::ZERO, 0, 0);
        };
        let mut grid = Self::new(bounds.min, bounds.width(), bounds.height());
        for &cell in cells {
            grid.insert(cell);
        }
        grid
    }

    /// Local coordinate of bit (0, 0)
    pub fn min(&self) -> IntVec2 {
        self.min
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Same bits, rectangle moved by `by`
    pub fn translated(&self, by: IntVec2) -> Self {
        Self {
            min: self.min + by,
            ..self.clone()
        }
    }

    #[inline]
    fn row(&self, y: i32) -> &[u64] {
        let start = y as usize * self.words_per_row;
        &self.words[start..start + self.words_per_row]
    }

    #[inline]
    fn index(&self, cell: IntVec2) -> Option<(usize, u32)> {
        let local = cell - self.min;
        if local.x < 0 || local.y < 0 || local.x >= self.width || local.y >= self.height {
            return None;
        }
        let word = local.y as usize * self.words_per_row + (local.x as usize / 64);
        Some((word, (local.x % 64) as u32))
    }

    /// Set a cell (ignored when outside the rectangle)
    pub fn insert(&mut self, cell: IntVec2) {
        if let Some((word, bit)) = self.index(cell) {
            self.words[word] |= 1u64 << bit;
        }
    }

    pub fn contains(&self, cell: IntVec2) -> bool {
        self.index(cell)
            .map(|(word, bit)| self.words[word] & (1u64 << bit) != 0)
            .unwrap_or(false)
    }

    /// Number of set cells
    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Set cells in row-major order (y, then x ascending)
    pub fn cells(&self) -> impl Iterator<Item = IntVec2> + '_ {
        (0..self.height).flat_map(move |y| {
            self.row(y).iter().enumerate().flat_map(move |(w, &word)| {
                BitIter(word).map(move |bit| {
                    self.min + IntVec2::new(w as i32 * 64 + bit as i32, y)
                })
            })
        })
    }

    /// Shift that maps bit indices of `moving` onto bit indices of `fixed`
    /// when the grids are rooted at `fixed_root` and `moving_root`
    pub fn shift_between(
        fixed_root: IntVec2,
        fixed: &BitGrid,
        moving_root: IntVec2,
        moving: &BitGrid,
    ) -> IntVec2 {
        moving_root + moving.min - fixed_root - fixed.min
    }

    /// Intersect in place with `other`, whose bit `i` lands on our bit `i + shift`
    ///
    /// Cells of `self` not covered by `other` are cleared.
    pub fn and_shifted(&mut self, other: &BitGrid, shift: IntVec2) {
        let words_per_row = self.words_per_row;
        for y in 0..self.height {
            let start = y as usize * words_per_row;
            let other_y = y - shift.y;
            if other_y < 0 || other_y >= other.height {
                self.words[start..start + words_per_row].fill(0);
                continue;
            }
            let other_row = other.row(other_y);
            for w in 0..words_per_row {
                let aligned = extract_bits(other_row, w as i64 * WORD_BITS - shift.x as i64);
                self.words[start + w] &= aligned;
            }
        }
    }

    /// Rows of `fixed` that can meet rows of `moving` under `shift`
    #[inline]
    fn overlapping_rows(fixed: &BitGrid, moving: &BitGrid, shift: IntVec2) -> std::ops::Range<i32> {
        let start = shift.y.max(0);
        let end = (moving.height + shift.y).min(fixed.height);
        start..end.max(start)
    }

    /// Word range of a fixed row that can meet the moving row under `shift`
    #[inline]
    fn overlapping_words(fixed: &BitGrid, moving: &BitGrid, shift: IntVec2) -> std::ops::Range<usize> {
        let x_start = shift.x.max(0);
        let x_end = (moving.width + shift.x).min(fixed.width);
        if x_end <= x_start {
            return 0..0;
        }
        (x_start as usize / 64)..((x_end as usize - 1) / 64 + 1)
    }
}

/// Number of cells set in both grids, `moving` bit `i` landing on `fixed`
/// bit `i + shift`
pub fn count_overlaps_shifted(fixed: &BitGrid, moving: &BitGrid, shift: IntVec2) -> u32 {
    let mut count = 0;
    let words = BitGrid::overlapping_words(fixed, moving, shift);
    if words.is_empty() {
        return 0;
    }
    for y in BitGrid::overlapping_rows(fixed, moving, shift) {
        let fixed_row = fixed.row(y);
        let moving_row = moving.row(y - shift.y);
        for w in words.clone() {
            let f = fixed_row[w];
            if f == 0 {
                continue;
            }
            let m = extract_bits(moving_row, w as i64 * WORD_BITS - shift.x as i64);
            count += (f & m).count_ones();
        }
    }
    count
}

/// Like [`count_overlaps_shifted`], but cells whose world coordinate
/// (`fixed_root` + local cell of `fixed`) is allowed are not counted
///
/// With `early_stop_at_two` the walk ends as soon as two illegal cells are
/// found; the returned count is then a lower bound.
pub fn count_illegal_overlaps_shifted(
    fixed: &BitGrid,
    moving: &BitGrid,
    shift: IntVec2,
    fixed_root: IntVec2,
    allowed: &AllowedWorldCells,
    early_stop_at_two: bool,
) -> u32 {
    if allowed.is_empty() {
        let count = count_overlaps_shifted(fixed, moving, shift);
        return if early_stop_at_two { count.min(2) } else { count };
    }

    let origin = fixed_root + fixed.min;
    let words = BitGrid::overlapping_words(fixed, moving, shift);
    if words.is_empty() {
        return 0;
    }
    let mut count = 0;
    for y in BitGrid::overlapping_rows(fixed, moving, shift) {
        let fixed_row = fixed.row(y);
        let moving_row = moving.row(y - shift.y);
        for w in words.clone() {
            let f = fixed_row[w];
            if f == 0 {
                continue;
            }
            let both = f & extract_bits(moving_row, w as i64 * WORD_BITS - shift.x as i64);
            for bit in BitIter(both) {
                let world = origin + IntVec2::new(w as i32 * 64 + bit as i32, y);
                if !allowed.contains(world) {
                    count += 1;
                    if early_stop_at_two && count >= 2 {
                        return count;
                    }
                }
            }
        }
    }
    count
}

/// 64 bits of `row` starting at bit `start` (bits outside the row read as 0)
#[inline]
fn extract_bits(row: &[u64], start: i64) -> u64 {
    let word_at = |i: i64| -> u64 {
        if i >= 0 && (i as usize) < row.len() {
            row[i as usize]
        } else {
            0
        }
    };
    let q = start.div_euclid(WORD_BITS);
    let r = start.rem_euclid(WORD_BITS) as u32;
    if r == 0 {
        word_at(q)
    } else {
        (word_at(q) >> r) | (word_at(q + 1) << (64 - r))
    }
}

/// Positions of set bits, lowest first
struct BitIter(u64);

impl Iterator for BitIter {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(bit)
    }
}
