//! Configuration spaces: where one template may sit relative to another
//!
//! For an ordered `(fixed, moving)` template pair the space is the set of
//! translations `moving_root - fixed_root` at which a socket pair lines up
//! (within bite depth) and the two footprints have no illegal overlap.

use std::sync::{Arc, OnceLock, RwLock};

use ahash::{AHashMap, AHashSet};

use crate::core::types::{IntVec2, TemplateId};
use crate::layout::bite::try_get_bite_allowance;
use crate::layout::overlap::count_illegal_overlap;
use crate::shapes::library::{ShapeLibrary, ShapeSource};
use crate::shapes::shape::ModuleShape;
use crate::spatial::BitGrid;

/// Valid relative translations for one ordered template pair
#[derive(Debug, Default)]
pub struct ConfigurationSpace {
    /// Insertion order is kept; candidate generation iterates this list
    offsets: Vec<IntVec2>,
    lookup: AHashSet<IntVec2>,
    bits: OnceLock<BitGrid>,
}

impl ConfigurationSpace {
    /// Build from an offset list, dropping duplicates but keeping first-seen order
    pub fn from_offsets(offsets: impl IntoIterator<Item = IntVec2>) -> Self {
        let mut lookup = AHashSet::new();
        let offsets = offsets.into_iter().filter(|o| lookup.insert(*o)).collect();
        Self {
            offsets,
            lookup,
            bits: OnceLock::new(),
        }
    }

    /// Reference builder: enumerate facing socket pairs of `fixed` and
    /// `moving`, including every telescoped offset allowed by either
    /// socket's bite depth, and keep offsets with zero illegal overlap
    pub fn between(fixed: &ModuleShape, moving: &ModuleShape) -> Self {
        let mut raw = Vec::new();
        for sf in fixed.sockets() {
            for sm in moving.sockets() {
                if !sf.can_face(sm) {
                    continue;
                }
                let flush = sf.offset - sm.offset;
                for k in 0..=sm.bite_depth as i32 {
                    raw.push(flush - sm.side.inward() * k);
                }
                for k in 1..=sf.bite_depth as i32 {
                    raw.push(flush + sf.side.inward() * k);
                }
            }
        }

        let mut seen = AHashSet::new();
        let offsets = raw.into_iter().filter(|&offset| {
            if !seen.insert(offset) {
                return false;
            }
            let Some(allowance) = try_get_bite_allowance(fixed, IntVec2::ZERO, moving, offset) else {
                return false;
            };
            count_illegal_overlap(fixed, IntVec2::ZERO, moving, offset, &allowance, true, true) == 0
        });
        Self::from_offsets(offsets.collect::<Vec<_>>())
    }

    pub fn offsets(&self) -> &[IntVec2] {
        &self.offsets
    }

    #[inline]
    pub fn contains(&self, offset: IntVec2) -> bool {
        self.lookup.contains(&offset)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offsets rasterized into a bitset, built on first use
    pub fn bits(&self) -> &BitGrid {
        self.bits.get_or_init(|| BitGrid::from_cells(&self.offsets))
    }
}

/// Anything that can answer configuration-space queries
///
/// `None` means the pair is unknown to the source; an empty space means the
/// pair is known and can never touch.
pub trait ConfigurationSpaceSource {
    fn space(&self, fixed: TemplateId, moving: TemplateId) -> Option<Arc<ConfigurationSpace>>;
}

/// In-memory configuration-space store
///
/// With a backing shape library, missing pairs are computed with
/// [`ConfigurationSpace::between`] and memoized. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ConfigurationSpaceLibrary {
    spaces: RwLock<AHashMap<(TemplateId, TemplateId), Arc<ConfigurationSpace>>>,
    shapes: Option<Arc<ShapeLibrary>>,
}

impl ConfigurationSpaceLibrary {
    /// Store with explicit entries only
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that computes missing pairs from `shapes`
    pub fn memoizing(shapes: Arc<ShapeLibrary>) -> Self {
        Self {
            spaces: RwLock::default(),
            shapes: Some(shapes),
        }
    }

    pub fn insert(&self, fixed: TemplateId, moving: TemplateId, space: ConfigurationSpace) {
        let mut spaces = self.spaces.write().unwrap_or_else(|e| e.into_inner());
        spaces.insert((fixed, moving), Arc::new(space));
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.spaces.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigurationSpaceSource for ConfigurationSpaceLibrary {
    fn space(&self, fixed: TemplateId, moving: TemplateId) -> Option<Arc<ConfigurationSpace>> {
        if let Some(space) = self
            .spaces
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(fixed, moving))
        {
            return Some(space.clone());
        }

        let shapes = self.shapes.as_ref()?;
        let fixed_shape = shapes.shape(fixed)?;
        let moving_shape = shapes.shape(moving)?;
        let space = Arc::new(ConfigurationSpace::between(&fixed_shape, &moving_shape));

        let mut spaces = self.spaces.write().unwrap_or_else(|e| e.into_inner());
        Some(spaces.entry((fixed, moving)).or_insert(space).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Side;

    fn room(id: u32) -> ModuleShape {
        ModuleShape::rectangle_room(TemplateId(id), "room", 5, 5, &Side::ALL).unwrap()
    }

    #[test]
    fn test_rooms_share_walls_on_each_side() {
        let space = ConfigurationSpace::between(&room(1), &room(2));
        let mut offsets = space.offsets().to_vec();
        offsets.sort_by_key(|o| (o.y, o.x));
        assert_eq!(
            offsets,
            vec![
                IntVec2::new(0, -4),
                IntVec2::new(-4, 0),
                IntVec2::new(4, 0),
                IntVec2::new(0, 4),
            ]
        );
        assert!(space.contains(IntVec2::new(4, 0)));
        assert!(!space.contains(IntVec2::new(5, 0)));
    }

    #[test]
    fn test_connector_space_includes_telescoped_offsets() {
        let r = room(1);
        let c = ModuleShape::corridor(TemplateId(2), "corridor", 3, true, 1).unwrap();
        let space = ConfigurationSpace::between(&r, &c);
        // east socket at (4, 2): flush and one cell deep
        assert!(space.contains(IntVec2::new(4, 2)));
        assert!(space.contains(IntVec2::new(3, 2)));
        assert!(!space.contains(IntVec2::new(2, 2)));
        // west socket at (0, 2): corridor east mouth at local (2, 0)
        assert!(space.contains(IntVec2::new(-2, 2)));
        assert!(space.contains(IntVec2::new(-1, 2)));
    }

    #[test]
    fn test_space_is_antisymmetric() {
        let r = room(1);
        let c = ModuleShape::corridor(TemplateId(2), "corridor", 4, false, 1).unwrap();
        let forward = ConfigurationSpace::between(&r, &c);
        let backward = ConfigurationSpace::between(&c, &r);
        assert_eq!(forward.len(), backward.len());
        for &offset in forward.offsets() {
            assert!(backward.contains(-offset), "missing {:?}", -offset);
        }
    }

    #[test]
    fn test_incompatible_sockets_give_empty_space() {
        let a = ModuleShape::rectangle_room(TemplateId(1), "a", 5, 5, &[Side::North]).unwrap();
        let b = ModuleShape::rectangle_room(TemplateId(2), "b", 5, 5, &[Side::North]).unwrap();
        assert!(ConfigurationSpace::between(&a, &b).is_empty());
    }

    #[test]
    fn test_memoizing_library_computes_once() {
        let mut shapes = ShapeLibrary::new();
        shapes.insert(room(1));
        shapes.insert(room(2));
        let library = ConfigurationSpaceLibrary::memoizing(Arc::new(shapes));

        let first = library.space(TemplateId(1), TemplateId(2)).unwrap();
        let second = library.space(TemplateId(1), TemplateId(2)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(library.len(), 1);
        assert!(library.space(TemplateId(1), TemplateId(9)).is_none());
    }

    #[test]
    fn test_explicit_library_has_no_fallback() {
        let library = ConfigurationSpaceLibrary::new();
        library.insert(
            TemplateId(1),
            TemplateId(2),
            ConfigurationSpace::from_offsets([IntVec2::X, IntVec2::X, IntVec2::Y]),
        );
        let space = library.space(TemplateId(1), TemplateId(2)).unwrap();
        assert_eq!(space.offsets(), &[IntVec2::X, IntVec2::Y]);
        assert!(library.space(TemplateId(2), TemplateId(1)).is_none());
    }
}
