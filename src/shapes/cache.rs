//! Per-world library cache
//!
//! Shape and configuration-space libraries are expensive to resolve and are
//! reused across generation calls for the same target world. The caller owns
//! the cache and picks the `WorldId`; entries are append-only.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use crate::core::types::WorldId;
use crate::shapes::config_space::ConfigurationSpaceLibrary;
use crate::shapes::library::ShapeLibrary;

/// Libraries resolved for one world
#[derive(Debug, Clone)]
pub struct WorldLibraries {
    pub shapes: Arc<ShapeLibrary>,
    pub spaces: Arc<ConfigurationSpaceLibrary>,
}

impl WorldLibraries {
    /// Shapes plus a configuration-space library memoized over them
    pub fn from_shapes(shapes: ShapeLibrary) -> Self {
        let shapes = Arc::new(shapes);
        Self {
            spaces: Arc::new(ConfigurationSpaceLibrary::memoizing(shapes.clone())),
            shapes,
        }
    }
}

#[derive(Debug, Default)]
pub struct LibraryCache {
    worlds: AHashMap<WorldId, WorldLibraries>,
}

impl LibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, world: WorldId) -> Option<&WorldLibraries> {
        self.worlds.get(&world)
    }

    /// Libraries for `world`, resolving them with `build` on first request
    pub fn get_or_insert_with<E>(
        &mut self,
        world: WorldId,
        build: impl FnOnce() -> Result<ShapeLibrary, E>,
    ) -> Result<&WorldLibraries, E> {
        match self.worlds.entry(world) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let shapes = build()?;
                debug!("Resolved {} shapes for {}", shapes.len(), world);
                Ok(&*entry.insert(WorldLibraries::from_shapes(shapes)))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }
}
