//! Placements, search states and the final result

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::types::{CellBounds, EdgeId, IntVec2, NodeId, TemplateId};
use crate::graph::{LayoutGraph, LayoutNodeKey};
use crate::layout::energy::EnergyCache;
use crate::shapes::ModuleShape;

/// One placed module; overwritten in place by search moves
#[derive(Debug, Clone)]
pub struct RoomPlacement {
    pub node: usize,
    pub template: TemplateId,
    pub shape: Arc<ModuleShape>,
    pub root: IntVec2,
}

impl RoomPlacement {
    pub fn new(node: usize, shape: Arc<ModuleShape>, root: IntVec2) -> Self {
        Self {
            node,
            template: shape.template(),
            shape,
            root,
        }
    }

    /// World bounds of the floor cells
    pub fn floor_bounds(&self) -> CellBounds {
        self.shape.floor_bounds().translate(self.root)
    }

    /// World bounds of floor and walls
    pub fn bounds(&self) -> CellBounds {
        self.shape.bounds().translate(self.root)
    }

    /// Overwrite template, shape and root; returns the patch that undoes it
    pub fn apply(&mut self, patch: PlacementPatch) -> PlacementPatch {
        let inverse = PlacementPatch {
            shape: self.shape.clone(),
            root: self.root,
        };
        self.template = patch.shape.template();
        self.shape = patch.shape;
        self.root = patch.root;
        inverse
    }
}

/// The fields a move changes
#[derive(Debug, Clone)]
pub struct PlacementPatch {
    pub shape: Arc<ModuleShape>,
    pub root: IntVec2,
}

impl PlacementPatch {
    pub fn new(shape: Arc<ModuleShape>, root: IntVec2) -> Self {
        Self { shape, root }
    }

    pub fn template(&self) -> TemplateId {
        self.shape.template()
    }
}

/// Everything needed to take back one move bit-for-bit
#[derive(Debug, Clone)]
pub struct MoveUndo {
    pub(crate) node: usize,
    /// `None` when the node was unplaced before the move
    pub(crate) inverse: Option<PlacementPatch>,
    pub(crate) pair_entries: Vec<(usize, f64)>,
    pub(crate) edge_entries: Vec<(usize, f64)>,
    pub(crate) overlap_sum: f64,
    pub(crate) distance_sum: f64,
}

impl MoveUndo {
    pub fn node(&self) -> usize {
        self.node
    }
}

/// One node of the backtracking search tree
///
/// Sibling branches each own a deep copy; nothing is shared between them.
#[derive(Debug, Clone)]
pub struct LayoutState {
    pub rooms: Vec<Option<RoomPlacement>>,
    /// Index of the next chain to place
    pub chain_index: usize,
    pub energy: EnergyCache,
}

impl LayoutState {
    /// Empty state with nothing placed
    pub fn new(node_count: usize) -> Self {
        Self {
            rooms: vec![None; node_count],
            chain_index: 0,
            energy: EnergyCache::new(node_count),
        }
    }

    pub fn placed_count(&self) -> usize {
        self.rooms.iter().filter(|r| r.is_some()).count()
    }
}

/// A placed module in the output
#[derive(Debug, Clone, Serialize)]
pub struct PlacedModule {
    pub template: TemplateId,
    pub name: String,
    pub root: IntVec2,
    #[serde(skip)]
    pub shape: Arc<ModuleShape>,
}

impl PlacedModule {
    /// Floor cells in world coordinates
    pub fn world_floor(&self) -> impl Iterator<Item = IntVec2> + '_ {
        self.shape.floor().iter().map(move |&c| c + self.root)
    }

    /// Wall cells in world coordinates
    pub fn world_walls(&self) -> impl Iterator<Item = IntVec2> + '_ {
        self.shape.walls().iter().map(move |&c| c + self.root)
    }
}

/// Successful generation output
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutResult {
    pub rooms: BTreeMap<NodeId, PlacedModule>,
    pub connectors: BTreeMap<EdgeId, PlacedModule>,
}

impl LayoutResult {
    /// Collect a fully placed state; unplaced nodes are skipped
    pub fn from_state(graph: &LayoutGraph, state: &LayoutState) -> Self {
        let mut result = Self::default();
        for placement in state.rooms.iter().flatten() {
            let module = PlacedModule {
                template: placement.template,
                name: placement.shape.name().to_string(),
                root: placement.root,
                shape: placement.shape.clone(),
            };
            match graph.node(placement.node).key {
                LayoutNodeKey::Room(id) => {
                    result.rooms.insert(id, module);
                }
                LayoutNodeKey::Connector(edge) => {
                    result.connectors.insert(edge, module);
                }
            }
        }
        result
    }

    pub fn room(&self, id: NodeId) -> Option<&PlacedModule> {
        self.rooms.get(&id)
    }

    /// Rooms then connectors, each in id order
    pub fn modules(&self) -> impl Iterator<Item = &PlacedModule> {
        self.rooms.values().chain(self.connectors.values())
    }

    pub fn module_count(&self) -> usize {
        self.rooms.len() + self.connectors.len()
    }

    pub fn to_json(&self) -> crate::core::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Side;

    fn shape(id: u32, size: i32) -> Arc<ModuleShape> {
        Arc::new(ModuleShape::rectangle_room(TemplateId(id), format!("r{}", id), size, size, &Side::ALL).unwrap())
    }

    #[test]
    fn test_apply_returns_inverse_patch() {
        let mut placement = RoomPlacement::new(0, shape(1, 5), IntVec2::ZERO);
        let inverse = placement.apply(PlacementPatch::new(shape(2, 7), IntVec2::new(3, 4)));

        assert_eq!(placement.template, TemplateId(2));
        assert_eq!(placement.bounds(), CellBounds::new(IntVec2::new(3, 4), IntVec2::new(9, 10)));

        placement.apply(inverse);
        assert_eq!(placement.template, TemplateId(1));
        assert_eq!(placement.root, IntVec2::ZERO);
    }

    #[test]
    fn test_result_json_has_roots() {
        let mut result = LayoutResult::default();
        result.rooms.insert(
            NodeId(3),
            PlacedModule {
                template: TemplateId(1),
                name: "hall".to_string(),
                root: IntVec2::new(2, -1),
                shape: shape(1, 5),
            },
        );
        let json = result.to_json().unwrap();
        assert!(json.contains("\"hall\""));
        assert!(json.contains("\"root\""));
        assert_eq!(result.module_count(), 1);
        let floor: Vec<IntVec2> = result.modules().flat_map(|m| m.world_floor()).collect();
        assert_eq!(floor.len(), 9);
        assert!(floor.contains(&IntVec2::new(3, 0)));
    }
}
