//! Shared builders for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use citadel_layout::core::types::{IntVec2, NodeId, Side, TemplateId};
use citadel_layout::graph::LevelGraph;
use citadel_layout::layout::{GenerationRequest, LayoutGenerator, LayoutResult, PlacedModule};
use citadel_layout::shapes::{
    ConfigurationSpaceLibrary, ConfigurationSpaceSource, ModuleKind, ModuleShape, ShapeLibrary, Socket,
    TemplateCatalog,
};
use citadel_layout::{GeneratorSettings, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const ROOM: TemplateId = TemplateId(1);
pub const EAST_DOOR: TemplateId = TemplateId(2);
pub const WEST_DOOR: TemplateId = TemplateId(3);
pub const NORTH_DOOR: TemplateId = TemplateId(4);
pub const HALL: TemplateId = TemplateId(5);

/// Libraries shared by every scenario: a 5x5 room, one-socket 3x3 rooms
/// and a flush three-cell corridor
pub struct Libraries {
    pub shapes: Arc<ShapeLibrary>,
    pub spaces: ConfigurationSpaceLibrary,
}

impl Libraries {
    pub fn new() -> Self {
        let mut shapes = ShapeLibrary::new();
        shapes.insert(ModuleShape::rectangle_room(ROOM, "room", 5, 5, &Side::ALL).unwrap());
        shapes.insert(one_door(EAST_DOOR, "east_door", Side::East, IntVec2::new(2, 1)));
        shapes.insert(one_door(WEST_DOOR, "west_door", Side::West, IntVec2::new(0, 1)));
        shapes.insert(one_door(NORTH_DOOR, "north_door", Side::North, IntVec2::new(1, 2)));
        shapes.insert(ModuleShape::corridor(HALL, "hall", 3, true, 0).unwrap());
        let shapes = Arc::new(shapes);
        Self {
            spaces: ConfigurationSpaceLibrary::memoizing(shapes.clone()),
            shapes,
        }
    }

    pub fn generate(
        &self,
        level: &LevelGraph,
        catalog: &TemplateCatalog,
        settings: GeneratorSettings,
        seed: u64,
    ) -> Result<LayoutResult> {
        let request = GenerationRequest::new(level, catalog, self.shapes.as_ref(), &self.spaces);
        LayoutGenerator::new(settings)?.try_generate(&request, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Whether `b` sits in one of `a`'s configuration-space offsets
    pub fn touches(&self, a: &PlacedModule, b: &PlacedModule) -> bool {
        self.spaces
            .space(a.template, b.template)
            .map(|space| space.contains(b.root - a.root))
            .unwrap_or(false)
    }
}

fn one_door(template: TemplateId, name: &str, side: Side, offset: IntVec2) -> ModuleShape {
    ModuleShape::from_rows(
        template,
        name,
        ModuleKind::Room,
        &["###", "#.#", "###"],
        vec![Socket::new(side, offset)],
    )
    .unwrap()
}

pub fn catalog() -> TemplateCatalog {
    TemplateCatalog::new()
        .with_default_rooms(vec![ROOM])
        .with_room_type("left", vec![EAST_DOOR])
        .with_room_type("right", vec![WEST_DOOR])
        .with_room_type("attic", vec![NORTH_DOOR])
        .with_room_type("vault", vec![])
        .with_connection_type("hall", vec![HALL])
}

pub fn settings() -> GeneratorSettings {
    GeneratorSettings {
        temperature_steps: 20,
        inner_iterations: 40,
        ..GeneratorSettings::default()
    }
}

/// `n` default rooms joined directly in a ring
pub fn ring(n: u32) -> LevelGraph {
    let mut level = LevelGraph::new();
    for i in 0..n {
        level.add_node(NodeId(i), None);
    }
    for i in 0..n {
        level.add_edge(NodeId(i), NodeId((i + 1) % n), None);
    }
    level
}
