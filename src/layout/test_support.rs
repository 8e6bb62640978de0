//! Shared fixtures for unit tests

use std::sync::Arc;

use crate::core::config::GeneratorSettings;
use crate::core::types::{NodeId, Side, TemplateId};
use crate::graph::{LayoutGraph, LevelGraph};
use crate::layout::energy::LayoutContext;
use crate::shapes::{ConfigurationSpaceLibrary, ModuleShape, ShapeLibrary, TemplateCatalog};

pub const ROOM: TemplateId = TemplateId(1);
pub const BIG_ROOM: TemplateId = TemplateId(2);
pub const CORRIDOR_H: TemplateId = TemplateId(3);
pub const CORRIDOR_V: TemplateId = TemplateId(4);

pub struct Fixture {
    pub graph: LayoutGraph,
    pub shapes: Arc<ShapeLibrary>,
    pub spaces: ConfigurationSpaceLibrary,
    pub settings: GeneratorSettings,
}

pub fn shapes() -> ShapeLibrary {
    let mut shapes = ShapeLibrary::new();
    shapes.insert(ModuleShape::rectangle_room(ROOM, "room", 5, 5, &Side::ALL).unwrap());
    shapes.insert(ModuleShape::rectangle_room(BIG_ROOM, "big_room", 7, 7, &Side::ALL).unwrap());
    shapes.insert(ModuleShape::corridor(CORRIDOR_H, "corridor_h", 3, true, 1).unwrap());
    shapes.insert(ModuleShape::corridor(CORRIDOR_V, "corridor_v", 3, false, 1).unwrap());
    shapes
}

pub fn catalog() -> TemplateCatalog {
    TemplateCatalog::new()
        .with_default_rooms(vec![ROOM, BIG_ROOM])
        .with_room_type("small", vec![ROOM])
        .with_connection_type("corridor", vec![CORRIDOR_H, CORRIDOR_V])
}

pub fn settings() -> GeneratorSettings {
    GeneratorSettings {
        temperature_steps: 20,
        inner_iterations: 40,
        ..GeneratorSettings::default()
    }
}

impl Fixture {
    pub fn from_level(level: &LevelGraph) -> Self {
        let shapes = Arc::new(shapes());
        Self {
            graph: LayoutGraph::build(level, &catalog()).unwrap(),
            spaces: ConfigurationSpaceLibrary::memoizing(shapes.clone()),
            shapes,
            settings: settings(),
        }
    }

    /// Two rooms joined directly
    pub fn pair_of_rooms() -> Self {
        let mut level = LevelGraph::new();
        level.add_node(NodeId(0), None).add_node(NodeId(1), None);
        level.add_edge(NodeId(0), NodeId(1), None);
        Self::from_level(&level)
    }

    /// Four rooms in a cycle, joined directly
    pub fn cycle_of_four() -> Self {
        let mut level = LevelGraph::new();
        for i in 0..4 {
            level.add_node(NodeId(i), None);
        }
        for i in 0..4 {
            level.add_edge(NodeId(i), NodeId((i + 1) % 4), None);
        }
        Self::from_level(&level)
    }

    /// Two small rooms joined by a corridor connector (node 2)
    pub fn rooms_with_corridor() -> Self {
        let mut level = LevelGraph::new();
        level.add_node(NodeId(0), Some("small")).add_node(NodeId(1), Some("small"));
        level.add_edge(NodeId(0), NodeId(1), Some("corridor"));
        Self::from_level(&level)
    }

    pub fn ctx(&self) -> LayoutContext<'_> {
        LayoutContext {
            graph: &self.graph,
            shapes: self.shapes.as_ref(),
            spaces: &self.spaces,
            settings: &self.settings,
        }
    }

    pub fn shape(&self, template: TemplateId) -> Arc<ModuleShape> {
        self.shapes.get(template).cloned().unwrap()
    }

    pub fn room(&self) -> Arc<ModuleShape> {
        self.shape(ROOM)
    }

    pub fn big_room(&self) -> Arc<ModuleShape> {
        self.shape(BIG_ROOM)
    }

    pub fn corridor_h(&self) -> Arc<ModuleShape> {
        self.shape(CORRIDOR_H)
    }
}
