//! TOML scenario files
//!
//! One file describes a whole generation run: seed, target world, settings,
//! module templates, the room/connection type catalog and the level graph.
//! Templates are referenced by name everywhere else in the file and get
//! numeric ids in declaration order, starting at 1.
//!
//! ```toml
//! seed = 7
//! default_rooms = ["hall"]
//!
//! [[templates]]
//! name = "hall"
//! rectangle = [5, 5]
//!
//! [[graph.nodes]]
//! id = 0
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use rand::Rng;
use serde::Deserialize;

use crate::core::config::GeneratorSettings;
use crate::core::error::{LayoutError, Result};
use crate::core::types::{Side, TemplateId, WorldId};
use crate::graph::LevelGraph;
use crate::layout::{GenerationRequest, LayoutGenerator, LayoutResult};
use crate::shapes::{LibraryCache, ModuleKind, ModuleShape, ShapeLibrary, Socket, TemplateCatalog, WorldLibraries};

/// Straight corridor shorthand
#[derive(Debug, Clone, Deserialize)]
pub struct CorridorDef {
    pub length: i32,
    #[serde(default = "default_horizontal")]
    pub horizontal: bool,
    #[serde(default)]
    pub bite_depth: u32,
}

fn default_horizontal() -> bool {
    true
}

/// One module template; exactly one of `rows`, `rectangle` or `corridor`
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    #[serde(default)]
    pub kind: ModuleKind,
    /// ASCII footprint, northernmost row first
    #[serde(default)]
    pub rows: Option<Vec<String>>,
    /// Walled rectangle `[width, height]` with a centred socket per side
    #[serde(default)]
    pub rectangle: Option<[i32; 2]>,
    #[serde(default)]
    pub corridor: Option<CorridorDef>,
    /// Sockets for a `rows` footprint
    #[serde(default)]
    pub sockets: Vec<Socket>,
}

impl TemplateDef {
    fn build(&self, template: TemplateId) -> Result<ModuleShape> {
        match (&self.rows, self.rectangle, &self.corridor) {
            (Some(rows), None, None) => {
                let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
                ModuleShape::from_rows(template, self.name.as_str(), self.kind, &rows, self.sockets.clone())
            }
            (None, Some([width, height]), None) => {
                ModuleShape::rectangle_room(template, self.name.as_str(), width, height, &Side::ALL)
            }
            (None, None, Some(c)) => {
                ModuleShape::corridor(template, self.name.as_str(), c.length, c.horizontal, c.bite_depth)
            }
            _ => Err(LayoutError::Scenario(format!(
                "template '{}' needs exactly one of rows, rectangle or corridor",
                self.name
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub seed: u64,
    /// Library cache key for this scenario's templates
    #[serde(default)]
    pub world: u64,
    #[serde(default)]
    pub settings: GeneratorSettings,
    pub templates: Vec<TemplateDef>,
    #[serde(default)]
    pub room_types: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub connection_types: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub default_rooms: Vec<String>,
    #[serde(default)]
    pub default_connectors: Vec<String>,
    pub graph: LevelGraph,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.settings.validate()?;
        Ok(scenario)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn world_id(&self) -> WorldId {
        WorldId(self.world)
    }

    fn template_ids(&self) -> Result<AHashMap<&str, TemplateId>> {
        let mut ids = AHashMap::with_capacity(self.templates.len());
        for (i, def) in self.templates.iter().enumerate() {
            if ids.insert(def.name.as_str(), TemplateId(i as u32 + 1)).is_some() {
                return Err(LayoutError::Scenario(format!(
                    "template '{}' is declared more than once",
                    def.name
                )));
            }
        }
        Ok(ids)
    }

    /// Resolve every template into a shape
    pub fn build_shapes(&self) -> Result<ShapeLibrary> {
        let ids = self.template_ids()?;
        let mut library = ShapeLibrary::new();
        for def in &self.templates {
            let template = ids[def.name.as_str()];
            library.insert(def.build(template)?);
        }
        Ok(library)
    }

    /// Room and connection types with template names resolved to ids
    pub fn catalog(&self) -> Result<TemplateCatalog> {
        let ids = self.template_ids()?;
        let resolve = |names: &[String]| -> Result<Vec<TemplateId>> {
            names
                .iter()
                .map(|name| {
                    ids.get(name.as_str())
                        .copied()
                        .ok_or_else(|| LayoutError::Scenario(format!("unknown template '{}'", name)))
                })
                .collect()
        };

        let mut catalog = TemplateCatalog::new()
            .with_default_rooms(resolve(&self.default_rooms)?)
            .with_default_connectors(resolve(&self.default_connectors)?);
        for (name, templates) in &self.room_types {
            catalog = catalog.with_room_type(name.as_str(), resolve(templates)?);
        }
        for (name, templates) in &self.connection_types {
            catalog = catalog.with_connection_type(name.as_str(), resolve(templates)?);
        }
        Ok(catalog)
    }

    /// This scenario's libraries, resolved once per world
    pub fn libraries<'c>(&self, cache: &'c mut LibraryCache) -> Result<&'c WorldLibraries> {
        cache.get_or_insert_with(self.world_id(), || self.build_shapes())
    }

    /// Run the generator on this scenario's graph
    pub fn generate<R: Rng + ?Sized>(&self, cache: &mut LibraryCache, rng: &mut R) -> Result<LayoutResult> {
        let catalog = self.catalog()?;
        let generator = LayoutGenerator::new(self.settings.clone())?;
        let libraries = self.libraries(cache)?;
        let request = GenerationRequest::new(
            &self.graph,
            &catalog,
            libraries.shapes.as_ref(),
            libraries.spaces.as_ref(),
        );
        generator.try_generate(&request, rng)
    }
}
