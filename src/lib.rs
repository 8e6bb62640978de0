//! Citadel Layout - room and connector layout generation from level graphs

pub mod core;
pub mod graph;
pub mod layout;
pub mod scenario;
pub mod shapes;
pub mod spatial;

pub use crate::core::{GeneratorSettings, LayoutError, Result};
pub use crate::graph::{LayoutNodeKey, LevelGraph};
pub use crate::layout::{render_ascii, GenerationRequest, LayoutGenerator, LayoutResult};
pub use crate::scenario::Scenario;
