pub mod config;
pub mod error;
pub mod types;

pub use config::GeneratorSettings;
pub use error::{LayoutError, Result};
pub use types::{CellBounds, EdgeId, IntVec2, NodeId, Side, TemplateId, WorldId};
