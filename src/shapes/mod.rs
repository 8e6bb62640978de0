//! Module footprints and the libraries that resolve them

pub mod cache;
pub mod catalog;
pub mod config_space;
pub mod library;
pub mod shape;
pub mod socket;

pub use cache::{LibraryCache, WorldLibraries};
pub use catalog::TemplateCatalog;
pub use config_space::{ConfigurationSpace, ConfigurationSpaceLibrary, ConfigurationSpaceSource};
pub use library::{ShapeLibrary, ShapeSource};
pub use shape::{ModuleKind, ModuleShape};
pub use socket::Socket;
