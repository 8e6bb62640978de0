//! Level graph input, its expanded placement graph and chain decomposition

pub mod chains;
pub mod layout_graph;
pub mod level;

pub use chains::{build_chains, chains_from_node_lists, fundamental_cycles, Chain};
pub use layout_graph::{LayoutEdge, LayoutGraph, LayoutNode, LayoutNodeKey};
pub use level::{LevelEdge, LevelGraph, LevelNode};
