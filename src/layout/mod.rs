//! Layout search: overlap and energy, candidates, per-chain annealing and
//! the backtracking driver

pub mod annealing;
pub mod bite;
pub mod candidates;
pub mod diagnostics;
pub mod energy;
pub mod generator;
pub mod overlap;
pub mod placement;
pub mod render;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use annealing::{ChainOutcome, ChainSolver};
pub use bite::{try_get_bite_allowance, BiteAllowance};
pub use candidates::CandidateFinder;
pub use diagnostics::EnergyReport;
pub use energy::{EnergyCache, LayoutContext};
pub use generator::{GenerationRequest, LayoutGenerator};
pub use overlap::count_illegal_overlap;
pub use placement::{LayoutResult, LayoutState, MoveUndo, PlacedModule, PlacementPatch, RoomPlacement};
pub use render::render_ascii;
pub use validation::{try_validate_global, try_validate_layout, ValidationIssue};
