//! Generator configuration with documented constants
//!
//! All search knobs are collected here with a note on what they trade off.
//! Settings are plain values; the caller owns loading and seeding.

use serde::{Deserialize, Serialize};

use crate::core::error::{LayoutError, Result};

/// Penalty charged per illegally overlapping cell
///
/// Overlap is the hard constraint. A single bad cell must outweigh any
/// realistic sum of edge distance penalties.
pub const OVERLAP_WEIGHT: f64 = 1000.0;

/// Base penalty for a graph edge whose endpoints do not touch
///
/// Added to the squared bounding-box gap so an unsatisfied edge never
/// scores zero, even when the modules sit right next to each other.
pub const UNSATISFIED_EDGE_BASE: f64 = 1.0;

/// Configuration for one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    // === SEARCH BREADTH ===
    /// Maximum number of completed layouts a chain hands back to the driver
    ///
    /// Each one becomes a sibling branch for backtracking. More layouts
    /// make the search more robust against dead ends at the cost of time
    /// spent in the annealer before the driver moves on.
    pub max_layouts_per_chain: usize,

    /// Optional cap on how many chain expansions the driver performs
    ///
    /// `None` lets the backtracking search run until the stack empties.
    /// Callers wanting bounded latency should set this or impose their own
    /// time budget around the call.
    pub max_chain_expansions: Option<usize>,

    // === ANNEALING SCHEDULE ===
    /// Outer annealing steps (one temperature level each)
    pub temperature_steps: usize,

    /// Trial moves per temperature level
    pub inner_iterations: usize,

    /// Geometric cooling factor applied after every outer step, in (0, 1)
    pub cooling: f64,

    /// Starting temperature
    ///
    /// Roughly the size of an energy increase that should be accepted about
    /// a third of the time early on. Edge penalties are squared cell gaps,
    /// so a few dozen lets rooms drift several cells apart while a single
    /// overlapping cell (1000) is almost never accepted.
    pub initial_temperature: f64,

    /// Probability that a move also swaps the node's template, in [0, 1]
    pub change_prefab_probability: f64,

    /// Probability that a move uses the cheap wiggle candidates, in [0, 1]
    pub wiggle_probability: f64,

    // === CANDIDATES ===
    /// Upper bound on wiggle candidates sampled per move
    pub max_wiggle_candidates: usize,

    /// Upper bound on best-effort candidates when neighbor spaces disagree
    pub max_fallback_candidates: usize,

    /// Rings searched outward from the origin for unconstrained nodes
    pub ring_search_rings: usize,

    // === OUTPUT GATING ===
    /// Minimum summed Manhattan distance (over chain nodes) between two
    /// accepted layouts of the same chain
    ///
    /// A template change counts as meeting the threshold on its own.
    pub min_layout_difference: i32,

    // === DECOMPOSITION ===
    /// Longest path chain grown from tree (non-face) edges
    pub max_tree_chain_length: usize,

    // === KERNEL ===
    /// Use the bitset overlap kernel instead of the hash-set fallback
    pub use_bitset_overlap: bool,
}

/// A settings document: one `[settings]` table and nothing else
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    settings: GeneratorSettings,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            // Breadth
            max_layouts_per_chain: 4,
            max_chain_expansions: None,

            // Annealing (40 x 80 = 3200 trial moves per chain)
            temperature_steps: 40,
            inner_iterations: 80,
            cooling: 0.9,
            initial_temperature: 30.0,
            change_prefab_probability: 0.2,
            wiggle_probability: 0.5,

            // Candidates
            max_wiggle_candidates: 32,
            max_fallback_candidates: 64,
            ring_search_rings: 6,

            // Gating
            min_layout_difference: 2,

            // Decomposition
            max_tree_chain_length: 6,

            use_bitset_overlap: true,
        }
    }
}

impl GeneratorSettings {
    /// Create settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `[settings]` table of a TOML document
    ///
    /// Missing keys keep their defaults. Unknown keys, inside the table or
    /// beside it, are errors.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(content)?;
        file.settings.validate()?;
        Ok(file.settings)
    }

    /// Validate ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.cooling > 0.0 && self.cooling < 1.0) {
            return Err(LayoutError::InvalidSettings(format!(
                "cooling ({}) must lie strictly between 0 and 1",
                self.cooling
            )));
        }

        for (name, value) in [
            ("change_prefab_probability", self.change_prefab_probability),
            ("wiggle_probability", self.wiggle_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LayoutError::InvalidSettings(format!(
                    "{} ({}) must lie in [0, 1]",
                    name, value
                )));
            }
        }

        if !(self.initial_temperature > 0.0) {
            return Err(LayoutError::InvalidSettings(
                "initial_temperature must be positive".into(),
            ));
        }

        if self.max_layouts_per_chain == 0
            || self.temperature_steps == 0
            || self.inner_iterations == 0
        {
            return Err(LayoutError::InvalidSettings(
                "layout count, temperature steps and inner iterations must be non-zero".into(),
            ));
        }

        if self.max_tree_chain_length == 0 {
            return Err(LayoutError::InvalidSettings(
                "max_tree_chain_length must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
