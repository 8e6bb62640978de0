//! Spatial kernels: bitset footprints and legal-overlap masks

pub mod allowed;
pub mod bitgrid;

pub use allowed::{AllowedWorldCells, RayLanes, RayMask};
pub use bitgrid::{count_illegal_overlaps_shifted, count_overlaps_shifted, BitGrid};
