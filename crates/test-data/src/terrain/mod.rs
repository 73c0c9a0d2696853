//! Synthetic terrain for ground-truth tracks.

mod elevation;

pub use elevation::ElevationGenerator;
