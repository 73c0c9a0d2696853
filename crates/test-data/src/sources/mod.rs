//! Ground-truth track sources.

mod procedural;

pub use procedural::{ProceduralGenerator, TrackConfig, TruthPoint, offset_meters};
