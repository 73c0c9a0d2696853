//! Synthetic multi-device recordings for sensor-compare.
//!
//! A scenario is one athlete moving along a procedurally generated track, seen
//! through several devices that each add their own error: GPS jitter, heart-rate
//! bias, coarser sampling, a skewed clock. The recordings can be written out as
//! GPX/TCX files or handed to the comparison pipeline directly.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let scenario = ScenarioBuilder::standard_devices()
//!     .with_seed(7)
//!     .with_distance(5000.0)
//!     .build();
//! scenario.write_to(Path::new("fixtures/run"))?;
//! ```

pub mod builders;
pub mod config;
pub mod devices;
pub mod gpx;
pub mod profiles;
pub mod sources;
pub mod tcx;
pub mod terrain;
mod xml;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{ActivityKind, Recording, Scenario, ScenarioBuilder};
    pub use crate::config::{BoundingBox, DEFAULT_START, Region, ScenarioConfig};
    pub use crate::devices::{DeviceModel, FileFormat, GpsGlitch};
    pub use crate::profiles::{AthleteProfile, CyclistProfile, RunnerProfile};
    pub use crate::sources::{ProceduralGenerator, TruthPoint};
    pub use crate::terrain::ElevationGenerator;
}
