//! Fluent builder APIs for multi-device scenarios.

mod scenario;

pub use scenario::{ActivityKind, Recording, Scenario, ScenarioBuilder};
