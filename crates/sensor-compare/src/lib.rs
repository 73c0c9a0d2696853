pub mod alignment;
pub mod comparison;
pub mod config;
pub mod distance;
pub mod errors;
pub mod file_parsers;
pub mod models;
pub mod outliers;
pub mod pipeline;
pub mod report;
pub mod speed;
pub mod units;

pub use config::RunConfig;
pub use errors::{CompareError, Result};
pub use pipeline::{ComparisonRun, compare_folder, compare_series};
pub use report::write_report;
pub use units::UnitOfMeasure;
