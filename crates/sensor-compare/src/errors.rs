use std::path::PathBuf;

use thiserror::Error;

use crate::file_parsers::ParseError;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Inconsistent sport across files: {first} vs {second}")]
    InconsistentSport { first: String, second: String },

    #[error("No activity files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("Failed to parse {}: {source}", .file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report error: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, CompareError>;
