// ⚠️ Boundary Errors
// Only loaders, config and string-typed view parameters can fail.
// The engine itself degrades record-by-record and never returns these.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse CSV from {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unsupported source file extension: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown view mode '{0}' (expected month, year or range)")]
    UnknownMode(String),

    #[error("Invalid view parameter '{name}': {value}")]
    InvalidParameter { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, TimelineError>;
