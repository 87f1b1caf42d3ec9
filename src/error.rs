use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VizError>;

/// Longest payload excerpt carried by a `DataFormat` error.
pub const PREVIEW_CHARS: usize = 100;

#[derive(Error, Debug)]
pub enum VizError {
    #[error("Could not parse data. Expected JSON string or list of records. Got: {preview}")]
    DataFormat { preview: String },

    #[error("Column '{column}' not found (required by {kind} chart)")]
    MissingColumn { column: String, kind: String },

    #[error("Cannot render {kind} chart: table has no rows")]
    EmptyTable { kind: String },

    #[error("Invalid chart request: {0}")]
    InvalidRequest(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Failed to write artifact {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl VizError {
    /// Build a `DataFormat` error from the offending input, keeping only a bounded prefix.
    pub fn data_format(input: &str) -> Self {
        VizError::DataFormat {
            preview: preview(input),
        }
    }
}

/// First `PREVIEW_CHARS` characters of `input`, cut on a char boundary.
pub fn preview(input: &str) -> String {
    input.chars().take(PREVIEW_CHARS).collect()
}
