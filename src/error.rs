//! Error types for the extraction engine.
//!
//! Parsing a message never fails: an unrecognized source or a missing field
//! is an ordinary outcome. These errors only come from registering templates
//! and from the batch input/output surfaces.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building a registry or running a batch.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to read input or write output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An email message could not be parsed
    #[error("Email error: {0}")]
    Mail(#[from] mailparse::MailParseError),

    /// Failed to walk an input directory
    #[error("Directory error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Path is neither an .eml file nor a directory holding any
    #[error("No .eml files at {}", .0.display())]
    NotEmail(std::path::PathBuf),

    /// A field rule failed to compile
    #[error("Invalid pattern in template {template}: {source}")]
    Pattern {
        template: String,
        #[source]
        source: regex::Error,
    },

    /// A template definition is unusable
    #[error("Invalid template {template}: {message}")]
    InvalidTemplate { template: String, message: String },

    /// Two templates registered under the same name
    #[error("Duplicate template name {0}")]
    DuplicateTemplate(String),
}
