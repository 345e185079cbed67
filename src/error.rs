//! Error types for the curve report application

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid sampling times: {0}")]
    InvalidTimes(String),

    #[error("No sampling times configured")]
    EmptyCurve,

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Invalid archive file: {0}")]
    InvalidArchive(String),

    #[error("PDF generation error: {0}")]
    Pdf(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Usage: curve-report {0}")]
    Usage(String),

    #[error("GUI error: {0}")]
    Gui(String),
}
