use crate::schema::DocumentRole;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketInsightsError {
    #[error("Input incomplete: please upload the {0} metrics JSON file")]
    InputIncomplete(String),

    #[error("Invalid JSON format in {role} metrics: {message} at line {line} column {column}")]
    ParseFailure {
        role: DocumentRole,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Narrative service error: {0}")]
    ServiceError(String),

    #[error("chart unavailable: missing field {0}")]
    MissingField(String),

    #[error("chart unavailable: field {0} is not numeric")]
    NonNumericField(String),

    #[error("Invalid field path '{0}': segments must be non-empty")]
    InvalidFieldPath(String),

    #[error("Chart rendering failed: {0}")]
    RenderFailed(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, MarketInsightsError>;
