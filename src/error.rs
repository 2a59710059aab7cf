// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of [AnalysisError], used by callers that only
/// need to know whether the input was missing, malformed, or simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Format,
    EmptySeries,
    Generic,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("File '{}' not found.", path.display())]
    NotFound { path: PathBuf },
    #[error("Invalid input format: {0}")]
    Format(String),
    #[error("The series is empty, nothing to summarize.")]
    EmptySeries,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("WAV Error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Config file Error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Plotting Error: {0}")]
    Plot(String),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::NotFound { .. } => ErrorKind::NotFound,
            AnalysisError::Format(_) => ErrorKind::Format,
            AnalysisError::EmptySeries => ErrorKind::EmptySeries,
            _ => ErrorKind::Generic,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
