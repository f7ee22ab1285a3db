//! # Noise error variants
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoiseError {
    #[error("File not found error: {0}")]
    FileNotFound(String),

    #[error("Unknown noise operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid noise profile, the configuration is malformed or out of range: {0}")]
    ConfigurationError(String),

    #[error("Label not found in label map: {0}")]
    LabelNotFound(String),

    #[error("Label index not found in label map: {0}")]
    IndexNotFound(i64),

    #[error("Token and label sequences must have the same length (got {0} tokens and {1} labels)")]
    LengthMismatch(usize, usize),

    #[error("External service error: {0}")]
    ServiceError(String),

    #[error("Dataset parsing error: {0}")]
    ParsingError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for NoiseError {
    fn from(error: std::io::Error) -> Self {
        NoiseError::IOError(error.to_string())
    }
}

impl From<serde_json::Error> for NoiseError {
    fn from(error: serde_json::Error) -> Self {
        NoiseError::ConfigurationError(error.to_string())
    }
}
