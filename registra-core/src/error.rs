use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistraError {
    #[error("Invalid wizard step: {0} (expected 1-6)")]
    InvalidStep(u8),

    #[error("Unknown wizard step: {0}")]
    UnknownStep(String),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistraError>;
