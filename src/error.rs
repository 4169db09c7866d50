use thiserror::Error;

#[derive(Debug, Error)]
pub enum DalleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid request: {0}")]
    RequestError(String),
    #[error("Client error: {0}")]
    ClientError(String),
    #[error("API error {status}: {label}")]
    ApiError {
        status: u16,
        label: &'static str,
        body: String,
    },
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DalleError {
    /// HTTP status reported by the generation API, if this is an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            DalleError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DalleError>;
