use serde::Serialize;

use crate::domain::errors::{EngineError, ErrorKind};

/// Body of every failed API response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponseDto {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl From<&EngineError> for ErrorResponseDto {
    fn from(err: &EngineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}
