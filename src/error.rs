//! Error type shared by every handler.
//!
//! Handlers convert an `AppError` into a response body at their boundary; nothing
//! below the handler layer builds HTTP responses.

use aws_sdk_s3::error::DisplayErrorContext;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} is not defined in environment variables")]
    MissingConfig(&'static str),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("text extraction job {job_id} failed: {reason}")]
    OcrFailed { job_id: String, reason: String },

    #[error("text extraction job {job_id} did not finish after {attempts} attempts")]
    OcrTimeout { job_id: String, attempts: u32 },

    #[error("model output could not be parsed: {0}")]
    ModelOutput(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Wraps an AWS SDK failure, keeping the service's own message.
    pub fn service<E>(operation: &'static str, err: E) -> Self
    where
        E: std::error::Error,
    {
        AppError::Service {
            operation,
            message: DisplayErrorContext(err).to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidRequest(_) | AppError::NotFound(_) => 400,
            _ => 500,
        }
    }
}
