//! Infrastructure-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors and add transport setup failures.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("HTTP client setup failed: {message}")]
    Http { message: String },
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
