//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, StructureError, ValidationError};
use crate::infrastructure::traits::FetchError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<StructureError> for ApplicationError {
    fn from(e: StructureError) -> Self {
        Self::Domain(e.into())
    }
}

impl From<ValidationError> for ApplicationError {
    fn from(e: ValidationError) -> Self {
        Self::Domain(e.into())
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
