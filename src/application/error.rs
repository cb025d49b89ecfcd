//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("step file not found: {0}")]
    FileMissing(PathBuf),

    #[error("unusable geometry in {}: {reason}", path.display())]
    Unusable { path: PathBuf, reason: String },

    #[error("no step files found in {0}")]
    NoSteps(PathBuf),

    #[error("step {step} is not part of the dataset")]
    UnknownStep { step: u32 },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
