//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// The preload list violates its structural invariants.
///
/// These are never retried: the source document (or the merge output) needs
/// human attention.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("line {line}: unexpected marker {found:?} while {state}")]
    UnexpectedMarker {
        line: usize,
        found: String,
        state: String,
    },

    #[error("line {line}: unexpected {family} marker after the last band: {content}")]
    MarkerAfterLastBand {
        line: usize,
        family: String,
        content: String,
    },

    #[error("document ended while {state}")]
    UnexpectedEnd { state: String },

    #[error("no bands configured")]
    NoBands,

    #[error("band entries are not valid JSON: {0}")]
    InvalidBandJson(String),

    #[error("line {line}: cannot decode entry: {message}")]
    InvalidEntry { line: usize, message: String },

    #[error("insertion marker {0:?} not found")]
    InsertionMarkerMissing(String),

    #[error("line {line}: insertion marker {marker:?} appears more than once")]
    InsertionMarkerDuplicated { line: usize, marker: String },

    #[error("document does not parse as JSON: {0}")]
    InvalidDocument(String),
}

/// A domain failed the sanity policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("incorrectly formatted domain: {0}")]
    MalformedDomain(String),

    #[error("unexpected domain in list: {0}")]
    DeniedDomain(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type DomainResult<T> = Result<T, DomainError>;
