//! Domain layer: the preload list model and its transformations
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entry;
pub mod error;
pub mod line;
pub mod merge;
pub mod pending;
pub mod region;
pub mod validate;

pub use entry::{Entry, EntryTemplate};
pub use error::{DomainError, DomainResult, StructureError, ValidationError};
pub use line::{classify, Document, Line, LineKind};
pub use merge::{merge_document, AdditionSet, Merge, MergeOutcome, MergeStats, RemovalSet};
pub use pending::{partition_pending, Partition, PendingScanResult, Rejection};
pub use region::{Band, Extraction, RegionExtractor, RegionState};
pub use validate::{find_duplicates, parse_without_comments, sanity_check, PreloadList};
