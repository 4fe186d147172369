//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, PreloadSource)
//! but are themselves concrete structs, not traits.

mod bulk;
mod check;
mod roll;

pub use bulk::{BulkReport, BulkRequest, BulkService};
pub use check::{CheckReport, CheckService};
pub use roll::{RemovalSource, RollReport, RollRequest, RollService};
