//! Hierarchy walkers and the per-run state they share

pub mod context;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod importer;
pub mod mover;
pub mod summary;

pub use context::{MigrationContext, MigrationOptions};
pub use error::*;
pub use exporter::Exporter;
pub use filter::OrgFilter;
pub use importer::Importer;
pub use mover::InstanceMover;
pub use summary::{ServiceResult, Summary};
