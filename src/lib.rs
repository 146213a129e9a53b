//! Service Migrator - moves Cloud Foundry service instances between foundations
//!
//! This crate walks the org/space/service-instance hierarchy of a source
//! foundation, exports every instance through a per-offering strategy, and
//! replays the exported layout against a target foundation.

pub mod cli;
pub mod clients;
pub mod config;
pub mod executor;
pub mod layout;
pub mod migrate;
pub mod strategy;

pub use clients::ClientHolder;
pub use config::{Config, Foundation};
pub use migrate::{Exporter, Importer, MigrationContext, Summary};
pub use strategy::StrategyRegistry;
