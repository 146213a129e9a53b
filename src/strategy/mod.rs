//! Per-offering export/import strategies and the registry that resolves them

pub mod credhub;
pub mod default;
pub mod ecs;
pub mod error;
pub mod interface;
pub mod mysql;
pub mod recreate;
pub mod registry;
pub mod settings;
pub mod template;

pub use credhub::CredHubStrategy;
pub use default::DefaultStrategy;
pub use ecs::EcsStrategy;
pub use error::*;
pub use interface::{InstanceScope, Strategy};
pub use mysql::MySqlStrategy;
pub use recreate::{RecreateOptions, ServiceRecreator};
pub use registry::{StrategyDeps, StrategyRegistry};
pub use settings::{CredHubSettings, EcsSettings, MySqlSettings, StrategyKind, StrategySettings};
pub use template::CommandTemplates;
