use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Move service instances between Cloud Foundry foundations
#[derive(Parser, Debug)]
#[command(name = "service-migrator")]
#[command(about = "Export service instances from one foundation and import them into another")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct ServiceMigratorCli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only walk orgs matching one of these regular expressions
    #[arg(long, global = true, value_delimiter = ',')]
    pub include_orgs: Vec<String>,

    /// Never walk orgs matching one of these regular expressions
    #[arg(long, global = true, value_delimiter = ',')]
    pub exclude_orgs: Vec<String>,

    /// Only migrate these service offerings
    #[arg(long, global = true, value_delimiter = ',')]
    pub services: Vec<String>,

    /// Only migrate these service instances
    #[arg(long, global = true, value_delimiter = ',')]
    pub instances: Vec<String>,

    /// Do not export or recreate service keys
    #[arg(long, global = true)]
    pub ignore_service_keys: bool,

    /// Never ask for confirmation
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Walk everything but record each instance as skipped
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Instances migrated concurrently within a space
    #[arg(long, global = true)]
    pub parallelism: Option<usize>,

    /// Timeout for a single external command (seconds)
    #[arg(long, global = true)]
    pub command_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export service instances from the source foundation
    Export(ExportArgs),

    /// Import previously exported service instances into the target foundation
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(subcommand)]
    pub scope: Option<Scope>,

    /// Directory the export is written to
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(subcommand)]
    pub scope: Option<Scope>,

    /// Directory holding a previous export
    #[arg(long)]
    pub import_dir: Option<PathBuf>,

    /// Route domain rewrites as old=new pairs
    #[arg(long, value_delimiter = ',')]
    pub domains_to_replace: Vec<String>,
}

/// Without a scope every org is migrated
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Only the named orgs
    Org {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// A single space
    Space { org: String, space: String },
}
