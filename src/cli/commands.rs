use crate::cli::options::{Commands, ExportArgs, ImportArgs, Scope, ServiceMigratorCli};
use crate::cli::prompt::confirm;
use crate::clients::{
    ClientHolder, Foundations, HttpBoshClientBuilder, HttpCfClientLoader, HttpOpsManClientBuilder,
};
use crate::config::{parse_domain_replacements, Config};
use crate::executor::ShellExecutor;
use crate::layout::{ensure_dir, is_empty_dir};
use crate::migrate::{
    Exporter, Importer, MigrateError, MigrationContext, MigrationOptions, OrgFilter, Result,
    Summary,
};
use crate::strategy::{RecreateOptions, ServiceRecreator, StrategyDeps, StrategyRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_EXPORT_DIR: &str = "export";

/// Everything one export or import invocation needs, built once up front
pub struct MigrationRun {
    config: Config,
    clients: Arc<ClientHolder>,
    registry: Arc<StrategyRegistry>,
    ctx: MigrationContext,
}

impl MigrationRun {
    /// Load and validate configuration and wire the production clients.
    /// Every error here is a configuration error.
    pub fn prepare(cli: &ServiceMigratorCli, cancel: CancellationToken) -> Result<Self> {
        let config = load_config(cli.config.as_deref())?;
        let config = apply_overrides(config, cli)?;
        config.validate()?;

        let clients = Arc::new(ClientHolder::new(
            Arc::new(HttpCfClientLoader),
            Arc::new(HttpBoshClientBuilder),
            Arc::new(HttpOpsManClientBuilder),
            Foundations::from(&config),
        ));
        clients.validate()?;

        let recreator = Arc::new(ServiceRecreator::new(
            clients.clone(),
            RecreateOptions {
                ignore_service_keys: config.ignore_service_keys,
                domains_to_replace: config.domains_to_replace.clone(),
            },
        ));
        let registry = Arc::new(StrategyRegistry::new(
            &config.migration,
            StrategyDeps {
                clients: clients.clone(),
                executor: Arc::new(ShellExecutor::new(config.command_timeout())),
                recreator,
            },
        )?);

        let options = migration_options(&config, cli)?;
        let ctx = MigrationContext::new(options).with_cancel(cancel);

        Ok(Self {
            config,
            clients,
            registry,
            ctx,
        })
    }

    pub fn summary(&self) -> &Summary {
        &self.ctx.summary
    }

    pub async fn execute(&self, command: &Commands, non_interactive: bool) -> Result<()> {
        match command {
            Commands::Export(args) => self.export(args, non_interactive).await,
            Commands::Import(args) => self.import(args).await,
        }
    }

    pub async fn export(&self, args: &ExportArgs, non_interactive: bool) -> Result<()> {
        let dir = args
            .export_dir
            .clone()
            .or_else(|| self.config.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR));
        prepare_export_dir(&dir, self.ctx.options.dry_run, non_interactive, confirm)?;

        info!("Exporting into {}", dir.display());
        let exporter = Exporter::new(self.clients.clone(), self.registry.clone());
        match &args.scope {
            None => exporter.export_all(&self.ctx, &dir).await,
            Some(Scope::Org { names }) => exporter.export_orgs(&self.ctx, &dir, names).await,
            Some(Scope::Space { org, space }) => {
                exporter.export_space(&self.ctx, &dir, org, space).await
            }
        }
    }

    pub async fn import(&self, args: &ImportArgs) -> Result<()> {
        let dir = args
            .import_dir
            .clone()
            .or_else(|| self.config.import_dir.clone())
            .or_else(|| self.config.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR));

        info!("Importing from {}", dir.display());
        let importer = Importer::new(self.clients.clone(), self.registry.clone());
        match &args.scope {
            None => importer.import_all(&self.ctx, &dir).await,
            Some(Scope::Org { names }) => importer.import_orgs(&self.ctx, &dir, names).await,
            Some(Scope::Space { org, space }) => {
                importer.import_space(&self.ctx, &dir, org, space).await
            }
        }
    }
}

/// An explicit path must exist; the default one is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => {
            let path = Config::default_path();
            if path.exists() {
                Ok(Config::load(&path)?)
            } else {
                warn!("No configuration at {}, using defaults", path.display());
                Ok(Config::default())
            }
        }
    }
}

/// Command-line values win over the file
pub fn apply_overrides(mut config: Config, cli: &ServiceMigratorCli) -> Result<Config> {
    if !cli.include_orgs.is_empty() {
        config.included_orgs = cli.include_orgs.clone();
    }
    if !cli.exclude_orgs.is_empty() {
        config.excluded_orgs = cli.exclude_orgs.clone();
    }
    if !cli.services.is_empty() {
        config.services = cli.services.clone();
    }
    if !cli.instances.is_empty() {
        config.instances = cli.instances.clone();
    }
    config.ignore_service_keys |= cli.ignore_service_keys;
    if let Some(parallelism) = cli.parallelism {
        config.parallelism = parallelism;
    }
    if let Some(timeout) = cli.command_timeout {
        config.command_timeout_secs = timeout;
    }

    match &cli.command {
        Commands::Export(args) => {
            if args.export_dir.is_some() {
                config.export_dir = args.export_dir.clone();
            }
        }
        Commands::Import(args) => {
            if args.import_dir.is_some() {
                config.import_dir = args.import_dir.clone();
            }
            let replacements = parse_domain_replacements(&args.domains_to_replace)?;
            config.domains_to_replace.extend(replacements);
        }
    }
    Ok(config)
}

pub fn migration_options(config: &Config, cli: &ServiceMigratorCli) -> Result<MigrationOptions> {
    Ok(MigrationOptions {
        filter: OrgFilter::new(&config.included_orgs, &config.excluded_orgs)?,
        services: config.services.clone(),
        instances: config.instances.clone(),
        dry_run: cli.dry_run,
        debug: cli.debug,
        parallelism: config.parallelism.max(1),
    })
}

/// Create the export directory, asking before writing into a non-empty one.
/// A dry run writes nothing, so the directory is left alone.
pub fn prepare_export_dir<F>(dir: &Path, dry_run: bool, non_interactive: bool, ask: F) -> Result<()>
where
    F: FnOnce(&str) -> std::io::Result<bool>,
{
    if dry_run {
        debug!("Dry run, leaving {} untouched", dir.display());
        return Ok(());
    }
    if !is_empty_dir(dir)? && !non_interactive {
        let question = format!("Export directory {} is not empty. Continue?", dir.display());
        let proceed = ask(&question).unwrap_or(false);
        if !proceed {
            return Err(MigrateError::ExportDirNotEmpty {
                dir: dir.display().to_string(),
            });
        }
    }
    ensure_dir(dir)?;
    Ok(())
}
