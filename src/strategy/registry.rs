use crate::clients::ClientHolder;
use crate::config::{ConfigError, MigrationDefinition};
use crate::executor::CommandExecutor;
use crate::strategy::{
    CredHubStrategy, DefaultStrategy, EcsStrategy, MySqlStrategy, Result, ServiceRecreator,
    Strategy, StrategyError, StrategySettings,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Shared collaborators handed to every strategy
#[derive(Clone)]
pub struct StrategyDeps {
    pub clients: Arc<ClientHolder>,
    pub executor: Arc<dyn CommandExecutor>,
    pub recreator: Arc<ServiceRecreator>,
}

struct Entry {
    settings: StrategySettings,
    strategy: Arc<dyn Strategy>,
}

/// Resolves a service offering to the strategy that moves it.
///
/// Every configured migrator is decoded and built once, here. Lookups never
/// fail on configuration, only on an offering that nothing handles.
pub struct StrategyRegistry {
    entries: HashMap<String, Entry>,
    default: Option<Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new(
        definition: &MigrationDefinition,
        deps: StrategyDeps,
    ) -> std::result::Result<Self, ConfigError> {
        let mut entries = HashMap::new();

        for migrator in &definition.migrators {
            // first entry for an offering wins
            if entries.contains_key(&migrator.name) {
                debug!("Ignoring duplicate migrator {}", migrator.name);
                continue;
            }
            let settings = StrategySettings::decode(migrator)?;
            let strategy = build_strategy(&migrator.name, settings.clone(), &deps)?;
            debug!("Registered {} migrator for {}", strategy.name(), migrator.name);
            entries.insert(migrator.name.clone(), Entry { settings, strategy });
        }

        let default = definition
            .use_default_migrator
            .then(|| Arc::new(DefaultStrategy::new(deps.recreator.clone())) as Arc<dyn Strategy>);

        Ok(Self { entries, default })
    }

    pub fn lookup(&self, offering: &str) -> Result<Arc<dyn Strategy>> {
        if let Some(entry) = self.entries.get(offering) {
            return Ok(entry.strategy.clone());
        }
        self.default
            .clone()
            .ok_or_else(|| StrategyError::NotConfigured {
                offering: offering.to_string(),
            })
    }

    /// Decoded settings of the migrator configured for `offering`
    pub fn settings(&self, offering: &str) -> Option<&StrategySettings> {
        self.entries.get(offering).map(|entry| &entry.settings)
    }
}

fn build_strategy(
    offering: &str,
    settings: StrategySettings,
    deps: &StrategyDeps,
) -> std::result::Result<Arc<dyn Strategy>, ConfigError> {
    let strategy: Arc<dyn Strategy> = match settings {
        StrategySettings::MySql(settings) => Arc::new(MySqlStrategy::new(
            offering,
            settings,
            deps.clients.clone(),
            deps.executor.clone(),
            deps.recreator.clone(),
        )?),
        StrategySettings::CredHub(settings) => Arc::new(CredHubStrategy::new(
            settings,
            deps.clients.clone(),
            deps.recreator.clone(),
        )),
        StrategySettings::Ecs(settings) => Arc::new(EcsStrategy::new(
            offering,
            settings,
            deps.clients.clone(),
            deps.executor.clone(),
            deps.recreator.clone(),
        )?),
    };
    Ok(strategy)
}
