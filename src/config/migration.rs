use crate::config::{ConfigError, Foundation, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30 * 60;

/// Run configuration loaded from the service-migrator YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: Foundation,
    pub target: Foundation,
    pub migration: MigrationDefinition,
    pub export_dir: Option<PathBuf>,
    pub import_dir: Option<PathBuf>,
    pub domains_to_replace: BTreeMap<String, String>,
    pub included_orgs: Vec<String>,
    pub excluded_orgs: Vec<String>,
    pub services: Vec<String>,
    pub instances: Vec<String>,
    pub ignore_service_keys: bool,
    /// Upper bound for any single external command (dump, restore, query)
    pub command_timeout_secs: u64,
    /// Instances migrated concurrently within one space
    pub parallelism: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: Foundation::default(),
            target: Foundation::default(),
            migration: MigrationDefinition::default(),
            export_dir: None,
            import_dir: None,
            domains_to_replace: BTreeMap::new(),
            included_orgs: Vec::new(),
            excluded_orgs: Vec::new(),
            services: Vec::new(),
            instances: Vec::new(),
            ignore_service_keys: false,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            parallelism: 1,
        }
    }
}

/// Declarative strategy configuration, one entry per non-default service type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationDefinition {
    pub use_default_migrator: bool,
    pub migrators: Vec<Migrator>,
}

impl Default for MigrationDefinition {
    fn default() -> Self {
        Self {
            use_default_migrator: true,
            migrators: Vec::new(),
        }
    }
}

/// A named migrator with its raw, not yet decoded settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Migrator {
    pub name: String,
    pub value: serde_yaml::Mapping,
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("service-migrator")
            .join("service-migrator.yml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::InvalidYaml { reason, .. } => ConfigError::InvalidYaml {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate both foundations. Runs before any traversal starts.
    pub fn validate(&self) -> Result<()> {
        self.source.validate("source")?;
        self.target.validate("target")?;
        Ok(())
    }

    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.command_timeout_secs)
    }
}

/// Parse `old=new` pairs as given on the command line.
pub fn parse_domain_replacements(entries: &[String]) -> Result<BTreeMap<String, String>> {
    let mut replacements = BTreeMap::new();
    for entry in entries {
        let (old, new) = entry
            .split_once('=')
            .filter(|(old, new)| !old.trim().is_empty() && !new.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidDomainReplacement {
                entry: entry.clone(),
            })?;
        replacements.insert(old.trim().to_string(), new.trim().to_string());
    }
    Ok(replacements)
}
