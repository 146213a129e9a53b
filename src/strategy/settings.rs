//! Strongly typed migrator settings, decoded once when the registry is built

use crate::config::{ConfigError, Migrator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    MySql,
    CredHub,
    Ecs,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [StrategyKind::MySql, StrategyKind::CredHub, StrategyKind::Ecs];

    /// Service offerings this kind knows how to move
    pub fn offerings(self) -> &'static [&'static str] {
        match self {
            StrategyKind::MySql => &["p.mysql", "p-mysql"],
            StrategyKind::CredHub => &["credhub"],
            StrategyKind::Ecs => &["ecs", "ecs-bucket"],
        }
    }

    pub fn for_offering(offering: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.offerings().contains(&offering))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlSettings {
    /// On-demand deployments are named `<prefix><instance guid>`
    pub deployment_prefix: String,
    pub instance_group: String,
    /// Writes the dump to stdout
    pub backup_command: String,
    /// Reads the dump from stdin
    pub restore_command: String,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            deployment_prefix: "service-instance_".to_string(),
            instance_group: "mysql".to_string(),
            backup_command: "bosh -d {{deployment}} ssh {{instance}} --results --column=stdout \
                -c 'sudo mysqldump --defaults-file=/var/vcap/jobs/mysql/config/mylogin.cnf \
                --all-databases --single-transaction --set-gtid-purged=OFF'"
                .to_string(),
            restore_command: "bosh -d {{deployment}} ssh {{instance}} \
                -c 'sudo mysql --defaults-file=/var/vcap/jobs/mysql/config/mylogin.cnf'"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredHubSettings {
    /// Temporary service keys are named `<prefix>-<uuid>`
    pub service_key_prefix: String,
}

impl Default for CredHubSettings {
    fn default() -> Self {
        Self {
            service_key_prefix: "service-migrator".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsSettings {
    /// Prints the bucket name of `{{instance_guid}}` on stdout
    pub query_command: String,
    pub reclaim_policy: String,
}

impl Default for EcsSettings {
    fn default() -> Self {
        Self {
            query_command: "ssh -i {{ccdb.ssh_private_key}} -o StrictHostKeyChecking=no \
                {{ccdb.ssh_username}}@{{ccdb.ssh_host}} \
                \"mysql -h {{ccdb.host}} -u {{ccdb.username}} -p{{ccdb.password}} ccdb -N -s \
                -e \\\"select name from service_instances where guid = '{{instance_guid}}'\\\"\""
                .to_string(),
            reclaim_policy: "Detach".to_string(),
        }
    }
}

/// One variant per strategy kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategySettings {
    MySql(MySqlSettings),
    CredHub(CredHubSettings),
    Ecs(EcsSettings),
}

impl StrategySettings {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategySettings::MySql(_) => StrategyKind::MySql,
            StrategySettings::CredHub(_) => StrategyKind::CredHub,
            StrategySettings::Ecs(_) => StrategyKind::Ecs,
        }
    }

    /// Unknown and missing keys are tolerated, type mismatches are not.
    pub fn decode(migrator: &Migrator) -> Result<Self, ConfigError> {
        let kind = StrategyKind::for_offering(&migrator.name).ok_or_else(|| {
            ConfigError::UnknownMigrator {
                name: migrator.name.clone(),
            }
        })?;

        let value = serde_yaml::Value::Mapping(migrator.value.clone());
        let invalid = |e: serde_yaml::Error| ConfigError::InvalidMigratorSettings {
            name: migrator.name.clone(),
            reason: e.to_string(),
        };

        Ok(match kind {
            StrategyKind::MySql => StrategySettings::MySql(serde_yaml::from_value(value).map_err(invalid)?),
            StrategyKind::CredHub => {
                StrategySettings::CredHub(serde_yaml::from_value(value).map_err(invalid)?)
            }
            StrategyKind::Ecs => StrategySettings::Ecs(serde_yaml::from_value(value).map_err(invalid)?),
        })
    }
}
