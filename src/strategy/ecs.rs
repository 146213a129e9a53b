//! ECS buckets: the bucket name comes from CCDB and is replayed on import

use crate::clients::cf::{ServiceInstance, Space};
use crate::clients::{CcdbProperties, CcdbPropertiesBuilder, ClientHolder};
use crate::config::ConfigError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::layout::ServiceManifest;
use crate::strategy::{
    CommandTemplates, EcsSettings, InstanceScope, Result, ServiceRecreator, Strategy,
    StrategyError,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Serialize)]
struct QueryContext<'a> {
    ccdb: &'a CcdbProperties,
    instance_guid: &'a str,
    instance_name: &'a str,
}

pub struct EcsStrategy {
    settings: EcsSettings,
    templates: CommandTemplates,
    clients: Arc<ClientHolder>,
    executor: Arc<dyn CommandExecutor>,
    recreator: Arc<ServiceRecreator>,
}

impl EcsStrategy {
    pub fn new(
        offering: &str,
        settings: EcsSettings,
        clients: Arc<ClientHolder>,
        executor: Arc<dyn CommandExecutor>,
        recreator: Arc<ServiceRecreator>,
    ) -> std::result::Result<Self, ConfigError> {
        let templates = CommandTemplates::new(offering, &[("query", settings.query_command.as_str())])?;
        Ok(Self {
            settings,
            templates,
            clients,
            executor,
            recreator,
        })
    }

    pub fn settings(&self) -> &EcsSettings {
        &self.settings
    }
}

#[async_trait]
impl Strategy for EcsStrategy {
    fn name(&self) -> &'static str {
        "ecs"
    }

    async fn export(&self, scope: &InstanceScope, instance: &ServiceInstance) -> Result<()> {
        let mut manifest = self.recreator.build_manifest(instance).await?;

        let opsman = self.clients.source_ops_manager_client().await?;
        let ccdb = CcdbPropertiesBuilder::new(opsman.as_ref(), self.clients.foundation(true))
            .build()
            .await?;

        let line = self.templates.render(
            "query",
            &QueryContext {
                ccdb: &ccdb,
                instance_guid: &instance.guid,
                instance_name: &instance.name,
            },
        )?;
        let spec = CommandSpec::parse(&line)?;
        let output = self.executor.execute(&spec, &scope.cancel).await?;

        let bucket = parse_bucket_name(&output.stdout).ok_or_else(|| StrategyError::InvalidOutput {
            program: spec.program.clone(),
            reason: format!("no bucket name for instance {}", instance.guid),
        })?;
        debug!("Instance {} uses bucket {}", instance.name, bucket);

        manifest
            .parameters
            .insert("name".to_string(), Value::String(bucket));
        manifest.parameters.insert(
            "reclaim-policy".to_string(),
            Value::String(self.settings.reclaim_policy.clone()),
        );

        self.recreator.write_manifest(scope, &manifest)?;
        Ok(())
    }

    async fn import(
        &self,
        _scope: &InstanceScope,
        space: &Space,
        manifest: &ServiceManifest,
    ) -> Result<()> {
        if !manifest.parameters.contains_key("name") {
            return Err(StrategyError::Skipped(format!(
                "manifest of {} has no bucket name",
                manifest.name
            )));
        }
        self.recreator.recreate(space, manifest).await?;
        Ok(())
    }
}

/// First non-empty line of the query output
fn parse_bucket_name(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
