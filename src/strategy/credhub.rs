//! CredHub instances: stored credentials become creation parameters

use crate::clients::cf::{CfClient, JsonMap, ServiceInstance, Space};
use crate::clients::ClientHolder;
use crate::layout::ServiceManifest;
use crate::strategy::{CredHubSettings, InstanceScope, Result, ServiceRecreator, Strategy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct CredHubStrategy {
    settings: CredHubSettings,
    clients: Arc<ClientHolder>,
    recreator: Arc<ServiceRecreator>,
}

impl CredHubStrategy {
    pub fn new(
        settings: CredHubSettings,
        clients: Arc<ClientHolder>,
        recreator: Arc<ServiceRecreator>,
    ) -> Self {
        Self {
            settings,
            clients,
            recreator,
        }
    }

    pub fn settings(&self) -> &CredHubSettings {
        &self.settings
    }

    /// Read the credentials through a short-lived service key
    async fn read_credentials(
        &self,
        cf: &dyn CfClient,
        instance: &ServiceInstance,
    ) -> Result<JsonMap> {
        let key_name = format!("{}-{}", self.settings.service_key_prefix, Uuid::new_v4());
        let key = cf
            .create_service_key(&instance.guid, &key_name, &JsonMap::new())
            .await?;
        debug!("Created temporary key {} on {}", key_name, instance.name);

        let details = cf.service_key_details(&key.guid).await;

        if let Err(e) = cf.delete_service_key(&key.guid).await {
            warn!("Failed to delete temporary key {}: {}", key_name, e);
        }

        Ok(details?)
    }
}

#[async_trait]
impl Strategy for CredHubStrategy {
    fn name(&self) -> &'static str {
        "credhub"
    }

    async fn export(&self, scope: &InstanceScope, instance: &ServiceInstance) -> Result<()> {
        let mut manifest = self.recreator.build_manifest(instance).await?;

        let cf = self.clients.source_cf_client().await?;
        let credentials = self.read_credentials(cf.as_ref(), instance).await?;
        manifest.parameters.extend(credentials);

        self.recreator.write_manifest(scope, &manifest)?;
        Ok(())
    }

    async fn import(
        &self,
        _scope: &InstanceScope,
        space: &Space,
        manifest: &ServiceManifest,
    ) -> Result<()> {
        self.recreator.recreate(space, manifest).await?;
        Ok(())
    }
}
