use crate::clients::cf::{ServiceInstance, Space};
use crate::layout::ServiceManifest;
use crate::strategy::{InstanceScope, Result, ServiceRecreator, Strategy};
use async_trait::async_trait;
use std::sync::Arc;

/// CF-level recreation only: instance, bindings, keys and routes, no data
pub struct DefaultStrategy {
    recreator: Arc<ServiceRecreator>,
}

impl DefaultStrategy {
    pub fn new(recreator: Arc<ServiceRecreator>) -> Self {
        Self { recreator }
    }
}

#[async_trait]
impl Strategy for DefaultStrategy {
    fn name(&self) -> &'static str {
        "default"
    }

    async fn export(&self, scope: &InstanceScope, instance: &ServiceInstance) -> Result<()> {
        let manifest = self.recreator.build_manifest(instance).await?;
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
