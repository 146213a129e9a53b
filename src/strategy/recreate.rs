//! CF-level export and recreation shared by every strategy

use crate::clients::cf::{InstanceType, JsonMap, ServiceInstance, Space};
use crate::clients::ClientHolder;
use crate::layout::{FileDescriptor, ServiceKeyManifest, ServiceManifest};
use crate::strategy::{InstanceScope, Result, StrategyError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct RecreateOptions {
    pub ignore_service_keys: bool,
    pub domains_to_replace: BTreeMap<String, String>,
}

/// Reads an instance with its bindings, keys and routes from the source
/// foundation and creates the same on the target.
pub struct ServiceRecreator {
    clients: Arc<ClientHolder>,
    options: RecreateOptions,
}

impl ServiceRecreator {
    pub fn new(clients: Arc<ClientHolder>, options: RecreateOptions) -> Self {
        Self { clients, options }
    }

    pub fn options(&self) -> &RecreateOptions {
        &self.options
    }

    pub async fn build_manifest(&self, instance: &ServiceInstance) -> Result<ServiceManifest> {
        let cf = self.clients.source_cf_client().await?;
        let mut manifest = ServiceManifest::from_instance(instance);

        match instance.instance_type {
            InstanceType::UserProvided => {
                manifest.credentials = cf.user_provided_credentials(&instance.guid).await?;
            }
            InstanceType::Managed => {
                // Brokers are not required to support fetching parameters
                match cf.service_instance_parameters(&instance.guid).await {
                    Ok(parameters) => manifest.parameters = parameters,
                    Err(e) => warn!("Parameters of {} not retrievable: {}", instance.name, e),
                }
            }
        }

        for binding in cf.list_bindings(&instance.guid).await? {
            manifest.apps.insert(binding.app_guid, binding.app_name);
        }

        if !self.options.ignore_service_keys {
            manifest.service_keys = cf
                .list_service_keys(&instance.guid)
                .await?
                .into_iter()
                .map(|key| ServiceKeyManifest {
                    name: key.name,
                    parameters: JsonMap::new(),
                })
                .collect();
        }

        let mut routes = cf.list_route_bindings(&instance.guid).await?;
        routes.sort();
        manifest.routes = routes;

        Ok(manifest)
    }

    pub fn write_manifest(
        &self,
        scope: &InstanceScope,
        manifest: &ServiceManifest,
    ) -> Result<FileDescriptor> {
        let descriptor = manifest.descriptor(&scope.base_dir, &scope.org, &scope.space);
        descriptor.write_yaml(manifest)?;
        debug!("Wrote manifest {}", descriptor.path().display());
        Ok(descriptor)
    }

    pub async fn recreate(&self, space: &Space, manifest: &ServiceManifest) -> Result<ServiceInstance> {
        let cf = self.clients.target_cf_client().await?;

        let existing = cf.list_service_instances(space).await?;
        if existing.iter().any(|i| i.name == manifest.name) {
            return Err(StrategyError::Skipped(format!(
                "service instance {:?} already exists in space {:?}",
                manifest.name, space.name
            )));
        }

        let manifest = manifest
            .clone()
            .with_replaced_domains(&self.options.domains_to_replace);

        let instance = cf
            .create_service_instance(space, &manifest.to_new_instance())
            .await?;
        debug!("Created service instance {} ({})", instance.name, instance.guid);

        for app_name in manifest.apps.values() {
            match cf.find_app(space, app_name).await? {
                Some(app) => {
                    cf.create_binding(&instance.guid, &app.guid, "", &JsonMap::new())
                        .await?;
                }
                None => warn!(
                    "App {} not found in space {}, not binding {}",
                    app_name, space.name, instance.name
                ),
            }
        }

        if !self.options.ignore_service_keys {
            for key in &manifest.service_keys {
                cf.create_service_key(&instance.guid, &key.name, &key.parameters)
                    .await?;
            }
        }

        for route in &manifest.routes {
            cf.create_route_binding(space, &instance.guid, route).await?;
        }

        Ok(instance)
    }
}
