use crate::clients::cf::{CfClient, Org, Space};
use crate::clients::ClientHolder;
use crate::migrate::{InstanceMover, MigrationContext, Result};
use crate::strategy::{InstanceScope, StrategyRegistry};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Walks the source foundation org by org and exports every instance found
pub struct Exporter {
    clients: Arc<ClientHolder>,
    mover: InstanceMover,
}

impl Exporter {
    pub fn new(clients: Arc<ClientHolder>, registry: Arc<StrategyRegistry>) -> Self {
        Self {
            clients,
            mover: InstanceMover::new(registry),
        }
    }

    pub async fn export_all(&self, ctx: &MigrationContext, base_dir: &Path) -> Result<()> {
        let cf = self.clients.source_cf_client().await?;
        let orgs = cf.list_orgs().await?;
        info!("Found {} orgs on the source foundation", orgs.len());

        for org in orgs {
            ctx.check_cancelled()?;
            if !ctx.options.filter.should_process(&org.name) {
                debug!("Org {} filtered out", org.name);
                continue;
            }
            self.export_org(ctx, cf.as_ref(), base_dir, &org).await?;
        }
        Ok(())
    }

    /// Any unknown org aborts before anything is exported
    pub async fn export_orgs(
        &self,
        ctx: &MigrationContext,
        base_dir: &Path,
        org_names: &[String],
    ) -> Result<()> {
        let cf = self.clients.source_cf_client().await?;

        let mut orgs = Vec::with_capacity(org_names.len());
        for name in org_names {
            orgs.push(cf.get_org(name).await?);
        }

        for org in orgs {
            ctx.check_cancelled()?;
            if !ctx.options.filter.should_process(&org.name) {
                debug!("Org {} filtered out", org.name);
                continue;
            }
            self.export_org(ctx, cf.as_ref(), base_dir, &org).await?;
        }
        Ok(())
    }

    pub async fn export_space(
        &self,
        ctx: &MigrationContext,
        base_dir: &Path,
        org_name: &str,
        space_name: &str,
    ) -> Result<()> {
        let cf = self.clients.source_cf_client().await?;
        let org = cf.get_org(org_name).await?;
        let space = cf.get_space(&org, space_name).await?;

        ctx.check_cancelled()?;
        self.export_instances(ctx, cf.as_ref(), base_dir, &org, &space)
            .await
    }

    async fn export_org(
        &self,
        ctx: &MigrationContext,
        cf: &dyn CfClient,
        base_dir: &Path,
        org: &Org,
    ) -> Result<()> {
        info!("Exporting org {}", org.name);

        let spaces = match cf.list_spaces(org).await {
            Ok(spaces) => spaces,
            Err(e) => {
                warn!("Cannot list spaces of org {}: {}", org.name, e);
                return Ok(());
            }
        };

        for space in spaces {
            ctx.check_cancelled()?;
            self.export_instances(ctx, cf, base_dir, org, &space).await?;
        }
        Ok(())
    }

    async fn export_instances(
        &self,
        ctx: &MigrationContext,
        cf: &dyn CfClient,
        base_dir: &Path,
        org: &Org,
        space: &Space,
    ) -> Result<()> {
        let instances = match cf.list_service_instances(space).await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(
                    "Cannot list service instances of {}/{}: {}",
                    org.name, space.name, e
                );
                return Ok(());
            }
        };
        debug!(
            "Exporting {} instances from {}/{}",
            instances.len(),
            org.name,
            space.name
        );

        stream::iter(instances)
            .map(|instance| {
                let scope = InstanceScope::new(
                    &org.name,
                    &space.name,
                    base_dir.to_path_buf(),
                    ctx.cancel.child_token(),
                );
                async move {
                    if ctx.is_cancelled() {
                        return;
                    }
                    self.mover.export(ctx, &scope, &instance).await;
                }
            })
            .buffer_unordered(ctx.options.parallelism.max(1))
            .collect::<Vec<()>>()
            .await;

        ctx.check_cancelled()
    }
}
