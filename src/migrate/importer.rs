use crate::clients::cf::{CfClient, Org, Space};
use crate::clients::ClientHolder;
use crate::layout::{discover_manifests, discover_orgs, discover_spaces, ServiceManifest, MANIFEST_EXTENSION};
use crate::migrate::{InstanceMover, MigrateError, MigrationContext, Result};
use crate::strategy::{InstanceScope, StrategyRegistry};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Replays an export directory against the target foundation
pub struct Importer {
    clients: Arc<ClientHolder>,
    mover: InstanceMover,
}

impl Importer {
    pub fn new(clients: Arc<ClientHolder>, registry: Arc<StrategyRegistry>) -> Self {
        Self {
            clients,
            mover: InstanceMover::new(registry),
        }
    }

    pub async fn import_all(&self, ctx: &MigrationContext, base_dir: &Path) -> Result<()> {
        check_base_dir(base_dir)?;

        let orgs = discover_orgs(base_dir)?;
        info!("Found {} orgs in {}", orgs.len(), base_dir.display());

        let cf = self.clients.target_cf_client().await?;
        for org in orgs {
            ctx.check_cancelled()?;
            if !ctx.options.filter.should_process(&org) {
                debug!("Org {} filtered out", org);
                continue;
            }
            self.import_org(ctx, cf.as_ref(), base_dir, &org).await?;
        }
        Ok(())
    }

    pub async fn import_orgs(
        &self,
        ctx: &MigrationContext,
        base_dir: &Path,
        org_names: &[String],
    ) -> Result<()> {
        check_base_dir(base_dir)?;
        for name in org_names {
            check_org_dir(base_dir, name)?;
        }

        let cf = self.clients.target_cf_client().await?;
        for org in org_names {
            ctx.check_cancelled()?;
            if !ctx.options.filter.should_process(org) {
                debug!("Org {} filtered out", org);
                continue;
            }
            self.import_org(ctx, cf.as_ref(), base_dir, org).await?;
        }
        Ok(())
    }

    pub async fn import_space(
        &self,
        ctx: &MigrationContext,
        base_dir: &Path,
        org_name: &str,
        space_name: &str,
    ) -> Result<()> {
        check_base_dir(base_dir)?;
        check_org_dir(base_dir, org_name)?;
        if !base_dir.join(org_name).join(space_name).is_dir() {
            return Err(MigrateError::SpaceNotFound {
                org: org_name.to_string(),
                name: space_name.to_string(),
            });
        }

        let cf = self.clients.target_cf_client().await?;
        let manifests = self.read_manifests(ctx, base_dir, org_name, space_name)?;

        let space = if self.touches_target(ctx, &manifests) {
            let org = cf.ensure_org(org_name).await?;
            cf.ensure_space(&org, space_name).await?
        } else {
            untouched_space(space_name)
        };

        ctx.check_cancelled()?;
        self.import_instances(ctx, base_dir, org_name, &space, manifests).await
    }

    async fn import_org(
        &self,
        ctx: &MigrationContext,
        cf: &dyn CfClient,
        base_dir: &Path,
        org_name: &str,
    ) -> Result<()> {
        info!("Importing org {}", org_name);

        // created on first use, so an org with nothing to migrate stays off the target
        let mut org: Option<Org> = None;

        for space_name in discover_spaces(base_dir, org_name)? {
            ctx.check_cancelled()?;
            let manifests = self.read_manifests(ctx, base_dir, org_name, &space_name)?;

            let space = if self.touches_target(ctx, &manifests) {
                if org.is_none() {
                    match cf.ensure_org(org_name).await {
                        Ok(created) => org = Some(created),
                        Err(e) => {
                            warn!("Cannot create org {} on the target: {}", org_name, e);
                            return Ok(());
                        }
                    }
                }
                let Some(target_org) = org.as_ref() else {
                    return Ok(());
                };
                match cf.ensure_space(target_org, &space_name).await {
                    Ok(space) => space,
                    Err(e) => {
                        warn!(
                            "Cannot create space {}/{} on the target: {}",
                            org_name, space_name, e
                        );
                        continue;
                    }
                }
            } else {
                untouched_space(&space_name)
            };

            self.import_instances(ctx, base_dir, org_name, &space, manifests).await?;
        }
        Ok(())
    }

    /// Decode every manifest of a space. Unreadable ones are recorded as
    /// failures and left out.
    fn read_manifests(
        &self,
        ctx: &MigrationContext,
        base_dir: &Path,
        org_name: &str,
        space_name: &str,
    ) -> Result<Vec<ServiceManifest>> {
        let names = discover_manifests(base_dir, org_name, space_name)?;
        let mut manifests = Vec::with_capacity(names.len());

        for name in names {
            let scope = InstanceScope::new(org_name, space_name, base_dir.to_path_buf(), ctx.cancel.clone());
            let descriptor = scope.descriptor(&name, MANIFEST_EXTENSION);
            match descriptor.read_yaml::<ServiceManifest>() {
                Ok(mut manifest) => {
                    if manifest.name.is_empty() {
                        manifest.name = name;
                    }
                    manifests.push(manifest);
                }
                Err(e) => {
                    warn!("Cannot read manifest {}: {}", descriptor.path().display(), e);
                    ctx.summary
                        .add_failed_service(org_name, space_name, &name, "", &e);
                }
            }
        }
        Ok(manifests)
    }

    fn touches_target(&self, ctx: &MigrationContext, manifests: &[ServiceManifest]) -> bool {
        manifests
            .iter()
            .any(|m| self.mover.would_migrate(ctx, &m.name, &m.service))
    }

    async fn import_instances(
        &self,
        ctx: &MigrationContext,
        base_dir: &Path,
        org_name: &str,
        space: &Space,
        manifests: Vec<ServiceManifest>,
    ) -> Result<()> {
        debug!(
            "Importing {} instances into {}/{}",
            manifests.len(),
            org_name,
            space.name
        );

        stream::iter(manifests)
            .map(|manifest| {
                let scope = InstanceScope::new(
                    org_name,
                    &space.name,
                    base_dir.to_path_buf(),
                    ctx.cancel.child_token(),
                );
                async move {
                    if ctx.is_cancelled() {
                        return;
                    }
                    self.mover.import(ctx, &scope, space, &manifest).await;
                }
            })
            .buffer_unordered(ctx.options.parallelism.max(1))
            .collect::<Vec<()>>()
            .await;

        ctx.check_cancelled()
    }
}

/// Stand-in for a space that is never created because every instance in it
/// is skipped. The mover records those skips without touching the space.
fn untouched_space(name: &str) -> Space {
    Space {
        guid: String::new(),
        name: name.to_string(),
        org_guid: String::new(),
    }
}

/// Checked once, before anything touches the target or the summary
fn check_base_dir(base_dir: &Path) -> Result<()> {
    if !base_dir.is_dir() {
        return Err(MigrateError::ImportDirMissing {
            dir: base_dir.display().to_string(),
        });
    }
    Ok(())
}

fn check_org_dir(base_dir: &Path, org: &str) -> Result<()> {
    if !base_dir.join(org).is_dir() {
        return Err(MigrateError::OrgNotFound {
            name: org.to_string(),
        });
    }
    Ok(())
}
