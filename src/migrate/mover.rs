use crate::clients::cf::{ServiceInstance, Space};
use crate::layout::ServiceManifest;
use crate::migrate::MigrationContext;
use crate::strategy::{InstanceScope, Strategy, StrategyError, StrategyRegistry};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies one resolved strategy to one instance and records the outcome.
///
/// Nothing escapes: every result, good or bad, ends up in the summary.
#[derive(Clone)]
pub struct InstanceMover {
    registry: Arc<StrategyRegistry>,
}

impl InstanceMover {
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self { registry }
    }

    pub async fn export(&self, ctx: &MigrationContext, scope: &InstanceScope, instance: &ServiceInstance) {
        let Some(strategy) = self.admit(ctx, scope, &instance.name, &instance.service_offering) else {
            return;
        };
        if ctx.options.debug {
            debug!(
                "Exporting {} ({}, plan {}) with {}",
                instance.name,
                instance.service_offering,
                instance.plan,
                strategy.name()
            );
        }

        let result = until_cancelled(scope, strategy.export(scope, instance)).await;
        record(ctx, scope, &instance.name, &instance.service_offering, result);
    }

    pub async fn import(
        &self,
        ctx: &MigrationContext,
        scope: &InstanceScope,
        space: &Space,
        manifest: &ServiceManifest,
    ) {
        let Some(strategy) = self.admit(ctx, scope, &manifest.name, &manifest.service) else {
            return;
        };
        if ctx.options.debug {
            debug!(
                "Importing {} ({}, plan {}) with {}",
                manifest.name,
                manifest.service,
                manifest.plan,
                strategy.name()
            );
        }

        let result = until_cancelled(scope, strategy.import(scope, space, manifest)).await;
        record(ctx, scope, &manifest.name, &manifest.service, result);
    }

    /// True when `admit` would hand the instance to its strategy, i.e. the
    /// target foundation is going to be touched for it.
    pub fn would_migrate(&self, ctx: &MigrationContext, name: &str, offering: &str) -> bool {
        !ctx.options.dry_run
            && allow_list_rejection(ctx, name, offering).is_none()
            && self.registry.lookup(offering).is_ok()
    }

    /// Resolve the strategy and apply allow-lists and dry run. `None` means
    /// the outcome is already recorded.
    fn admit(
        &self,
        ctx: &MigrationContext,
        scope: &InstanceScope,
        name: &str,
        offering: &str,
    ) -> Option<Arc<dyn Strategy>> {
        let summary = &ctx.summary;
        let options = &ctx.options;

        let strategy = match self.registry.lookup(offering) {
            Ok(strategy) => strategy,
            Err(e) => {
                record(ctx, scope, name, offering, Err(e));
                return None;
            }
        };

        if let Some(reason) = allow_list_rejection(ctx, name, offering) {
            summary.add_skipped_service(&scope.org, &scope.space, name, offering, reason);
            return None;
        }

        if options.dry_run {
            info!(
                "Dry run: would migrate {}/{}/{} with {}",
                scope.org,
                scope.space,
                name,
                strategy.name()
            );
            summary.add_skipped_service(&scope.org, &scope.space, name, offering, "dry run");
            return None;
        }

        Some(strategy)
    }
}

fn allow_list_rejection(ctx: &MigrationContext, name: &str, offering: &str) -> Option<String> {
    let options = &ctx.options;
    if !options.services.is_empty() && !options.services.iter().any(|s| s == offering) {
        return Some(format!("service {offering:?} is not in the services list"));
    }
    if !options.instances.is_empty() && !options.instances.iter().any(|i| i == name) {
        return Some(format!("instance {name:?} is not in the instances list"));
    }
    None
}

/// Drops the in-flight strategy call, and with it any pending request or
/// job poll, as soon as the instance's token fires.
async fn until_cancelled<F>(scope: &InstanceScope, work: F) -> Result<(), StrategyError>
where
    F: Future<Output = Result<(), StrategyError>>,
{
    tokio::select! {
        biased;
        _ = scope.cancel.cancelled() => Err(StrategyError::Cancelled),
        result = work => result,
    }
}

fn record(
    ctx: &MigrationContext,
    scope: &InstanceScope,
    name: &str,
    offering: &str,
    result: Result<(), StrategyError>,
) {
    let summary = &ctx.summary;
    match result {
        Ok(()) => {
            info!("Migrated {}/{}/{}", scope.org, scope.space, name);
            summary.add_successful_service(&scope.org, &scope.space, name, offering);
        }
        Err(e) => match e.skip_reason() {
            Some(reason) => {
                debug!("Skipped {}/{}/{}: {}", scope.org, scope.space, name, reason);
                summary.add_skipped_service(&scope.org, &scope.space, name, offering, reason);
            }
            None => {
                warn!("Failed to migrate {}/{}/{}: {}", scope.org, scope.space, name, e);
                if ctx.options.debug {
                    let mut source = std::error::Error::source(&e);
                    while let Some(cause) = source {
                        warn!("  caused by: {}", cause);
                        source = cause.source();
                    }
                }
                summary.add_failed_service(&scope.org, &scope.space, name, offering, &e);
            }
        },
    }
}
