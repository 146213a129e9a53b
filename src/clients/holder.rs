//! Run-scoped, lazily built access to the six directional clients

use crate::clients::bosh::{BoshClient, BoshClientBuilder};
use crate::clients::cf::{CfClient, CfClientLoader};
use crate::clients::opsman::{
    derive_bosh_access, derive_cloud_controller_access, OpsManClient, OpsManClientBuilder,
};
use crate::clients::Result;
use crate::config::{Config, ConfigError, Foundation};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Foundations {
    pub source: Foundation,
    pub target: Foundation,
}

impl From<&Config> for Foundations {
    fn from(config: &Config) -> Self {
        Self {
            source: config.source.clone(),
            target: config.target.clone(),
        }
    }
}

struct Side {
    name: &'static str,
    foundation: Foundation,
    cf: OnceCell<Arc<dyn CfClient>>,
    bosh: OnceCell<Arc<dyn BoshClient>>,
    opsman: OnceCell<Arc<dyn OpsManClient>>,
}

impl Side {
    fn new(name: &'static str, foundation: Foundation) -> Self {
        Self {
            name,
            foundation,
            cf: OnceCell::new(),
            bosh: OnceCell::new(),
            opsman: OnceCell::new(),
        }
    }
}

/// Builds each client on first use and hands out the cached instance afterwards.
///
/// Cached clients are read-only once built, so one holder is shared by every
/// concurrent instance migration of a run.
pub struct ClientHolder {
    loader: Arc<dyn CfClientLoader>,
    bosh_builder: Arc<dyn BoshClientBuilder>,
    opsman_builder: Arc<dyn OpsManClientBuilder>,
    source: Side,
    target: Side,
}

impl ClientHolder {
    pub fn new(
        loader: Arc<dyn CfClientLoader>,
        bosh_builder: Arc<dyn BoshClientBuilder>,
        opsman_builder: Arc<dyn OpsManClientBuilder>,
        foundations: Foundations,
    ) -> Self {
        Self {
            loader,
            bosh_builder,
            opsman_builder,
            source: Side::new("source", foundations.source),
            target: Side::new("target", foundations.target),
        }
    }

    /// Authentication problems are configuration errors and surface here, before traversal.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.source.foundation.validate(self.source.name)?;
        self.target.foundation.validate(self.target.name)?;
        Ok(())
    }

    pub fn foundation(&self, is_source: bool) -> &Foundation {
        &self.side(is_source).foundation
    }

    pub async fn source_cf_client(&self) -> Result<Arc<dyn CfClient>> {
        self.cf_client(true).await
    }

    pub async fn target_cf_client(&self) -> Result<Arc<dyn CfClient>> {
        self.cf_client(false).await
    }

    pub async fn source_bosh_client(&self) -> Result<Arc<dyn BoshClient>> {
        self.bosh_client(true).await
    }

    pub async fn target_bosh_client(&self) -> Result<Arc<dyn BoshClient>> {
        self.bosh_client(false).await
    }

    pub async fn source_ops_manager_client(&self) -> Result<Arc<dyn OpsManClient>> {
        self.ops_manager_client(true).await
    }

    pub async fn target_ops_manager_client(&self) -> Result<Arc<dyn OpsManClient>> {
        self.ops_manager_client(false).await
    }

    pub async fn cf_client(&self, is_source: bool) -> Result<Arc<dyn CfClient>> {
        let side = self.side(is_source);
        side.cf
            .get_or_try_init(|| async {
                debug!("Building {} cloud controller client", side.name);
                let access = match &side.foundation.cloud_controller {
                    Some(access) => access.clone(),
                    None => {
                        let opsman = self.ops_manager_client(is_source).await?;
                        derive_cloud_controller_access(opsman.as_ref()).await?
                    }
                };
                self.loader
                    .load(&access, side.foundation.skip_ssl_validation)
                    .await
            })
            .await
            .map(Arc::clone)
    }

    pub async fn bosh_client(&self, is_source: bool) -> Result<Arc<dyn BoshClient>> {
        let side = self.side(is_source);
        side.bosh
            .get_or_try_init(|| async {
                debug!("Building {} bosh client", side.name);
                let access = match &side.foundation.bosh {
                    Some(access) => {
                        let mut access = access.clone();
                        if access.all_proxy.is_none() {
                            access.all_proxy = side.foundation.ops_manager_proxy();
                        }
                        access
                    }
                    None => {
                        let opsman = self.ops_manager_client(is_source).await?;
                        derive_bosh_access(opsman.as_ref(), &side.foundation).await?
                    }
                };
                self.bosh_builder
                    .build(&access, side.foundation.skip_ssl_validation)
                    .await
            })
            .await
            .map(Arc::clone)
    }

    pub async fn ops_manager_client(&self, is_source: bool) -> Result<Arc<dyn OpsManClient>> {
        let side = self.side(is_source);
        side.opsman
            .get_or_try_init(|| async {
                debug!("Building {} ops manager client", side.name);
                self.opsman_builder.build(&side.foundation).await
            })
            .await
            .map(Arc::clone)
    }

    fn side(&self, is_source: bool) -> &Side {
        if is_source {
            &self.source
        } else {
            &self.target
        }
    }
}
