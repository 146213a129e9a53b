//! Ops Manager client contract

pub mod access;
pub mod ccdb;
pub mod http;

pub use access::{derive_bosh_access, derive_cloud_controller_access};
pub use ccdb::{CcdbProperties, CcdbPropertiesBuilder};
pub use http::{HttpOpsManClient, HttpOpsManClientBuilder};

use crate::clients::{ClientError, Result};
use crate::config::Foundation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedProduct {
    /// Product guid, e.g. `cf-0123456789abcdef`
    pub installation_name: String,
    pub product_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub identity: String,
    pub password: String,
}

/// Director access as reported by `bosh_commandline_credentials`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorCredentials {
    pub client: String,
    pub client_secret: String,
    pub environment: String,
}

#[async_trait]
pub trait OpsManClient: Send + Sync {
    async fn deployed_products(&self) -> Result<Vec<DeployedProduct>>;

    async fn product_credential(&self, product_guid: &str, reference: &str) -> Result<Credential>;

    /// Staged product properties keyed by property reference, values unwrapped
    async fn product_properties(
        &self,
        product_guid: &str,
    ) -> Result<HashMap<String, serde_json::Value>>;

    async fn director_credentials(&self) -> Result<DirectorCredentials>;
}

#[async_trait]
pub trait OpsManClientBuilder: Send + Sync {
    async fn build(&self, foundation: &Foundation) -> Result<Arc<dyn OpsManClient>>;
}

pub async fn find_product(opsman: &dyn OpsManClient, product_type: &str) -> Result<DeployedProduct> {
    opsman
        .deployed_products()
        .await?
        .into_iter()
        .find(|p| p.product_type == product_type)
        .ok_or_else(|| ClientError::NotFound {
            kind: "deployed product",
            name: product_type.to_string(),
        })
}

/// Parse `BOSH_CLIENT=... BOSH_CLIENT_SECRET=... BOSH_ENVIRONMENT=... bosh`.
pub fn parse_commandline_credentials(line: &str) -> Option<DirectorCredentials> {
    let vars: HashMap<&str, &str> = line
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .collect();

    Some(DirectorCredentials {
        client: vars.get("BOSH_CLIENT")?.to_string(),
        client_secret: vars.get("BOSH_CLIENT_SECRET")?.to_string(),
        environment: vars.get("BOSH_ENVIRONMENT")?.to_string(),
    })
}
