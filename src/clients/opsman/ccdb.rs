//! Cloud Controller database connection details

use crate::clients::opsman::{find_product, OpsManClient};
use crate::clients::Result;
use crate::config::Foundation;
use serde::Serialize;

const INTERNAL_CCDB_HOST: &str = "mysql.service.cf.internal";

/// Everything needed to reach CCDB through the Ops Manager VM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CcdbProperties {
    pub host: String,
    pub username: String,
    pub password: String,
    pub encryption_key: String,
    pub ssh_host: String,
    pub ssh_username: String,
    pub ssh_private_key: String,
}

pub struct CcdbPropertiesBuilder<'a> {
    opsman: &'a dyn OpsManClient,
    foundation: &'a Foundation,
}

impl<'a> CcdbPropertiesBuilder<'a> {
    pub fn new(opsman: &'a dyn OpsManClient, foundation: &'a Foundation) -> Self {
        Self { opsman, foundation }
    }

    pub async fn build(&self) -> Result<CcdbProperties> {
        let cf = find_product(self.opsman, "cf").await?;
        let guid = cf.installation_name.as_str();
        let properties = self.opsman.product_properties(guid).await?;

        let external = properties
            .get(".properties.system_database")
            .and_then(|v| v.as_str())
            == Some("external");

        let (host, credential_ref) = if external {
            (
                properties
                    .get(".properties.system_database.external.host")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                ".properties.system_database.external.ccdb_credentials",
            )
        } else {
            (INTERNAL_CCDB_HOST.to_string(), ".cloud_controller.db_credentials")
        };

        let db = self.opsman.product_credential(guid, credential_ref).await?;
        let encryption_key = self
            .opsman
            .product_credential(guid, ".cloud_controller.encrypt_key")
            .await?;

        Ok(CcdbProperties {
            host,
            username: db.identity,
            password: db.password,
            encryption_key: encryption_key.password,
            ssh_host: self.foundation.hostname.clone(),
            ssh_username: self.foundation.ssh_user.clone(),
            ssh_private_key: self.foundation.private_key.clone(),
        })
    }
}
