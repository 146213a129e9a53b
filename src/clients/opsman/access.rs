//! Access details derived from Ops Manager when a foundation does not spell them out

use crate::clients::opsman::{find_product, OpsManClient};
use crate::clients::{ClientError, Result};
use crate::config::{Authentication, BoshAccess, CloudControllerAccess, Foundation};

const DIRECTOR_PORT: u16 = 25555;
const DIRECTOR_UAA_PORT: u16 = 8443;

pub async fn derive_bosh_access(
    opsman: &dyn OpsManClient,
    foundation: &Foundation,
) -> Result<BoshAccess> {
    let creds = opsman.director_credentials().await?;
    Ok(BoshAccess {
        url: format!("https://{}:{}", creds.environment, DIRECTOR_PORT),
        authentication: Authentication::uaa_client(
            &format!("https://{}:{}", creds.environment, DIRECTOR_UAA_PORT),
            &creds.client,
            &creds.client_secret,
        ),
        all_proxy: foundation.ops_manager_proxy(),
    })
}

pub async fn derive_cloud_controller_access(
    opsman: &dyn OpsManClient,
) -> Result<CloudControllerAccess> {
    let cf = find_product(opsman, "cf").await?;
    let properties = opsman.product_properties(&cf.installation_name).await?;

    let system_domain = properties
        .get(".cloud_controller.system_domain")
        .and_then(|v| v.as_str())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ClientError::InvalidResponse {
            url: cf.installation_name.clone(),
            reason: "cf product has no .cloud_controller.system_domain".to_string(),
        })?;

    let admin = opsman
        .product_credential(&cf.installation_name, ".uaa.admin_client_credentials")
        .await?;

    Ok(CloudControllerAccess {
        url: format!("https://api.{system_domain}"),
        authentication: Authentication::uaa_client(
            &format!("https://uaa.{system_domain}"),
            &admin.identity,
            &admin.password,
        ),
    })
}
