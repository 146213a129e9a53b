use crate::clients::http::{build_http_client, ApiClient, Authorizer};
use crate::clients::opsman::{
    parse_commandline_credentials, Credential, DeployedProduct, DirectorCredentials,
    OpsManClient, OpsManClientBuilder,
};
use crate::clients::{ClientError, Result};
use crate::config::{ConfigError, Foundation};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ProductResponse {
    installation_name: String,
    #[serde(rename = "type")]
    product_type: String,
}

#[derive(Debug, Deserialize)]
struct CredentialResponse {
    credential: CredentialBody,
}

#[derive(Debug, Deserialize)]
struct CredentialBody {
    #[serde(default)]
    value: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PropertiesResponse {
    #[serde(default)]
    properties: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CommandlineCredentials {
    credential: String,
}

pub struct HttpOpsManClient {
    api: ApiClient,
}

#[async_trait]
impl OpsManClient for HttpOpsManClient {
    async fn deployed_products(&self) -> Result<Vec<DeployedProduct>> {
        let products: Vec<ProductResponse> = self.api.get("/api/v0/deployed/products").await?;
        Ok(products
            .into_iter()
            .map(|p| DeployedProduct {
                installation_name: p.installation_name,
                product_type: p.product_type,
            })
            .collect())
    }

    async fn product_credential(&self, product_guid: &str, reference: &str) -> Result<Credential> {
        let response: CredentialResponse = self
            .api
            .get(&format!(
                "/api/v0/deployed/products/{product_guid}/credentials/{reference}"
            ))
            .await?;
        let mut value = response.credential.value;

        // simple_credentials carry identity/password, secrets only a secret
        let password = value
            .remove("password")
            .or_else(|| value.remove("secret"))
            .unwrap_or_default();
        Ok(Credential {
            identity: value.remove("identity").unwrap_or_default(),
            password,
        })
    }

    async fn product_properties(&self, product_guid: &str) -> Result<HashMap<String, Value>> {
        let response: PropertiesResponse = self
            .api
            .get(&format!("/api/v0/staged/products/{product_guid}/properties"))
            .await?;
        Ok(response
            .properties
            .into_iter()
            .map(|(name, property)| {
                let value = property.get("value").cloned().unwrap_or(Value::Null);
                (name, value)
            })
            .collect())
    }

    async fn director_credentials(&self) -> Result<DirectorCredentials> {
        let path = "/api/v0/deployed/director/credentials/bosh_commandline_credentials";
        let response: CommandlineCredentials = self.api.get(path).await?;
        parse_commandline_credentials(&response.credential).ok_or_else(|| {
            ClientError::InvalidResponse {
                url: self.api.url(path),
                reason: "incomplete bosh command line credentials".to_string(),
            }
        })
    }
}

pub struct HttpOpsManClientBuilder;

#[async_trait]
impl OpsManClientBuilder for HttpOpsManClientBuilder {
    async fn build(&self, foundation: &Foundation) -> Result<Arc<dyn OpsManClient>> {
        let method = foundation.authentication.resolve().map_err(|reason| {
            ConfigError::InvalidAuthentication {
                foundation: foundation.url.clone(),
                reason,
            }
        })?;

        let http = build_http_client(foundation.skip_ssl_validation, None)?;
        let auth = Authorizer::new(&http, method, "opsman");
        Ok(Arc::new(HttpOpsManClient {
            api: ApiClient::new(http, &foundation.url, auth),
        }))
    }
}
