use crate::clients::bosh::{BoshClient, BoshClientBuilder, Vm};
use crate::clients::http::{build_http_client, ApiClient, Authorizer};
use crate::clients::Result;
use crate::config::{AuthMethod, BoshAccess, ConfigError, UaaGrant};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct DirectorVm {
    #[serde(default)]
    job: String,
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: String,
    #[serde(default)]
    ips: Vec<String>,
}

pub struct HttpBoshClient {
    api: ApiClient,
    environment: String,
    all_proxy: Option<String>,
    cli_env: Vec<(String, String)>,
}

#[async_trait]
impl BoshClient for HttpBoshClient {
    async fn find_vms(&self, deployment: &str, job: &str) -> Result<Vec<Vm>> {
        debug!("Looking up {} VMs in deployment {}", job, deployment);

        let vms: Vec<DirectorVm> = self
            .api
            .get(&format!("/deployments/{deployment}/vms"))
            .await?;

        let mut vms: Vec<Vm> = vms
            .into_iter()
            .filter(|vm| vm.job == job)
            .map(|vm| Vm {
                job: vm.job,
                index: vm.index,
                id: vm.id,
                ips: vm.ips,
            })
            .collect();
        vms.sort_by_key(|vm| vm.index);
        Ok(vms)
    }

    fn environment(&self) -> &str {
        &self.environment
    }

    fn all_proxy(&self) -> Option<&str> {
        self.all_proxy.as_deref()
    }

    fn cli_env(&self) -> Vec<(String, String)> {
        self.cli_env.clone()
    }
}

fn cli_env(access: &BoshAccess, method: &AuthMethod) -> Vec<(String, String)> {
    let mut env = vec![("BOSH_ENVIRONMENT".to_string(), access.url.clone())];

    match method {
        AuthMethod::Basic { username, password } => {
            env.push(("BOSH_CLIENT".to_string(), username.clone()));
            env.push(("BOSH_CLIENT_SECRET".to_string(), password.clone()));
        }
        AuthMethod::Uaa {
            grant:
                UaaGrant::ClientCredentials {
                    client_id,
                    client_secret,
                },
            ..
        } => {
            env.push(("BOSH_CLIENT".to_string(), client_id.clone()));
            env.push(("BOSH_CLIENT_SECRET".to_string(), client_secret.clone()));
        }
        AuthMethod::Uaa { .. } => {}
    }

    if let Some(proxy) = &access.all_proxy {
        env.push(("BOSH_ALL_PROXY".to_string(), proxy.clone()));
    }
    env
}

pub struct HttpBoshClientBuilder;

#[async_trait]
impl BoshClientBuilder for HttpBoshClientBuilder {
    async fn build(
        &self,
        access: &BoshAccess,
        skip_ssl_validation: bool,
    ) -> Result<Arc<dyn BoshClient>> {
        let method = access.authentication.resolve().map_err(|reason| {
            ConfigError::InvalidAuthentication {
                foundation: format!("bosh {}", access.url),
                reason,
            }
        })?;

        let http = build_http_client(skip_ssl_validation, access.all_proxy.as_deref())?;
        let env = cli_env(access, &method);
        let auth = Authorizer::new(&http, method, "bosh_cli");

        Ok(Arc::new(HttpBoshClient {
            api: ApiClient::new(http, &access.url, auth),
            environment: access.url.clone(),
            all_proxy: access.all_proxy.clone(),
            cli_env: env,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Authentication;

    #[test]
    fn test_cli_env_for_client_credentials() {
        let access = BoshAccess {
            url: "https://10.0.0.5:25555".to_string(),
            authentication: Authentication::uaa_client("https://10.0.0.5:8443", "ops_manager", "s3cret"),
            all_proxy: Some("ssh+socks5://ubuntu@opsman:22?private-key=/k".to_string()),
        };
        let method = access.authentication.resolve().unwrap();
        let env = cli_env(&access, &method);

        assert!(env.contains(&("BOSH_CLIENT".to_string(), "ops_manager".to_string())));
        assert!(env.contains(&("BOSH_CLIENT_SECRET".to_string(), "s3cret".to_string())));
        assert!(env.contains(&(
            "BOSH_ALL_PROXY".to_string(),
            "ssh+socks5://ubuntu@opsman:22?private-key=/k".to_string()
        )));
    }
}
