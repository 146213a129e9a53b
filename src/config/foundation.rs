use crate::config::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// One Ops-Manager-fronted platform acting as migration source or target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Foundation {
    /// Ops Manager URL
    pub url: String,
    pub authentication: Authentication,
    /// Ops Manager VM hostname used for SSH tunnels
    pub hostname: String,
    pub ssh_user: String,
    /// Path to the private key for `ssh_user`
    pub private_key: String,
    pub skip_ssl_validation: bool,
    /// Explicit director access; derived from Ops Manager when absent
    pub bosh: Option<BoshAccess>,
    /// Explicit Cloud Controller access; derived from Ops Manager when absent
    pub cloud_controller: Option<CloudControllerAccess>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authentication {
    pub basic: Option<BasicAuth>,
    pub uaa: Option<UaaAuth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UaaAuth {
    pub url: String,
    pub client_credentials: Option<ClientCredentials>,
    pub user_credentials: Option<UserCredentials>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientCredentials {
    pub id: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoshAccess {
    pub url: String,
    pub authentication: Authentication,
    /// Proxy for director and VM access, e.g. `ssh+socks5://ubuntu@opsman:22?private-key=key.pem`
    pub all_proxy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudControllerAccess {
    /// API URL, e.g. `https://api.sys.example.com`
    pub url: String,
    pub authentication: Authentication,
}

/// Authentication resolved to a single method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Basic { username: String, password: String },
    Uaa { url: String, grant: UaaGrant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UaaGrant {
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    Password {
        username: String,
        password: String,
    },
}

impl Authentication {
    pub fn basic(username: &str, password: &str) -> Self {
        Self {
            basic: Some(BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            }),
            uaa: None,
        }
    }

    pub fn uaa_client(url: &str, id: &str, secret: &str) -> Self {
        Self {
            basic: None,
            uaa: Some(UaaAuth {
                url: url.to_string(),
                client_credentials: Some(ClientCredentials {
                    id: id.to_string(),
                    secret: secret.to_string(),
                }),
                user_credentials: None,
            }),
        }
    }

    /// Resolve to exactly one authentication method, or explain why not
    pub fn resolve(&self) -> std::result::Result<AuthMethod, String> {
        match (&self.basic, &self.uaa) {
            (Some(basic), None) => {
                if basic.username.is_empty() || basic.password.is_empty() {
                    return Err("basic authentication requires username and password".to_string());
                }
                Ok(AuthMethod::Basic {
                    username: basic.username.clone(),
                    password: basic.password.clone(),
                })
            }
            (None, Some(uaa)) => {
                if uaa.url.is_empty() {
                    return Err("UAA authentication requires a url".to_string());
                }
                let grant = match (&uaa.client_credentials, &uaa.user_credentials) {
                    (Some(client), None) => UaaGrant::ClientCredentials {
                        client_id: client.id.clone(),
                        client_secret: client.secret.clone(),
                    },
                    (None, Some(user)) => UaaGrant::Password {
                        username: user.username.clone(),
                        password: user.password.clone(),
                    },
                    _ => {
                        return Err(
                            "UAA authentication requires exactly one of client credentials or user credentials"
                                .to_string(),
                        )
                    }
                };
                Ok(AuthMethod::Uaa {
                    url: uaa.url.clone(),
                    grant,
                })
            }
            _ => Err("exactly one of basic or UAA authentication must be set".to_string()),
        }
    }
}

impl Foundation {
    /// Check everything needed before any client is built.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingField {
                foundation: name.to_string(),
                field: "url".to_string(),
            });
        }

        self.authentication
            .resolve()
            .map_err(|reason| invalid_auth(name, reason))?;

        if let Some(bosh) = &self.bosh {
            bosh.authentication
                .resolve()
                .map_err(|reason| invalid_auth(&format!("{name} bosh"), reason))?;
        }

        if let Some(cc) = &self.cloud_controller {
            match cc.authentication.resolve() {
                Ok(AuthMethod::Uaa { .. }) => {}
                Ok(AuthMethod::Basic { .. }) => {
                    return Err(invalid_auth(
                        &format!("{name} cloud controller"),
                        "cloud controller requires UAA authentication".to_string(),
                    ))
                }
                Err(reason) => return Err(invalid_auth(&format!("{name} cloud controller"), reason)),
            }
        }

        Ok(())
    }

    /// Default proxy tunnelling through the Ops Manager VM, when SSH access is configured.
    pub fn ops_manager_proxy(&self) -> Option<String> {
        if self.hostname.is_empty() || self.ssh_user.is_empty() || self.private_key.is_empty() {
            return None;
        }
        Some(format!(
            "ssh+socks5://{}@{}:22?private-key={}",
            self.ssh_user, self.hostname, self.private_key
        ))
    }
}

fn invalid_auth(foundation: &str, reason: String) -> ConfigError {
    ConfigError::InvalidAuthentication {
        foundation: foundation.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foundation(auth: Authentication) -> Foundation {
        Foundation {
            url: "https://opsman.example.com".to_string(),
            authentication: auth,
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_auth_requires_both_fields() {
        let f = foundation(Authentication::basic("admin", ""));
        let err = f.validate("source").unwrap_err();
        assert!(err.to_string().contains("username and password"));
    }

    #[test]
    fn test_uaa_requires_single_grant() {
        let mut auth = Authentication::uaa_client("https://uaa", "id", "secret");
        auth.uaa.as_mut().unwrap().user_credentials = Some(UserCredentials {
            username: "admin".to_string(),
            password: "pw".to_string(),
        });
        assert!(foundation(auth).validate("target").is_err());

        let mut auth = Authentication::uaa_client("https://uaa", "id", "secret");
        auth.uaa.as_mut().unwrap().client_credentials = None;
        assert!(foundation(auth).validate("target").is_err());
    }

    #[test]
    fn test_uaa_requires_url() {
        let f = foundation(Authentication::uaa_client("", "id", "secret"));
        assert!(f.validate("source").is_err());
    }

    #[test]
    fn test_both_methods_rejected() {
        let mut auth = Authentication::basic("admin", "pw");
        auth.uaa = Authentication::uaa_client("https://uaa", "id", "secret").uaa;
        assert!(foundation(auth).validate("source").is_err());
        assert!(foundation(Authentication::default()).validate("source").is_err());
    }

    #[test]
    fn test_valid_foundation() {
        let f = foundation(Authentication::uaa_client("https://uaa", "id", "secret"));
        assert!(f.validate("source").is_ok());
        assert_eq!(
            f.authentication.resolve().unwrap(),
            AuthMethod::Uaa {
                url: "https://uaa".to_string(),
                grant: UaaGrant::ClientCredentials {
                    client_id: "id".to_string(),
                    client_secret: "secret".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_ops_manager_proxy() {
        let mut f = foundation(Authentication::basic("admin", "pw"));
        assert_eq!(f.ops_manager_proxy(), None);

        f.hostname = "opsman.example.com".to_string();
        f.ssh_user = "ubuntu".to_string();
        f.private_key = "/keys/opsman.pem".to_string();
        assert_eq!(
            f.ops_manager_proxy().as_deref(),
            Some("ssh+socks5://ubuntu@opsman.example.com:22?private-key=/keys/opsman.pem")
        );
    }
}
