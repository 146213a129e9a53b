//! Shared HTTP plumbing: client construction, UAA tokens and authorized requests

use crate::clients::{ClientError, Result};
use crate::config::{AuthMethod, UaaGrant};
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

pub fn build_http_client(skip_ssl_validation: bool, proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(skip_ssl_validation);

    if let Some(proxy) = proxy.filter(|p| is_http_proxy(p)) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    Ok(builder.build()?)
}

/// `ssh+socks5` tunnels are only understood by the bosh CLI, not by reqwest.
pub fn is_http_proxy(proxy: &str) -> bool {
    url::Url::parse(proxy)
        .map(|u| matches!(u.scheme(), "http" | "https" | "socks5" | "socks5h"))
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: i64,
}

fn default_expiry() -> i64 {
    600
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// OAuth2 token source against a UAA server, refreshed shortly before expiry
pub struct TokenSource {
    http: Client,
    token_url: String,
    grant: UaaGrant,
    password_client: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(http: Client, uaa_url: &str, grant: UaaGrant, password_client: &str) -> Self {
        Self {
            http,
            token_url: format!("{}/oauth/token", uaa_url.trim_end_matches('/')),
            grant,
            password_client: password_client.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch(&self) -> Result<CachedToken> {
        debug!("Requesting UAA token from {}", self.token_url);

        let request = match &self.grant {
            UaaGrant::ClientCredentials {
                client_id,
                client_secret,
            } => self
                .http
                .post(&self.token_url)
                .basic_auth(client_id, Some(client_secret))
                .form(&[("grant_type", "client_credentials")]),
            UaaGrant::Password { username, password } => self
                .http
                .post(&self.token_url)
                .basic_auth(&self.password_client, Some(""))
                .form(&[
                    ("grant_type", "password"),
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                ]),
        };

        let response = request.header(ACCEPT, "application/json").send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Authentication {
                url: self.token_url.clone(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        })
    }
}

pub enum Authorizer {
    Basic { username: String, password: String },
    Bearer(TokenSource),
}

impl Authorizer {
    /// `password_client` is the UAA client used for password grants ("cf", "opsman", "bosh_cli").
    pub fn new(http: &Client, method: AuthMethod, password_client: &str) -> Self {
        match method {
            AuthMethod::Basic { username, password } => Authorizer::Basic { username, password },
            AuthMethod::Uaa { url, grant } => {
                Authorizer::Bearer(TokenSource::new(http.clone(), &url, grant, password_client))
            }
        }
    }

    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self {
            Authorizer::Basic { username, password } => {
                Ok(request.basic_auth(username, Some(password)))
            }
            Authorizer::Bearer(source) => Ok(request.bearer_auth(source.token().await?)),
        }
    }
}

/// JSON API client bound to one base URL
pub struct ApiClient {
    http: Client,
    base_url: String,
    auth: Authorizer,
}

impl ApiClient {
    pub fn new(http: Client, base_url: &str, auth: Authorizer) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None).await
    }

    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let response = self.send_raw(method, path, body).await?;
        Ok(response.json().await?)
    }

    /// Send a request and fail on any non-success status.
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = self.auth.authorize(request).await?;

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus {
                method: method.to_string(),
                url,
                status,
                body,
            });
        }
        Ok(response)
    }
}
