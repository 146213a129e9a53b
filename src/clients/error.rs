use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("organization {name:?} not found")]
    OrgNotFound { name: String },

    #[error("space {name:?} not found in organization {org:?}")]
    SpaceNotFound { org: String, name: String },

    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("authentication against {url} failed: {reason}")]
    Authentication { url: String, reason: String },

    #[error("{method} {url} returned {status}: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("job {url} failed: {reason}")]
    JobFailed { url: String, reason: String },

    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClientError::OrgNotFound { .. }
                | ClientError::SpaceNotFound { .. }
                | ClientError::NotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
