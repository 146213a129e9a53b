use crate::clients::ClientError;
use crate::config::ConfigError;
use crate::layout::LayoutError;
use thiserror::Error;

/// Errors that abort a whole export or import command
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("organization {name:?} not found")]
    OrgNotFound { name: String },

    #[error("space {name:?} not found in organization {org:?}")]
    SpaceNotFound { org: String, name: String },

    #[error("import directory {dir:?} does not exist")]
    ImportDirMissing { dir: String },

    #[error("export directory {dir:?} is not empty")]
    ExportDirNotEmpty { dir: String },

    #[error("migration cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(ClientError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl From<ClientError> for MigrateError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::OrgNotFound { name } => MigrateError::OrgNotFound { name },
            ClientError::SpaceNotFound { org, name } => MigrateError::SpaceNotFound { org, name },
            ClientError::Configuration(e) => MigrateError::Config(e),
            other => MigrateError::Client(other),
        }
    }
}

impl MigrateError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MigrateError::OrgNotFound { .. }
                | MigrateError::SpaceNotFound { .. }
                | MigrateError::ImportDirMissing { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
