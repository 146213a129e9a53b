use crate::clients::ClientError;
use crate::executor::ExecutorError;
use crate::layout::LayoutError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("no migrator configured for service {offering:?}")]
    NotConfigured { offering: String },

    /// The strategy decided the instance is out of scope
    #[error("{0}")]
    Skipped(String),

    #[error("no VMs for job {job:?} in deployment {deployment:?}")]
    NoVms { deployment: String, job: String },

    #[error("missing artifact {path}")]
    MissingArtifact { path: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("failed to render {name} command: {reason}")]
    Template { name: String, reason: String },

    #[error("unexpected output from {program}: {reason}")]
    InvalidOutput { program: String, reason: String },

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl StrategyError {
    /// Reason to record when this outcome counts as skipped rather than failed
    pub fn skip_reason(&self) -> Option<String> {
        match self {
            StrategyError::NotConfigured { .. } => Some(self.to_string()),
            StrategyError::Skipped(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;
