use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {foundation} authentication: {reason}")]
    InvalidAuthentication { foundation: String, reason: String },

    #[error("missing required field {field} for {foundation} foundation")]
    MissingField { foundation: String, field: String },

    #[error("invalid org pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unknown migrator {name:?}")]
    UnknownMigrator { name: String },

    #[error("failed to decode settings for migrator {name:?}: {reason}")]
    InvalidMigratorSettings { name: String, reason: String },

    #[error("invalid domain replacement {entry:?}, expected old=new")]
    InvalidDomainReplacement { entry: String },

    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid YAML in {path}: {reason}")]
    InvalidYaml { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
