use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Cannot encode {path}: {reason}")]
    Encode { path: String, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl LayoutError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        LayoutError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
