use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("program not found on PATH: {program}")]
    ProgramNotFound { program: String },

    #[error("invalid command line {line:?}: {reason}")]
    InvalidCommandLine { line: String, reason: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("{program} was cancelled")]
    Cancelled { program: String },

    #[error("{program} exited with code {exit_code}: {stderr}")]
    Failed {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
