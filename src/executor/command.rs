use crate::executor::{ExecutorError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One external program invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Feed this file to stdin instead of an empty stream
    pub stdin_file: Option<PathBuf>,
    /// Write stdout to this file instead of capturing it
    pub stdout_file: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            ..Default::default()
        }
    }

    /// Split a rendered command line into program and arguments, shell-style.
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = shell_words::split(line).map_err(|e| ExecutorError::InvalidCommandLine {
            line: line.to_string(),
            reason: e.to_string(),
        })?;
        if words.is_empty() {
            return Err(ExecutorError::InvalidCommandLine {
                line: line.to_string(),
                reason: "empty command".to_string(),
            });
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
            ..Default::default()
        })
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(vars);
        self
    }

    pub fn stdin_from(mut self, path: &Path) -> Self {
        self.stdin_file = Some(path.to_path_buf());
        self
    }

    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout_file = Some(path.to_path_buf());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    /// Empty when stdout went to a file
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run to completion. A non-zero exit is an error.
    async fn execute(&self, spec: &CommandSpec, cancel: &CancellationToken) -> Result<CommandOutput>;
}

/// Runs local processes, killing them on timeout or cancellation
pub struct ShellExecutor {
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, spec: &CommandSpec, cancel: &CancellationToken) -> Result<CommandOutput> {
        let program_path = which::which(&spec.program).map_err(|_| ExecutorError::ProgramNotFound {
            program: spec.program.clone(),
        })?;

        let mut cmd = Command::new(program_path);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &spec.stdin_file {
            Some(path) => cmd.stdin(Stdio::from(std::fs::File::open(path)?)),
            None => cmd.stdin(Stdio::null()),
        };
        match &spec.stdout_file {
            Some(path) => cmd.stdout(Stdio::from(std::fs::File::create(path)?)),
            None => cmd.stdout(Stdio::piped()),
        };

        // Arguments may carry credentials, only the program is logged
        debug!("Running {} ({} args)", spec.program, spec.args.len());

        let child = cmd.spawn().map_err(|source| ExecutorError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let output = tokio::select! {
            result = tokio::time::timeout(self.timeout, child.wait_with_output()) => match result {
                Ok(output) => output?,
                Err(_) => {
                    return Err(ExecutorError::Timeout {
                        program: spec.program.clone(),
                        timeout_secs: self.timeout.as_secs(),
                    })
                }
            },
            _ = cancel.cancelled() => {
                return Err(ExecutorError::Cancelled {
                    program: spec.program.clone(),
                })
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(ExecutorError::Failed {
                program: spec.program.clone(),
                exit_code,
                stderr,
            });
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let spec = CommandSpec::parse("ssh -i '/keys/my key.pem' vcap@10.0.0.1 \"echo hi\"").unwrap();
        assert_eq!(spec.program, "ssh");
        assert_eq!(
            spec.args,
            vec!["-i", "/keys/my key.pem", "vcap@10.0.0.1", "echo hi"]
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_unbalanced() {
        assert!(CommandSpec::parse("   ").is_err());
        assert!(CommandSpec::parse("echo 'unterminated").is_err());
    }
}
