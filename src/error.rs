use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("failed to read arguments file {}: {source}", path.display())]
    ArgumentsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write arguments file {}: {source}", path.display())]
    ArgumentsWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid argument `{key}`: {reason}")]
    InvalidArgument { key: String, reason: String },

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to spawn `{command}`: {source}")]
    CommandSpawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{command}` was cancelled")]
    Cancelled { command: String },
}

impl AgentError {
    /// Underlying I/O error kind, for callers that branch on NotFound vs PermissionDenied.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::ArgumentsRead { source, .. }
            | Self::ArgumentsWrite { source, .. }
            | Self::ConfigRead { source, .. }
            | Self::CommandSpawn { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
