use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Node-local settings shared by the argument store and the restart dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Root of the node's writable snap data (argument files, lock files)
    pub snap_data: PathBuf,
    /// Program used to issue restart directives (e.g. "snapctl")
    pub control_command: String,
    /// Prefix joined with the daemon name by "-" (e.g. "microk8s.daemon")
    pub daemon_prefix: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            snap_data: crate::clienv::snap_data(),
            control_command: crate::clienv::control_command(),
            daemon_prefix: crate::clienv::daemon_prefix(),
        }
    }
}

impl AgentConfig {
    pub fn with_snap_data(snap_data: impl Into<PathBuf>) -> Self {
        Self {
            snap_data: snap_data.into(),
            ..Self::default()
        }
    }

    /// Environment defaults overlaid with the config file, if one exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&crate::clienv::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::trace!(path = %path.display(), "Loading agent config");

        if !path.exists() {
            tracing::trace!("Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| AgentError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| AgentError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        tracing::trace!(snap_data = %config.snap_data.display(), control_command = %config.control_command, "Agent config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.control_command.trim().is_empty() {
            return Err(AgentError::Config("control_command must not be empty".into()));
        }
        if self.daemon_prefix.trim().is_empty() {
            return Err(AgentError::Config("daemon_prefix must not be empty".into()));
        }
        Ok(())
    }

    /// $SNAP_DATA/args
    pub fn args_dir(&self) -> PathBuf {
        self.snap_data.join("args")
    }

    /// $SNAP_DATA/var/lock/lite.lock
    pub fn lite_lock_path(&self) -> PathBuf {
        self.snap_data.join("var").join("lock").join("lite.lock")
    }
}
