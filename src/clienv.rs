use std::path::PathBuf;

const SNAP_DATA: &str = "SNAP_DATA";
const CLUSTER_AGENT_CONFIG: &str = "CLUSTER_AGENT_CONFIG";
const CLUSTER_AGENT_CONTROL_COMMAND: &str = "CLUSTER_AGENT_CONTROL_COMMAND";
const CLUSTER_AGENT_DAEMON_PREFIX: &str = "CLUSTER_AGENT_DAEMON_PREFIX";

const DEFAULT_SNAP_DATA: &str = "/var/snap/microk8s/current";
const DEFAULT_CONTROL_COMMAND: &str = "snapctl";
const DEFAULT_DAEMON_PREFIX: &str = "microk8s.daemon";
const FALLBACK_CONFIG_DIR: &str = "~/.config";
const AGENT_SUBDIR: &str = "cluster-agent";

/// Non-empty value of an environment variable.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

/// Snap data directory ($SNAP_DATA or /var/snap/microk8s/current)
pub fn snap_data() -> PathBuf {
    let dir = PathBuf::from(env_or(SNAP_DATA, DEFAULT_SNAP_DATA));
    tracing::trace!(dir = %dir.display(), "Resolved snap data directory");
    dir
}

/// Agent config file ($CLUSTER_AGENT_CONFIG or ~/.config/cluster-agent/config.toml)
pub fn config_path() -> PathBuf {
    let path = env_opt(CLUSTER_AGENT_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CONFIG_DIR))
                .join(AGENT_SUBDIR)
                .join("config.toml")
        });
    tracing::trace!(path = %path.display(), "Resolved agent config path");
    path
}

/// Service control program ($CLUSTER_AGENT_CONTROL_COMMAND or "snapctl")
pub fn control_command() -> String {
    let cmd = env_or(CLUSTER_AGENT_CONTROL_COMMAND, DEFAULT_CONTROL_COMMAND);
    tracing::trace!(command = %cmd, "Control command");
    cmd
}

/// Daemon unit prefix ($CLUSTER_AGENT_DAEMON_PREFIX or "microk8s.daemon")
pub fn daemon_prefix() -> String {
    let prefix = env_or(CLUSTER_AGENT_DAEMON_PREFIX, DEFAULT_DAEMON_PREFIX);
    tracing::trace!(prefix = %prefix, "Daemon prefix");
    prefix
}
