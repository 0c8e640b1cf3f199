use super::runner::{CommandRunner, ControlCommand};
use crate::agent_config::AgentConfig;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Daemon serving the control-plane services when the node runs in combined mode.
pub const COMBINED_DAEMON: &str = "kubelite";

/// Daemon behind a control-plane service name or its `kube-` alias.
fn control_plane_daemon(service: &str) -> Option<&'static str> {
    match service {
        "apiserver" | "kube-apiserver" => Some("apiserver"),
        "proxy" | "kube-proxy" => Some("proxy"),
        "kubelet" => Some("kubelet"),
        "scheduler" | "kube-scheduler" => Some("scheduler"),
        "controller-manager" | "kube-controller-manager" => Some("controller-manager"),
        _ => None,
    }
}

/// Map a logical service to the daemon that has to be restarted.
///
/// Only the control-plane services collapse onto [`COMBINED_DAEMON`];
/// `k8s-dqlite`, `cluster-agent`, `containerd` and unknown names pass through.
pub fn daemon_name(service: &str, combined: bool) -> &str {
    match control_plane_daemon(service) {
        Some(_) if combined => COMBINED_DAEMON,
        Some(daemon) => daemon,
        None => service,
    }
}

/// Issues `<control> restart <prefix>-<daemon>` for logical services.
pub struct ServiceDispatcher<R> {
    runner: R,
    lock_path: PathBuf,
    control_command: String,
    daemon_prefix: String,
}

impl<R: CommandRunner> ServiceDispatcher<R> {
    pub fn new(runner: R, config: &AgentConfig) -> Self {
        Self {
            runner,
            lock_path: config.lite_lock_path(),
            control_command: config.control_command.clone(),
            daemon_prefix: config.daemon_prefix.clone(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Whether the combined-mode lock exists right now.
    ///
    /// Errors while checking count as "no lock".
    pub fn combined_mode(&self) -> bool {
        match self.lock_path.try_exists() {
            Ok(exists) => exists,
            Err(e) => {
                warn!(
                    path = %self.lock_path.display(),
                    error = %e,
                    "Failed to check combined-mode lock, assuming it is absent"
                );
                false
            }
        }
    }

    pub fn resolve_daemon(&self, service: &str) -> String {
        let combined = control_plane_daemon(service).is_some() && self.combined_mode();
        daemon_name(service, combined).to_string()
    }

    pub fn restart_command(&self, service: &str) -> ControlCommand {
        let daemon = self.resolve_daemon(service);
        ControlCommand::new(&self.control_command)
            .arg("restart")
            .arg(format!("{}-{}", self.daemon_prefix, daemon))
    }

    /// Restart the daemon behind `service`.
    ///
    /// Nothing is issued when `cancel` is already cancelled. Runner failures
    /// are logged and not returned.
    pub async fn restart(&self, cancel: &CancellationToken, service: &str) {
        if cancel.is_cancelled() {
            debug!(service, "Restart skipped, already cancelled");
            return;
        }

        let command = self.restart_command(service);
        info!(service, command = %command, "Restarting service");

        if let Err(e) = self.runner.run(cancel, &command).await {
            warn!(service, command = %command, error = %e, "Restart command failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::runner::RecordingRunner;
    use std::fs;

    const CONTROL_PLANE: [&str; 9] = [
        "apiserver",
        "proxy",
        "kubelet",
        "scheduler",
        "controller-manager",
        "kube-apiserver",
        "kube-proxy",
        "kube-scheduler",
        "kube-controller-manager",
    ];

    fn dispatcher() -> (tempfile::TempDir, ServiceDispatcher<RecordingRunner>) {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig {
            snap_data: dir.path().to_path_buf(),
            control_command: "snapctl".into(),
            daemon_prefix: "microk8s.daemon".into(),
        };
        (dir, ServiceDispatcher::new(RecordingRunner::new(), &config))
    }

    fn create_lite_lock(dispatcher: &ServiceDispatcher<RecordingRunner>) {
        let lock = dispatcher.lock_path();
        fs::create_dir_all(lock.parent().unwrap()).unwrap();
        fs::write(lock, "").unwrap();
    }

    async fn restarted(d: &ServiceDispatcher<RecordingRunner>, service: &str) -> String {
        d.restart(&CancellationToken::new(), service).await;
        d.runner().last().unwrap()
    }

    #[test]
    fn daemon_name_table() {
        assert_eq!(daemon_name("kube-apiserver", false), "apiserver");
        assert_eq!(daemon_name("kube-controller-manager", false), "controller-manager");
        assert_eq!(daemon_name("kubelet", true), COMBINED_DAEMON);
        assert_eq!(daemon_name("containerd", true), "containerd");
        assert_eq!(daemon_name("etcd", true), "etcd");
        assert_eq!(daemon_name("kube-kubelet", true), "kube-kubelet");
    }

    #[tokio::test]
    async fn test_restart_without_kubelite() {
        let (_dir, d) = dispatcher();

        for (service, expected) in [
            ("apiserver", "snapctl restart microk8s.daemon-apiserver"),
            ("proxy", "snapctl restart microk8s.daemon-proxy"),
            ("kubelet", "snapctl restart microk8s.daemon-kubelet"),
            ("scheduler", "snapctl restart microk8s.daemon-scheduler"),
            ("controller-manager", "snapctl restart microk8s.daemon-controller-manager"),
            ("kube-apiserver", "snapctl restart microk8s.daemon-apiserver"),
            ("kube-proxy", "snapctl restart microk8s.daemon-proxy"),
            ("kube-scheduler", "snapctl restart microk8s.daemon-scheduler"),
            ("kube-controller-manager", "snapctl restart microk8s.daemon-controller-manager"),
            ("k8s-dqlite", "snapctl restart microk8s.daemon-k8s-dqlite"),
            ("cluster-agent", "snapctl restart microk8s.daemon-cluster-agent"),
            ("containerd", "snapctl restart microk8s.daemon-containerd"),
        ] {
            assert_eq!(restarted(&d, service).await, expected, "{service}");
        }
    }

    #[tokio::test]
    async fn test_restart_with_kubelite() {
        let (_dir, d) = dispatcher();
        create_lite_lock(&d);
        assert!(d.combined_mode());

        for service in CONTROL_PLANE {
            assert_eq!(
                restarted(&d, service).await,
                "snapctl restart microk8s.daemon-kubelite",
                "{service}"
            );
        }
        for service in ["k8s-dqlite", "cluster-agent", "containerd"] {
            assert_eq!(
                restarted(&d, service).await,
                format!("snapctl restart microk8s.daemon-{service}")
            );
        }
    }

    #[tokio::test]
    async fn lock_is_checked_on_every_call() {
        let (_dir, d) = dispatcher();
        assert_eq!(
            restarted(&d, "apiserver").await,
            "snapctl restart microk8s.daemon-apiserver"
        );

        create_lite_lock(&d);
        assert_eq!(
            restarted(&d, "apiserver").await,
            "snapctl restart microk8s.daemon-kubelite"
        );

        fs::remove_file(d.lock_path()).unwrap();
        assert_eq!(
            restarted(&d, "apiserver").await,
            "snapctl restart microk8s.daemon-apiserver"
        );
    }

    #[tokio::test]
    async fn unknown_service_passes_through() {
        let (_dir, d) = dispatcher();
        create_lite_lock(&d);
        assert_eq!(
            restarted(&d, "my-daemon").await,
            "snapctl restart microk8s.daemon-my-daemon"
        );
    }

    #[tokio::test]
    async fn cancelled_restart_is_not_issued() {
        let (_dir, d) = dispatcher();
        let cancel = CancellationToken::new();
        cancel.cancel();

        d.restart(&cancel, "apiserver").await;
        assert!(d.runner().commands().is_empty());
    }

    #[tokio::test]
    async fn runner_failure_does_not_escape() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig::with_snap_data(dir.path());
        let d = ServiceDispatcher::new(RecordingRunner::failing(), &config);

        d.restart(&CancellationToken::new(), "containerd").await;
        assert_eq!(d.runner().commands().len(), 1);
    }

    #[test]
    fn unreadable_lock_location_is_not_combined_mode() {
        let (dir, d) = dispatcher();
        // `var` is a regular file, so `var/lock/lite.lock` cannot be inspected
        fs::write(dir.path().join("var"), "").unwrap();

        assert!(!d.combined_mode());
        assert_eq!(d.resolve_daemon("kubelet"), "kubelet");
    }

    #[test]
    fn restart_command_uses_configured_program() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig {
            snap_data: dir.path().to_path_buf(),
            control_command: "systemctl".into(),
            daemon_prefix: "snap.microk8s.daemon".into(),
        };
        let d = ServiceDispatcher::new(RecordingRunner::new(), &config);

        let cmd = d.restart_command("kube-proxy");
        assert_eq!(cmd.program, "systemctl");
        assert_eq!(cmd.args, vec!["restart", "snap.microk8s.daemon-proxy"]);
    }
}
