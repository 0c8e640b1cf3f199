//! Daemon restarts through the node's service-control program
//!
//! Logical service names (`apiserver`, `kube-proxy`, `containerd`, ...) are
//! mapped to daemon units and restarted with a single
//! `snapctl restart microk8s.daemon-<name>` style command. When the
//! combined-mode lock (`$SNAP_DATA/var/lock/lite.lock`) exists, the
//! control-plane services all run inside one `kubelite` daemon.
//!
//! ```text
//! restart("kube-apiserver")
//!   ├─ lite.lock absent  → snapctl restart microk8s.daemon-apiserver
//!   └─ lite.lock present → snapctl restart microk8s.daemon-kubelite
//! ```

pub mod dispatcher;
pub mod runner;

pub use dispatcher::{daemon_name, ServiceDispatcher, COMBINED_DAEMON};
pub use runner::{CommandRunner, ControlCommand, ProcessRunner, RecordingRunner};
