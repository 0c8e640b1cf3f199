use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cluster-agent")]
#[command(version)]
#[command(about = "Inspect service arguments and restart node daemons", long_about = None)]
pub(crate) struct Cli {
    /// Override the snap data directory. Can also be set via SNAP_DATA env var.
    #[arg(long, global = true)]
    pub snap_data: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print the value of one argument of a service (empty when unset)
    Get {
        /// Service name (e.g., kube-apiserver)
        service: String,

        /// Argument key including dashes (e.g., --secure-port)
        #[arg(allow_hyphen_values = true)]
        key: String,
    },

    /// List every argument recognized in a service's arguments file
    List {
        service: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set and delete arguments of a service in one rewrite
    Set {
        service: String,

        /// Argument to set, as KEY=VALUE (repeatable)
        #[arg(long = "arg", value_name = "KEY=VALUE", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Argument key to remove (repeatable)
        #[arg(long = "delete", value_name = "KEY", allow_hyphen_values = true)]
        delete: Vec<String>,
    },

    /// Restart the daemons behind one or more services
    Restart {
        #[arg(required = true)]
        services: Vec<String>,

        /// Give up on a restart command after this many seconds
        #[arg(long, default_value = "60")]
        timeout: u64,
    },

    /// Print the restart command for a service without running it
    Resolve { service: String },
}
