pub mod agent_config;
pub mod arguments;
pub mod clienv;
pub mod error;
pub mod services;

pub use agent_config::AgentConfig;
pub use arguments::{ArgumentStore, ServiceArgument};
pub use error::{AgentError, Result};
pub use services::{CommandRunner, ControlCommand, ProcessRunner, RecordingRunner, ServiceDispatcher};
