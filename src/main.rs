mod args;

use anyhow::{bail, Context, Result};
use args::{Cli, Commands};
use clap::Parser;
use cluster_agent::{AgentConfig, ArgumentStore, ProcessRunner, ServiceDispatcher};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AgentConfig::load().context("Failed to load agent config")?;
    if let Some(snap_data) = cli.snap_data {
        config.snap_data = snap_data;
    }

    match cli.command {
        Commands::Get { service, key } => {
            let store = ArgumentStore::from_config(&config);
            println!("{}", store.get_service_argument(&service, &key));
        }
        Commands::List { service, json } => cmd_list(&config, &service, json)?,
        Commands::Set {
            service,
            args,
            delete,
        } => cmd_set(&config, &service, &args, &delete)?,
        Commands::Restart { services, timeout } => cmd_restart(&config, &services, timeout).await,
        Commands::Resolve { service } => {
            let dispatcher = ServiceDispatcher::new(ProcessRunner, &config);
            println!("{}", dispatcher.restart_command(&service));
        }
    }

    Ok(())
}

fn cmd_list(config: &AgentConfig, service: &str, json: bool) -> Result<()> {
    let arguments = ArgumentStore::from_config(config).service_arguments(service);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&arguments).context("Failed to serialize arguments")?
        );
        return Ok(());
    }
    for argument in arguments {
        if argument.value.is_empty() {
            println!("{}", argument.key);
        } else {
            println!("{}={}", argument.key, argument.value);
        }
    }
    Ok(())
}

fn cmd_set(config: &AgentConfig, service: &str, args: &[String], delete: &[String]) -> Result<()> {
    let mut updates = HashMap::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("Invalid argument '{}', expected KEY=VALUE", arg);
        };
        updates.insert(key.trim().to_string(), value.trim().to_string());
    }

    ArgumentStore::from_config(config)
        .update_service_arguments(service, &updates, delete)
        .with_context(|| format!("Failed to update arguments of '{}'", service))?;
    Ok(())
}

async fn cmd_restart(config: &AgentConfig, services: &[String], timeout: u64) {
    let dispatcher = ServiceDispatcher::new(ProcessRunner, config);
    for service in services {
        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(timeout)).await;
            guard.cancel();
        });
        dispatcher.restart(&cancel, service).await;
        timer.abort();
    }
}
