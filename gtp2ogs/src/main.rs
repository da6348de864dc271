mod admission_policy;
mod config;
mod engine_pool;
mod error;
mod rest_client;
mod session_controller;
mod transport;

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use engine_adapter::Transport as GtpTransport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, EngineCommand};
use crate::engine_pool::{EnginePool, EngineRole, EngineSpec};
use crate::rest_client::RestClient;
use crate::session_controller::SessionController;
use crate::transport::ServerConnection;

/// gtp2ogs: bridges a local GTP-speaking engine to the server.
#[derive(Debug, Parser)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: std::path::PathBuf,

    /// Overrides the `verbosity`/`DEBUG` config key for this run.
    #[arg(long)]
    verbosity: Option<String>,
}

fn init_tracing(verbosity: Option<&str>) {
    let filter_directive = verbosity
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}=info", env!("CARGO_CRATE_NAME")));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter_directive.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true),
        )
        .init();
}

fn load_config(path: &std::path::Path) -> Result<Config, error::Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| error::Error::ConfigInvalid(format!("reading {}: {e}", path.display())))?;
    let config: Config = serde_json::from_str(&text)
        .map_err(|e| error::Error::ConfigInvalid(format!("parsing {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

fn engine_spec(command: &EngineCommand, json: bool) -> EngineSpec {
    let (program, args) = command
        .argv
        .split_first()
        .expect("validate() rejects an empty argv");
    EngineSpec {
        program: program.clone(),
        args: args.to_vec(),
        transport: if json { GtpTransport::Json } else { GtpTransport::Text },
    }
}

fn build_pool_specs(config: &Config) -> HashMap<EngineRole, (EngineSpec, u32)> {
    let mut specs = HashMap::new();
    specs.insert(
        EngineRole::Main,
        (engine_spec(&config.bot_command, config.json), config.bot_command.instances),
    );
    if let Some(opening) = &config.opening_bot {
        specs.insert(EngineRole::Opening, (engine_spec(opening, config.json), opening.instances));
    }
    if let Some(ending) = &config.ending_bot {
        specs.insert(EngineRole::Ending, (engine_spec(ending, config.json), ending.instances));
    }
    if let Some(resign) = &config.resign_bot {
        specs.insert(EngineRole::ResignCheck, (engine_spec(resign, config.json), resign.instances));
    }
    specs
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbosity.as_deref());

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "configuration is invalid");
            std::process::exit(1);
        }
    };
    let config = Arc::new(config);

    tracing::info!(bot_command = ?config.bot_command.argv, "spawning engine pool");
    let pools = match EnginePool::build(build_pool_specs(&config)).await {
        Ok(pools) => Arc::new(pools),
        Err(err) => {
            tracing::error!(%err, "failed to bring up the engine pool");
            std::process::exit(1);
        }
    };

    let rest = RestClient::new(config.rest_base_url.clone(), config.apikey.clone());
    let controller = SessionController::new(config.clone(), pools, rest);

    let connection = match ServerConnection::connect(&config.server_url).await {
        Ok(connection) => connection,
        Err(err) => {
            tracing::error!(%err, "failed to connect to the server");
            std::process::exit(1);
        }
    };

    if let Err(err) = controller.run(connection).await {
        tracing::error!(%err, "session controller exited with an error");
        std::process::exit(1);
    }
}
