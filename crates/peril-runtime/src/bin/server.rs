//! # Peril Server
//!
//! Persists the shared game log and broadcasts pause/resume on operator
//! command.

use std::sync::Arc;

use anyhow::{Context, Result};
use peril_runtime::repl::{prompt, SERVER_HELP};
use peril_runtime::{GameServer, Reply, ServerConfig};
use peril_telemetry::{init_telemetry, TelemetryConfig};
use shared_bus::amqp::redact;
use shared_bus::AmqpConnection;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env("peril-server"))?;
    let config = ServerConfig::from_env().context("Invalid configuration")?;

    println!("Starting Peril server...");
    let connection = AmqpConnection::connect(&config.amqp_url)
        .await
        .with_context(|| format!("Failed to connect to {}", redact(&config.amqp_url)))?;

    let server = GameServer::start(Arc::new(connection), &config.game_log_path)
        .await
        .context("Failed to start server")?;
    println!("{SERVER_HELP}");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt("> ");

        let line = tokio::select! {
            line = input.next_line() => line.context("Failed to read command")?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("Interrupt received");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match server.handle_line(&line).await {
            Ok(Reply::Text(text)) => println!("{}", text.trim_end()),
            Ok(Reply::Silent) => {}
            Ok(Reply::Quit) => {
                println!("Exiting...");
                break;
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    server.shutdown().await;
    Ok(())
}
