//! # Peril Client
//!
//! One player's process: subscribes to pause and army-move broadcasts and
//! reads commands from stdin until `quit`, end of input or Ctrl+C.

use std::sync::Arc;

use anyhow::{Context, Result};
use peril_runtime::config::validate_username;
use peril_runtime::repl::{prompt, CLIENT_HELP};
use peril_runtime::{ClientConfig, GameClient, Reply};
use peril_telemetry::{init_telemetry, TelemetryConfig};
use shared_bus::amqp::redact;
use shared_bus::AmqpConnection;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

type Input = Lines<BufReader<Stdin>>;

/// Ask until a usable name is entered. `None` on end of input.
async fn prompt_username(input: &mut Input) -> Result<Option<String>> {
    loop {
        prompt("Please enter your username: ");
        let Some(line) = input.next_line().await.context("Failed to read username")? else {
            return Ok(None);
        };
        match validate_username(&line) {
            Ok(name) => return Ok(Some(name)),
            Err(e) => println!("{e}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env("peril-client"))?;
    let config = ClientConfig::from_env().context("Invalid configuration")?;

    println!("Starting Peril client...");
    let connection = AmqpConnection::connect(&config.amqp_url)
        .await
        .with_context(|| format!("Failed to connect to {}", redact(&config.amqp_url)))?;
    let connection = Arc::new(connection);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let username = match config.username {
        Some(name) => name,
        None => match prompt_username(&mut input).await? {
            Some(name) => name,
            None => return Ok(()),
        },
    };
    println!("Welcome, {username}!");

    let client = GameClient::start(connection, &username, config.map)
        .await
        .context("Failed to start client")?;
    println!("{CLIENT_HELP}");

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

        match client.handle_line(&line).await {
            Ok(Reply::Text(text)) => println!("{}", text.trim_end()),
            Ok(Reply::Silent) => {}
            Ok(Reply::Quit) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    client.shutdown().await;
    Ok(())
}
