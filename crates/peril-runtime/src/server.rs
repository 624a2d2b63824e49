//! # Game Server
//!
//! Broadcasts pause/resume to every client and keeps the shared game log.
//!
//! The `game-log` queue is durable and bound to `game-log.*`, so lines
//! published while no server runs are written once one starts.

use std::path::Path;
use std::sync::Arc;

use shared_bus::{subscribe_json, BrokerConnection, Publisher, QueueBinding, SubscriptionRegistry};
use shared_types::routing::{
    self, EXCHANGE_DIRECT, EXCHANGE_TOPIC, GAME_LOG_PREFIX, GAME_LOG_QUEUE, PAUSE_KEY,
};
use shared_types::PlayingState;
use tracing::{info, warn};

use crate::errors::ServerError;
use crate::game_log::GameLogWriter;
use crate::handlers;
use crate::repl::{Reply, ServerCommand, SERVER_HELP};

pub struct GameServer {
    publisher: Publisher,
    subscriptions: SubscriptionRegistry,
    connection: Arc<dyn BrokerConnection>,
}

impl GameServer {
    /// Open the game log, subscribe to `game-log` and open a publishing
    /// channel.
    pub async fn start(
        connection: Arc<dyn BrokerConnection>,
        game_log_path: &Path,
    ) -> Result<Self, ServerError> {
        let writer = GameLogWriter::open(game_log_path).map_err(|source| ServerError::GameLog {
            path: game_log_path.to_path_buf(),
            source,
        })?;

        let mut subscriptions = SubscriptionRegistry::new();
        let game_log = QueueBinding::durable(
            EXCHANGE_TOPIC,
            GAME_LOG_QUEUE,
            routing::all_players(GAME_LOG_PREFIX),
        );
        subscriptions.register(
            subscribe_json(
                connection.as_ref(),
                &game_log,
                handlers::game_log_handler(Arc::new(writer)),
            )
            .await?,
        );

        let channel = connection
            .open_channel()
            .await
            .map_err(ServerError::Channel)?;

        info!(game_log = %game_log_path.display(), "Server ready");

        Ok(Self {
            publisher: Publisher::json(channel),
            subscriptions,
            connection,
        })
    }

    /// Run one line of operator input.
    pub async fn handle_line(&self, line: &str) -> Result<Reply, ServerError> {
        let Some(command) = ServerCommand::parse(line) else {
            return Ok(Reply::Silent);
        };

        match command {
            ServerCommand::Pause => {
                self.broadcast(PlayingState::PAUSED).await?;
                Ok(Reply::Text("Sent pause message".to_string()))
            }
            ServerCommand::Resume => {
                self.broadcast(PlayingState::RESUMED).await?;
                Ok(Reply::Text("Sent resume message".to_string()))
            }
            ServerCommand::Help => Ok(Reply::Text(SERVER_HELP.to_string())),
            ServerCommand::Quit => Ok(Reply::Quit),
            ServerCommand::Unknown(word) => Ok(Reply::Text(format!(
                "Unknown command '{word}'. Type 'help' for a list of commands."
            ))),
        }
    }

    async fn broadcast(&self, signal: PlayingState) -> Result<(), ServerError> {
        self.publisher
            .publish(EXCHANGE_DIRECT, PAUSE_KEY, &signal)
            .await?;
        info!(paused = signal.is_paused, "Pause state broadcast");
        Ok(())
    }

    /// Close subscriptions, then the connection.
    pub async fn shutdown(mut self) {
        self.subscriptions.close_all().await;
        if let Err(e) = self.connection.close().await {
            warn!(error = %e, "Failed to close broker connection");
        }
        info!(
            published = self.publisher.messages_published(),
            "Server stopped"
        );
    }
}
