//! # Game Client
//!
//! Wires one player's process to the broker.
//!
//! ## Startup
//!
//! 1. Subscribe `pause.<username>` to `direct-control`/`pause` (transient)
//! 2. Subscribe `army-move.<username>` to `topic-events`/`army-move.*`
//!    (transient, so the player also hears its own moves)
//! 3. Open the publishing channel
//!
//! ## Move flow
//!
//! ```text
//! move cmd ──→ GameCoordinator::command_move ──→ ArmyMove
//!                                                  │
//!                      army-move.<username> ←──publish──┤
//!                      game-log.<username>  ←──publish──┘ (best effort)
//! ```
//!
//! If the move cannot be published it is taken back, so a failed command
//! leaves no trace.

use std::sync::Arc;

use peril_game::{GameCoordinator, GameMap};
use shared_bus::{subscribe_json, BrokerConnection, Publisher, QueueBinding, SubscriptionRegistry};
use shared_types::routing::{
    self, ARMY_MOVES_PREFIX, EXCHANGE_DIRECT, EXCHANGE_TOPIC, PAUSE_KEY,
};
use shared_types::{ArmyMove, GameLog};
use tracing::{info, warn};

use crate::errors::ClientError;
use crate::handlers;
use crate::repl::{ClientCommand, Reply, CLIENT_HELP};

pub struct GameClient {
    game: Arc<GameCoordinator>,
    publisher: Publisher,
    subscriptions: SubscriptionRegistry,
    connection: Arc<dyn BrokerConnection>,
}

impl GameClient {
    /// Subscribe `username`'s queues and open a publishing channel.
    pub async fn start(
        connection: Arc<dyn BrokerConnection>,
        username: &str,
        map: GameMap,
    ) -> Result<Self, ClientError> {
        let game = Arc::new(GameCoordinator::new(username, map));
        let mut subscriptions = SubscriptionRegistry::new();

        let pause = QueueBinding::transient(
            EXCHANGE_DIRECT,
            routing::pause_queue(username),
            PAUSE_KEY,
        );
        subscriptions.register(
            subscribe_json(
                connection.as_ref(),
                &pause,
                handlers::pause_handler(Arc::clone(&game)),
            )
            .await?,
        );

        let moves = QueueBinding::transient(
            EXCHANGE_TOPIC,
            routing::army_move_queue(username),
            routing::all_players(ARMY_MOVES_PREFIX),
        );
        subscriptions.register(
            subscribe_json(
                connection.as_ref(),
                &moves,
                handlers::move_handler(Arc::clone(&game)),
            )
            .await?,
        );

        let channel = connection
            .open_channel()
            .await
            .map_err(ClientError::Channel)?;

        info!(
            player = username,
            queues = ?subscriptions.queues(),
            "Client ready"
        );

        Ok(Self {
            game,
            publisher: Publisher::json(channel),
            subscriptions,
            connection,
        })
    }

    pub fn game(&self) -> &Arc<GameCoordinator> {
        &self.game
    }

    pub fn username(&self) -> &str {
        self.game.username()
    }

    /// Run one line of player input.
    pub async fn handle_line(&self, line: &str) -> Result<Reply, ClientError> {
        let Some(command) = ClientCommand::parse(line) else {
            return Ok(Reply::Silent);
        };

        match command {
            ClientCommand::Spawn(args) => {
                let units = self.game.command_spawn(&args)?;
                let text = match units.first() {
                    Some(unit) => format!("Spawned {} {} in {}", units.len(), unit.rank, unit.region),
                    None => "Nothing spawned".to_string(),
                };
                Ok(Reply::Text(text))
            }
            ClientCommand::Move(args) => {
                let army = self.game.command_move(&args)?;
                self.broadcast_move(&army).await?;
                Ok(Reply::Text(describe_move(&army)))
            }
            ClientCommand::Status => Ok(Reply::Text(self.game.command_status().to_string())),
            ClientCommand::Spam => Ok(Reply::Text("Spamming not allowed yet!".to_string())),
            ClientCommand::Help => Ok(Reply::Text(CLIENT_HELP.to_string())),
            ClientCommand::Quit => Ok(Reply::Quit),
            ClientCommand::Unknown(word) => Ok(Reply::Text(format!(
                "Unknown command '{word}'. Type 'help' for a list of commands."
            ))),
        }
    }

    async fn broadcast_move(&self, army: &ArmyMove) -> Result<(), ClientError> {
        let key = routing::army_move_key(self.username());
        if let Err(e) = self.publisher.publish(EXCHANGE_TOPIC, &key, army).await {
            self.game.cancel_move(army);
            return Err(e.into());
        }
        info!(player = %self.username(), to_region = %army.to_region, "Move published");

        let entry = GameLog::now(self.username(), describe_move(army));
        let log_key = routing::game_log_key(self.username());
        if let Err(e) = self.publisher.publish(EXCHANGE_TOPIC, &log_key, &entry).await {
            warn!(player = %self.username(), error = %e, "Failed to publish game log");
        }
        Ok(())
    }

    /// Close subscriptions, then the connection.
    pub async fn shutdown(mut self) {
        self.subscriptions.close_all().await;
        if let Err(e) = self.connection.close().await {
            warn!(error = %e, "Failed to close broker connection");
        }
        info!(player = %self.username(), "Client stopped");
    }
}

fn describe_move(army: &ArmyMove) -> String {
    match army.units.first() {
        Some(unit) => format!(
            "Moved {} {} to {}",
            army.units.len(),
            unit.rank,
            army.to_region
        ),
        None => format!("Moved no units to {}", army.to_region),
    }
}
