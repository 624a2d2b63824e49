//! # Game Log
//!
//! Clients publish a `GameLog` after each move; the server appends it to
//! its log file. The queue is durable, so lines outlive a server restart.

#[cfg(test)]
mod tests {
    use std::path::Path;

    use peril_runtime::GameServer;
    use shared_bus::{publish_json, BrokerConnection};
    use shared_types::routing::{self, EXCHANGE_TOPIC, GAME_LOG_QUEUE};
    use shared_types::{GameLog, QueueLifetime};

    use crate::integration::fixtures::{broker, client, connect, eventually};

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_move_is_logged_by_server() {
        let broker = broker();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");
        let _server = GameServer::start(connect(&broker), &path).await.unwrap();
        let alice = client(&broker, "alice").await.unwrap();

        alice.handle_line("spawn region7 infantry 5").await.unwrap();
        alice.handle_line("move region7 infantry 3").await.unwrap();

        eventually(|| read(&path).contains("alice: Moved 3 infantry to region7")).await;
        assert_eq!(broker.queue_lifetime(GAME_LOG_QUEUE), Some(QueueLifetime::Durable));
    }

    #[tokio::test]
    async fn test_lines_wait_for_restarted_server() {
        let broker = broker();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");

        let server = GameServer::start(connect(&broker), &path).await.unwrap();
        server.shutdown().await;

        let conn = connect(&broker);
        let channel = conn.open_channel().await.unwrap();
        publish_json(
            channel.as_ref(),
            EXCHANGE_TOPIC,
            &routing::game_log_key("bob"),
            &GameLog::now("bob", "attacked while the server was down"),
        )
        .await
        .unwrap();
        assert_eq!(broker.ready_count(GAME_LOG_QUEUE), Some(1));

        let _server = GameServer::start(connect(&broker), &path).await.unwrap();
        eventually(|| read(&path).contains("bob: attacked while the server was down")).await;
    }

    #[tokio::test]
    async fn test_undecodable_line_is_dropped() {
        let broker = broker();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");
        let _server = GameServer::start(connect(&broker), &path).await.unwrap();

        let conn = connect(&broker);
        let channel = conn.open_channel().await.unwrap();
        let key = routing::game_log_key("mallory");
        publish_json(channel.as_ref(), EXCHANGE_TOPIC, &key, &"not a game log")
            .await
            .unwrap();
        publish_json(channel.as_ref(), EXCHANGE_TOPIC, &key, &GameLog::now("mallory", "ok"))
            .await
            .unwrap();

        eventually(|| read(&path).contains("mallory: ok")).await;
        assert_eq!(read(&path).lines().count(), 1);
    }
}
