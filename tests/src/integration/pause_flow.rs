//! # Pause Flow
//!
//! `pause`/`resume` typed at the server reach every client's pause queue.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use peril_game::{CommandError, GameCoordinator};
    use peril_runtime::{handlers, ClientError, GameServer, Reply};
    use shared_bus::{publish_json, subscribe_json, BrokerConnection, QueueBinding};
    use shared_types::routing::{EXCHANGE_DIRECT, PAUSE_KEY};
    use shared_types::PlayingState;

    use crate::integration::fixtures::{broker, client, connect, eventually, map};

    #[tokio::test]
    async fn test_raw_pause_message_sets_flag() {
        let broker = broker();
        let conn = connect(&broker);
        let game = Arc::new(GameCoordinator::new("alice", map()));

        let binding = QueueBinding::transient(EXCHANGE_DIRECT, "pause.alice", PAUSE_KEY);
        let _subscription =
            subscribe_json(conn.as_ref(), &binding, handlers::pause_handler(Arc::clone(&game)))
                .await
                .unwrap();

        let channel = conn.open_channel().await.unwrap();
        publish_json(channel.as_ref(), EXCHANGE_DIRECT, PAUSE_KEY, &PlayingState::PAUSED)
            .await
            .unwrap();

        eventually(|| game.is_paused()).await;
    }

    #[tokio::test]
    async fn test_server_pause_reaches_every_client() {
        let broker = broker();
        let alice = client(&broker, "alice").await.unwrap();
        let bob = client(&broker, "bob").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let server = GameServer::start(connect(&broker), &dir.path().join("game.log"))
            .await
            .unwrap();

        let reply = server.handle_line("pause").await.unwrap();
        assert_eq!(reply, Reply::Text("Sent pause message".into()));

        eventually(|| alice.game().is_paused() && bob.game().is_paused()).await;

        server.handle_line("resume").await.unwrap();
        eventually(|| !alice.game().is_paused() && !bob.game().is_paused()).await;
    }

    #[tokio::test]
    async fn test_paused_client_refuses_moves() {
        let broker = broker();
        let alice = client(&broker, "alice").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let server = GameServer::start(connect(&broker), &dir.path().join("game.log"))
            .await
            .unwrap();

        alice.handle_line("spawn region1 cavalry 2").await.unwrap();
        server.handle_line("pause").await.unwrap();
        eventually(|| alice.game().is_paused()).await;

        let before = alice.game().snapshot();
        let err = alice.handle_line("move region1 cavalry 1").await.unwrap_err();
        assert!(matches!(err, ClientError::Command(CommandError::Paused)));
        assert_eq!(alice.game().snapshot(), before);

        // Spawning is local and not gated.
        alice.handle_line("spawn region1 cavalry 1").await.unwrap();

        server.handle_line("resume").await.unwrap();
        eventually(|| !alice.game().is_paused()).await;
        assert!(alice.handle_line("move region1 cavalry 3").await.is_ok());
    }

    #[tokio::test]
    async fn test_server_commands() {
        let broker = broker();
        let dir = tempfile::tempdir().unwrap();
        let server = GameServer::start(connect(&broker), &dir.path().join("game.log"))
            .await
            .unwrap();

        assert!(matches!(server.handle_line("help").await.unwrap(), Reply::Text(_)));
        assert_eq!(server.handle_line("  ").await.unwrap(), Reply::Silent);
        assert_eq!(server.handle_line("quit").await.unwrap(), Reply::Quit);

        server.shutdown().await;
    }
}
