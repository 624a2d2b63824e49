//! # Army Moves
//!
//! A move is broadcast on `army-move.<username>`; every client bound to
//! `army-move.*` hears it, including the mover.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use peril_game::{CommandError, GameCoordinator};
    use peril_runtime::{handlers, ClientError, GameClient, Reply};
    use shared_bus::{
        subscribe_json, BrokerConnection, BrokerError, PublishError, QueueBinding,
    };
    use shared_types::routing::EXCHANGE_TOPIC;
    use shared_types::UnitRank;

    use crate::integration::fixtures::{broker, client, connect, eventually, map};

    fn infantry_in(client: &GameClient, region: &str) -> usize {
        client
            .game()
            .command_status()
            .garrison_count(region, UnitRank::Infantry)
    }

    #[tokio::test]
    async fn test_move_reaches_other_players() {
        let broker = broker();
        let alice = client(&broker, "alice").await.unwrap();
        let bob = client(&broker, "bob").await.unwrap();

        alice.handle_line("spawn region7 infantry 5").await.unwrap();
        let reply = alice.handle_line("move region7 infantry 3").await.unwrap();
        assert_eq!(reply, Reply::Text("Moved 3 infantry to region7".into()));

        eventually(|| bob.game().command_status().visible.get("alice").is_some()).await;
        let status = bob.game().command_status();
        assert_eq!(status.visible["alice"]["region7"], 3);
        assert_eq!(bob.game().units_in_region("region7"), 3);
    }

    #[tokio::test]
    async fn test_own_broadcast_is_not_applied_twice() {
        let broker = broker();
        let alice = client(&broker, "alice").await.unwrap();

        // Watch the same topic to know when alice's echo has been delivered.
        let observer_conn = connect(&broker);
        let observer = Arc::new(GameCoordinator::new("observer", map()));
        let binding = QueueBinding::transient(EXCHANGE_TOPIC, "army-move.observer", "army-move.*");
        let _watch = subscribe_json(
            observer_conn.as_ref(),
            &binding,
            handlers::move_handler(Arc::clone(&observer)),
        )
        .await
        .unwrap();

        alice.handle_line("spawn region7 infantry 5").await.unwrap();
        alice.handle_line("move region7 infantry 3").await.unwrap();
        eventually(|| observer.units_in_region("region7") == 3).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(infantry_in(&alice, "region7"), 2);
        let status = alice.game().command_status();
        assert!(status.visible.is_empty());
        assert_eq!(status.dispatched.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_publish_takes_move_back() {
        let broker = broker();
        let conn = connect(&broker);
        let shared: Arc<dyn BrokerConnection> = conn.clone();
        let alice = GameClient::start(shared, "alice", map()).await.unwrap();

        alice.handle_line("spawn region7 infantry 5").await.unwrap();
        let before = alice.game().snapshot();

        conn.close().await.unwrap();
        let err = alice.handle_line("move region7 infantry 3").await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Publish(PublishError::Broker {
                source: BrokerError::ChannelClosed,
                ..
            })
        ));
        assert_eq!(alice.game().snapshot(), before);
        assert_eq!(infantry_in(&alice, "region7"), 5);
    }

    #[tokio::test]
    async fn test_invalid_commands_are_reported() {
        let broker = broker();
        let alice = client(&broker, "alice").await.unwrap();

        let err = alice.handle_line("move region7 infantry 1").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Command(CommandError::InsufficientUnits { available: 0, .. })
        ));

        let err = alice.handle_line("spawn atlantis infantry 1").await.unwrap_err();
        assert!(matches!(err, ClientError::Command(CommandError::UnknownRegion(_))));

        assert_eq!(
            alice.handle_line("spam").await.unwrap(),
            Reply::Text("Spamming not allowed yet!".into())
        );
        assert!(matches!(
            alice.handle_line("dance").await.unwrap(),
            Reply::Text(text) if text.contains("Unknown command 'dance'")
        ));
    }

    #[tokio::test]
    async fn test_shutdown_removes_transient_queues() {
        let broker = broker();
        let alice = client(&broker, "alice").await.unwrap();
        assert!(broker.queue_lifetime("army-move.alice").is_some());

        alice.shutdown().await;

        assert_eq!(broker.queue_lifetime("pause.alice"), None);
        assert_eq!(broker.queue_lifetime("army-move.alice"), None);
    }
}
