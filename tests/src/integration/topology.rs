//! # Topology
//!
//! Queue declarations that disagree with an existing queue fail at setup.

#[cfg(test)]
mod tests {
    use shared_bus::{
        declare_and_bind, BrokerError, QueueBinding, SubscribeError, TopologyError,
    };
    use shared_types::routing::{EXCHANGE_TOPIC, GAME_LOG_QUEUE};
    use shared_types::QueueLifetime;

    use peril_runtime::{ClientError, GameServer, ServerError};

    use crate::integration::fixtures::{broker, client, connect};

    #[tokio::test]
    async fn test_same_username_twice_is_locked_out() {
        let broker = broker();
        let _alice = client(&broker, "alice").await.unwrap();

        let err = client(&broker, "alice").await.err().unwrap();

        assert!(matches!(
            err,
            ClientError::Subscribe(SubscribeError::Topology(TopologyError::Declare {
                source: BrokerError::ResourceLocked(_),
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_server_rejects_transient_game_log() {
        let broker = broker();
        let squatter = connect(&broker);
        let binding = QueueBinding::transient(EXCHANGE_TOPIC, GAME_LOG_QUEUE, "game-log.*");
        declare_and_bind(squatter.as_ref(), &binding).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = GameServer::start(connect(&broker), &dir.path().join("game.log"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ServerError::Subscribe(SubscribeError::Topology(_))));
        assert_eq!(
            broker.queue_lifetime(GAME_LOG_QUEUE),
            Some(QueueLifetime::Transient)
        );
    }

    #[tokio::test]
    async fn test_unwritable_game_log_fails_startup() {
        let broker = broker();
        let dir = tempfile::tempdir().unwrap();

        let err = GameServer::start(connect(&broker), &dir.path().join("no/such/dir.log"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ServerError::GameLog { .. }));
    }
}
