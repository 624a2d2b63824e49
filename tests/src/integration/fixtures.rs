//! Shared setup for the integration scenarios.

use std::sync::Arc;
use std::time::Duration;

use peril_game::GameMap;
use peril_runtime::{ClientError, GameClient};
use shared_bus::{BrokerConnection, InMemoryBroker, InMemoryConnection};
use shared_types::routing::EXCHANGES;

/// A broker with the game's exchanges provisioned.
pub fn broker() -> InMemoryBroker {
    InMemoryBroker::with_exchanges(&EXCHANGES)
}

/// The map used by every scenario.
pub fn map() -> GameMap {
    GameMap::new(["region1", "region7", "europe"]).unwrap()
}

/// A fresh connection, shared so a test can close it under a client.
pub fn connect(broker: &InMemoryBroker) -> Arc<InMemoryConnection> {
    Arc::new(broker.connect())
}

/// Start `username`'s client on its own connection.
pub async fn client(broker: &InMemoryBroker, username: &str) -> Result<GameClient, ClientError> {
    let connection: Arc<dyn BrokerConnection> = connect(broker);
    GameClient::start(connection, username, map()).await
}

/// Poll `condition` until it holds, panicking after one second.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let reached = tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "condition not reached within one second");
}
