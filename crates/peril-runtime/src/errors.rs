//! Runtime error types.

use std::path::PathBuf;

use peril_game::CommandError;
use shared_bus::{BrokerError, PublishError, SubscribeError};
use thiserror::Error;

/// Failures of the client process.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Opening the publishing channel failed.
    #[error("failed to open publish channel: {0}")]
    Channel(#[source] BrokerError),

    #[error(transparent)]
    Subscribe(#[from] SubscribeError),

    /// Invalid player input; nothing changed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The move was taken back because it could not be broadcast.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Failures of the server process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to open publish channel: {0}")]
    Channel(#[source] BrokerError),

    #[error(transparent)]
    Subscribe(#[from] SubscribeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("cannot open game log {path}: {source}")]
    GameLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
