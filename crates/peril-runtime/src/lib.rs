//! # Peril Runtime Library
//!
//! The pieces the `peril-client` and `peril-server` binaries are built
//! from, exposed for the integration tests.
//!
//! - `config`: environment configuration
//! - `client`: `GameClient`, one player's subscriptions and commands
//! - `server`: `GameServer`, pause broadcast and the game log
//! - `handlers`: subscription callbacks
//! - `repl`: command-line parsing and help text
//! - `game_log`: the server's history file

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod config;
pub mod errors;
pub mod game_log;
pub mod handlers;
pub mod repl;
pub mod server;

pub use client::GameClient;
pub use config::{ClientConfig, ConfigError, ServerConfig};
pub use errors::{ClientError, ServerError};
pub use game_log::GameLogWriter;
pub use repl::Reply;
pub use server::GameServer;
