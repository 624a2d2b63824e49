//! Client/server scenarios over the in-memory broker.

#[cfg(test)]
pub mod fixtures;

mod army_moves;
mod game_log;
mod pause_flow;
mod topology;
