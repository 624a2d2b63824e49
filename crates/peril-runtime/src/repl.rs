//! # Command Line Parsing
//!
//! Turns a line typed at the prompt into a command. The first word picks
//! the command (case-insensitive); the remaining words are its arguments.

use std::io::{self, Write};

use tracing::debug;

pub const CLIENT_HELP: &str = "\
Possible commands:
* spawn <region> <unitType> <count>
    example: spawn europe infantry 3
* move <region> <unitType> <count>
    example: move europe infantry 2
* status
* spam <n>
* quit
* help";

pub const SERVER_HELP: &str = "\
Possible commands:
* pause
* resume
* quit
* help";

/// Print `text` to stdout without a newline and flush it.
pub fn prompt(text: &str) {
    if let Err(e) = write_prompt(&mut io::stdout().lock(), text) {
        debug!(error = %e, "Prompt not flushed");
    }
}

fn write_prompt<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Split `line` into whitespace-separated words.
pub fn words(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand<'a> {
    Spawn(Vec<&'a str>),
    Move(Vec<&'a str>),
    Status,
    Spam,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> ClientCommand<'a> {
    /// `None` for a blank line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let words = words(line);
        let (&first, args) = words.split_first()?;
        let command = match first.to_ascii_lowercase().as_str() {
            "spawn" => Self::Spawn(args.to_vec()),
            "move" => Self::Move(args.to_vec()),
            "status" => Self::Status,
            "spam" => Self::Spam,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(first),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCommand<'a> {
    Pause,
    Resume,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> ServerCommand<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let first = line.split_whitespace().next()?;
        let command = match first.to_ascii_lowercase().as_str() {
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(first),
        };
        Some(command)
    }
}

/// What the command loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this and read the next line.
    Text(String),
    /// Nothing to print.
    Silent,
    /// Leave the loop.
    Quit,
}
