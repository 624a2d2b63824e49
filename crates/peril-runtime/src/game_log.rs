//! Append-only game history file written by the server.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use shared_types::GameLog;

/// One line per [`GameLog`]: `<rfc3339 time> <username>: <message>`.
pub struct GameLogWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl GameLogWriter {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &GameLog) -> io::Result<()> {
        let line = format_line(entry);
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

fn format_line(entry: &GameLog) -> String {
    // Newlines inside a message would forge extra entries.
    let message = entry.message.replace(['\r', '\n'], " ");
    format!(
        "{} {}: {}\n",
        entry.current_time.to_rfc3339(),
        entry.username,
        message
    )
}
