//! JSONL event log.
//!
//! Writes each [`GameEvent`] as one JSON line to any `Write` destination
//! (stdout, file, pipe). Hosts drain the simulation's event buffer after a
//! tick and hand the batch to [`EventLog::record`].

use crate::events::GameEvent;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// JSONL sink for simulation events.
///
/// # Example
///
/// ```ignore
/// let mut log = EventLog::file("events.jsonl")?;
/// sim.run_month();
/// log.record(&sim.drain_events())?;
/// ```
pub struct EventLog {
    writer: Box<dyn Write + Send>,
    written: u64,
}

impl EventLog {
    /// Log to stdout, for piping to `jq` and friends.
    pub fn stdout() -> Self {
        Self::new(Box::new(BufWriter::new(std::io::stdout())))
    }

    /// Log to a file, truncating it.
    pub fn file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer, written: 0 }
    }

    /// Writes a batch of events and flushes.
    pub fn record(&mut self, events: &[GameEvent]) -> Result<(), EventLogError> {
        if events.is_empty() {
            return Ok(());
        }
        for event in events {
            serde_json::to_writer(&mut self.writer, event)?;
            writeln!(self.writer)?;
            self.written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Number of events written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
