//! Event Journal - Append-only JSONL storage
//!
//! Administrative events of compliance instances and modules. Writes are
//! append-only; the journal is shared between a compliance instance and
//! its modules, so `append` takes `&self`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ComplianceError, ComplianceResult};
use crate::event::ComplianceEvent;

enum Sink {
    File(File),
    Memory(Vec<ComplianceEvent>),
}

/// Append-only journal of compliance events
///
/// File-backed journals write one JSON-serialized [`ComplianceEvent`] per line.
/// In-memory journals keep the events for inspection.
pub struct EventJournal {
    path: PathBuf,
    sink: Mutex<Sink>,
}

impl EventJournal {
    /// Open (or create) a journal at the given path
    pub fn new(path: impl AsRef<Path>) -> ComplianceResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            sink: Mutex::new(Sink::File(file)),
        })
    }

    /// Create an in-memory journal
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            sink: Mutex::new(Sink::Memory(Vec::new())),
        }
    }

    /// Append an event
    pub fn append(&self, event: &ComplianceEvent) -> ComplianceResult<()> {
        let json = serde_json::to_string(event)?;
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| ComplianceError::LockPoisoned("event journal".to_string()))?;

        match &mut *sink {
            Sink::File(file) => {
                writeln!(file, "{}", json)?;
                file.flush()?;
            }
            Sink::Memory(events) => events.push(event.clone()),
        }

        tracing::debug!(event = event.name(), id = %event.id(), "Journal event appended");
        Ok(())
    }

    /// Read all events
    pub fn read_all(&self) -> ComplianceResult<Vec<ComplianceEvent>> {
        self.read_from(0)
    }

    /// Read events from a specific point (by line number)
    pub fn read_from(&self, start_line: usize) -> ComplianceResult<Vec<ComplianceEvent>> {
        if let Some(events) = self.memory_events()? {
            return Ok(events.into_iter().skip(start_line).collect());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut events = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            if i < start_line {
                continue;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }

    /// Get the current event count (for checkpointing)
    pub fn line_count(&self) -> ComplianceResult<usize> {
        if let Some(events) = self.memory_events()? {
            return Ok(events.len());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        Ok(reader.lines().count())
    }

    /// Get the path to the journal file (empty when in memory)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if this is an in-memory journal
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    fn memory_events(&self) -> ComplianceResult<Option<Vec<ComplianceEvent>>> {
        let sink = self
            .sink
            .lock()
            .map_err(|_| ComplianceError::LockPoisoned("event journal".to_string()))?;
        Ok(match &*sink {
            Sink::Memory(events) => Some(events.clone()),
            Sink::File(_) => None,
        })
    }
}

impl std::fmt::Debug for EventJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventJournal")
            .field("path", &self.path)
            .field("in_memory", &self.is_in_memory())
            .finish()
    }
}

#[cfg(test)]
impl EventJournal {
    /// Poison the sink so every later append fails
    pub(crate) fn poison(&self) {
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = self.sink.lock();
                    panic!("poison the journal");
                })
                .join();
        });
    }
}
