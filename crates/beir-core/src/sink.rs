//! Audit event sinks.
//!
//! Stages never write the execution log directly; they receive a
//! `&mut dyn AuditSink`. Production wires a [`FileAuditSink`], tests use a
//! [`MemoryAuditSink`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::TrailError;
use crate::trail::AuditEvent;

pub trait AuditSink {
    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns `TrailError` when the event cannot be encoded or persisted.
    fn record(&mut self, event: &AuditEvent) -> Result<(), TrailError>;

    /// Push buffered events to durable storage.
    ///
    /// # Errors
    ///
    /// Returns `TrailError::Io` on write failure.
    fn flush(&mut self) -> Result<(), TrailError> {
        Ok(())
    }
}

/// Writes one line per event to a log file, truncating it on creation.
///
/// Buffered writes are flushed by [`AuditSink::flush`] and, best effort, on drop.
pub struct FileAuditSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileAuditSink {
    /// Create (or truncate) the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns `TrailError::Io` when the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, TrailError> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&mut self, event: &AuditEvent) -> Result<(), TrailError> {
        let line = event.to_line()?;
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TrailError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for FileAuditSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), "failed to flush execution log: {e}");
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    pub events: Vec<AuditEvent>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered log lines, as a file sink would have written them.
    ///
    /// # Errors
    ///
    /// Returns `TrailError::Encode` if an event fails to serialize.
    pub fn lines(&self) -> Result<Vec<String>, TrailError> {
        self.events.iter().map(AuditEvent::to_line).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&mut self, event: &AuditEvent) -> Result<(), TrailError> {
        self.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::{StageLog, StageStatus, read_log};
    use pretty_assertions::assert_eq;

    fn stage(message: &str) -> AuditEvent {
        AuditEvent::Stage(StageLog {
            stage: "extraction".into(),
            status: StageStatus::Ok,
            source: "a.txt".into(),
            message: message.into(),
            records: Some(3),
        })
    }

    #[test]
    fn file_sink_writes_replayable_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        {
            let mut sink = FileAuditSink::create(&path).unwrap();
            sink.record(&stage("first")).unwrap();
            sink.record(&stage("second")).unwrap();
            sink.flush().unwrap();
        }
        let events = read_log(&path).unwrap();
        assert_eq!(events, vec![stage("first"), stage("second")]);
    }

    #[test]
    fn file_sink_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, "stale\n").unwrap();
        {
            let mut sink = FileAuditSink::create(&path).unwrap();
            sink.record(&stage("fresh")).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert!(text.starts_with("INFO | STAGE_LOG: "));
    }

    #[test]
    fn memory_sink_renders_lines() {
        let mut sink = MemoryAuditSink::new();
        sink.record(&stage("x")).unwrap();
        let lines = sink.lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"Records\":3"));
    }
}
