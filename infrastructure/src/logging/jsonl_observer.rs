//! JSONL file writer for discussion events.
//!
//! Each [`DiscussionEvent`] is serialized as a single JSON line carrying its
//! `type` tag plus a `timestamp`, appended to the file via a buffered writer.

use async_trait::async_trait;
use conclave_application::{DeliveryError, ObserverConnection};
use conclave_domain::{DiscussionEvent, DiscussionId};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Transcript observer that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and
/// on `Drop`.
pub struct JsonlTranscriptObserver {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTranscriptObserver {
    /// Create a writer for the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist,
    /// truncating any previous transcript.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        debug!(path = %path.display(), "Opened transcript file");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Create `<dir>/<discussion id>.jsonl`
    pub fn in_directory(dir: impl AsRef<Path>, id: DiscussionId) -> io::Result<Self> {
        Self::create(dir.as_ref().join(format!("{}.jsonl", id)))
    }

    /// Get the path to the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: &DiscussionEvent) -> Result<String, DeliveryError> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut value =
            serde_json::to_value(event).map_err(|e| DeliveryError::Transport(e.to_string()))?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
        }
        serde_json::to_string(&value).map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ObserverConnection for JsonlTranscriptObserver {
    async fn deliver(&self, event: &DiscussionEvent) -> Result<(), DeliveryError> {
        let line = Self::record(event)?;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    fn label(&self) -> String {
        format!("jsonl:{}", self.path.display())
    }

    async fn close(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}

impl Drop for JsonlTranscriptObserver {
    fn drop(&mut self) {
        let writer = self
            .writer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::{DiscussionStatus, FailureClass};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let id = DiscussionId::new();
        let observer = JsonlTranscriptObserver::in_directory(dir.path(), id).unwrap();

        observer
            .deliver(&DiscussionEvent::DiscussionFailed {
                discussion_id: id,
                turn: 3,
                error_class: FailureClass::ProviderTransient,
                error: "Timeout".to_string(),
            })
            .await
            .unwrap();
        observer
            .deliver(&DiscussionEvent::DiscussionComplete {
                discussion_id: id,
                turn: 3,
                status: DiscussionStatus::Stopped,
                total_turns: 3,
                consensus_reached: false,
                confidence: 0.4,
                summary: "stopped".to_string(),
            })
            .await
            .unwrap();

        let path = observer.path().to_path_buf();
        assert!(path.ends_with(format!("{}.jsonl", id)));
        drop(observer);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.get("timestamp").is_some());
        }
        assert_eq!(records[0]["type"], "discussion_failed");
        assert_eq!(records[0]["error_class"], "provider_transient");
        assert_eq!(records[0]["turn"], 3);
        assert_eq!(records[1]["type"], "discussion_complete");
        assert_eq!(records[1]["total_turns"], 3);
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("t.jsonl");
        let observer = JsonlTranscriptObserver::create(&path).unwrap();
        assert!(observer.label().starts_with("jsonl:"));
        assert!(path.exists());
    }

    #[test]
    fn test_create_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        assert!(JsonlTranscriptObserver::create(blocker.join("t.jsonl")).is_err());
    }
}
