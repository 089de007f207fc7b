//! JSON-lines Audit Recorder
//!
//! Appends one JSON object per line and syncs before acknowledging.
//! The latest record id at each `(session, sequence)` slot is indexed at
//! open so resent records deduplicate across restarts.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::foundation::{AuditRecordId, SessionId};
use crate::domain::session::AuditRecord;
use crate::ports::{AppendReceipt, AuditRecorder, RecorderError};

#[derive(Deserialize)]
struct IndexedLine {
    record_id: AuditRecordId,
    session_id: SessionId,
    sequence: u64,
}

struct Sink {
    file: File,
    latest: HashMap<(SessionId, u64), AuditRecordId>,
}

pub struct JsonlAuditRecorder {
    path: PathBuf,
    sink: Mutex<Sink>,
}

impl JsonlAuditRecorder {
    /// Opens (or creates) the log at `path` and indexes existing records.
    ///
    /// Unparseable lines, such as a torn final write, are skipped.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RecorderError::unavailable(e.to_string()))?;
        }

        let mut latest = HashMap::new();
        let mut torn_tail = false;
        match fs::read_to_string(&path).await {
            Ok(existing) => {
                torn_tail = !existing.is_empty() && !existing.ends_with('\n');
                for (line_no, line) in existing.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<IndexedLine>(line) {
                        Ok(indexed) => {
                            latest.insert(
                                (indexed.session_id, indexed.sequence),
                                indexed.record_id,
                            );
                        }
                        Err(e) => tracing::warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            error = %e,
                            "skipping unreadable audit line"
                        ),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(RecorderError::unavailable(e.to_string())),
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| RecorderError::unavailable(e.to_string()))?;
        if torn_tail {
            file.write_all(b"\n")
                .await
                .map_err(|e| RecorderError::unavailable(e.to_string()))?;
        }

        tracing::info!(path = %path.display(), slots = latest.len(), "audit log opened");
        Ok(Self {
            path,
            sink: Mutex::new(Sink { file, latest }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every parseable record back from disk.
    pub async fn read_all(&self) -> Result<Vec<AuditRecord>, RecorderError> {
        let _guard = self.sink.lock().await;
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| RecorderError::unavailable(e.to_string()))?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[async_trait]
impl AuditRecorder for JsonlAuditRecorder {
    async fn append(&self, record: &AuditRecord) -> Result<AppendReceipt, RecorderError> {
        let mut sink = self.sink.lock().await;
        let slot = (record.session_id, record.sequence);
        if sink.latest.get(&slot) == Some(&record.record_id) {
            return Ok(AppendReceipt::Duplicate);
        }

        let mut line = serde_json::to_string(record)
            .map_err(|e| RecorderError::unavailable(format!("encode: {e}")))?;
        line.push('\n');

        sink.file
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RecorderError::unavailable(e.to_string()))?;
        sink.file
            .sync_data()
            .await
            .map_err(|e| RecorderError::unavailable(e.to_string()))?;

        sink.latest.insert(slot, record.record_id);
        Ok(AppendReceipt::Appended)
    }
}
