//! In-Memory Audit Recorder
//!
//! Keeps records in memory. A record whose id is already the latest at its
//! `(session, sequence)` slot is a duplicate; any other record is appended
//! and becomes the slot's latest. Supports failure and latency injection so
//! fail-closed behavior can be exercised in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::foundation::{AuditRecordId, SessionId};
use crate::domain::session::AuditRecord;
use crate::ports::{AppendReceipt, AuditRecorder, RecorderError};

#[derive(Debug, Default)]
struct Log {
    records: Vec<AuditRecord>,
    latest: HashMap<(SessionId, u64), AuditRecordId>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditRecorder {
    log: Arc<RwLock<Log>>,
    unavailable: Arc<AtomicBool>,
    failures_remaining: Arc<AtomicU32>,
    lost_acks_remaining: Arc<AtomicU32>,
    delay_ms: Arc<AtomicU64>,
}

impl InMemoryAuditRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every append fails until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The next `count` appends fail, then appends succeed again.
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// The next `count` appends are stored but report failure, as when an
    /// acknowledgement is lost after a durable write.
    pub fn lose_next_acks(&self, count: u32) {
        self.lost_acks_remaining.store(count, Ordering::SeqCst);
    }

    /// Sleep this long before acknowledging each append.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis().min(u128::from(u64::MAX)) as u64, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.log.read().await.records.clone()
    }

    pub async fn records_for(&self, session_id: &SessionId) -> Vec<AuditRecord> {
        self.log
            .read()
            .await
            .records
            .iter()
            .filter(|r| &r.session_id == session_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn take_injected_failure(&self) -> bool {
        take_one(&self.failures_remaining)
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl AuditRecorder for InMemoryAuditRecorder {
    async fn append(&self, record: &AuditRecord) -> Result<AppendReceipt, RecorderError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) || self.take_injected_failure() {
            return Err(RecorderError::unavailable("injected failure"));
        }

        let mut log = self.log.write().await;
        let slot = (record.session_id, record.sequence);
        if log.latest.get(&slot) == Some(&record.record_id) {
            return Ok(AppendReceipt::Duplicate);
        }
        log.records.push(record.clone());
        log.latest.insert(slot, record.record_id);
        drop(log);

        if take_one(&self.lost_acks_remaining) {
            return Err(RecorderError::unavailable("acknowledgement lost"));
        }
        Ok(AppendReceipt::Appended)
    }
}
