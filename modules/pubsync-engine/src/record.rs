//! ActionRecorder implementations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traits::ActionRecorder;

/// One dispatched action as the log saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedAction {
    pub seq: i64,
    pub ts: DateTime<Utc>,
    pub action_type: String,
    /// The action whose routing emitted this one.
    pub parent_seq: Option<i64>,
    /// The root of the chain this action belongs to.
    pub caused_by_seq: Option<i64>,
    pub run_id: String,
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// MemoryActionLog
// ---------------------------------------------------------------------------

/// In-memory, bounded action log. Keeps the most recent `capacity` actions
/// with monotonically increasing sequence numbers. Thread-safe.
pub struct MemoryActionLog {
    capacity: usize,
    next_seq: AtomicI64,
    actions: Mutex<VecDeque<RecordedAction>>,
}

impl MemoryActionLog {
    /// A log holding at most `capacity` actions (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_seq: AtomicI64::new(1),
            actions: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained actions, oldest first.
    pub fn actions(&self) -> Vec<RecordedAction> {
        self.lock().iter().cloned().collect()
    }

    /// Retained actions belonging to one causal chain, root first.
    pub fn chain(&self, root_seq: i64) -> Vec<RecordedAction> {
        self.lock()
            .iter()
            .filter(|a| a.seq == root_seq || a.caused_by_seq == Some(root_seq))
            .cloned()
            .collect()
    }

    /// Total number of actions ever recorded, evicted ones included.
    pub fn total_recorded(&self) -> i64 {
        self.next_seq.load(Ordering::SeqCst) - 1
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<RecordedAction>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(
        &self,
        action_type: String,
        payload: serde_json::Value,
        run_id: &str,
        lineage: Option<(i64, i64)>,
    ) -> RecordedAction {
        let mut actions = self.lock();

        let recorded = RecordedAction {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            ts: Utc::now(),
            action_type,
            parent_seq: lineage.map(|(parent, _)| parent),
            caused_by_seq: lineage.map(|(_, root)| root),
            run_id: run_id.to_string(),
            payload,
        };

        if actions.len() == self.capacity {
            actions.pop_front();
        }
        actions.push_back(recorded.clone());
        recorded
    }
}

impl Default for MemoryActionLog {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl ActionRecorder for MemoryActionLog {
    async fn record(
        &self,
        action_type: String,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedAction> {
        Ok(self.append(action_type, payload, run_id, None))
    }

    async fn record_child(
        &self,
        parent_seq: i64,
        root_seq: i64,
        action_type: String,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedAction> {
        Ok(self.append(action_type, payload, run_id, Some((parent_seq, root_seq))))
    }
}

// ---------------------------------------------------------------------------
// Arc<R> blanket so the log can be shared for reading
// ---------------------------------------------------------------------------

#[async_trait]
impl<R: ActionRecorder + ?Sized> ActionRecorder for Arc<R> {
    async fn record(
        &self,
        action_type: String,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedAction> {
        (**self).record(action_type, payload, run_id).await
    }

    async fn record_child(
        &self,
        parent_seq: i64,
        root_seq: i64,
        action_type: String,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedAction> {
        (**self)
            .record_child(parent_seq, root_seq, action_type, payload, run_id)
            .await
    }
}
