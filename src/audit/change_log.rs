// src/audit/change_log.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{ChangeRecord, ChangeType, Snapshot};
use crate::errors::ClientError;
use crate::store::KeyValueStore;

use super::snapshots::SnapshotStore;

pub const CHANGE_LOG_KEY: &str = "listing_change_log";

/// Session-local, append-only log of the edits made through this
/// client. It gives an editor immediate feedback before the server
/// round trip confirms; the server history endpoint stays the system of
/// record and the two are never merged, so a server rejection is not
/// masked by local state.
///
/// Records are stored in chronological insertion order; all read paths
/// return newest-first.
pub struct ChangeLog<S: KeyValueStore> {
    store: S,
    entries: Mutex<Vec<ChangeRecord>>,
}

/// All recorded changes for one listing, newest-first, with the initial
/// snapshot when one was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeGroup {
    pub listing_id: i64,
    pub listing_address: Option<String>,
    pub initial: Option<Snapshot>,
    pub changes: Vec<ChangeRecord>,
}

impl<S: KeyValueStore> ChangeLog<S> {
    /// Loads any previously persisted log from the store.
    pub fn open(store: S) -> Result<Self, ClientError> {
        let entries = match store.get(CHANGE_LOG_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| ClientError::Storage(format!("corrupt change log: {e}")))?,
            None => Vec::new(),
        };
        Ok(Self {
            store,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChangeRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends one immutable record and persists the log.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        listing_id: i64,
        field: &str,
        old_value: Value,
        new_value: Value,
        editor: &str,
        listing_address: Option<&str>,
        change_type: ChangeType,
    ) -> Result<ChangeRecord, ClientError> {
        let record = ChangeRecord {
            id: Uuid::new_v4().to_string(),
            listing_id,
            listing_address: listing_address.map(String::from),
            field: field.to_string(),
            old_value,
            new_value,
            editor: editor.to_string(),
            timestamp: Utc::now(),
            change_type,
        };
        let mut entries = self.lock();
        entries.push(record.clone());
        let raw = serde_json::to_string(&*entries).map_err(ClientError::storage)?;
        self.store.set(CHANGE_LOG_KEY, &raw)?;
        Ok(record)
    }

    /// Changes for one listing, newest-first.
    pub fn by_listing(&self, listing_id: i64) -> Vec<ChangeRecord> {
        let mut out: Vec<ChangeRecord> = self
            .lock()
            .iter()
            .filter(|c| c.listing_id == listing_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    /// The whole log, newest-first.
    pub fn all(&self) -> Vec<ChangeRecord> {
        let mut out = self.lock().clone();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    /// Groups the log per listing, in order of first appearance, with
    /// each group's changes newest-first and the initial snapshot
    /// attached when the snapshot store has one.
    pub fn grouped_by_listing<S2: KeyValueStore>(
        &self,
        snapshots: &SnapshotStore<S2>,
    ) -> Vec<ChangeGroup> {
        let mut groups: Vec<ChangeGroup> = Vec::new();
        for change in self.lock().iter() {
            let idx = match groups.iter().position(|g| g.listing_id == change.listing_id) {
                Some(idx) => idx,
                None => {
                    groups.push(ChangeGroup {
                        listing_id: change.listing_id,
                        listing_address: change.listing_address.clone(),
                        initial: snapshots.get(change.listing_id),
                        changes: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            groups[idx].changes.push(change.clone());
        }
        for group in &mut groups {
            group.changes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
