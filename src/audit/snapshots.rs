// src/audit/snapshots.rs

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::domain::{Listing, Snapshot};
use crate::errors::ClientError;
use crate::store::KeyValueStore;

pub const SNAPSHOTS_KEY: &str = "listing_snapshots";

/// First-observed state of every listing the session has seen, used as
/// the baseline for diffing. First write wins: a snapshot is captured
/// at most once per listing id and never overwritten, even when the
/// listing changes later. Persisted through the key-value port so
/// baselines survive reloads. No eviction; volume is bounded by the
/// number of distinct listings ever viewed.
pub struct SnapshotStore<S: KeyValueStore> {
    store: S,
    cache: Mutex<BTreeMap<i64, Snapshot>>,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    /// Loads any previously persisted snapshots from the store.
    pub fn open(store: S) -> Result<Self, ClientError> {
        let cache = match store.get(SNAPSHOTS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| ClientError::Storage(format!("corrupt snapshot map: {e}")))?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            store,
            cache: Mutex::new(cache),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<i64, Snapshot>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idempotent capture. Returns `true` when a new snapshot was taken,
    /// `false` when one already existed for this id.
    pub fn capture_if_absent(&self, listing: &Listing) -> Result<bool, ClientError> {
        let mut cache = self.lock();
        if cache.contains_key(&listing.id) {
            return Ok(false);
        }
        cache.insert(
            listing.id,
            Snapshot {
                listing_id: listing.id,
                captured: listing.clone(),
                created_at: Utc::now(),
            },
        );
        self.persist(&cache)
    }

    /// Captures every listing on a fetched page; returns how many were new.
    pub fn observe_page(&self, items: &[Listing]) -> Result<usize, ClientError> {
        let mut cache = self.lock();
        let mut captured = 0;
        for listing in items {
            if cache.contains_key(&listing.id) {
                continue;
            }
            cache.insert(
                listing.id,
                Snapshot {
                    listing_id: listing.id,
                    captured: listing.clone(),
                    created_at: Utc::now(),
                },
            );
            captured += 1;
        }
        if captured > 0 {
            self.persist(&cache)?;
        }
        Ok(captured)
    }

    pub fn get(&self, listing_id: i64) -> Option<Snapshot> {
        self.lock().get(&listing_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn persist(&self, cache: &BTreeMap<i64, Snapshot>) -> Result<bool, ClientError> {
        let raw = serde_json::to_string(cache).map_err(ClientError::storage)?;
        self.store.set(SNAPSHOTS_KEY, &raw)?;
        Ok(true)
    }
}
