// src/domain/changes.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::listing::Listing;

/// Lifecycle class of a change, shared by the session-local log and the
/// server-computed history feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
    Archive,
    Restore,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Archive => "archive",
            ChangeType::Restore => "restore",
        }
    }
}

/// One immutable audit entry: a single field transition on one listing.
/// Records are append-only and never mutate after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: String,
    pub listing_id: i64,
    pub listing_address: Option<String>,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub editor: String,
    pub timestamp: DateTime<Utc>,
    pub change_type: ChangeType,
}

/// The first-observed state of a listing, used as the diff baseline.
/// Captured at most once per listing id and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub listing_id: i64,
    pub captured: Listing,
    pub created_at: DateTime<Utc>,
}

/// One per-field diff inside a server history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub attribute: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// One entry of the server-computed history feed — the authoritative
/// audit trail, distinct from the session-local [`ChangeRecord`] log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub listing_id: i64,
    pub change_type: ChangeType,
    pub editor_full_name: String,
    pub changed_at: DateTime<Utc>,
    #[serde(default)]
    pub changes: Vec<FieldDiff>,
}

/// A page of the global history feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
    pub total: u64,
    pub pages: u32,
}
