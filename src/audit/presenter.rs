// src/audit/presenter.rs

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{ChangeType, FieldDiff, HistoryEntry};

/// The editor identity the scheduled scraper job writes under. Flagged
/// for styling only; automated entries behave like any other.
pub const AUTOMATED_EDITOR: &str = "cron-job";

pub const EMPTY_HISTORY: &str = "No history available";

/// Styling hint for a change category. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Green,
    Amber,
    Red,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeStyle {
    pub label: &'static str,
    pub tone: Tone,
}

pub fn change_style(change_type: ChangeType) -> ChangeStyle {
    match change_type {
        ChangeType::Create => ChangeStyle {
            label: "First Creation",
            tone: Tone::Green,
        },
        ChangeType::Update => ChangeStyle {
            label: "Updated",
            tone: Tone::Amber,
        },
        ChangeType::Archive => ChangeStyle {
            label: "Archived",
            tone: Tone::Red,
        },
        ChangeType::Restore => ChangeStyle {
            label: "Restored",
            tone: Tone::Blue,
        },
    }
}

pub fn is_automated(editor: &str) -> bool {
    editor == AUTOMATED_EDITOR
}

/// `field: old → new`, with strings unquoted and nulls shown as "null".
pub fn format_diff(diff: &FieldDiff) -> String {
    format!(
        "{}: {} → {}",
        diff.attribute,
        format_value(&diff.old_value),
        format_value(&diff.new_value)
    )
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

/// One history entry shaped for rendering: category style, automation
/// flag, a one-line summary and the formatted diff lines. Diff lists
/// can be arbitrarily long; overflow handling belongs to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntryView {
    pub id: String,
    pub style: ChangeStyle,
    pub automated: bool,
    pub editor: String,
    pub changed_at: DateTime<Utc>,
    pub changed_at_label: String,
    pub summary: String,
    pub diffs: Vec<String>,
}

/// The presented history of one listing, newest-first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntryView>,
}

impl HistoryView {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The defined empty state when a listing has no history.
    pub fn empty_message(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_HISTORY)
    }
}

fn summarize(entry: &HistoryEntry) -> String {
    match entry.change_type {
        ChangeType::Create => format!("Listing created by {}", entry.editor_full_name),
        ChangeType::Update => {
            let n = entry.changes.len();
            if n == 1 {
                "1 field changed".to_string()
            } else {
                format!("{n} fields changed")
            }
        }
        ChangeType::Archive => format!("Listing archived by {}", entry.editor_full_name),
        ChangeType::Restore => format!("Listing restored by {}", entry.editor_full_name),
    }
}

pub fn present_one(entry: &HistoryEntry) -> HistoryEntryView {
    HistoryEntryView {
        id: entry.id.clone(),
        style: change_style(entry.change_type),
        automated: is_automated(&entry.editor_full_name),
        editor: entry.editor_full_name.clone(),
        changed_at: entry.changed_at,
        changed_at_label: format_timestamp(entry.changed_at),
        summary: summarize(entry),
        diffs: entry.changes.iter().map(format_diff).collect(),
    }
}

/// Presents a history feed newest-first. Pure: no I/O, no state.
pub fn present(entries: &[HistoryEntry]) -> HistoryView {
    let mut views: Vec<HistoryEntryView> = entries.iter().map(present_one).collect();
    views.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
    HistoryView { entries: views }
}

/// The presented history of one listing within a grouped feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingHistoryView {
    pub listing_id: i64,
    pub history: HistoryView,
}

/// Groups a mixed feed per listing (order of first appearance) and
/// presents each group newest-first.
pub fn present_grouped(entries: &[HistoryEntry]) -> Vec<ListingHistoryView> {
    let mut groups: Vec<(i64, Vec<HistoryEntry>)> = Vec::new();
    for entry in entries {
        let idx = match groups.iter().position(|(id, _)| *id == entry.listing_id) {
            Some(idx) => idx,
            None => {
                groups.push((entry.listing_id, Vec::new()));
                groups.len() - 1
            }
        };
        groups[idx].1.push(entry.clone());
    }
    groups
        .into_iter()
        .map(|(listing_id, entries)| ListingHistoryView {
            listing_id,
            history: present(&entries),
        })
        .collect()
}
