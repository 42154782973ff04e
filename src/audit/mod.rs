pub mod change_log;
pub mod presenter;
pub mod snapshots;

pub use change_log::{ChangeGroup, ChangeLog};
pub use presenter::{present, present_grouped, HistoryEntryView, HistoryView, Tone};
pub use snapshots::SnapshotStore;
