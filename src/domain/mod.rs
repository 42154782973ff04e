pub mod changes;
pub mod listing;
pub mod query;

pub use changes::{ChangeRecord, ChangeType, FieldDiff, HistoryEntry, HistoryPage, Snapshot};
pub use listing::{Listing, ListingStatus, ResultPage, SearchStats};
pub use query::{HistoryQuery, QueryDescriptor, SortDirection};
