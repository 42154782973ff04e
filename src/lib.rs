//! Client-side data layer for a property-listing catalog.
//!
//! The crate keeps a paginated, filtered, sorted page of remote
//! listings synchronized with the server ([`sync::ListingsSync`]),
//! captures first-observed baselines and a session-local audit trail
//! ([`audit`]), and toggles the favorite relation optimistically with
//! rollback ([`sync::FavoriteToggler`]). Presentation code consumes
//! the state snapshots and view models; no rendering happens here.

pub mod api;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod store;
pub mod sync;

#[cfg(test)]
mod tests;

pub use api::{FavoritesApi, HttpApi, ListingsApi};
pub use audit::{ChangeLog, SnapshotStore};
pub use config::ApiConfig;
pub use domain::{
    ChangeRecord, ChangeType, HistoryEntry, Listing, ListingStatus, QueryDescriptor, ResultPage,
    SortDirection,
};
pub use errors::ClientError;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use sync::{FavoriteToggler, FavoritesPager, ListingsSync};
