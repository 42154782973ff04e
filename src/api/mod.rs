// src/api/mod.rs

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{HistoryEntry, HistoryPage, HistoryQuery, Listing, QueryDescriptor, ResultPage};
use crate::errors::ClientError;

pub use http::HttpApi;

/// The remote catalog: search plus the mutation and history endpoints.
/// A trait so the synchronizer can be driven by fakes in tests.
#[async_trait]
pub trait ListingsApi: Send + Sync {
    /// `GET /listings/search` — idempotent, side-effect-free.
    async fn search(&self, query: &QueryDescriptor) -> Result<ResultPage, ClientError>;

    /// `GET /listings/{id}`
    async fn get(&self, id: i64) -> Result<Listing, ClientError>;

    /// `POST /listings`
    async fn create(&self, payload: &Value) -> Result<Listing, ClientError>;

    /// `PUT /listings/{id}`
    async fn update(&self, id: i64, payload: &Value) -> Result<Listing, ClientError>;

    /// `DELETE /listings/{id}` — hard delete.
    async fn delete(&self, id: i64) -> Result<(), ClientError>;

    /// `POST /listings/{id}/archive` — soft delete, with an optional reason.
    async fn archive(&self, id: i64, reason: Option<&str>) -> Result<Listing, ClientError>;

    /// `POST /listings/{id}/restore`
    async fn restore(&self, id: i64) -> Result<Listing, ClientError>;

    /// `GET /listings/{id}/history` — the authoritative audit trail for
    /// one listing, chronological.
    async fn listing_history(&self, id: i64) -> Result<Vec<HistoryEntry>, ClientError>;

    /// `GET /listings/history` — the paged global history feed.
    async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, ClientError>;
}

#[async_trait]
impl<T: ListingsApi + ?Sized> ListingsApi for std::sync::Arc<T> {
    async fn search(&self, query: &QueryDescriptor) -> Result<ResultPage, ClientError> {
        (**self).search(query).await
    }

    async fn get(&self, id: i64) -> Result<Listing, ClientError> {
        (**self).get(id).await
    }

    async fn create(&self, payload: &Value) -> Result<Listing, ClientError> {
        (**self).create(payload).await
    }

    async fn update(&self, id: i64, payload: &Value) -> Result<Listing, ClientError> {
        (**self).update(id, payload).await
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        (**self).delete(id).await
    }

    async fn archive(&self, id: i64, reason: Option<&str>) -> Result<Listing, ClientError> {
        (**self).archive(id, reason).await
    }

    async fn restore(&self, id: i64) -> Result<Listing, ClientError> {
        (**self).restore(id).await
    }

    async fn listing_history(&self, id: i64) -> Result<Vec<HistoryEntry>, ClientError> {
        (**self).listing_history(id).await
    }

    async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, ClientError> {
        (**self).history(query).await
    }
}

/// The favorite relation for the current actor.
#[async_trait]
pub trait FavoritesApi: Send + Sync {
    /// `GET /favorites` — the actor's favorites, paginated.
    async fn favorites(&self, page: u32, page_size: u32) -> Result<ResultPage, ClientError>;

    /// `POST /favorites/{listing_id}`
    async fn add_favorite(&self, listing_id: i64) -> Result<(), ClientError>;

    /// `DELETE /favorites/{listing_id}`
    async fn remove_favorite(&self, listing_id: i64) -> Result<(), ClientError>;

    /// `GET /favorites/{listing_id}/check`
    async fn check_favorite(&self, listing_id: i64) -> Result<bool, ClientError>;
}
