// src/sync/favorites.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

use crate::api::FavoritesApi;
use crate::domain::{Listing, ResultPage};
use crate::errors::ClientError;

/// Optimistic favorite toggling with rollback.
///
/// The server owns the relation; the local flag flips immediately and a
/// failed server call reverts it. Toggles on the same listing id are
/// serialized through a per-id async mutex, so a rapid double-toggle
/// settles on the server's authoritative value instead of losing one of
/// the writes.
pub struct FavoriteToggler<A: FavoritesApi> {
    api: Arc<A>,
    flags: Mutex<HashMap<i64, bool>>,
    gates: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl<A: FavoritesApi> FavoriteToggler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            flags: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Seeds the local flag for a listing we have not seen yet. Flags
    /// already tracked are left alone so an in-flight toggle is not
    /// clobbered by a refetch.
    pub fn observe(&self, listing: &Listing) {
        let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        flags.entry(listing.id).or_insert(listing.is_favorite);
    }

    pub fn observe_page(&self, page: &ResultPage) {
        for listing in &page.items {
            self.observe(listing);
        }
    }

    pub fn is_favorite(&self, listing_id: i64) -> bool {
        let flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        flags.get(&listing_id).copied().unwrap_or(false)
    }

    fn set_local(&self, listing_id: i64, value: bool) {
        let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        flags.insert(listing_id, value);
    }

    fn gate(&self, listing_id: i64) -> Arc<AsyncMutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(listing_id).or_default())
    }

    /// Flips the favorite flag for `listing`, seeding the local value
    /// from the record if this is the first time we see it.
    pub async fn toggle(&self, listing: &Listing) -> Result<bool, ClientError> {
        self.observe(listing);
        self.toggle_id(listing.id).await
    }

    /// Returns the new local value on success. On failure the flag is
    /// rolled back to its pre-toggle value and the error propagates.
    pub async fn toggle_id(&self, listing_id: i64) -> Result<bool, ClientError> {
        let gate = self.gate(listing_id);
        let _held = gate.lock().await;

        let was = self.is_favorite(listing_id);
        self.set_local(listing_id, !was);

        let call = if was {
            self.api.remove_favorite(listing_id).await
        } else {
            self.api.add_favorite(listing_id).await
        };

        match call {
            Ok(()) => Ok(!was),
            Err(err) => {
                warn!(listing_id, %err, "favorite toggle failed, rolling back");
                self.set_local(listing_id, was);
                Err(err)
            }
        }
    }
}

/// A small paged view over the actor's favorites list. Pessimistic:
/// every change refetches the current page. Removing the last item of a
/// page past the first steps back one page so the view never lands on
/// an empty page.
pub struct FavoritesPager<A: FavoritesApi> {
    api: Arc<A>,
    state: Mutex<PagerState>,
}

#[derive(Debug, Clone)]
pub struct PagerState {
    pub page: ResultPage,
    pub current_page: u32,
    pub page_size: u32,
    pub loading: bool,
    pub error: Option<String>,
}

impl<A: FavoritesApi> FavoritesPager<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self::with_page_size(api, 10)
    }

    pub fn with_page_size(api: Arc<A>, page_size: u32) -> Self {
        Self {
            api,
            state: Mutex::new(PagerState {
                page: ResultPage::default(),
                current_page: 1,
                page_size: page_size.max(1),
                loading: false,
                error: None,
            }),
        }
    }

    pub fn state(&self) -> PagerState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let (page, page_size) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.loading = true;
            state.error = None;
            (state.current_page, state.page_size)
        };
        let result = self.api.favorites(page, page_size).await;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.loading = false;
        match result {
            Ok(fetched) => {
                state.page = fetched;
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.to_string());
                state.page.items.clear();
                Err(err)
            }
        }
    }

    pub async fn set_page(&self, page: u32) -> Result<(), ClientError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.current_page = page.max(1);
        }
        self.refresh().await
    }

    /// Removes a favorite and refetches, stepping back a page when the
    /// removed item was the last one on a page past the first.
    pub async fn remove(&self, listing_id: i64) -> Result<(), ClientError> {
        self.api.remove_favorite(listing_id).await?;
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.page.items.len() == 1 && state.current_page > 1 {
                state.current_page -= 1;
            }
        }
        self.refresh().await
    }
}
