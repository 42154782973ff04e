// src/sync/synchronizer.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

use crate::api::ListingsApi;
use crate::domain::{Listing, QueryDescriptor, ResultPage};
use crate::errors::ClientError;

/// Keeps one page of search results synchronized with the server.
///
/// Descriptor setters never touch the network themselves: each one
/// mutates the descriptor, takes the next fencing token and hands the
/// (token, descriptor) pair to a single-consumer driver task over a
/// watch channel. The driver fetches, and a completed fetch is applied
/// only while its token is still the latest issued — a response that
/// lost the race is dropped, so results land in descriptor order, not
/// completion order.
///
/// Mutations (`create`/`update`/`remove`/`archive`/`restore`) go to the
/// server first and then re-run the current query unconditionally.
/// Server-derived fields stay authoritative; nothing here patches the
/// result page in place.
pub struct ListingsSync<A: ListingsApi + 'static> {
    api: Arc<A>,
    shared: Arc<Shared>,
    tx: watch::Sender<FetchRequest>,
}

/// A point-in-time view of the synchronizer for presentation code.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub descriptor: QueryDescriptor,
    pub page: ResultPage,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone)]
struct FetchRequest {
    token: u64,
    descriptor: QueryDescriptor,
}

struct Shared {
    state: Mutex<State>,
    notify: Notify,
}

struct State {
    descriptor: QueryDescriptor,
    page: ResultPage,
    loading: bool,
    error: Option<String>,
    /// Latest fencing token handed out.
    issued: u64,
    /// Highest token seen to completion: applied, failed, or discarded.
    resolved: u64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, token: u64, result: Result<ResultPage, ClientError>) {
        {
            let mut state = self.lock();
            state.resolved = state.resolved.max(token);
            if token != state.issued {
                // Lost the fence; a newer descriptor is already in flight.
                debug!(token, latest = state.issued, "discarding stale fetch response");
            } else {
                match result {
                    Ok(page) => {
                        state.page = page;
                        state.error = None;
                    }
                    Err(err) => {
                        // Keep the last good page; only the message changes.
                        warn!(%err, "fetch failed, keeping previous result page");
                        state.error = Some(err.to_string());
                    }
                }
                state.loading = false;
            }
        }
        self.notify.notify_waiters();
    }
}

async fn drive<A: ListingsApi>(
    api: Arc<A>,
    shared: Arc<Shared>,
    mut rx: watch::Receiver<FetchRequest>,
) {
    loop {
        let request = rx.borrow_and_update().clone();
        let result = api.search(&request.descriptor).await;
        shared.apply(request.token, result);
        // Exits once the synchronizer handle is dropped.
        if rx.changed().await.is_err() {
            break;
        }
    }
}

impl<A: ListingsApi + 'static> ListingsSync<A> {
    /// Starts the fetch driver and issues the initial fetch for the
    /// default descriptor. Must be called inside a tokio runtime.
    pub fn spawn(api: A) -> Self {
        Self::spawn_with(api, QueryDescriptor::default())
    }

    pub fn spawn_with(api: A, descriptor: QueryDescriptor) -> Self {
        let api = Arc::new(api);
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                descriptor: descriptor.clone(),
                page: ResultPage::default(),
                loading: true,
                error: None,
                issued: 1,
                resolved: 0,
            }),
            notify: Notify::new(),
        });
        let (tx, rx) = watch::channel(FetchRequest {
            token: 1,
            descriptor,
        });
        tokio::spawn(drive(Arc::clone(&api), Arc::clone(&shared), rx));
        Self { api, shared, tx }
    }

    fn schedule(&self, mutate: impl FnOnce(&mut QueryDescriptor)) {
        let request = {
            let mut state = self.shared.lock();
            mutate(&mut state.descriptor);
            state.issued += 1;
            state.loading = true;
            FetchRequest {
                token: state.issued,
                descriptor: state.descriptor.clone(),
            }
        };
        debug!(token = request.token, "scheduling fetch");
        let _ = self.tx.send(request);
    }

    // ---- descriptor setters -------------------------------------------

    pub fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        self.schedule(|d| d.set_search(term));
    }

    pub fn set_filters(&self, filters: BTreeMap<String, String>) {
        self.schedule(|d| d.set_filters(filters));
    }

    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.schedule(|d| d.set_filter(key, value));
    }

    pub fn toggle_sort(&self, field: impl Into<String>) {
        let field = field.into();
        self.schedule(|d| d.toggle_sort(field));
    }

    pub fn set_page(&self, page: u32) {
        self.schedule(|d| d.set_page(page));
    }

    pub fn set_page_size(&self, page_size: u32) {
        self.schedule(|d| d.set_page_size(page_size));
    }

    /// Re-runs the current query without touching the descriptor.
    pub fn refresh(&self) {
        self.schedule(|_| {});
    }

    // ---- state --------------------------------------------------------

    pub fn state(&self) -> QueryState {
        let state = self.shared.lock();
        QueryState {
            descriptor: state.descriptor.clone(),
            page: state.page.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn descriptor(&self) -> QueryDescriptor {
        self.shared.lock().descriptor.clone()
    }

    /// Resolves once every issued fetch has been applied, failed, or
    /// discarded. The quiescence point tests wait on.
    pub async fn settled(&self) {
        loop {
            let mut notified = std::pin::pin!(self.shared.notify.notified());
            // Register before checking so a wakeup between the check
            // and the await is not lost.
            notified.as_mut().enable();
            {
                let state = self.shared.lock();
                if state.resolved >= state.issued {
                    return;
                }
            }
            notified.await;
        }
    }

    // ---- mutations ----------------------------------------------------

    pub async fn create(&self, payload: &Value) -> Result<Listing, ClientError> {
        let created = self.api.create(payload).await?;
        self.refresh();
        Ok(created)
    }

    pub async fn update(&self, id: i64, payload: &Value) -> Result<Listing, ClientError> {
        let updated = self.api.update(id, payload).await?;
        self.refresh();
        Ok(updated)
    }

    pub async fn remove(&self, id: i64) -> Result<(), ClientError> {
        self.api.delete(id).await?;
        self.refresh();
        Ok(())
    }

    pub async fn archive(&self, id: i64, reason: Option<&str>) -> Result<Listing, ClientError> {
        let archived = self.api.archive(id, reason).await?;
        self.refresh();
        Ok(archived)
    }

    pub async fn restore(&self, id: i64) -> Result<Listing, ClientError> {
        let restored = self.api.restore(id).await?;
        self.refresh();
        Ok(restored)
    }
}
