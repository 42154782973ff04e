// src/tests/sync_tests.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::domain::query::page_count;
use crate::domain::{ListingStatus, QueryDescriptor, SortDirection};
use crate::sync::ListingsSync;
use crate::tests::fixtures::{listing, FakeListingsApi};

fn status_filter(status: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("status".to_string(), status.to_string())])
}

// ---- descriptor invariants -----------------------------------------------

#[test]
fn search_change_resets_page() {
    let mut descriptor = QueryDescriptor::default();
    descriptor.set_page(4);
    descriptor.set_search("maple");
    assert_eq!(descriptor.page, 1);
}

#[test]
fn filter_change_resets_page() {
    let mut descriptor = QueryDescriptor::default();
    descriptor.set_page(4);
    descriptor.set_filters(status_filter("sold"));
    assert_eq!(descriptor.page, 1);
}

#[test]
fn unchanged_search_keeps_page() {
    let mut descriptor = QueryDescriptor::default();
    descriptor.set_search("maple");
    descriptor.set_page(3);
    descriptor.set_search("maple");
    assert_eq!(descriptor.page, 3);
}

#[test]
fn sort_toggle_flips_and_resets() {
    let mut descriptor = QueryDescriptor::default();

    // New field starts ascending.
    descriptor.toggle_sort("current_price");
    assert_eq!(descriptor.sort_field, "current_price");
    assert_eq!(descriptor.sort_direction, SortDirection::Asc);

    // Same field flips; twice returns to the original direction.
    descriptor.toggle_sort("current_price");
    assert_eq!(descriptor.sort_direction, SortDirection::Desc);
    descriptor.toggle_sort("current_price");
    assert_eq!(descriptor.sort_direction, SortDirection::Asc);
}

#[test]
fn page_size_change_resets_page() {
    let mut descriptor = QueryDescriptor::default();
    descriptor.set_page(5);
    descriptor.set_page_size(50);
    assert_eq!(descriptor.page, 1);
    assert_eq!(descriptor.page_size, 50);
}

#[test]
fn page_count_is_ceiling() {
    assert_eq!(page_count(0, 10), 0);
    assert_eq!(page_count(1, 10), 1);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(11, 10), 2);
    assert_eq!(page_count(25, 10), 3);
}

#[test]
fn empty_values_left_out_of_query_pairs() {
    let mut descriptor = QueryDescriptor::default();
    descriptor.set_filter("status", "");
    let pairs = descriptor.to_query_pairs();
    assert!(pairs.iter().all(|(k, _)| k != "search" && k != "status"));
    assert!(pairs.iter().any(|(k, v)| k == "page" && v == "1"));
}

#[test]
fn price_change_percentage_from_initial() {
    let mut subject = listing(1, 500_000, ListingStatus::ForSale);
    subject.current_price = Some(450_000);
    assert_eq!(subject.price_change_pct(), Some(-10.0));

    subject.initial_price = None;
    assert_eq!(subject.price_change_pct(), None);
}

#[test]
fn config_reads_env_overrides() {
    std::env::set_var("LISTING_API_URL", "https://api.example.com/v1");
    std::env::set_var("LISTING_API_TOKEN", "tok-123");
    let config = crate::config::ApiConfig::from_env();
    assert_eq!(config.base_url, "https://api.example.com/v1");
    assert_eq!(config.bearer_token.as_deref(), Some("tok-123"));
    std::env::remove_var("LISTING_API_URL");
    std::env::remove_var("LISTING_API_TOKEN");
}

// ---- end-to-end ----------------------------------------------------------

fn fixture_data() -> Vec<crate::domain::Listing> {
    let mut data: Vec<_> = (1..=25)
        .map(|i| listing(i, 10_000 * i, ListingStatus::ForSale))
        .collect();
    // Noise that must not match the status filter.
    data.push(listing(100, 1, ListingStatus::Sold));
    data.push(listing(101, 2, ListingStatus::Pending));
    data
}

#[tokio::test]
async fn filtered_sorted_first_page() {
    let descriptor = QueryDescriptor {
        search: String::new(),
        filters: status_filter("for sale"),
        sort_field: "current_price".to_string(),
        sort_direction: SortDirection::Desc,
        page: 1,
        page_size: 10,
    };
    let sync = ListingsSync::spawn_with(FakeListingsApi::with_data(fixture_data()), descriptor);
    sync.settled().await;

    let state = sync.state();
    assert_eq!(state.error, None);
    assert_eq!(state.page.total, 25);
    assert_eq!(state.page.pages, 3);
    assert_eq!(state.page.items.len(), 10);
    let prices: Vec<i64> = state
        .page
        .items
        .iter()
        .filter_map(|l| l.current_price)
        .collect();
    let mut sorted = prices.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(prices, sorted);
    assert_eq!(prices[0], 250_000);
}

#[tokio::test]
async fn stale_response_is_discarded() {
    crate::tests::fixtures::init_tracing();
    let api = Arc::new(FakeListingsApi::with_data(fixture_data()));
    // Hold the initial fetch in flight long enough for a newer
    // descriptor to be issued underneath it.
    *api.search_delay.lock().unwrap() = Some(Duration::from_millis(50));

    let sync = ListingsSync::spawn_with(Arc::clone(&api), QueryDescriptor::default());
    api.search_started.notified().await;
    sync.set_filter("status", "sold");
    sync.settled().await;

    // Both fetches ran; only the newer one was applied.
    assert_eq!(api.search_count(), 2);
    let state = sync.state();
    assert_eq!(state.error, None);
    assert!(!state.loading);
    assert_eq!(state.page.items.len(), 1);
    assert!(state
        .page
        .items
        .iter()
        .all(|l| l.status == ListingStatus::Sold));
}

#[tokio::test]
async fn mutation_refetch_loses_to_newer_descriptor() {
    let descriptor = QueryDescriptor {
        sort_field: "id".to_string(),
        sort_direction: SortDirection::Asc,
        page_size: 10,
        ..QueryDescriptor::default()
    };
    let api = Arc::new(FakeListingsApi::with_data(fixture_data()));
    let sync = ListingsSync::spawn_with(Arc::clone(&api), descriptor);
    sync.settled().await;

    // Keep the update's refetch in flight while the user pages forward.
    *api.search_delay.lock().unwrap() = Some(Duration::from_millis(50));
    sync.update(7, &json!({ "current_price": 450_000 }))
        .await
        .unwrap();
    sync.set_page(2);
    sync.settled().await;

    let state = sync.state();
    assert_eq!(state.descriptor.page, 2);
    assert_eq!(state.error, None);
    let ids: Vec<i64> = state.page.items.iter().map(|l| l.id).collect();
    assert_eq!(ids, (11..=20).collect::<Vec<i64>>());
    // The mutation itself landed server-side even though its refetch
    // was superseded.
    let data = api.data.lock().unwrap();
    let updated = data.iter().find(|l| l.id == 7).unwrap();
    assert_eq!(updated.current_price, Some(450_000));
}

#[tokio::test]
async fn failed_fetch_keeps_previous_page() {
    let api = Arc::new(FakeListingsApi::with_data(fixture_data()));
    let sync = ListingsSync::spawn_with(Arc::clone(&api), QueryDescriptor::default());
    sync.settled().await;
    let before = sync.state().page.clone();
    assert!(!before.items.is_empty());

    api.fail_next_search
        .store(true, std::sync::atomic::Ordering::SeqCst);
    sync.refresh();
    sync.settled().await;

    let state = sync.state();
    assert!(state.error.is_some());
    assert_eq!(state.page, before);

    // The next successful fetch clears the error.
    sync.refresh();
    sync.settled().await;
    assert_eq!(sync.state().error, None);
}

#[tokio::test]
async fn failed_mutation_does_not_refetch() {
    let api = Arc::new(FakeListingsApi::with_data(fixture_data()));
    let sync = ListingsSync::spawn_with(Arc::clone(&api), QueryDescriptor::default());
    sync.settled().await;
    let searches_before = api.search_count();

    api.fail_next_mutation
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let err = sync
        .update(7, &json!({ "current_price": 1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::errors::ClientError::Server { status: 422, .. }));

    sync.settled().await;
    assert_eq!(api.search_count(), searches_before);
    // Server data untouched.
    let data = api.data.lock().unwrap();
    assert_eq!(data.iter().find(|l| l.id == 7).unwrap().current_price, Some(70_000));
}

#[tokio::test]
async fn remove_triggers_pessimistic_refresh() {
    let api = Arc::new(FakeListingsApi::with_data(fixture_data()));
    let descriptor = QueryDescriptor {
        sort_field: "id".to_string(),
        sort_direction: SortDirection::Asc,
        page_size: 10,
        ..QueryDescriptor::default()
    };
    let sync = ListingsSync::spawn_with(Arc::clone(&api), descriptor);
    sync.settled().await;

    sync.remove(1).await.unwrap();
    sync.settled().await;

    let state = sync.state();
    assert_eq!(state.page.total, 26);
    assert!(state.page.items.iter().all(|l| l.id != 1));
}
