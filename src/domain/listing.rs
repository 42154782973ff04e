// src/domain/listing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::page_count;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    #[serde(rename = "for sale")]
    ForSale,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "sold")]
    Sold,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::ForSale => "for sale",
            ListingStatus::Pending => "pending",
            ListingStatus::Sold => "sold",
        }
    }
}

/// One catalog record as the server hands it to us. The schema belongs
/// to the server; we read and write whole records or named fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub address: Option<String>,
    pub initial_price: Option<i64>,
    pub current_price: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area: Option<String>,
    pub status: ListingStatus,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_favorite: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zoning: Option<String>,
    pub image_listing: Option<String>,
    pub listing_link: Option<String>,
    pub listing_website: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Percentage change from the initial asking price, when both prices
    /// are known and the initial price is non-zero.
    pub fn price_change_pct(&self) -> Option<f64> {
        let initial = self.initial_price.filter(|p| *p != 0)?;
        let current = self.current_price?;
        Some((current - initial) as f64 / initial as f64 * 100.0)
    }
}

/// Aggregate counters some search responses carry alongside the items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total_all: Option<u64>,
    pub total_modified: Option<u64>,
    pub total_not_modified: Option<u64>,
}

/// One fetched page of search results. Owned by the synchronizer and
/// replaced wholesale on every successful fetch; nothing patches it in
/// place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPage {
    pub items: Vec<Listing>,
    pub total: u64,
    pub pages: u32,
    pub stats: Option<SearchStats>,
}

impl ResultPage {
    pub fn new(items: Vec<Listing>, total: u64, page_size: u32) -> Self {
        Self {
            items,
            total,
            pages: page_count(total, page_size),
            stats: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
