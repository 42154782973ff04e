// src/domain/query.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::changes::ChangeType;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SORT_FIELD: &str = "date_created";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The canonical "what page of listings does the user want" tuple.
///
/// Every mutation keeps the invariants the search view relies on:
/// changing the search term or the filter set drops back to page 1, and
/// sorting by a new field starts ascending while re-sorting by the
/// current field flips the direction.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub page_size: u32,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_direction: SortDirection::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryDescriptor {
    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search {
            self.search = term;
            self.page = 1;
        }
    }

    pub fn set_filters(&mut self, filters: BTreeMap<String, String>) {
        if filters != self.filters {
            self.filters = filters;
            self.page = 1;
        }
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.filters.insert(key.into(), value.into());
        self.page = 1;
    }

    /// Re-sorting by the current field flips the direction; a new field
    /// starts ascending. Either way the view returns to page 1.
    pub fn toggle_sort(&mut self, field: impl Into<String>) {
        let field = field.into();
        if field == self.sort_field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Flattens the descriptor into query-string pairs, omitting empty
    /// values the way the server expects.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search".to_string(), self.search.clone()));
        }
        for (key, value) in &self.filters {
            if !value.is_empty() {
                pairs.push((key.clone(), value.clone()));
            }
        }
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("page_size".to_string(), self.page_size.to_string()));
        pairs.push(("sort_by".to_string(), self.sort_field.clone()));
        pairs.push((
            "sort_direction".to_string(),
            self.sort_direction.as_str().to_string(),
        ));
        pairs
    }
}

/// `ceil(total / page_size)`, with 0 pages for an empty result set.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let page_size = u64::from(page_size.max(1));
    ((total + page_size - 1) / page_size) as u32
}

/// Parameters for the server-computed history feed. History reads are
/// most-recent-first by default, unlike listing searches.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort_order: SortDirection,
    pub change_type: Option<ChangeType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_order: SortDirection::Desc,
            change_type: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl HistoryQuery {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
            ("sort_order".to_string(), self.sort_order.as_str().to_string()),
        ];
        if let Some(change_type) = self.change_type {
            pairs.push(("change_type".to_string(), change_type.as_str().to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("start_date".to_string(), start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date".to_string(), end.to_string()));
        }
        pairs
    }
}
