// src/api/http.rs

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::api::{FavoritesApi, ListingsApi};
use crate::config::ApiConfig;
use crate::domain::listing::SearchStats;
use crate::domain::query::page_count;
use crate::domain::{HistoryEntry, HistoryPage, HistoryQuery, Listing, QueryDescriptor, ResultPage};
use crate::errors::ClientError;

/// reqwest-backed implementation of the catalog endpoints.
pub struct HttpApi {
    client: Client,
    config: ApiConfig,
}

/// Most endpoints wrap their payload in `{ "data": ... }`; a few return
/// it bare. Mirror that by trying the envelope first.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<Listing>,
    total: u64,
    pages: Option<u32>,
    #[serde(default)]
    stats: Option<SearchStats>,
}

impl SearchResponse {
    fn into_page(self, page_size: u32) -> ResultPage {
        let pages = self
            .pages
            .unwrap_or_else(|| page_count(self.total, page_size));
        ResultPage {
            items: self.items,
            total: self.total,
            pages,
            stats: self.stats,
        }
    }
}

#[derive(Deserialize)]
struct HistoryResponse {
    items: Vec<HistoryEntry>,
    total: u64,
    pages: Option<u32>,
}

#[derive(Deserialize)]
struct CheckFavoriteResponse {
    is_favorite: bool,
}

impl HttpApi {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::network)?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str, pairs: &[(String, String)]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path))
            .map_err(|e| ClientError::Network(format!("bad url: {e}")))?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await.map_err(ClientError::network)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(server_error(status, response).await)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        let body = response.text().await.map_err(ClientError::network)?;
        if let Ok(envelope) = serde_json::from_str::<Envelope<T>>(&body) {
            return Ok(envelope.data);
        }
        serde_json::from_str::<T>(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Pulls the human-readable message out of a structured error body,
/// checking the `detail` and `message` fields the server uses.
async fn server_error(status: StatusCode, response: Response) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| "request failed".to_string());
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ListingsApi for HttpApi {
    async fn search(&self, query: &QueryDescriptor) -> Result<ResultPage, ClientError> {
        let url = self.endpoint("/listings/search", &query.to_query_pairs())?;
        let response: SearchResponse = self.fetch(self.request(Method::GET, url)).await?;
        Ok(response.into_page(query.page_size))
    }

    async fn get(&self, id: i64) -> Result<Listing, ClientError> {
        let url = self.endpoint(&format!("/listings/{id}"), &[])?;
        self.fetch(self.request(Method::GET, url)).await
    }

    async fn create(&self, payload: &Value) -> Result<Listing, ClientError> {
        let url = self.endpoint("/listings", &[])?;
        self.fetch(self.request(Method::POST, url).json(payload)).await
    }

    async fn update(&self, id: i64, payload: &Value) -> Result<Listing, ClientError> {
        let url = self.endpoint(&format!("/listings/{id}"), &[])?;
        self.fetch(self.request(Method::PUT, url).json(payload)).await
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("/listings/{id}"), &[])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn archive(&self, id: i64, reason: Option<&str>) -> Result<Listing, ClientError> {
        let url = self.endpoint(&format!("/listings/{id}/archive"), &[])?;
        let mut builder = self.request(Method::POST, url);
        if let Some(reason) = reason {
            builder = builder.json(&json!({ "reason": reason }));
        }
        self.fetch(builder).await
    }

    async fn restore(&self, id: i64) -> Result<Listing, ClientError> {
        let url = self.endpoint(&format!("/listings/{id}/restore"), &[])?;
        self.fetch(self.request(Method::POST, url)).await
    }

    async fn listing_history(&self, id: i64) -> Result<Vec<HistoryEntry>, ClientError> {
        let url = self.endpoint(&format!("/listings/{id}/history"), &[])?;
        self.fetch(self.request(Method::GET, url)).await
    }

    async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, ClientError> {
        let url = self.endpoint("/listings/history", &query.to_query_pairs())?;
        let response: HistoryResponse = self.fetch(self.request(Method::GET, url)).await?;
        let pages = response
            .pages
            .unwrap_or_else(|| page_count(response.total, query.page_size));
        Ok(HistoryPage {
            items: response.items,
            total: response.total,
            pages,
        })
    }
}

#[async_trait]
impl FavoritesApi for HttpApi {
    async fn favorites(&self, page: u32, page_size: u32) -> Result<ResultPage, ClientError> {
        let pairs = [
            ("page".to_string(), page.to_string()),
            ("page_size".to_string(), page_size.to_string()),
        ];
        let url = self.endpoint("/favorites", &pairs)?;
        let response: SearchResponse = self.fetch(self.request(Method::GET, url)).await?;
        Ok(response.into_page(page_size))
    }

    async fn add_favorite(&self, listing_id: i64) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("/favorites/{listing_id}"), &[])?;
        self.send(self.request(Method::POST, url)).await?;
        Ok(())
    }

    async fn remove_favorite(&self, listing_id: i64) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("/favorites/{listing_id}"), &[])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn check_favorite(&self, listing_id: i64) -> Result<bool, ClientError> {
        let url = self.endpoint(&format!("/favorites/{listing_id}/check"), &[])?;
        let response: CheckFavoriteResponse = self.fetch(self.request(Method::GET, url)).await?;
        Ok(response.is_favorite)
    }
}
