//! Client for the Derpibooru image search API.
//!
//! [`SearchClient`] wraps any [`SearchBackend`] and turns it into a lazy, bounded sequence of
//! [`ImageResult`]s: pages are only requested while the caller keeps asking for images.

use std::collections::{HashMap, VecDeque};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::RelayError;

/// The API refuses pages larger than this.
const MAX_PER_PAGE: usize = 50;
/// Path of the image search endpoint, relative to the site root.
const SEARCH_PATH: &str = "/api/v1/json/search/images";

/// One image from a search. (Does not include every field the API returns.)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct ImageResult {
    pub id: u64,
    /// File extension, e.g. `png` or `jpg`.
    pub format: String,
    /// Rendition name (`large`, `full`, `thumb`, ...) to download URL.
    pub representations: HashMap<String, String>,
}

impl ImageResult {
    /// Discord only previews attachments whose name ends in a known image extension, so the
    /// upload is named after the id and format rather than whatever the original file was called.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.id, self.format)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    images: Vec<ImageResult>,
}

/// Anything that can answer one page of an image search.
#[async_trait]
pub(crate) trait SearchBackend: Send + Sync {
    /// Fetches page `page` (1-based) of at most `per_page` results for `tags`.
    async fn search_page(
        &self,
        tags: &[String],
        page: u32,
        per_page: usize,
    ) -> Result<Vec<ImageResult>, RelayError>;
}

/// Joins the tags into a single query string. Blank tags add no constraint, and a query with no
/// constraints at all matches every image.
pub(crate) fn query_string(tags: &[String]) -> String {
    let terms: Vec<&str> = tags
        .iter()
        .map(String::as_str)
        .filter(|t| !t.trim().is_empty())
        .collect();
    if terms.is_empty() {
        "*".to_string()
    } else {
        terms.join(",")
    }
}

/// The real thing, talking to Derpibooru over HTTP.
#[derive(Clone)]
pub(crate) struct DerpibooruApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    filter_id: Option<u64>,
    sort_field: Option<String>,
    sort_direction: Option<String>,
}

impl DerpibooruApi {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            filter_id: config.filter_id,
            sort_field: config.sort_field.clone(),
            sort_direction: config.sort_direction.clone(),
        }
    }

    fn params(&self, tags: &[String], page: u32, per_page: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query_string(tags)),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        if let Some(id) = self.filter_id {
            params.push(("filter_id", id.to_string()));
        }
        if let Some(sf) = &self.sort_field {
            params.push(("sf", sf.clone()));
        }
        if let Some(sd) = &self.sort_direction {
            params.push(("sd", sd.clone()));
        }
        params
    }
}

#[async_trait]
impl SearchBackend for DerpibooruApi {
    async fn search_page(
        &self,
        tags: &[String],
        page: u32,
        per_page: usize,
    ) -> Result<Vec<ImageResult>, RelayError> {
        let response: SearchResponse = self
            .client
            .get(format!("{}{}", self.base_url, SEARCH_PATH))
            .query(&self.params(tags, page, per_page))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            // the URL carries the API key, so it must never reach a notice or a log line
            .map_err(|e| RelayError::Search(e.without_url().into()))?
            .json()
            .await
            .map_err(|e| {
                RelayError::Search(anyhow!("unreadable search response: {}", e.without_url()))
            })?;

        debug!(page, count = response.images.len(), "search page received");
        Ok(response.images)
    }
}

/// A search backend plus the cap on how many results one query may produce.
#[derive(Debug)]
pub(crate) struct SearchClient<B> {
    backend: B,
    limit: usize,
}

impl<B: SearchBackend> SearchClient<B> {
    pub fn new(backend: B, limit: usize) -> Self {
        Self { backend, limit }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Starts a search. Nothing is sent until [`Results::next`] is first awaited.
    pub fn query<'a>(&'a self, tags: &'a [String]) -> Results<'a, B> {
        Results {
            client: self,
            tags,
            buffered: VecDeque::new(),
            next_page: 1,
            yielded: 0,
            exhausted: false,
        }
    }
}

/// Lazily paged search results, in the order the service returns them.
pub(crate) struct Results<'a, B> {
    client: &'a SearchClient<B>,
    tags: &'a [String],
    buffered: VecDeque<ImageResult>,
    next_page: u32,
    yielded: usize,
    exhausted: bool,
}

impl<B: SearchBackend> Results<'_, B> {
    /// The next image, `Ok(None)` once the limit is reached or the service runs out.
    pub async fn next(&mut self) -> Result<Option<ImageResult>, RelayError> {
        if self.yielded >= self.client.limit {
            return Ok(None);
        }

        if self.buffered.is_empty() && !self.exhausted {
            let per_page = (self.client.limit - self.yielded).min(MAX_PER_PAGE);
            let page = self
                .client
                .backend
                .search_page(self.tags, self.next_page, per_page)
                .await?;
            // a short page is the last one
            self.exhausted = page.len() < per_page;
            self.next_page += 1;
            self.buffered.extend(page);
        }

        let next = self.buffered.pop_front();
        if next.is_some() {
            self.yielded += 1;
        }
        Ok(next)
    }
}
