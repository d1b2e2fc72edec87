//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket pacing at 4 requests / second via [`governor`].
//! - HTTP 429 surfaces as [`Error::RateLimited`]; nothing is retried within a run.
//! - 30-second request timeout.
//! - Confidence scoring based on title similarity and year proximity.

use std::num::NonZeroU32;
use std::time::Duration;

use artwork_healer_common::{ArtworkSlot, Error, ItemKind, Result};
use async_trait::async_trait;
use bytes::Bytes;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::metadata::provider::{MetadataProvider, ProviderMatch};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(4) {
    Some(n) => n,
    None => panic!("rate must be non-zero"),
};

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbEntry>,
}

/// Shape shared by movie, TV, and collection results (search and detail).
#[derive(Debug, Deserialize)]
struct TmdbEntry {
    id: u64,
    /// Movies
    title: Option<String>,
    /// TV shows and collections
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

impl TmdbEntry {
    fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_default()
    }

    fn year(&self) -> Option<u16> {
        parse_year(&self.release_date).or_else(|| parse_year(&self.first_air_date))
    }

    fn into_match(self, confidence: f64) -> ProviderMatch {
        ProviderMatch {
            title: self.display_title(),
            year: self.year(),
            id: self.id.to_string(),
            confidence,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use artwork_healer::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "en-US".into()).unwrap();
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    api_base: String,
    image_base: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a new TMDB provider with the given API key and language.
    pub fn new(api_key: String, language: String) -> Result<Self> {
        Self::with_base_urls(api_key, language, TMDB_BASE_URL, TMDB_IMAGE_BASE)
    }

    /// Create a provider that talks to alternative API and image hosts.
    pub fn with_base_urls(
        api_key: String,
        language: String,
        api_base: &str,
        image_base: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::network(format!("failed to build TMDB HTTP client: {e}")))?;

        let rate_limiter = RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND));

        Ok(Self {
            client,
            api_key,
            language,
            api_base: api_base.trim_end_matches('/').to_string(),
            image_base: image_base.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    /// Execute a paced GET request. `Ok(None)` means HTTP 404.
    async fn get(&self, url: &str, what: &str) -> Result<Option<reqwest::Response>> {
        self.rate_limiter.until_ready().await;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(format!("TMDB {what} request failed: {e}")))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("?")
                    .to_string();
                Err(Error::rate_limited(format!(
                    "TMDB {what} returned 429 (retry after {wait}s)"
                )))
            }
            status if !status.is_success() => Err(Error::network(format!(
                "TMDB {what} returned {status}"
            ))),
            _ => Ok(Some(resp)),
        }
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.api_base, self.api_key, self.language
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    /// Convert an image path fragment to a full URL.
    fn image_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{path}", self.image_base)
        }
    }

    /// Compute confidence score for a search result based on title similarity
    /// and year proximity.
    fn confidence(
        query_title: &str,
        result_title: &str,
        query_year: Option<u16>,
        result_year: Option<u16>,
    ) -> f64 {
        // Title scoring
        let query_folded = query_title.to_lowercase();
        let result_folded = result_title.to_lowercase();
        let base = if query_title == result_title {
            0.5
        } else if query_folded == result_folded {
            0.4
        } else if result_folded.contains(&query_folded) {
            0.2
        } else {
            0.1
        };

        // Year scoring
        let year_bonus = match (query_year, result_year) {
            (Some(q), Some(r)) if q == r => 0.3,
            (Some(q), Some(r)) if q.abs_diff(r) <= 1 => 0.15,
            _ => 0.0,
        };

        base + year_bonus
    }

    /// Pick the highest-scoring result. Ties keep provider order.
    fn best_match(
        query_title: &str,
        query_year: Option<u16>,
        results: Vec<TmdbEntry>,
    ) -> Option<ProviderMatch> {
        let mut scored: Vec<ProviderMatch> = results
            .into_iter()
            .map(|r| {
                let confidence =
                    Self::confidence(query_title, &r.display_title(), query_year, r.year());
                r.into_match(confidence)
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.into_iter().next()
    }
}

fn search_path(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Movie => "/search/movie",
        ItemKind::Show => "/search/tv",
        ItemKind::Collection => "/search/collection",
    }
}

fn detail_path(kind: ItemKind, id: u64) -> String {
    match kind {
        ItemKind::Movie => format!("/movie/{id}"),
        ItemKind::Show => format!("/tv/{id}"),
        ItemKind::Collection => format!("/collection/{id}"),
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn search(
        &self,
        title: &str,
        kind: ItemKind,
        year: Option<u16>,
    ) -> Result<Option<ProviderMatch>> {
        let mut params = vec![("query", title)];
        let year_str = year.map(|y| y.to_string());
        if let (ItemKind::Movie, Some(y)) = (kind, year_str.as_deref()) {
            params.push(("year", y));
        }

        let path = search_path(kind);
        debug!(path, title, ?year, "TMDB search");

        let Some(resp) = self.get(&self.url(path, &params), "search").await? else {
            return Ok(None);
        };
        let body: TmdbSearchResponse = resp
            .json()
            .await
            .map_err(|e| Error::network(format!("failed to parse TMDB search response: {e}")))?;

        Ok(Self::best_match(title, year, body.results))
    }

    async fn lookup(&self, id: u64, kind: ItemKind) -> Result<Option<ProviderMatch>> {
        let path = detail_path(kind, id);
        debug!(path = %path, "TMDB lookup");

        let Some(resp) = self.get(&self.url(&path, &[]), "lookup").await? else {
            return Ok(None);
        };
        let entry: TmdbEntry = resp
            .json()
            .await
            .map_err(|e| Error::network(format!("failed to parse TMDB detail response: {e}")))?;

        Ok(Some(entry.into_match(1.0)))
    }

    async fn fetch_image(
        &self,
        item: &ProviderMatch,
        slot: ArtworkSlot,
    ) -> Result<Option<Bytes>> {
        let Some(path) = item.image_path(slot) else {
            return Ok(None);
        };

        let url = self.image_url(path);
        debug!(url = %url, %slot, "TMDB download image");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::network(format!("TMDB image download failed: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Error::network(format!(
                "TMDB image download returned {}",
                resp.status()
            )));
        }

        let data = resp
            .bytes()
            .await
            .map_err(|e| Error::network(format!("failed to read TMDB image bytes: {e}")))?;

        if image::guess_format(&data).is_err() {
            return Err(Error::invalid_image(format!(
                "TMDB returned non-image data for {url}"
            )));
        }

        Ok(Some(data))
    }
}
