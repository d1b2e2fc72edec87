//! Trait definition and types for metadata providers.
//!
//! This module defines the [`MetadataProvider`] trait that the fallback
//! artwork source implements, along with the match type returned by
//! provider queries.

use artwork_healer_common::{ArtworkSlot, ItemKind, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// The provider entry selected for a library item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMatch {
    /// Provider-specific identifier (e.g. TMDB numeric ID).
    pub id: String,
    /// Display title of the matched entry.
    pub title: String,
    /// Release or premiere year, if known.
    pub year: Option<u16>,
    /// How confident the provider is that this entry matches the query (0.0 - 1.0).
    pub confidence: f64,
    /// Path fragment or URL of the poster image, if available.
    pub poster_path: Option<String>,
    /// Path fragment or URL of the background image, if available.
    pub backdrop_path: Option<String>,
}

impl ProviderMatch {
    /// Image reference for `slot`, if the provider has one.
    pub fn image_path(&self, slot: ArtworkSlot) -> Option<&str> {
        match slot {
            ArtworkSlot::Poster => self.poster_path.as_deref(),
            ArtworkSlot::Background => self.backdrop_path.as_deref(),
        }
        .filter(|p| !p.is_empty())
    }
}

/// Capability interface for the external metadata/image database.
///
/// Every failure (network, rate limiting, bad response) is returned as an
/// error and is non-fatal to the caller. "Nothing found" is `Ok(None)`.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Search by title and pick the best match, if any.
    async fn search(
        &self,
        title: &str,
        kind: ItemKind,
        year: Option<u16>,
    ) -> Result<Option<ProviderMatch>>;

    /// Resolve a provider id that the media server already knows.
    async fn lookup(&self, id: u64, kind: ItemKind) -> Result<Option<ProviderMatch>>;

    /// Download the image for `slot` of a match.
    async fn fetch_image(&self, item: &ProviderMatch, slot: ArtworkSlot)
        -> Result<Option<Bytes>>;
}
