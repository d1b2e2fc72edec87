//! Media server access.
//!
//! [`MediaServer`] is the capability interface the healing pipeline talks to;
//! [`PlexClient`] implements it over the Plex HTTP API.

mod client;

pub use client::{extract_provider_id, PlexClient};

use artwork_healer_common::{ArtworkSlot, ArtworkState, LibraryItem, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// Capability interface for the media server.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Enumerate every movie, show, and collection of the configured
    /// libraries. A library that cannot be listed is skipped with a warning.
    async fn list_items(&self) -> Result<Vec<LibraryItem>>;

    /// Classify the current artwork of `slot`.
    ///
    /// Unreachable or undecodable artwork counts as [`ArtworkState::Broken`].
    async fn artwork_state(&self, item: &LibraryItem, slot: ArtworkSlot) -> ArtworkState;

    /// Download the current artwork of `slot`, if it resolves to an image.
    async fn download_artwork(&self, item: &LibraryItem, slot: ArtworkSlot)
        -> Result<Option<Bytes>>;

    /// Replace the artwork of `slot` with `data`.
    async fn upload_artwork(&self, item: &LibraryItem, slot: ArtworkSlot, data: Bytes)
        -> Result<()>;
}
