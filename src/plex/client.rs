use crate::config::ServerConfig;
use artwork_healer_common::{ArtworkSlot, ArtworkState, Error, ItemKind, LibraryItem, Result};
use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

use super::MediaServer;

const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";

static PROVIDER_GUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:themoviedb|tmdb)://(\d+)").expect("provider guid regex should compile")
});

#[derive(Debug, Deserialize)]
struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    container: T,
}

#[derive(Debug, Default, Deserialize)]
struct SectionContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<PlexSection>,
}

#[derive(Debug, Deserialize)]
struct PlexSection {
    key: String,
    title: String,
    #[serde(rename = "type")]
    section_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

#[derive(Debug, Deserialize)]
struct PlexMetadata {
    #[serde(rename = "ratingKey")]
    rating_key: String,
    title: String,
    #[serde(rename = "type")]
    item_type: Option<String>,
    year: Option<u16>,
    thumb: Option<String>,
    art: Option<String>,
    guid: Option<String>,
    #[serde(rename = "Guid", default)]
    guids: Vec<PlexGuid>,
}

#[derive(Debug, Deserialize)]
struct PlexGuid {
    id: String,
}

impl PlexMetadata {
    fn into_item(self, fallback_kind: ItemKind) -> LibraryItem {
        let guids = self
            .guid
            .iter()
            .map(String::as_str)
            .chain(self.guids.iter().map(|g| g.id.as_str()));
        let provider_id = extract_provider_id(guids);

        LibraryItem {
            kind: self
                .item_type
                .as_deref()
                .and_then(ItemKind::from_server_type)
                .unwrap_or(fallback_kind),
            key: self.rating_key,
            title: self.title,
            year: self.year,
            poster: self.thumb,
            background: self.art,
            provider_id,
        }
    }
}

/// Find the first TMDB id among Plex guid strings.
///
/// Accepts both the current agent form (`tmdb://603`) and the legacy one
/// (`com.plexapp.agents.themoviedb://603?lang=en`).
pub fn extract_provider_id<'a>(guids: impl IntoIterator<Item = &'a str>) -> Option<u64> {
    guids.into_iter().find_map(|guid| {
        PROVIDER_GUID_PATTERN
            .captures(guid)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    })
}

pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
    libraries: Vec<String>,
    include_collections: bool,
}

impl PlexClient {
    pub fn new(config: &ServerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            libraries: config.libraries.clone(),
            include_collections: config.include_collections,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Whether `reference` is served by this Plex server. The token is only
    /// ever sent to the server's own origin.
    fn is_own_origin(&self, reference: &str) -> bool {
        if !reference.starts_with("http://") && !reference.starts_with("https://") {
            return true;
        }
        match (Url::parse(reference), Url::parse(&self.base_url)) {
            (Ok(target), Ok(base)) => target.origin() == base.origin(),
            _ => false,
        }
    }

    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(self.url(path))
            .header(PLEX_TOKEN_HEADER, &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::network(format!("Failed to GET {}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "GET {} returned {}",
                path,
                response.status()
            )));
        }

        let body: PlexResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::network(format!("Failed to parse {}: {}", path, e)))?;

        Ok(body.container)
    }

    async fn sections(&self) -> Result<Vec<PlexSection>> {
        let container: SectionContainer = self.get_json("/library/sections").await?;
        Ok(container.directories)
    }

    async fn section_items(&self, section: &PlexSection, kind: ItemKind) -> Result<Vec<LibraryItem>> {
        let path = format!("/library/sections/{}/all?includeGuids=1", section.key);
        let container: MetadataContainer = self.get_json(&path).await?;
        Ok(container
            .metadata
            .into_iter()
            .map(|m| m.into_item(kind))
            .collect())
    }

    async fn section_collections(&self, section: &PlexSection) -> Result<Vec<LibraryItem>> {
        let path = format!("/library/sections/{}/collections", section.key);
        let container: MetadataContainer = self.get_json(&path).await?;
        Ok(container
            .metadata
            .into_iter()
            .map(|m| m.into_item(ItemKind::Collection))
            .collect())
    }

    /// Fetch an artwork reference. `Ok(None)` when the server answers but
    /// the response is not a usable image.
    async fn fetch_reference(&self, reference: &str) -> Result<Option<Bytes>> {
        let mut request = self.client.get(self.url(reference));
        if self.is_own_origin(reference) {
            request = request.header(PLEX_TOKEN_HEADER, &self.token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("Failed to GET {}: {}", reference, e)))?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!("Artwork {} returned {}", reference, response.status());
            return Ok(None);
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::network(format!("Failed to read {}: {}", reference, e)))?;

        if image::guess_format(&data).is_err() {
            tracing::debug!("Artwork {} is not a recognised image", reference);
            return Ok(None);
        }

        Ok(Some(data))
    }
}

#[async_trait]
impl MediaServer for PlexClient {
    async fn list_items(&self) -> Result<Vec<LibraryItem>> {
        let sections = self.sections().await?;
        let mut items = Vec::new();

        for name in &self.libraries {
            let Some(section) = sections.iter().find(|s| &s.title == name) else {
                tracing::warn!("Library '{}' not found on server", name);
                continue;
            };

            let Some(kind) = ItemKind::from_server_type(&section.section_type) else {
                tracing::warn!(
                    "Library '{}' has unsupported type '{}'",
                    name,
                    section.section_type
                );
                continue;
            };

            match self.section_items(section, kind).await {
                Ok(mut found) => {
                    tracing::info!("Library '{}': {} items", name, found.len());
                    items.append(&mut found);
                }
                Err(e) => tracing::warn!("Failed to list library '{}': {}", name, e),
            }

            if self.include_collections && kind == ItemKind::Movie {
                match self.section_collections(section).await {
                    Ok(mut found) => {
                        tracing::info!("Library '{}': {} collections", name, found.len());
                        items.append(&mut found);
                    }
                    Err(e) => tracing::warn!("Failed to list collections of '{}': {}", name, e),
                }
            }
        }

        Ok(items)
    }

    async fn artwork_state(&self, item: &LibraryItem, slot: ArtworkSlot) -> ArtworkState {
        let Some(reference) = item.artwork_ref(slot) else {
            return ArtworkState::Missing;
        };

        match self.fetch_reference(reference).await {
            Ok(Some(_)) => ArtworkState::Present,
            Ok(None) => ArtworkState::Broken,
            Err(e) => {
                tracing::debug!("Treating {} {} as broken: {}", item, slot, e);
                ArtworkState::Broken
            }
        }
    }

    async fn download_artwork(
        &self,
        item: &LibraryItem,
        slot: ArtworkSlot,
    ) -> Result<Option<Bytes>> {
        match item.artwork_ref(slot) {
            Some(reference) => self.fetch_reference(reference).await,
            None => Ok(None),
        }
    }

    async fn upload_artwork(
        &self,
        item: &LibraryItem,
        slot: ArtworkSlot,
        data: Bytes,
    ) -> Result<()> {
        let endpoint = match slot {
            ArtworkSlot::Poster => "posters",
            ArtworkSlot::Background => "arts",
        };
        let path = format!("/library/metadata/{}/{}", item.key, endpoint);

        let response = self
            .client
            .post(self.url(&path))
            .header(PLEX_TOKEN_HEADER, &self.token)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::network(format!("Failed to POST {}: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::write(format!(
                "Plex upload to {} failed ({}): {}",
                path, status, body
            )));
        }

        Ok(())
    }
}
