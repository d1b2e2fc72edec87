//! Shared test harness for integration tests.
//!
//! Provides in-memory doubles for [`MediaServer`] and [`MetadataProvider`]
//! that record every call, plus [`TestHarness`] which wires them into a
//! [`Healer`] backed by a temporary backup tree.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use artwork_healer::backup::BackupStore;
use artwork_healer::healer::{HealSettings, Healer};
use artwork_healer::metadata::{MetadataProvider, ProviderMatch};
use artwork_healer::plex::MediaServer;
use artwork_healer_common::{
    ArtworkSlot, ArtworkState, Error, ItemKind, LibraryItem, Result,
};
use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;

pub const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF fake jpeg body";

pub fn item(title: &str, kind: ItemKind) -> LibraryItem {
    LibraryItem {
        key: format!("key-{}", title.to_lowercase().replace(' ', "-")),
        title: title.to_string(),
        kind,
        year: None,
        poster: Some(format!("/library/metadata/{title}/thumb")),
        background: Some(format!("/library/metadata/{title}/art")),
        provider_id: None,
    }
}

pub fn movie(title: &str) -> LibraryItem {
    item(title, ItemKind::Movie)
}

pub fn show(title: &str) -> LibraryItem {
    item(title, ItemKind::Show)
}

pub fn provider_match(id: &str, title: &str) -> ProviderMatch {
    ProviderMatch {
        id: id.to_string(),
        title: title.to_string(),
        year: None,
        confidence: 0.5,
        poster_path: Some(format!("/{id}-poster.jpg")),
        backdrop_path: Some(format!("/{id}-backdrop.jpg")),
    }
}

// ---------------------------------------------------------------------------
// Media server double
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeServer {
    items: Vec<LibraryItem>,
    states: HashMap<(String, ArtworkSlot), ArtworkState>,
    artwork: HashMap<(String, ArtworkSlot), Bytes>,
    fail_listing: bool,
    fail_uploads: bool,
    pub state_checks: Mutex<Vec<(String, ArtworkSlot)>>,
    pub uploads: Mutex<Vec<(String, ArtworkSlot, Bytes)>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item whose slots report the given states.
    pub fn with_item(
        mut self,
        item: LibraryItem,
        poster: ArtworkState,
        background: ArtworkState,
    ) -> Self {
        self.states
            .insert((item.key.clone(), ArtworkSlot::Poster), poster);
        self.states
            .insert((item.key.clone(), ArtworkSlot::Background), background);
        self.items.push(item);
        self
    }

    /// Serve `data` as the current artwork of a slot.
    pub fn with_artwork(mut self, key: &str, slot: ArtworkSlot, data: &[u8]) -> Self {
        self.artwork
            .insert((key.to_string(), slot), Bytes::copy_from_slice(data));
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaServer for FakeServer {
    async fn list_items(&self) -> Result<Vec<LibraryItem>> {
        if self.fail_listing {
            return Err(Error::network("server unreachable"));
        }
        Ok(self.items.clone())
    }

    async fn artwork_state(&self, item: &LibraryItem, slot: ArtworkSlot) -> ArtworkState {
        self.state_checks
            .lock()
            .unwrap()
            .push((item.key.clone(), slot));
        self.states
            .get(&(item.key.clone(), slot))
            .copied()
            .unwrap_or(ArtworkState::Present)
    }

    async fn download_artwork(
        &self,
        item: &LibraryItem,
        slot: ArtworkSlot,
    ) -> Result<Option<Bytes>> {
        Ok(self.artwork.get(&(item.key.clone(), slot)).cloned())
    }

    async fn upload_artwork(
        &self,
        item: &LibraryItem,
        slot: ArtworkSlot,
        data: Bytes,
    ) -> Result<()> {
        if self.fail_uploads {
            return Err(Error::write("server rejected upload"));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((item.key.clone(), slot, data));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Metadata provider double
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeProvider {
    by_title: HashMap<String, ProviderMatch>,
    by_id: HashMap<u64, ProviderMatch>,
    images: HashMap<(String, ArtworkSlot), Bytes>,
    fail_search: bool,
    pub searches: Mutex<Vec<String>>,
    pub lookups: Mutex<Vec<u64>>,
    pub fetches: Mutex<Vec<(String, ArtworkSlot)>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer searches for `title` with `found`, serving `JPEG` for both slots.
    pub fn with_match(mut self, title: &str, found: ProviderMatch) -> Self {
        for slot in ArtworkSlot::ALL {
            self.images
                .insert((found.id.clone(), slot), Bytes::from_static(JPEG));
        }
        self.by_title.insert(title.to_string(), found);
        self
    }

    /// Answer lookups for `id` with `found`, serving `JPEG` for both slots.
    pub fn with_id(mut self, id: u64, found: ProviderMatch) -> Self {
        for slot in ArtworkSlot::ALL {
            self.images
                .insert((found.id.clone(), slot), Bytes::from_static(JPEG));
        }
        self.by_id.insert(id, found);
        self
    }

    /// Stop serving the image of one slot of a match.
    pub fn without_image(mut self, id: &str, slot: ArtworkSlot) -> Self {
        self.images.remove(&(id.to_string(), slot));
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Total calls of any kind.
    pub fn call_count(&self) -> usize {
        self.searches.lock().unwrap().len()
            + self.lookups.lock().unwrap().len()
            + self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(
        &self,
        title: &str,
        _kind: ItemKind,
        _year: Option<u16>,
    ) -> Result<Option<ProviderMatch>> {
        self.searches.lock().unwrap().push(title.to_string());
        if self.fail_search {
            return Err(Error::network("provider unreachable"));
        }
        Ok(self.by_title.get(title).cloned())
    }

    async fn lookup(&self, id: u64, _kind: ItemKind) -> Result<Option<ProviderMatch>> {
        self.lookups.lock().unwrap().push(id);
        Ok(self.by_id.get(&id).cloned())
    }

    async fn fetch_image(
        &self,
        found: &ProviderMatch,
        slot: ArtworkSlot,
    ) -> Result<Option<Bytes>> {
        self.fetches.lock().unwrap().push((found.id.clone(), slot));
        Ok(self.images.get(&(found.id.clone(), slot)).cloned())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A [`Healer`] wired to the doubles and a temporary backup tree.
pub struct TestHarness {
    pub server: Arc<FakeServer>,
    pub provider: Arc<FakeProvider>,
    pub backups: BackupStore,
    pub healer: Healer,
    pub dir: TempDir,
}

impl TestHarness {
    pub fn new(server: FakeServer, provider: FakeProvider, settings: HealSettings) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let backups = BackupStore::new(dir.path().join("Posters"));
        let server = Arc::new(server);
        let provider = Arc::new(provider);
        let healer = Healer::new(
            server.clone(),
            provider.clone(),
            backups.clone(),
            settings,
        );

        Self {
            server,
            provider,
            backups,
            healer,
            dir,
        }
    }

    /// Place a backup file directly, bypassing the store.
    pub fn seed_backup(&self, relative: &str, data: &[u8]) {
        let path = self.dir.path().join("Posters").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    pub fn backup_path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join("Posters").join(relative)
    }

    /// Count every regular file under the backup tree.
    pub fn backup_file_count(&self) -> usize {
        fn walk(dir: &Path) -> usize {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return 0;
            };
            entries
                .filter_map(|e| e.ok())
                .map(|e| {
                    let path = e.path();
                    if path.is_dir() {
                        walk(&path)
                    } else {
                        1
                    }
                })
                .sum()
        }
        walk(&self.dir.path().join("Posters"))
    }
}

pub fn upload_settings() -> HealSettings {
    HealSettings {
        enable_upload: true,
        ..HealSettings::default()
    }
}

pub fn dry_run_settings() -> HealSettings {
    HealSettings {
        enable_upload: true,
        dry_run: true,
        ..HealSettings::default()
    }
}
