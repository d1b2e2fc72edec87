//! Filesystem layout and access for backup images.
//!
//! Images live at `{base_dir}/{Movies|TV Shows|Collections}/{title}/{slot}.{ext}`
//! with at most one file per (title, slot).

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use artwork_healer_common::paths::{safe_filename, BACKUP_EXTENSIONS};
use artwork_healer_common::{ArtworkSlot, Error, ItemKind, Result};

/// Filesystem manager for the backup tree.
#[derive(Debug, Clone)]
pub struct BackupStore {
    base_dir: PathBuf,
}

impl BackupStore {
    /// Create a new `BackupStore` rooted at `base_dir`.
    ///
    /// The directory is not created until the first write.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Folder holding all backups of one item.
    pub fn item_dir(&self, kind: ItemKind, title: &str) -> PathBuf {
        self.base_dir
            .join(kind.backup_folder())
            .join(safe_filename(title))
    }

    /// Path a backup with the given extension would have.
    pub fn path_for(&self, kind: ItemKind, title: &str, slot: ArtworkSlot, ext: &str) -> PathBuf {
        self.item_dir(kind, title)
            .join(format!("{}.{}", slot.file_stem(), ext))
    }

    /// Return the existing backup image for (title, slot), if there is one.
    ///
    /// Files whose header is not a recognised image format (empty or
    /// interrupted writes) are not backups and are skipped.
    pub fn find(&self, kind: ItemKind, title: &str, slot: ArtworkSlot) -> Option<PathBuf> {
        BACKUP_EXTENSIONS
            .iter()
            .map(|ext| self.path_for(kind, title, slot, ext))
            .filter(|path| path.is_file())
            .find(|path| {
                let valid = has_image_header(path);
                if !valid {
                    tracing::warn!(path = %path.display(), "Ignoring backup that is not an image");
                }
                valid
            })
    }

    /// Read the raw bytes of a backup file.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    /// Store image bytes as the backup for (title, slot).
    ///
    /// Parent folders are created as needed. The image is written to a
    /// temporary file in the item folder and moved into place, so a backup is
    /// either complete or absent. Fails with [`Error::Write`] if a backup for
    /// this slot already exists or the file cannot be written. A non-image
    /// file at the target path is replaced.
    pub fn write(
        &self,
        kind: ItemKind,
        title: &str,
        slot: ArtworkSlot,
        data: &[u8],
    ) -> Result<PathBuf> {
        if let Some(existing) = self.find(kind, title, slot) {
            return Err(Error::write(format!(
                "backup already exists: {}",
                existing.display()
            )));
        }

        let item_dir = self.item_dir(kind, title);
        std::fs::create_dir_all(&item_dir).map_err(|e| {
            Error::write(format!(
                "failed to create backup directory {}: {e}",
                item_dir.display()
            ))
        })?;

        let path = self.path_for(kind, title, slot, image_extension(data));
        let write_err =
            |e: std::io::Error| Error::write(format!("failed to write backup {}: {e}", path.display()));

        let mut tmp = tempfile::NamedTempFile::new_in(&item_dir).map_err(write_err)?;
        tmp.write_all(data).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        // Only a leftover non-image can occupy the target at this point.
        if path.exists() {
            tmp.persist(&path).map_err(|e| write_err(e.error))?;
        } else {
            tmp.persist_noclobber(&path).map_err(|e| write_err(e.error))?;
        }

        tracing::debug!(path = %path.display(), bytes = data.len(), "Wrote backup image");
        Ok(path)
    }
}

/// Whether the file starts with the magic number of a known image format.
fn has_image_header(path: &Path) -> bool {
    let mut header = Vec::with_capacity(32);
    File::open(path)
        .and_then(|f| f.take(32).read_to_end(&mut header))
        .map(|_| image::guess_format(&header).is_ok())
        .unwrap_or(false)
}

/// File extension for image bytes, sniffed from the magic number.
///
/// Unknown formats fall back to `jpg`.
pub fn image_extension(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => "png",
        Ok(image::ImageFormat::WebP) => "webp",
        _ => "jpg",
    }
}
