//! Core type definitions for library items and their artwork.
//!
//! All enums serialize in lowercase (kebab-case where multi-word) so they
//! read naturally in the config file and the run log.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of library item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single movie.
    Movie,
    /// A TV series.
    Show,
    /// A collection grouping several items.
    Collection,
}

impl ItemKind {
    /// Top-level folder of the backup tree that holds this kind of item.
    pub fn backup_folder(&self) -> &'static str {
        match self {
            Self::Movie => "Movies",
            Self::Show => "TV Shows",
            Self::Collection => "Collections",
        }
    }

    /// Parse the `type` attribute the media server reports for an item or
    /// library section.
    pub fn from_server_type(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "show" => Some(Self::Show),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Show => write!(f, "show"),
            Self::Collection => write!(f, "collection"),
        }
    }
}

/// One artwork role of a library item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkSlot {
    /// Poster / cover image.
    Poster,
    /// Background / fanart image.
    Background,
}

impl ArtworkSlot {
    /// Both slots, in processing order.
    pub const ALL: [ArtworkSlot; 2] = [ArtworkSlot::Poster, ArtworkSlot::Background];

    /// File name stem used for this slot in the backup tree.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Poster => "poster",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for ArtworkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Detected condition of an artwork slot on the media server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkState {
    /// The slot has a reference that resolves to a valid image.
    Present,
    /// The slot has no reference at all.
    Missing,
    /// The slot has a reference that is unreachable or not an image.
    Broken,
}

impl ArtworkState {
    /// Whether the pipeline has to act on this slot.
    pub fn needs_repair(&self) -> bool {
        !matches!(self, Self::Present)
    }
}

impl fmt::Display for ArtworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Missing => write!(f, "missing"),
            Self::Broken => write!(f, "broken"),
        }
    }
}

/// A movie, show, or collection as enumerated from the media server.
///
/// Items are fetched fresh on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    /// Server-side identifier (Plex `ratingKey`).
    pub key: String,
    /// Display title.
    pub title: String,
    /// Kind of item.
    pub kind: ItemKind,
    /// Release or premiere year, if known.
    pub year: Option<u16>,
    /// Current poster reference (server-relative path), if any.
    pub poster: Option<String>,
    /// Current background reference (server-relative path), if any.
    pub background: Option<String>,
    /// Metadata provider id exposed by the server, if any.
    pub provider_id: Option<u64>,
}

impl LibraryItem {
    /// Current artwork reference for `slot`.
    pub fn artwork_ref(&self, slot: ArtworkSlot) -> Option<&str> {
        match slot {
            ArtworkSlot::Poster => self.poster.as_deref(),
            ArtworkSlot::Background => self.background.as_deref(),
        }
        .filter(|r| !r.is_empty())
    }
}

impl fmt::Display for LibraryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.kind)
    }
}
