//! Artwork-Healer-Common: Shared types, errors, and utilities.
//!
//! This crate provides functionality used across artwork-healer:
//!
//! - **Core Types**: Library item kinds, artwork slots, and artwork states
//! - **Path Utilities**: Filesystem-safe naming for the backup tree
//! - **Error Handling**: The error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use artwork_healer_common::{ArtworkSlot, Error, ItemKind, Result};
//! use artwork_healer_common::paths::safe_filename;
//!
//! assert_eq!(ItemKind::Show.backup_folder(), "TV Shows");
//! assert_eq!(ArtworkSlot::Background.file_stem(), "background");
//! assert_eq!(safe_filename("Face/Off"), "FaceOff");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("no poster for Gladiator"))
//! }
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
