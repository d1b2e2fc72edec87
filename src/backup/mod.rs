//! Local backup store.
//!
//! A filesystem tree mirroring the library structure that acts as the
//! first-choice artwork source. Backups are additive only: files are created
//! lazily and never overwritten or deleted.

mod store;

pub use store::{image_extension, BackupStore};
