//! Artwork healer - repairs missing or broken Plex artwork
//!
//! This library crate exposes the core functionality for integration testing.

pub mod backup;
pub mod config;
pub mod healer;
pub mod metadata;
pub mod plex;
pub mod report;
