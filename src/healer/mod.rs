//! The healing pipeline.
//!
//! For each library item and each of its two artwork slots the [`Healer`]
//! decides whether the slot needs repair, tries the local backup store, falls
//! back to the metadata provider, and optionally uploads the result.

mod pipeline;

pub use pipeline::{HealSettings, Healer};
