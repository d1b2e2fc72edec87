//! Metadata provider used as the fallback artwork source.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and the shared match type.
//! - [`providers`] -- Concrete provider implementations (TMDB).

pub mod provider;
pub mod providers;

pub use provider::{MetadataProvider, ProviderMatch};
pub use providers::TmdbProvider;
