//! Error taxonomy shared by the clients, the backup store, and the pipeline.
//!
//! Only [`Error::Config`] is fatal; every other kind is recovered per slot.

/// Common error type for artwork-healer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The media server or metadata provider could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The metadata provider refused the request because of rate limiting.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// No matching artwork or item was found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Writing to the backup store or uploading to the server failed.
    #[error("Write error: {0}")]
    Write(String),

    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bytes that were expected to be an image could not be recognised.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new Network error.
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new RateLimited error.
    pub fn rate_limited<S: Into<String>>(msg: S) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Write error.
    pub fn write<S: Into<String>>(msg: S) -> Self {
        Self::Write(msg.into())
    }

    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new InvalidImage error.
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Whether this error must abort the run instead of a single slot.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
