//! Error types for Dispatch.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors returned by a mail provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Scan pipeline errors.
///
/// `MissingToken` and `Search` fail the whole request. The remaining
/// variants are per-message: the message is skipped and its siblings
/// continue.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Missing token")]
    MissingToken,

    #[error("Message search failed: {0}")]
    Search(#[source] ProviderError),

    #[error("Failed to fetch message {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: ProviderError,
    },

    #[error("Message {id} has no {header} header")]
    MissingHeader { id: String, header: &'static str },

    #[error("Failed to decode body of message {id}: {reason}")]
    Decode { id: String, reason: String },

    #[error("Message {id} has no usable timestamp")]
    NoTimestamp { id: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
