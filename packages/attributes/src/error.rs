//! Error types for attribute resolution.

use thiserror::Error;

/// Errors that can occur while routing or resolving dynamic attributes.
#[derive(Debug, Error)]
pub enum Error {
    /// The document layer failed (malformed payload, encoding).
    #[error("document error: {0}")]
    Document(#[from] dynattr_document::Error),

    /// Walking the locale fallback chain came back to a locale it had
    /// already visited.
    #[error("fallback cycle detected at locale '{locale}' (chain: {})", .chain.join(" -> "))]
    FallbackCycleDetected { locale: String, chain: Vec<String> },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for attribute operations.
pub type Result<T> = std::result::Result<T, Error>;
