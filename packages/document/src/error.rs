//! Error types for the document layer.

use thiserror::Error;

/// Errors at the document layer.
///
/// Reads and removals never fail; only the serialization boundary does.
#[derive(Debug, Error)]
pub enum Error {
    /// A stored payload could not be turned into a document tree.
    #[error("malformed document payload: {reason}")]
    MalformedDocumentPayload { reason: String },

    /// A document tree could not be encoded as JSON text.
    #[error("encode error: {message}")]
    Encode { message: String },
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedDocumentPayload {
            reason: reason.into(),
        }
    }
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;
