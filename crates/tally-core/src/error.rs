use thiserror::Error;

/// Shared error type for the Tally core collaborators.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Blob storage error (lock poisoning, backend failure).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cryptographic error (malformed key or signature bytes).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for TallyError {
    fn from(e: serde_json::Error) -> Self {
        TallyError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for TallyError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        TallyError::Crypto(e.to_string())
    }
}
