use thiserror::Error;

/// Errors raised by the vault, the signing session and the hub client.
///
/// Every variant is scoped to the operation that produced it; nothing here is
/// fatal to the process.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed local input (bad hex key, zero fid, oversized cast text).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Wrong password or tampered ciphertext.
    #[error("decryption failed (wrong password or tampered data)")]
    Authentication,

    /// Non-2xx answer from the hub.
    #[error("hub error ({status}): {detail}")]
    Network { status: u16, detail: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed JSON from the hub or a corrupt local document.
    #[error("decode error: {0}")]
    Decode(String),

    /// Connection-level failure that survived every retry.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("pagination stopped after {pages} pages without reaching the end")]
    PaginationLimit { pages: usize },

    #[error("pagination cursor repeated: {cursor}")]
    PaginationCycle { cursor: String },

    #[error("failed to create message: {0}")]
    MessageBuild(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
