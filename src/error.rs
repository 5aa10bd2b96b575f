use thiserror::Error;

/// Failure of a single decode call. Decoding is all-or-nothing: no samples
/// are returned alongside either variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The buffer is too short to hold a field it claims or requires.
    #[error("payload format error: {0}")]
    Format(String),

    /// The buffer is complete but a field value violates the protocol.
    #[error("payload content error: {0}")]
    Content(String),
}

impl PayloadError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn content(message: impl Into<String>) -> Self {
        Self::Content(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PayloadError>;
