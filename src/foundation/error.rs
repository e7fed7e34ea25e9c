/// Result alias used across the crate.
pub type CaptionResult<T> = Result<T, CaptionError>;

/// Crate error type.
///
/// Per-effect failures use [`CaptionError::Effect`] and are normally caught by the compositors;
/// everything else aborts the render pass that produced it.
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    /// Invalid input values (frame rates, windows, buffer sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid or incomplete configuration.
    #[error("config error: {0}")]
    Config(String),

    /// An effect failed to prepare or transform.
    #[error("effect error: {0}")]
    Effect(String),

    /// Source video probing or decoding failed.
    #[error("decode error: {0}")]
    Decode(String),

    /// Output encoding failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptionError {
    /// Build a [`CaptionError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CaptionError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CaptionError::Effect`].
    pub fn effect(msg: impl Into<String>) -> Self {
        Self::Effect(msg.into())
    }

    /// Build a [`CaptionError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`CaptionError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CaptionError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for CaptionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
