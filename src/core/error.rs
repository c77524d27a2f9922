//! Error types for queue, subscriber and pipeline operations.

use thiserror::Error;

/// Errors produced by notification queue components.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Subscriber input was malformed, canceled or unconfirmed.
    #[error("entity validation failed: {0}")]
    EntityValidation(String),
    /// A queue name was looked up without being registered first.
    #[error("queue not registered: {0}")]
    QueueNotRegistered(String),
    /// Queue store failure with context.
    #[error("store error: {0}")]
    Store(String),
    /// Mail transport failure with context.
    #[error("transport error: {0}")]
    Transport(String),
    /// Configuration could not be loaded or was invalid.
    #[error("config error: {0}")]
    Config(String),
}

/// Failure raised by a pipeline stage handler.
///
/// Never escapes `QueueItem::process`; it only demotes the item to not-ready.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StageError(pub String);

impl StageError {
    /// Build a stage error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<NotifyError> for StageError {
    fn from(err: NotifyError) -> Self {
        Self(err.to_string())
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
