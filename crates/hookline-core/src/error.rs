//! Error types for Hookline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Webhook signature or token did not match the configured secret.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Outbound call to the git provider failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The sink already holds a job with the same name.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("sink rejected job: {0}")]
    Sink(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
