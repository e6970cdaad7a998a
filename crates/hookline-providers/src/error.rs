//! Git provider errors.

/// Errors raised by provider adapters.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<GitError> for hookline_core::Error {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Authentication(msg) => hookline_core::Error::Authentication(msg),
            GitError::Parse(msg) => hookline_core::Error::InvalidInput(msg),
            GitError::Request(_) | GitError::Api { .. } => {
                hookline_core::Error::Transport(err.to_string())
            }
        }
    }
}
