use thiserror::Error;

/// Errors raised while parsing domain tags
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown audience: {0}")]
    UnknownAudience(String),

    #[error("Unknown sheet status: {0}")]
    UnknownStatus(String),
}
