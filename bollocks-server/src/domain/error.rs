use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("forbidden")]
    Forbidden,

    #[error("concurrent modification: {0}")]
    Conflict(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("upstream failure: {0}")]
    Upstream(String),
}
