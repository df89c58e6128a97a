use thiserror::Error;

/// Failure modes of the Search Console API boundary.
///
/// `Unauthorized` is kept distinct so callers can drive a token-refresh
/// flow; everything else is either non-retryable (`Forbidden`, `NotFound`)
/// or a generic upstream/transport failure.
#[derive(Debug, Error)]
pub enum GscError {
    #[error("credential rejected (expired or revoked token)")]
    Unauthorized,
    #[error("access forbidden: {0}")]
    Forbidden(String),
    #[error("site not found or not verified: {0}")]
    NotFound(String),
    #[error("search console API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GscResult<T> = Result<T, GscError>;
