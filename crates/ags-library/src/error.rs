//! Error types for library sync operations

/// Errors from library sync operations.
///
/// These stay internal to the subsystem: the `load()` orchestration
/// boundary absorbs every variant into a logged `LoadResult::Failed`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] ags_auth::Error),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("entitlement sync failed: {0}")]
    Sync(String),

    #[error("authorization code missing from callback URL")]
    MissingAuthorizationCode,

    #[error("cache error: {0}")]
    Cache(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for library sync operations.
pub type Result<T> = std::result::Result<T, Error>;
