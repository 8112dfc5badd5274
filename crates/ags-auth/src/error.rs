//! Error types for authentication operations

/// Errors from authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("device registration failed: {0}")]
    Registration(String),

    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("not authenticated: {0}")]
    NotAuthenticated(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
