//! Error types exposed by the GitHub remote-source layer.

use thiserror::Error;

/// Errors surfaced while communicating with the remote pull request source.
///
/// These are transport-level failures; the sync engine translates them into
/// query-level errors before they reach the facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The authentication token was missing or blank.
    #[error("personal access token is required")]
    MissingToken,

    /// The provided repository URL could not be parsed.
    #[error("repository URL is invalid: {0}")]
    InvalidUrl(String),

    /// The repository path is incomplete.
    #[error("repository URL must match /owner/repo")]
    MissingPathSegments,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub, including timeouts.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403/429 with a rate limit
    /// message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from GitHub.
        message: String,
    },

    /// Invalid pagination parameters.
    #[error("invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the invalid parameter.
        message: String,
    },

    /// A response deserialised but did not match the expected shape.
    #[error("unexpected GitHub response shape: {message}")]
    InvalidResponse {
        /// Description of the missing or malformed field.
        message: String,
    },
}
