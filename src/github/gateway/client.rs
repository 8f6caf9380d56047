//! Octocrab client construction shared by gateway implementations.

use http::Uri;
use octocrab::Octocrab;

use crate::github::error::RemoteError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Builds an authenticated Octocrab client for the given API base URL.
///
/// # Errors
///
/// Returns [`RemoteError::InvalidUrl`] when the base URI cannot be parsed or
/// [`RemoteError::Api`] when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, RemoteError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| RemoteError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| RemoteError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
