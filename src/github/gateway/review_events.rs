//! Octocrab-backed gateway for fetching a pull request's review events.

use async_trait::async_trait;
use octocrab::{Octocrab, Page};

use crate::github::error::RemoteError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{ApiReview, PullRequest, ReviewEvent};

use super::ReviewEventGateway;
use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;

/// Octocrab-backed review event gateway.
pub struct OctocrabReviewEventGateway {
    client: Octocrab,
}

impl OctocrabReviewEventGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] when the base URI cannot be parsed
    /// or [`RemoteError::Api`] when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &RepositoryLocator,
    ) -> Result<Self, RemoteError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab))
    }
}

#[async_trait]
impl ReviewEventGateway for OctocrabReviewEventGateway {
    async fn list_review_events(
        &self,
        locator: &RepositoryLocator,
        pull_request: &PullRequest,
    ) -> Result<Vec<ReviewEvent>, RemoteError> {
        let reviews_path = locator.reviews_path(pull_request.number);

        let page = self
            .client
            .get::<Page<ApiReview>, _, _>(&reviews_path, None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("list reviews", &error))?;

        let reviews = self
            .client
            .all_pages(page)
            .await
            .map_err(|error| map_octocrab_error("list reviews", &error))?;

        // Pending reviews have no submitted_at and are skipped.
        Ok(reviews
            .into_iter()
            .filter_map(|review| review.into_event(pull_request.id))
            .collect())
    }
}
