//! Octocrab-backed gateway for listing a repository's pull requests.

use async_trait::async_trait;
use octocrab::{Octocrab, Page};

use crate::github::error::RemoteError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{ApiPullRequest, PullRequest};
use crate::github::pagination::PageInfo;

use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;
use super::{PullRequestPage, RepositoryGateway};

/// Items requested per page; the GitHub maximum.
const PER_PAGE: u8 = 100;

/// Octocrab-backed repository gateway.
pub struct OctocrabRepositoryGateway {
    client: Octocrab,
}

impl OctocrabRepositoryGateway {
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
impl RepositoryGateway for OctocrabRepositoryGateway {
    async fn list_pull_requests(
        &self,
        locator: &RepositoryLocator,
        page: u32,
    ) -> Result<PullRequestPage, RemoteError> {
        if page == 0 {
            return Err(RemoteError::InvalidPagination {
                message: "page must be at least 1".to_owned(),
            });
        }

        let page_str = page.to_string();
        let per_page_str = PER_PAGE.to_string();
        // State filtering and date filtering both happen locally in the sync
        // engine; the listing always requests every state.
        let query_params = [
            ("state", "all"),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];

        let page_result: Page<ApiPullRequest> = self
            .client
            .get(locator.pulls_path(), Some(&query_params))
            .await
            .map_err(|error| map_octocrab_error("list pulls", &error))?;

        let has_next = page_result.next.is_some();

        let items = page_result
            .items
            .into_iter()
            .map(PullRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PullRequestPage {
            items,
            page_info: PageInfo::new(page, PER_PAGE, has_next),
        })
    }
}
