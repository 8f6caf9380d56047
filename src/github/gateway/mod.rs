//! Gateways for reading pull request data through Octocrab.
//!
//! The trait-based design keeps the sync engine independent of HTTP details
//! and enables mocking in tests; the Octocrab implementations handle the real
//! requests.

mod client;
mod error_mapping;
mod pull_requests;
mod review_events;

pub use pull_requests::OctocrabRepositoryGateway;
pub use review_events::OctocrabReviewEventGateway;

use async_trait::async_trait;

use crate::github::error::RemoteError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::{PullRequest, ReviewEvent};
use crate::github::pagination::PageInfo;

/// One page of pull requests from the remote source.
#[derive(Debug, Clone)]
pub struct PullRequestPage {
    /// Pull requests on this page.
    pub items: Vec<PullRequest>,
    /// Pagination state, including the end-of-pagination signal.
    pub page_info: PageInfo,
}

/// Gateway for listing a repository's pull requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// Lists one page of pull requests (all states), 1-based page number.
    async fn list_pull_requests(
        &self,
        locator: &RepositoryLocator,
        page: u32,
    ) -> Result<PullRequestPage, RemoteError>;
}

/// Gateway for fetching one pull request's review events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewEventGateway: Send + Sync {
    /// Fetches all review events for the pull request, unordered.
    async fn list_review_events(
        &self,
        locator: &RepositoryLocator,
        pull_request: &PullRequest,
    ) -> Result<Vec<ReviewEvent>, RemoteError>;
}
