//! Remote pull request source: typed GitHub access through Octocrab.
//!
//! This module wraps Octocrab behind small gateway traits, parses responses
//! into explicit domain shapes on ingress, and maps transport failures into
//! the [`RemoteError`] taxonomy so callers never see raw Octocrab errors.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod pagination;

pub use error::RemoteError;
pub use gateway::{
    OctocrabRepositoryGateway, OctocrabReviewEventGateway, PullRequestPage, RepositoryGateway,
    ReviewEventGateway,
};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{PullRequest, PullRequestState, ReviewEvent};
pub use pagination::PageInfo;

#[cfg(test)]
pub use gateway::{MockRepositoryGateway, MockReviewEventGateway};
