//! Domain models for pull requests and review events.
//!
//! Types prefixed with `Api` are deserialisation targets for raw GitHub
//! responses. They are validated on ingress and converted into the public
//! domain types; a response missing a field the engine relies on fails fast
//! with [`RemoteError::InvalidResponse`] instead of propagating untyped data
//! inward.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::RemoteError;

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestState {
    /// The pull request is open and still mutable on the remote side.
    Open,
    /// The pull request is closed (or merged) and immutable.
    Closed,
}

impl PullRequestState {
    /// Returns the API string for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parses an API state string.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidResponse`] for anything other than
    /// `open` or `closed`.
    pub fn parse(value: &str) -> Result<Self, RemoteError> {
        match value {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(RemoteError::InvalidResponse {
                message: format!("unknown pull request state `{other}`"),
            }),
        }
    }
}

/// One pull request as reported by the remote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Stable identifier assigned by GitHub; immutable.
    pub id: u64,
    /// Human-facing sequence number.
    pub number: u64,
    /// Title, when GitHub provides one.
    pub title: Option<String>,
    /// Author login, when present.
    pub author: Option<String>,
    /// Creation timestamp; governs date-range inclusion.
    pub created_at: DateTime<Utc>,
    /// Lifecycle state.
    pub state: PullRequestState,
    /// Closure timestamp; present iff the state is closed.
    pub closed_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Returns true when the pull request is closed and therefore cacheable.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, PullRequestState::Closed)
    }
}

/// A timestamped reviewer action on one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEvent {
    /// Identifier of the pull request this event belongs to.
    pub pr_id: u64,
    /// Reviewer login.
    pub reviewer: String,
    /// Submission timestamp; events within a PR order by this ascending.
    pub submitted_at: DateTime<Utc>,
    /// Review outcome (approved, `changes_requested`, commented...). Retained
    /// for completeness; not used in aggregation.
    pub outcome: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) id: Option<u64>,
    pub(super) number: Option<u64>,
    pub(super) title: Option<String>,
    pub(super) state: Option<String>,
    pub(super) user: Option<ApiUser>,
    pub(super) created_at: Option<DateTime<Utc>>,
    pub(super) closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiUser {
    pub(super) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiReview {
    pub(super) user: Option<ApiUser>,
    pub(super) state: Option<String>,
    pub(super) submitted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ApiPullRequest> for PullRequest {
    type Error = RemoteError;

    fn try_from(value: ApiPullRequest) -> Result<Self, Self::Error> {
        let id = value.id.ok_or_else(|| missing_field("id"))?;
        let number = value.number.ok_or_else(|| missing_field("number"))?;
        let created_at = value.created_at.ok_or_else(|| missing_field("created_at"))?;
        let state_str = value.state.ok_or_else(|| missing_field("state"))?;
        let state = PullRequestState::parse(&state_str)?;

        if matches!(state, PullRequestState::Closed) && value.closed_at.is_none() {
            return Err(RemoteError::InvalidResponse {
                message: format!("closed pull request #{number} has no closed_at timestamp"),
            });
        }

        Ok(Self {
            id,
            number,
            title: value.title,
            author: value.user.and_then(|user| user.login),
            created_at,
            state,
            closed_at: value.closed_at,
        })
    }
}

impl ApiReview {
    /// Converts an API review into a domain event for the given pull request.
    ///
    /// Returns `None` for pending reviews: GitHub reports those without a
    /// `submitted_at` timestamp (and occasionally without a user), and they
    /// carry no latency signal.
    pub(super) fn into_event(self, pr_id: u64) -> Option<ReviewEvent> {
        let submitted_at = self.submitted_at?;
        let reviewer = self.user.and_then(|user| user.login)?;
        let outcome = self
            .state
            .map_or_else(|| "commented".to_owned(), |state| state.to_lowercase());
        Some(ReviewEvent {
            pr_id,
            reviewer,
            submitted_at,
            outcome,
        })
    }
}

fn missing_field(field: &str) -> RemoteError {
    RemoteError::InvalidResponse {
        message: format!("pull request response is missing `{field}`"),
    }
}
