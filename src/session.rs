//! Query facade tying the sync engine and statistics computation together.
//!
//! A [`StatsSession`] owns the gateways, the cache, and the repository
//! target for one configured repository and serves any number of date-range
//! queries over its lifetime. The cache persists across sessions, so repeat
//! queries in later runs reuse everything learned about closed pull requests.

use crate::github::gateway::{RepositoryGateway, ReviewEventGateway};
use crate::github::locator::RepositoryLocator;
use crate::persistence::ReviewCache;
use crate::stats::{Report, build_report};
use crate::sync::{DateRange, RetryPolicy, SkippedPullRequest, StatsError, SyncEngine};
use crate::telemetry::TelemetrySink;

/// Result of one statistics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsResponse {
    /// The computed latency report.
    pub report: Report,
    /// Pull requests excluded after failed review event fetches.
    pub skipped: Vec<SkippedPullRequest>,
}

/// Long-lived query session for one repository.
pub struct StatsSession<Repositories, Reviews>
where
    Repositories: RepositoryGateway,
    Reviews: ReviewEventGateway,
{
    repositories: Repositories,
    reviews: Reviews,
    cache: ReviewCache,
    telemetry: Box<dyn TelemetrySink>,
    locator: RepositoryLocator,
    retry: RetryPolicy,
}

impl<Repositories, Reviews> StatsSession<Repositories, Reviews>
where
    Repositories: RepositoryGateway,
    Reviews: ReviewEventGateway,
{
    /// Creates a session for the given repository.
    #[must_use]
    pub fn new(
        repositories: Repositories,
        reviews: Reviews,
        cache: ReviewCache,
        telemetry: Box<dyn TelemetrySink>,
        locator: RepositoryLocator,
    ) -> Self {
        Self {
            repositories,
            reviews,
            cache,
            telemetry,
            locator,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy for remote calls.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs one statistics query over the given creation-date range.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::NoData`] when no pull request matches the range,
    /// [`StatsError::RemoteList`] when the pull request listing fails, and
    /// [`StatsError::Store`] when the cache fails. A failed event fetch for
    /// an individual pull request does not fail the query; the pull request
    /// is reported in [`StatsResponse::skipped`] instead.
    pub async fn get_stats(&self, range: &DateRange) -> Result<StatsResponse, StatsError> {
        let engine = SyncEngine::new(
            &self.repositories,
            &self.reviews,
            &self.cache,
            self.telemetry.as_ref(),
        )
        .with_retry_policy(self.retry);

        let outcome = engine.reconcile(&self.locator, range).await?;
        if outcome.pull_requests.is_empty() && outcome.skipped.is_empty() {
            return Err(StatsError::NoData {
                range: range.describe(),
            });
        }

        Ok(StatsResponse {
            report: build_report(&outcome.pull_requests),
            skipped: outcome.skipped,
        })
    }
}
