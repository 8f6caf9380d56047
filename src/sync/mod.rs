//! Sync engine: reconciles the remote source and the local cache.
//!
//! Given a date range, the engine produces the complete set of in-range pull
//! requests paired with their ordered review events, fetching from GitHub
//! only what the cache cannot supply. Closed pull requests are immutable, so
//! their events are served from the cache once seen; open pull requests are
//! always fetched live and never cached.

mod error;

pub use error::StatsError;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::github::error::RemoteError;
use crate::github::gateway::{RepositoryGateway, ReviewEventGateway};
use crate::github::locator::RepositoryLocator;
use crate::github::models::{PullRequest, ReviewEvent};
use crate::persistence::{CacheEntry, ReviewCache, StoreError};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Inclusive creation-time bounds for a statistics query.
///
/// Inclusion is governed by `created_at`, not closure time. An absent `from`
/// means unbounded past; an absent `to` means "now", which is equivalent to
/// unbounded because creation timestamps are never in the future.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Creates a range with the given optional bounds.
    #[must_use]
    pub const fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// An unbounded range matching every pull request.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Returns true when the timestamp falls within the inclusive bounds.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| timestamp >= from)
            && self.to.is_none_or(|to| timestamp <= to)
    }

    /// Human-readable description used in messages and the no-data error.
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.from, self.to) {
            (Some(from), Some(to)) => format!(
                "created between {} and {}",
                from.format("%Y-%m-%d %H:%M:%S"),
                to.format("%Y-%m-%d %H:%M:%S")
            ),
            (Some(from), None) => {
                format!("created since {}", from.format("%Y-%m-%d %H:%M:%S"))
            }
            (None, Some(to)) => format!("created up to {}", to.format("%Y-%m-%d %H:%M:%S")),
            (None, None) => "with no date filter".to_owned(),
        }
    }
}

/// One reconciled pull request with its ordered review events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedPullRequest {
    /// The pull request.
    pub pull_request: PullRequest,
    /// Review events ordered by `submitted_at` ascending; may be empty.
    pub events: Vec<ReviewEvent>,
}

/// A pull request excluded from the result after its review events could not
/// be fetched within the bounded retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPullRequest {
    /// Human-facing pull request number.
    pub pr_number: u64,
    /// Error detail from the final failed attempt.
    pub message: String,
}

/// Result of reconciling one date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// In-range pull requests with their events.
    pub pull_requests: Vec<SyncedPullRequest>,
    /// Pull requests excluded after failed event fetches.
    pub skipped: Vec<SkippedPullRequest>,
}

/// Bounded retry and timeout budget for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles per retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single remote call.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

enum ResolveFailure {
    Remote(RemoteError),
    Store(StoreError),
}

impl From<StoreError> for ResolveFailure {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}

/// Reconciles the remote pull request source and the local cache.
pub struct SyncEngine<'a, Repositories, Reviews>
where
    Repositories: RepositoryGateway,
    Reviews: ReviewEventGateway,
{
    repositories: &'a Repositories,
    reviews: &'a Reviews,
    cache: &'a ReviewCache,
    telemetry: &'a dyn TelemetrySink,
    retry: RetryPolicy,
}

impl<'a, Repositories, Reviews> SyncEngine<'a, Repositories, Reviews>
where
    Repositories: RepositoryGateway,
    Reviews: ReviewEventGateway,
{
    /// Creates an engine with the default retry policy.
    #[must_use]
    pub fn new(
        repositories: &'a Repositories,
        reviews: &'a Reviews,
        cache: &'a ReviewCache,
        telemetry: &'a dyn TelemetrySink,
    ) -> Self {
        Self {
            repositories,
            reviews,
            cache,
            telemetry,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns every in-range pull request paired with its ordered review
    /// events, growing the cache with any closed pull request seen for the
    /// first time.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::RemoteList`] when the pull request listing
    /// fails after retries (partial listings would mislead) and
    /// [`StatsError::Store`] when the cache cannot be read or written.
    pub async fn reconcile(
        &self,
        locator: &RepositoryLocator,
        range: &DateRange,
    ) -> Result<SyncOutcome, StatsError> {
        let listed = self.list_all_pull_requests(locator).await?;
        tracing::info!(total = listed.len(), "listed pull requests");

        // The remote listing is not trusted for date filtering; the local
        // filter alone guarantees the output set.
        let in_range: Vec<PullRequest> = listed
            .into_iter()
            .filter(|pull_request| range.contains(pull_request.created_at))
            .collect();

        let mut pull_requests = Vec::with_capacity(in_range.len());
        let mut skipped = Vec::new();

        for pull_request in in_range {
            match self.resolve_events(locator, &pull_request).await {
                Ok(mut events) => {
                    events.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
                    pull_requests.push(SyncedPullRequest {
                        pull_request,
                        events,
                    });
                }
                Err(ResolveFailure::Store(error)) => return Err(error.into()),
                Err(ResolveFailure::Remote(error)) => {
                    let message = error.to_string();
                    tracing::warn!(
                        pr_number = pull_request.number,
                        %error,
                        "excluding pull request after failed review event fetch"
                    );
                    self.telemetry.record(TelemetryEvent::PullRequestExcluded {
                        pr_number: pull_request.number,
                        message: message.clone(),
                    });
                    skipped.push(SkippedPullRequest {
                        pr_number: pull_request.number,
                        message,
                    });
                }
            }
        }

        Ok(SyncOutcome {
            pull_requests,
            skipped,
        })
    }

    async fn list_all_pull_requests(
        &self,
        locator: &RepositoryLocator,
    ) -> Result<Vec<PullRequest>, StatsError> {
        let mut pull_requests = Vec::new();
        let mut page = 1_u32;

        loop {
            let result = self
                .with_retry("list pull requests", || {
                    self.repositories.list_pull_requests(locator, page)
                })
                .await
                .map_err(|error| StatsError::RemoteList {
                    message: error.to_string(),
                })?;

            pull_requests.extend(result.items);

            if result.page_info.is_last_page() {
                return Ok(pull_requests);
            }
            page = page.saturating_add(1);
        }
    }

    /// Supplies review events for one pull request, from cache when the pull
    /// request is closed and already cached, live otherwise. The only path
    /// that grows the cache is a closed pull request missing from it.
    async fn resolve_events(
        &self,
        locator: &RepositoryLocator,
        pull_request: &PullRequest,
    ) -> Result<Vec<ReviewEvent>, ResolveFailure> {
        if pull_request.is_closed() {
            if let Some(entry) = self.cache.get(pull_request.id)? {
                tracing::debug!(
                    pr_number = pull_request.number,
                    "served review events from cache"
                );
                return Ok(entry.events);
            }

            let events = self
                .with_retry("list review events", || {
                    self.reviews.list_review_events(locator, pull_request)
                })
                .await
                .map_err(ResolveFailure::Remote)?;

            self.cache.put(&CacheEntry {
                pull_request: pull_request.clone(),
                events: events.clone(),
            })?;
            self.telemetry.record(TelemetryEvent::CacheEntryInserted {
                pr_number: pull_request.number,
            });
            return Ok(events);
        }

        // Open pull requests are mutable; always fetch live, never cache.
        self.with_retry("list review events", || {
            self.reviews.list_review_events(locator, pull_request)
        })
        .await
        .map_err(ResolveFailure::Remote)
    }

    async fn with_retry<T, Call, Fut>(
        &self,
        operation: &str,
        mut call: Call,
    ) -> Result<T, RemoteError>
    where
        Call: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1_u32;

        loop {
            let result = match tokio::time::timeout(self.retry.request_timeout, call()).await {
                Ok(result) => result,
                Err(_elapsed) => Err(RemoteError::Network {
                    message: format!(
                        "{operation} timed out after {timeout:?}",
                        timeout = self.retry.request_timeout
                    ),
                }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.retry.max_attempts => {
                    tracing::warn!(operation, attempt, %error, "remote call failed; retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt = attempt.saturating_add(1);
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests;
