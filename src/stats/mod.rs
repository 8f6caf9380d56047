//! Review latency statistics over reconciled pull requests.
//!
//! The computation is pure: it consumes the sync engine's output and never
//! touches the network or the cache, so identical inputs always produce
//! identical reports.

use chrono::{DateTime, Duration, Utc};

use crate::sync::SyncedPullRequest;

/// Review latency for one pull request.
///
/// Latency is measured from `created_at` to the first review event of any
/// kind on the pull request. A pull request with no review events carries no
/// latency rather than a zero or sentinel value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestLatency {
    /// Human-facing pull request number.
    pub number: u64,
    /// Pull request title, when the remote supplied one.
    pub title: Option<String>,
    /// Creation timestamp the latency is measured from.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the earliest review event, if any.
    pub first_review_at: Option<DateTime<Utc>>,
    /// Time from creation to the first review event, if any.
    pub latency: Option<Duration>,
}

/// Aggregated responsiveness of one reviewer.
///
/// Per pull request, only the reviewer's earliest event counts; later
/// re-reviews on the same pull request do not dilute the metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerMetric {
    /// Reviewer login.
    pub reviewer: String,
    /// Mean first-response latency across reviewed pull requests.
    pub average_latency: Duration,
    /// Smallest first-response latency observed.
    pub fastest_latency: Duration,
    /// Largest first-response latency observed.
    pub slowest_latency: Duration,
    /// Number of distinct pull requests the reviewer responded to.
    pub reviewed_count: usize,
}

/// Complete statistics report for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Per pull request latencies, ordered by creation time ascending.
    pub pull_requests: Vec<PullRequestLatency>,
    /// Per reviewer metrics, ordered by reviewer login ascending.
    pub reviewers: Vec<ReviewerMetric>,
}

/// Builds the statistics report from reconciled pull requests.
///
/// Events within each input are expected pre-sorted by `submitted_at`
/// ascending, which the sync engine guarantees.
#[must_use]
pub fn build_report(pull_requests: &[SyncedPullRequest]) -> Report {
    let mut latencies: Vec<PullRequestLatency> = pull_requests
        .iter()
        .map(|synced| {
            let first_review_at = synced.events.first().map(|event| event.submitted_at);
            PullRequestLatency {
                number: synced.pull_request.number,
                title: synced.pull_request.title.clone(),
                created_at: synced.pull_request.created_at,
                first_review_at,
                latency: first_review_at
                    .map(|submitted| submitted - synced.pull_request.created_at),
            }
        })
        .collect();
    latencies.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then(a.number.cmp(&b.number))
    });

    Report {
        pull_requests: latencies,
        reviewers: build_reviewer_metrics(pull_requests),
    }
}

fn build_reviewer_metrics(pull_requests: &[SyncedPullRequest]) -> Vec<ReviewerMetric> {
    use std::collections::BTreeMap;

    // BTreeMap keeps reviewers sorted by login for free.
    let mut per_reviewer: BTreeMap<&str, Vec<Duration>> = BTreeMap::new();

    for synced in pull_requests {
        // Events arrive sorted, so the first occurrence per reviewer is that
        // reviewer's earliest response on this pull request.
        let mut seen: Vec<&str> = Vec::new();
        for event in &synced.events {
            if seen.contains(&event.reviewer.as_str()) {
                continue;
            }
            seen.push(&event.reviewer);
            per_reviewer
                .entry(&event.reviewer)
                .or_default()
                .push(event.submitted_at - synced.pull_request.created_at);
        }
    }

    per_reviewer
        .into_iter()
        .map(|(reviewer, latencies)| summarise_reviewer(reviewer, &latencies))
        .collect()
}

fn summarise_reviewer(reviewer: &str, latencies: &[Duration]) -> ReviewerMetric {
    let fastest = latencies.iter().min().copied().unwrap_or_default();
    let slowest = latencies.iter().max().copied().unwrap_or_default();
    let total_seconds: i64 = latencies.iter().map(Duration::num_seconds).sum();
    let count = i64::try_from(latencies.len()).unwrap_or(i64::MAX).max(1);

    ReviewerMetric {
        reviewer: reviewer.to_owned(),
        average_latency: Duration::seconds(total_seconds / count),
        fastest_latency: fastest,
        slowest_latency: slowest,
        reviewed_count: latencies.len(),
    }
}
