//! Tests for the sync engine's cache-consistent reconciliation.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use mockall::Sequence;
use rstest::rstest;
use tempfile::TempDir;

use super::{DateRange, RetryPolicy, StatsError, SyncEngine};
use crate::github::error::RemoteError;
use crate::github::gateway::{MockRepositoryGateway, MockReviewEventGateway, PullRequestPage};
use crate::github::locator::RepositoryLocator;
use crate::github::models::{PullRequest, PullRequestState, ReviewEvent};
use crate::github::pagination::PageInfo;
use crate::persistence::{CacheEntry, ReviewCache, migrate_database};
use crate::telemetry::NoopTelemetrySink;
use crate::telemetry::TelemetryEvent;
use crate::telemetry::test_support::RecordingSink;

fn timestamp(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn closed_pr(id: u64, number: u64, day: u32) -> PullRequest {
    PullRequest {
        id,
        number,
        title: Some(format!("PR {number}")),
        author: Some("octocat".to_owned()),
        created_at: timestamp(day, 9),
        state: PullRequestState::Closed,
        closed_at: Some(timestamp(day, 18)),
    }
}

fn open_pr(id: u64, number: u64, day: u32) -> PullRequest {
    PullRequest {
        id,
        number,
        title: Some(format!("PR {number}")),
        author: Some("hubot".to_owned()),
        created_at: timestamp(day, 9),
        state: PullRequestState::Open,
        closed_at: None,
    }
}

fn event(pr_id: u64, reviewer: &str, day: u32, hour: u32) -> ReviewEvent {
    ReviewEvent {
        pr_id,
        reviewer: reviewer.to_owned(),
        submitted_at: timestamp(day, hour),
        outcome: "approved".to_owned(),
    }
}

fn single_page(items: Vec<PullRequest>) -> PullRequestPage {
    PullRequestPage {
        items,
        page_info: PageInfo::new(1, 100, false),
    }
}

fn locator() -> RepositoryLocator {
    RepositoryLocator::from_owner_repo("owner", "repo").expect("locator should build")
}

fn temp_cache() -> (TempDir, ReviewCache) {
    let temp_dir = TempDir::new().expect("temp dir should create");
    let database_url = temp_dir
        .path()
        .join("revlag.sqlite")
        .to_string_lossy()
        .to_string();
    migrate_database(&database_url, &NoopTelemetrySink).expect("migration should succeed");
    let cache = ReviewCache::new(database_url).expect("cache should build");
    (temp_dir, cache)
}

const fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::ZERO,
        request_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn pagination_combines_pages_until_end_signal() {
    let mut repositories = MockRepositoryGateway::new();
    repositories
        .expect_list_pull_requests()
        .withf(|_, page| *page == 1)
        .times(1)
        .returning(|_, _| {
            Ok(PullRequestPage {
                items: vec![open_pr(1, 1, 1)],
                page_info: PageInfo::new(1, 100, true),
            })
        });
    repositories
        .expect_list_pull_requests()
        .withf(|_, page| *page == 2)
        .times(1)
        .returning(|_, _| {
            Ok(PullRequestPage {
                items: vec![open_pr(2, 2, 2)],
                page_info: PageInfo::new(2, 100, false),
            })
        });

    let mut reviews = MockReviewEventGateway::new();
    reviews
        .expect_list_review_events()
        .times(2)
        .returning(|_, _| Ok(Vec::new()));

    let (_temp_dir, cache) = temp_cache();
    let engine = SyncEngine::new(&repositories, &reviews, &cache, &NoopTelemetrySink)
        .with_retry_policy(fast_retry());

    let outcome = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("reconcile should succeed");

    assert_eq!(outcome.pull_requests.len(), 2);
    assert!(outcome.skipped.is_empty());
}

#[tokio::test]
async fn closed_pr_events_fetched_exactly_once_across_queries() {
    let mut repositories = MockRepositoryGateway::new();
    repositories
        .expect_list_pull_requests()
        .times(2)
        .returning(|_, _| Ok(single_page(vec![closed_pr(10, 1, 1)])));

    let mut reviews = MockReviewEventGateway::new();
    // The cornerstone property: the second query must serve the closed PR
    // from the cache with zero review event network calls.
    reviews
        .expect_list_review_events()
        .times(1)
        .returning(|_, _| Ok(vec![event(10, "alice", 1, 12)]));

    let (_temp_dir, cache) = temp_cache();
    let telemetry = RecordingSink::default();
    let engine =
        SyncEngine::new(&repositories, &reviews, &cache, &telemetry).with_retry_policy(fast_retry());

    let first = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("first reconcile should succeed");
    let second = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("second reconcile should succeed");

    assert_eq!(first.pull_requests, second.pull_requests);
    assert_eq!(
        telemetry
            .take()
            .iter()
            .filter(|recorded| matches!(recorded, TelemetryEvent::CacheEntryInserted { .. }))
            .count(),
        1
    );
}

#[tokio::test]
async fn cached_empty_event_list_is_not_refetched() {
    let pull_request = closed_pr(20, 2, 3);

    let (_temp_dir, cache) = temp_cache();
    cache
        .put(&CacheEntry {
            pull_request: pull_request.clone(),
            events: Vec::new(),
        })
        .expect("seed put should succeed");

    let mut repositories = MockRepositoryGateway::new();
    repositories
        .expect_list_pull_requests()
        .times(1)
        .returning(move |_, _| Ok(single_page(vec![closed_pr(20, 2, 3)])));

    // No expectations on the review gateway: any call panics the test.
    let reviews = MockReviewEventGateway::new();

    let engine = SyncEngine::new(&repositories, &reviews, &cache, &NoopTelemetrySink)
        .with_retry_policy(fast_retry());

    let outcome = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("reconcile should succeed");

    assert_eq!(outcome.pull_requests.len(), 1);
    let synced = outcome
        .pull_requests
        .first()
        .expect("should have one pull request");
    assert!(synced.events.is_empty());
}

#[tokio::test]
async fn open_pr_events_are_always_fetched_fresh() {
    let mut repositories = MockRepositoryGateway::new();
    repositories
        .expect_list_pull_requests()
        .times(2)
        .returning(|_, _| Ok(single_page(vec![open_pr(30, 3, 5)])));

    let mut sequence = Sequence::new();
    let mut reviews = MockReviewEventGateway::new();
    reviews
        .expect_list_review_events()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| Ok(vec![event(30, "alice", 5, 10)]));
    reviews
        .expect_list_review_events()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| Ok(vec![event(30, "alice", 5, 10), event(30, "bob", 5, 11)]));

    let (_temp_dir, cache) = temp_cache();
    let engine = SyncEngine::new(&repositories, &reviews, &cache, &NoopTelemetrySink)
        .with_retry_policy(fast_retry());

    let first = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("first reconcile should succeed");
    let second = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("second reconcile should succeed");

    let first_events = &first
        .pull_requests
        .first()
        .expect("should have one pull request")
        .events;
    let second_events = &second
        .pull_requests
        .first()
        .expect("should have one pull request")
        .events;
    assert_eq!(first_events.len(), 1);
    assert_eq!(second_events.len(), 2, "second query must see the new event");

    assert!(
        !cache.has(30).expect("has should succeed"),
        "open pull requests must never be cached"
    );
}

#[tokio::test]
async fn out_of_range_pull_requests_are_excluded_and_not_fetched() {
    let mut repositories = MockRepositoryGateway::new();
    repositories.expect_list_pull_requests().times(1).returning(|_, _| {
        Ok(single_page(vec![
            closed_pr(40, 4, 1),
            closed_pr(41, 5, 10),
            closed_pr(42, 6, 20),
        ]))
    });

    let mut reviews = MockReviewEventGateway::new();
    // Only the in-range PR may trigger an event fetch.
    reviews
        .expect_list_review_events()
        .withf(|_, pull_request| pull_request.number == 5)
        .times(1)
        .returning(|_, _| Ok(Vec::new()));

    let (_temp_dir, cache) = temp_cache();
    let engine = SyncEngine::new(&repositories, &reviews, &cache, &NoopTelemetrySink)
        .with_retry_policy(fast_retry());

    let range = DateRange::new(Some(timestamp(5, 0)), Some(timestamp(15, 0)));
    let outcome = engine
        .reconcile(&locator(), &range)
        .await
        .expect("reconcile should succeed");

    let numbers: Vec<u64> = outcome
        .pull_requests
        .iter()
        .map(|synced| synced.pull_request.number)
        .collect();
    assert_eq!(numbers, vec![5]);
}

#[tokio::test]
async fn event_fetch_failure_skips_pr_after_bounded_retries() {
    let mut repositories = MockRepositoryGateway::new();
    repositories.expect_list_pull_requests().times(1).returning(|_, _| {
        Ok(single_page(vec![closed_pr(50, 7, 1), closed_pr(51, 8, 2)]))
    });

    let mut reviews = MockReviewEventGateway::new();
    reviews
        .expect_list_review_events()
        .withf(|_, pull_request| pull_request.number == 7)
        .times(3)
        .returning(|_, _| {
            Err(RemoteError::Network {
                message: "connection reset".to_owned(),
            })
        });
    reviews
        .expect_list_review_events()
        .withf(|_, pull_request| pull_request.number == 8)
        .times(1)
        .returning(|_, _| Ok(vec![event(51, "alice", 2, 12)]));

    let (_temp_dir, cache) = temp_cache();
    let telemetry = RecordingSink::default();
    let engine =
        SyncEngine::new(&repositories, &reviews, &cache, &telemetry).with_retry_policy(fast_retry());

    let outcome = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("one bad PR must not abort the query");

    assert_eq!(outcome.pull_requests.len(), 1);
    assert_eq!(outcome.skipped.len(), 1);
    let skipped = outcome.skipped.first().expect("should have one skipped PR");
    assert_eq!(skipped.pr_number, 7);

    assert!(
        !cache.has(50).expect("has should succeed"),
        "a PR with unfetched events must not be cached"
    );
    assert!(telemetry.take().iter().any(|recorded| matches!(
        recorded,
        TelemetryEvent::PullRequestExcluded { pr_number: 7, .. }
    )));
}

#[tokio::test]
async fn list_failure_aborts_the_query() {
    let mut repositories = MockRepositoryGateway::new();
    repositories
        .expect_list_pull_requests()
        .times(3)
        .returning(|_, _| {
            Err(RemoteError::Api {
                message: "boom".to_owned(),
            })
        });

    let reviews = MockReviewEventGateway::new();
    let (_temp_dir, cache) = temp_cache();
    let engine = SyncEngine::new(&repositories, &reviews, &cache, &NoopTelemetrySink)
        .with_retry_policy(fast_retry());

    let error = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect_err("list failure should abort");

    assert!(
        matches!(error, StatsError::RemoteList { .. }),
        "expected RemoteList, got {error:?}"
    );
}

#[tokio::test]
async fn fetched_events_are_sorted_ascending() {
    let mut repositories = MockRepositoryGateway::new();
    repositories
        .expect_list_pull_requests()
        .times(1)
        .returning(|_, _| Ok(single_page(vec![open_pr(60, 9, 1)])));

    let mut reviews = MockReviewEventGateway::new();
    reviews.expect_list_review_events().times(1).returning(|_, _| {
        Ok(vec![
            event(60, "carol", 2, 15),
            event(60, "alice", 1, 10),
            event(60, "bob", 1, 12),
        ])
    });

    let (_temp_dir, cache) = temp_cache();
    let engine = SyncEngine::new(&repositories, &reviews, &cache, &NoopTelemetrySink)
        .with_retry_policy(fast_retry());

    let outcome = engine
        .reconcile(&locator(), &DateRange::unbounded())
        .await
        .expect("reconcile should succeed");

    let reviewers: Vec<&str> = outcome
        .pull_requests
        .first()
        .expect("should have one pull request")
        .events
        .iter()
        .map(|recorded| recorded.reviewer.as_str())
        .collect();
    assert_eq!(reviewers, vec!["alice", "bob", "carol"]);
}

#[rstest]
#[case::inside(Some(1), Some(10), 5, true)]
#[case::on_lower_bound(Some(5), Some(10), 5, true)]
#[case::on_upper_bound(Some(1), Some(5), 5, true)]
#[case::before(Some(6), Some(10), 5, false)]
#[case::after(Some(1), Some(4), 5, false)]
#[case::unbounded_past(None, Some(10), 5, true)]
#[case::unbounded_future(Some(1), None, 5, true)]
#[case::fully_unbounded(None, None, 5, true)]
fn date_range_bounds_are_inclusive(
    #[case] from_day: Option<u32>,
    #[case] to_day: Option<u32>,
    #[case] created_day: u32,
    #[case] expected: bool,
) {
    let range = DateRange::new(
        from_day.map(|day| timestamp(day, 0)),
        to_day.map(|day| timestamp(day, 0)),
    );

    assert_eq!(range.contains(timestamp(created_day, 0)), expected);
}
