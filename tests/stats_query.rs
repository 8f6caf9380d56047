//! End-to-end statistics queries against a mocked GitHub API.
//!
//! Exercises the full path: Octocrab gateways, the sync engine, the `SQLite`
//! cache, and the statistics computation, with wiremock standing in for
//! GitHub.

use chrono::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use revlag::telemetry::NoopTelemetrySink;
use revlag::{
    DateRange, OctocrabRepositoryGateway, OctocrabReviewEventGateway, PersonalAccessToken,
    RepositoryLocator, ReviewCache, StatsError, StatsSession, persistence,
};

const PULLS_PATH: &str = "/api/v3/repos/owner/repo/pulls";

fn pull_request_listing() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 9001,
            "number": 1,
            "title": "Add parser",
            "state": "closed",
            "user": { "login": "octocat" },
            "created_at": "2025-02-01T09:00:00Z",
            "closed_at": "2025-02-03T17:00:00Z"
        },
        {
            "id": 9002,
            "number": 2,
            "title": "Fix lexer",
            "state": "open",
            "user": { "login": "hubot" },
            "created_at": "2025-02-10T09:00:00Z",
            "closed_at": null
        }
    ])
}

async fn start_session(
    server: &MockServer,
) -> (
    TempDir,
    StatsSession<OctocrabRepositoryGateway, OctocrabReviewEventGateway>,
) {
    let temp_dir = TempDir::new().expect("temp dir should create");
    let database_url = temp_dir
        .path()
        .join("revlag.sqlite")
        .to_string_lossy()
        .to_string();
    persistence::migrate_database(&database_url, &NoopTelemetrySink)
        .expect("migration should succeed");

    let locator = RepositoryLocator::parse(&format!("{}/owner/repo", server.uri()))
        .expect("locator should parse");
    let token = PersonalAccessToken::new("test-token").expect("token should be valid");
    let repositories =
        OctocrabRepositoryGateway::for_token(&token, &locator).expect("gateway should build");
    let reviews =
        OctocrabReviewEventGateway::for_token(&token, &locator).expect("gateway should build");
    let cache = ReviewCache::new(database_url).expect("cache should build");

    let session = StatsSession::new(
        repositories,
        reviews,
        cache,
        Box::new(NoopTelemetrySink),
        locator,
    );
    (temp_dir, session)
}

#[tokio::test]
async fn repeat_queries_reuse_cached_closed_pull_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_request_listing()))
        .expect(2)
        .mount(&server)
        .await;

    // The closed PR's reviews must be fetched exactly once across both
    // queries; the open PR's reviews are refetched every time.
    Mock::given(method("GET"))
        .and(path(format!("{PULLS_PATH}/1/reviews")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "user": { "login": "alice" },
                "state": "APPROVED",
                "submitted_at": "2025-02-01T13:00:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{PULLS_PATH}/2/reviews")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "user": { "login": "bob" },
                "state": "CHANGES_REQUESTED",
                "submitted_at": "2025-02-10T11:00:00Z"
            }
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let (_temp_dir, session) = start_session(&server).await;

    let first = session
        .get_stats(&DateRange::unbounded())
        .await
        .expect("first query should succeed");
    let second = session
        .get_stats(&DateRange::unbounded())
        .await
        .expect("second query should succeed");

    assert_eq!(first.report, second.report);
    assert_eq!(first.report.pull_requests.len(), 2);

    let closed = first
        .report
        .pull_requests
        .first()
        .expect("should have the closed PR");
    assert_eq!(closed.number, 1);
    assert_eq!(closed.latency, Some(Duration::hours(4)));

    let reviewers: Vec<&str> = first
        .report
        .reviewers
        .iter()
        .map(|metric| metric.reviewer.as_str())
        .collect();
    assert_eq!(reviewers, vec!["alice", "bob"]);
}

#[tokio::test]
async fn date_range_excludes_out_of_range_pull_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_request_listing()))
        .mount(&server)
        .await;
    // Only PR #1 is in range, so only its reviews endpoint exists.
    Mock::given(method("GET"))
        .and(path(format!("{PULLS_PATH}/1/reviews")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (_temp_dir, session) = start_session(&server).await;

    let range = DateRange::new(
        "2025-02-01T00:00:00Z".parse().ok(),
        "2025-02-05T00:00:00Z".parse().ok(),
    );
    let response = session
        .get_stats(&range)
        .await
        .expect("query should succeed");

    assert_eq!(response.report.pull_requests.len(), 1);
    let latency = response
        .report
        .pull_requests
        .first()
        .expect("should have one PR");
    assert_eq!(latency.number, 1);
    assert_eq!(latency.latency, None);
}

#[tokio::test]
async fn empty_repository_yields_no_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let (_temp_dir, session) = start_session(&server).await;

    let error = session
        .get_stats(&DateRange::unbounded())
        .await
        .expect_err("empty repository should be NoData");
    assert!(matches!(error, StatsError::NoData { .. }));
}
