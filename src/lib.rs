//! Revlag library crate: pull request review-latency statistics.
//!
//! The library syncs pull requests and their review events from GitHub into
//! a local `SQLite` cache (closed pull requests are immutable, so their
//! review events are fetched at most once), then reduces the reconciled
//! dataset into per-PR and per-reviewer latency metrics.

pub mod config;
pub mod github;
pub mod persistence;
pub mod session;
pub mod stats;
pub mod sync;
pub mod telemetry;

pub use config::{ConfigError, RevlagConfig};
pub use github::{
    OctocrabRepositoryGateway, OctocrabReviewEventGateway, PersonalAccessToken, PullRequest,
    PullRequestState, RemoteError, RepositoryLocator, ReviewEvent,
};
pub use persistence::{CacheEntry, ReviewCache, StoreError};
pub use session::{StatsResponse, StatsSession};
pub use stats::{PullRequestLatency, Report, ReviewerMetric};
pub use sync::{
    DateRange, RetryPolicy, SkippedPullRequest, StatsError, SyncEngine, SyncOutcome,
    SyncedPullRequest,
};
