//! Query-level error taxonomy surfaced by the sync engine and facade.

use thiserror::Error;

use crate::persistence::StoreError;

/// Errors surfaced to the caller of a statistics query.
///
/// Remote and store failures are translated into these variants at the sync
/// engine boundary; the facade never sees raw transport errors. A failed
/// event fetch for a single pull request is deliberately absent here: after
/// bounded retries it degrades to a recorded warning
/// ([`crate::sync::SkippedPullRequest`]) instead of aborting the query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatsError {
    /// Missing or invalid credential or repository target; fatal at startup.
    #[error("configuration error: {message}")]
    Config {
        /// Details about the configuration failure.
        message: String,
    },

    /// Paginating the pull request list failed; fatal for the query because
    /// a partial listing would produce a misleading report.
    #[error("failed to list pull requests: {message}")]
    RemoteList {
        /// Transport error detail from the final attempt.
        message: String,
    },

    /// The cache store failed; fatal for the query rather than silently
    /// degrading to uncached operation.
    #[error("cache store error: {0}")]
    Store(#[from] StoreError),

    /// Zero pull requests match the requested range. A valid empty result,
    /// surfaced distinctly from both failure and an empty report.
    #[error("no pull requests found {range}")]
    NoData {
        /// Human-readable description of the requested range.
        range: String,
    },
}
