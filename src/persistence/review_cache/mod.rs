//! Closed pull request cache backed by `SQLite`.
//!
//! Closed pull requests are immutable on the remote side, so each one is
//! persisted exactly once together with its full ordered review event list.
//! Entries are never updated or deleted; `put` is an idempotent insert so a
//! repeated or concurrent write for the same pull request is a no-op rather
//! than a duplicate.

use chrono::{DateTime, Utc};
use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;

use crate::github::models::{PullRequest, PullRequestState, ReviewEvent};

use super::StoreError;

const CACHE_TABLE: &str = "cached_pull_requests";

/// One cached closed pull request with its full ordered event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The closed pull request.
    pub pull_request: PullRequest,
    /// Review events ordered by `submitted_at` ascending.
    pub events: Vec<ReviewEvent>,
}

/// SQLite-backed store of closed pull requests and their review events.
#[derive(Debug, Clone)]
pub struct ReviewCache {
    database_url: String,
}

impl ReviewCache {
    /// Create a cache wrapper targeting the configured `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, StoreError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(StoreError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string,
        })
    }

    /// Returns true when a cached entry exists for the pull request id.
    ///
    /// An entry with zero review events still counts: empty is a valid
    /// terminal state, distinct from "never fetched".
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened, the schema
    /// is missing, or the query fails.
    pub fn has(&self, pr_id: u64) -> Result<bool, StoreError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            count: i64,
        }

        let mut connection = self.establish_connection()?;

        let row: Row =
            sql_query("SELECT COUNT(*) AS count FROM cached_pull_requests WHERE pr_id = ?;")
                .bind::<BigInt, _>(id_to_i64(pr_id))
                .get_result(&mut connection)
                .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        Ok(row.count > 0)
    }

    /// Fetches the cached entry for the pull request id, if present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened, the schema
    /// is missing, the query fails, or a stored timestamp is unparsable.
    pub fn get(&self, pr_id: u64) -> Result<Option<CacheEntry>, StoreError> {
        let mut connection = self.establish_connection()?;

        let pr_row: Option<PullRequestRow> = sql_query(
            "SELECT pr_number, title, author, created_at, closed_at \
             FROM cached_pull_requests WHERE pr_id = ? LIMIT 1;",
        )
        .bind::<BigInt, _>(id_to_i64(pr_id))
        .get_result(&mut connection)
        .optional()
        .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        let Some(row) = pr_row else {
            return Ok(None);
        };

        let event_rows: Vec<ReviewEventRow> = sql_query(
            "SELECT reviewer, submitted_at, outcome FROM cached_review_events \
             WHERE pr_id = ? ORDER BY submitted_at ASC, id ASC;",
        )
        .bind::<BigInt, _>(id_to_i64(pr_id))
        .load(&mut connection)
        .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        let pull_request = PullRequest {
            id: pr_id,
            number: i64_to_id(row.pr_number),
            title: row.title,
            author: row.author,
            created_at: parse_timestamp(pr_id, &row.created_at)?,
            state: PullRequestState::Closed,
            closed_at: Some(parse_timestamp(pr_id, &row.closed_at)?),
        };

        let events = event_rows
            .into_iter()
            .map(|event_row| {
                Ok(ReviewEvent {
                    pr_id,
                    reviewer: event_row.reviewer,
                    submitted_at: parse_timestamp(pr_id, &event_row.submitted_at)?,
                    outcome: event_row.outcome,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Some(CacheEntry {
            pull_request,
            events,
        }))
    }

    /// Inserts a cache entry for a closed pull request.
    ///
    /// Idempotent: when an entry with the same pull request id already
    /// exists, nothing is written, including the event rows. The insert runs
    /// inside a transaction so an interrupted write never leaves a pull
    /// request row without its events.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] when the entry is not a closed
    /// pull request or the write fails, and other [`StoreError`] variants for
    /// connection and schema problems.
    pub fn put(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        if !entry.pull_request.is_closed() {
            return Err(StoreError::WriteFailed {
                message: format!(
                    "refusing to cache open pull request #{}",
                    entry.pull_request.number
                ),
            });
        }
        let Some(closed_at) = entry.pull_request.closed_at else {
            return Err(StoreError::WriteFailed {
                message: format!(
                    "closed pull request #{} has no closed_at timestamp",
                    entry.pull_request.number
                ),
            });
        };

        let mut connection = self.establish_connection()?;

        let result = connection.transaction::<_, diesel::result::Error, _>(|transaction| {
            let inserted = sql_query(
                "INSERT INTO cached_pull_requests \
                 (pr_id, pr_number, title, author, created_at, closed_at) \
                 VALUES (?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(pr_id) DO NOTHING;",
            )
            .bind::<BigInt, _>(id_to_i64(entry.pull_request.id))
            .bind::<BigInt, _>(id_to_i64(entry.pull_request.number))
            .bind::<Nullable<Text>, _>(entry.pull_request.title.as_deref())
            .bind::<Nullable<Text>, _>(entry.pull_request.author.as_deref())
            .bind::<Text, _>(entry.pull_request.created_at.to_rfc3339())
            .bind::<Text, _>(closed_at.to_rfc3339())
            .execute(transaction)?;

            // Conflict means the entry already exists in full; skip the
            // events so a second put never duplicates rows.
            if inserted == 0 {
                return Ok(());
            }

            for event in &entry.events {
                sql_query(
                    "INSERT INTO cached_review_events \
                     (pr_id, reviewer, submitted_at, outcome) \
                     VALUES (?, ?, ?, ?);",
                )
                .bind::<BigInt, _>(id_to_i64(entry.pull_request.id))
                .bind::<Text, _>(event.reviewer.as_str())
                .bind::<Text, _>(event.submitted_at.to_rfc3339())
                .bind::<Text, _>(event.outcome.as_str())
                .execute(transaction)?;
            }

            Ok(())
        });

        result.map_err(|error| Self::map_write_error(&mut connection, &error))
    }

    /// Returns the ids of all cached pull requests, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened, the schema
    /// is missing, or the query fails.
    pub fn list_ids(&self) -> Result<Vec<u64>, StoreError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            pr_id: i64,
        }

        let mut connection = self.establish_connection()?;

        let rows: Vec<Row> = sql_query("SELECT pr_id FROM cached_pull_requests ORDER BY pr_id;")
            .load(&mut connection)
            .map_err(|error| Self::map_query_error(&mut connection, &error))?;

        Ok(rows.into_iter().map(|row| i64_to_id(row.pr_id)).collect())
    }

    fn establish_connection(&self) -> Result<SqliteConnection, StoreError> {
        let mut connection = SqliteConnection::establish(&self.database_url).map_err(|error| {
            StoreError::ConnectionFailed {
                message: error.to_string(),
            }
        })?;

        sql_query("PRAGMA foreign_keys = ON;")
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| StoreError::ForeignKeysEnableFailed {
                message: error.to_string(),
            })?;

        Ok(connection)
    }

    fn cache_table_exists(
        connection: &mut SqliteConnection,
    ) -> Result<bool, diesel::result::Error> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            count: i64,
        }

        let row: Row = sql_query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;",
        )
        .bind::<Text, _>(CACHE_TABLE)
        .get_result(connection)?;

        Ok(row.count > 0)
    }

    fn map_error_with_schema_check<F>(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
        create_error: F,
    ) -> StoreError
    where
        F: Fn(String) -> StoreError,
    {
        match Self::cache_table_exists(connection) {
            Ok(false) => StoreError::SchemaNotInitialised,
            Ok(true) => create_error(error.to_string()),
            Err(check_error) => create_error(format!(
                "schema presence check failed: {check_error}; original error: {error}"
            )),
        }
    }

    fn map_query_error(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
    ) -> StoreError {
        Self::map_error_with_schema_check(connection, error, |message| StoreError::QueryFailed {
            message,
        })
    }

    fn map_write_error(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
    ) -> StoreError {
        Self::map_error_with_schema_check(connection, error, |message| StoreError::WriteFailed {
            message,
        })
    }
}

#[derive(Debug, QueryableByName)]
struct PullRequestRow {
    #[diesel(sql_type = BigInt)]
    pr_number: i64,
    #[diesel(sql_type = Nullable<Text>)]
    title: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    author: Option<String>,
    #[diesel(sql_type = Text)]
    created_at: String,
    #[diesel(sql_type = Text)]
    closed_at: String,
}

#[derive(Debug, QueryableByName)]
struct ReviewEventRow {
    #[diesel(sql_type = Text)]
    reviewer: String,
    #[diesel(sql_type = Text)]
    submitted_at: String,
    #[diesel(sql_type = Text)]
    outcome: String,
}

// GitHub ids are u64 but Diesel's BigInt binding uses i64; saturate in
// both directions.
fn id_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn i64_to_id(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn parse_timestamp(pr_id: u64, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| StoreError::InvalidTimestamp {
            pr_id,
            message: error.to_string(),
        })
}
