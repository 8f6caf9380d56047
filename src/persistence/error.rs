//! Error types for the local cache store.

use thiserror::Error;

/// Errors returned while initialising or accessing the local `SQLite` cache.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Enabling foreign key enforcement failed.
    #[error("failed to enable foreign keys: {message}")]
    ForeignKeysEnableFailed {
        /// Error detail from the PRAGMA execution.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The cache tables are absent; migrations have not run.
    #[error("cache schema is not initialised; run migrations first")]
    SchemaNotInitialised,

    /// A cache read failed.
    #[error("cache query failed: {message}")]
    QueryFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A cache write failed.
    #[error("cache write failed: {message}")]
    WriteFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A stored timestamp could not be parsed back.
    #[error("cache row for PR id {pr_id} holds an invalid timestamp: {message}")]
    InvalidTimestamp {
        /// Identifier of the affected pull request.
        pr_id: u64,
        /// Parse error detail.
        message: String,
    },
}
