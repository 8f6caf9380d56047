//! Local persistence for the closed pull request cache.
//!
//! Revlag keeps a local `SQLite` database of closed pull requests and their
//! review events. The schema is managed with Diesel migrations so the
//! database is self-creating on first use and upgrades consistently across
//! machines.

mod error;
mod migrator;
mod review_cache;

pub use error::StoreError;
pub use migrator::{INITIAL_SCHEMA_VERSION, MIGRATIONS, SchemaVersion, migrate_database};
pub use review_cache::{CacheEntry, ReviewCache};
