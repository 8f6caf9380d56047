//! Application telemetry events and sinks.
//!
//! Revlag is a local-first tool, but structured telemetry still helps with
//! debugging: it captures the active schema version, cache growth, and pull
//! requests dropped from a report after failed event fetches.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted by revlag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the current database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20260815000000`).
        schema_version: String,
    },
    /// A closed pull request was cached for the first time.
    CacheEntryInserted {
        /// Human-facing pull request number.
        pr_number: u64,
    },
    /// A pull request was excluded from the report because its review events
    /// could not be fetched after bounded retries.
    PullRequestExcluded {
        /// Human-facing pull request number.
        pr_number: u64,
        /// Error detail from the final failed attempt.
        message: String,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}
