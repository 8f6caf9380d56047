//! Parsing of interactive commands.
//!
//! The grammar mirrors the function-call style users expect from the
//! prompt: `get_stats()`, `get_stats(2025-01-01)`, or
//! `get_stats(2025-01-01, 2025-03-31)`. Dates are calendar days
//! (`YYYY-MM-DD`, expanded to inclusive day boundaries) or full RFC 3339
//! timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use revlag::DateRange;

/// One parsed interactive command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a statistics query over the given range.
    Stats(DateRange),
    /// Print usage help.
    Help,
    /// Leave the interactive loop.
    Quit,
}

/// Rejected command input. Printed at the prompt; never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Input matched no known command.
    #[error("unrecognised command {input:?} (try 'help')")]
    UnknownCommand {
        /// The offending input line.
        input: String,
    },

    /// A date argument was neither `YYYY-MM-DD` nor RFC 3339.
    #[error("invalid date {value:?}: expected YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidDate {
        /// The offending date argument.
        value: String,
    },

    /// More than two date arguments were supplied.
    #[error("get_stats takes at most two dates: get_stats(from, to)")]
    TooManyArguments,

    /// The lower bound was after the upper bound.
    #[error("'from' ({from}) is after 'to' ({to})")]
    InvertedRange {
        /// The rejected lower bound.
        from: String,
        /// The rejected upper bound.
        to: String,
    },
}

/// Parses one input line. Blank lines parse to `None`.
///
/// # Errors
///
/// Returns a [`ParseError`] describing why the line was rejected.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Some(Command::Help)),
        "exit" | "quit" => return Ok(Some(Command::Quit)),
        _ => {}
    }

    if let Some(arguments) = trimmed.strip_prefix("get_stats") {
        return parse_stats_arguments(trimmed, arguments.trim()).map(Some);
    }

    Err(ParseError::UnknownCommand {
        input: trimmed.to_owned(),
    })
}

fn parse_stats_arguments(input: &str, arguments: &str) -> Result<Command, ParseError> {
    if arguments.is_empty() {
        return Ok(Command::Stats(DateRange::unbounded()));
    }

    let inner = arguments
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| ParseError::UnknownCommand {
            input: input.to_owned(),
        })?;

    let mut dates = inner
        .split(',')
        .map(str::trim)
        .filter(|argument| !argument.is_empty());

    let first = dates.next().map(|value| parse_date(value, DayBoundary::Start));
    let second = dates.next().map(|value| parse_date(value, DayBoundary::End));
    if dates.next().is_some() {
        return Err(ParseError::TooManyArguments);
    }

    let from = first.transpose()?;
    let to = second.transpose()?;
    if let (Some(lower), Some(upper)) = (from, to)
        && lower > upper
    {
        return Err(ParseError::InvertedRange {
            from: lower.format("%Y-%m-%d %H:%M:%S").to_string(),
            to: upper.format("%Y-%m-%d %H:%M:%S").to_string(),
        });
    }

    Ok(Command::Stats(DateRange::new(from, to)))
}

#[derive(Clone, Copy)]
enum DayBoundary {
    Start,
    End,
}

/// Parses a date argument, expanding bare calendar days so both bounds stay
/// inclusive: `from` becomes midnight, `to` becomes the last second of the
/// day.
fn parse_date(value: &str, boundary: DayBoundary) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ParseError::InvalidDate {
        value: value.to_owned(),
    })?;
    let time = match boundary {
        DayBoundary::Start => day.and_hms_opt(0, 0, 0),
        DayBoundary::End => day.and_hms_opt(23, 59, 59),
    };
    time.map(|naive| naive.and_utc())
        .ok_or_else(|| ParseError::InvalidDate {
            value: value.to_owned(),
        })
}
