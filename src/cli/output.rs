//! Output formatting for statistics reports.

use std::io::Write;

use chrono::Duration;

use revlag::{PullRequestLatency, ReviewerMetric, StatsResponse};

use super::CliError;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Writes the full report for one query to the given writer.
///
/// # Errors
///
/// Returns [`CliError::Io`] when the writer fails.
pub fn write_response<W: Write>(writer: &mut W, response: &StatsResponse) -> Result<(), CliError> {
    let report = &response.report;

    writeln!(
        writer,
        "Review latency for {count} pull request(s):",
        count = report.pull_requests.len()
    )
    .map_err(|error| CliError::io(&error))?;
    for latency in &report.pull_requests {
        write_pull_request_line(writer, latency).map_err(|error| CliError::io(&error))?;
    }

    if !report.reviewers.is_empty() {
        writeln!(writer, "Reviewer response times:").map_err(|error| CliError::io(&error))?;
        for metric in &report.reviewers {
            write_reviewer_line(writer, metric).map_err(|error| CliError::io(&error))?;
        }
    }

    if !response.skipped.is_empty() {
        writeln!(
            writer,
            "Skipped {count} pull request(s) after failed review fetches:",
            count = response.skipped.len()
        )
        .map_err(|error| CliError::io(&error))?;
        for skipped in &response.skipped {
            writeln!(writer, "  #{}: {}", skipped.pr_number, skipped.message)
                .map_err(|error| CliError::io(&error))?;
        }
    }

    Ok(())
}

fn write_pull_request_line<W: Write>(
    writer: &mut W,
    latency: &PullRequestLatency,
) -> std::io::Result<()> {
    let title = latency.title.as_deref().unwrap_or("(no title)");
    let created = latency.created_at.format("%Y-%m-%d");
    match latency.latency {
        Some(duration) => writeln!(
            writer,
            "  #{number} {created} {title}: first review after {hours}",
            number = latency.number,
            hours = format_hours(duration)
        ),
        None => writeln!(
            writer,
            "  #{number} {created} {title}: no reviews",
            number = latency.number
        ),
    }
}

fn write_reviewer_line<W: Write>(writer: &mut W, metric: &ReviewerMetric) -> std::io::Result<()> {
    writeln!(
        writer,
        "  {reviewer}: avg {avg}, fastest {fastest}, slowest {slowest} over {count} pull request(s)",
        reviewer = metric.reviewer,
        avg = format_hours(metric.average_latency),
        fastest = format_hours(metric.fastest_latency),
        slowest = format_hours(metric.slowest_latency),
        count = metric.reviewed_count
    )
}

/// Formats a latency as fractional hours, e.g. `2.5h`.
fn format_hours(duration: Duration) -> String {
    let hours = duration.num_seconds() as f64 / SECONDS_PER_HOUR;
    format!("{hours:.1}h")
}
