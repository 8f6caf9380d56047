//! The interactive query loop.

use std::io::{self, BufRead, Write};

use revlag::StatsSession;
use revlag::github::gateway::{RepositoryGateway, ReviewEventGateway};

use super::command::{self, Command};
use super::{CliError, output};

const HELP_TEXT: &str = "\
Commands:
  get_stats()                      latency report over all pull requests
  get_stats(FROM)                  pull requests created on or after FROM
  get_stats(FROM, TO)              pull requests created between FROM and TO
  help                             show this help
  exit                             leave the prompt

Dates are YYYY-MM-DD (inclusive day boundaries) or RFC 3339 timestamps.";

/// Runs the interactive loop until the user quits or input ends.
///
/// Query failures are printed at the prompt and the loop continues; only
/// terminal I/O failures are returned.
///
/// # Errors
///
/// Returns [`CliError::Io`] when reading from or writing to the terminal
/// fails.
pub async fn run<Repositories, Reviews>(
    session: &StatsSession<Repositories, Reviews>,
) -> Result<(), CliError>
where
    Repositories: RepositoryGateway,
    Reviews: ReviewEventGateway,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    loop {
        write!(stdout, "revlag> ").map_err(|error| CliError::io(&error))?;
        stdout.flush().map_err(|error| CliError::io(&error))?;

        let mut line = String::new();
        let bytes_read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|error| CliError::io(&error))?;
        if bytes_read == 0 {
            // End of input counts as a quit.
            writeln!(stdout).map_err(|error| CliError::io(&error))?;
            return Ok(());
        }

        match dispatch(session, &line, &mut stdout).await? {
            LoopControl::Continue => {}
            LoopControl::Quit => return Ok(()),
        }
    }
}

enum LoopControl {
    Continue,
    Quit,
}

async fn dispatch<Repositories, Reviews, W>(
    session: &StatsSession<Repositories, Reviews>,
    line: &str,
    writer: &mut W,
) -> Result<LoopControl, CliError>
where
    Repositories: RepositoryGateway,
    Reviews: ReviewEventGateway,
    W: Write,
{
    match command::parse(line) {
        Ok(None) => {}
        Ok(Some(Command::Help)) => {
            writeln!(writer, "{HELP_TEXT}").map_err(|error| CliError::io(&error))?;
        }
        Ok(Some(Command::Quit)) => return Ok(LoopControl::Quit),
        Ok(Some(Command::Stats(range))) => match session.get_stats(&range).await {
            Ok(response) => output::write_response(writer, &response)?,
            Err(error) => {
                writeln!(writer, "{error}").map_err(|write_error| CliError::io(&write_error))?;
            }
        },
        Err(parse_error) => {
            writeln!(writer, "{parse_error}").map_err(|error| CliError::io(&error))?;
        }
    }
    Ok(LoopControl::Continue)
}
