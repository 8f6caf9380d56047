//! Revlag CLI entrypoint: interactive pull request review latency statistics.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;

use revlag::telemetry::StderrJsonlTelemetrySink;
use revlag::{
    ConfigError, OctocrabRepositoryGateway, OctocrabReviewEventGateway, PersonalAccessToken,
    ReviewCache, RevlagConfig, StatsError, StatsSession, persistence,
};

use cli::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    let config = load_config()?;

    let token = PersonalAccessToken::new(config.resolve_token()?)?;
    let locator = config.resolve_locator()?;
    let database_url = config.resolve_database_url();

    let telemetry = StderrJsonlTelemetrySink;
    persistence::migrate_database(&database_url, &telemetry).map_err(StatsError::from)?;

    let repositories = OctocrabRepositoryGateway::for_token(&token, &locator)?;
    let reviews = OctocrabReviewEventGateway::for_token(&token, &locator)?;
    let cache = ReviewCache::new(database_url).map_err(StatsError::from)?;

    let session = StatsSession::new(
        repositories,
        reviews,
        cache,
        Box::new(StderrJsonlTelemetrySink),
        locator,
    );

    cli::interactive::run(&session).await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when ortho-config fails to parse arguments
/// or load configuration files.
fn load_config() -> Result<RevlagConfig, ConfigError> {
    RevlagConfig::load().map_err(|error| ConfigError::Load {
        message: error.to_string(),
    })
}
