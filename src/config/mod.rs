//! Application configuration loaded from CLI, environment, and files.
//!
//! Values merge from layered sources using ortho-config, lowest to highest
//! precedence:
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.revlag.toml` in the current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `REVLAG_TOKEN`, `REVLAG_OWNER`, and so on,
//!    plus the legacy `GITHUB_TOKEN`/`GITHUB_OWNER`/`GITHUB_REPO` fallbacks
//! 4. **Command-line arguments** – `--token`/`-t`, `--owner`/`-o`, ...
//!
//! # Configuration File
//!
//! ```toml
//! token = "ghp_example"
//! owner = "octocat"
//! repo = "hello-world"
//! database_url = "revlag.sqlite"
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::github::locator::RepositoryLocator;
use crate::sync::StatsError;

/// Default cache database path when none is configured.
pub const DEFAULT_DATABASE_URL: &str = "revlag.sqlite";

/// Startup configuration failures. All of them are fatal: the process
/// reports the problem and exits rather than starting a session it cannot
/// serve.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// ortho-config failed to parse arguments or load configuration files.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Detail from the configuration loader.
        message: String,
    },

    /// No token in configuration or the `GITHUB_TOKEN` environment variable.
    #[error("authentication token is required (use --token, REVLAG_TOKEN, or GITHUB_TOKEN)")]
    MissingToken,

    /// No repository owner configured.
    #[error("repository owner is required (use --owner, REVLAG_OWNER, or GITHUB_OWNER)")]
    MissingOwner,

    /// No repository name configured.
    #[error("repository name is required (use --repo, REVLAG_REPO, or GITHUB_REPO)")]
    MissingRepo,

    /// The configured repository target could not be parsed.
    #[error("invalid repository target: {message}")]
    InvalidRepository {
        /// Detail about the rejected value.
        message: String,
    },
}

impl From<ConfigError> for StatsError {
    fn from(error: ConfigError) -> Self {
        Self::Config {
            message: error.to_string(),
        }
    }
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `REVLAG_TOKEN`, `GITHUB_TOKEN`, or `--token`: Authentication token
/// - `REVLAG_OWNER`, `GITHUB_OWNER`, or `--owner`: Repository owner
/// - `REVLAG_REPO`, `GITHUB_REPO`, or `--repo`: Repository name
/// - `REVLAG_REPO_URL` or `--repo-url`: Repository URL, an alternative to
///   owner plus repo that also addresses GitHub Enterprise hosts
/// - `REVLAG_DATABASE_URL` or `--database-url`: Local `SQLite` cache path
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "REVLAG",
    discovery(
        dotfile_name = ".revlag.toml",
        config_file_name = "revlag.toml",
        app_name = "revlag"
    )
)]
pub struct RevlagConfig {
    /// Personal access token for GitHub API authentication.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Repository owner (e.g., "octocat").
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repository name (e.g., "hello-world").
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Repository URL (e.g., `https://github.com/octocat/hello-world`).
    ///
    /// Takes precedence over `owner`/`repo` and supports GitHub Enterprise
    /// hosts, whose API lives under `/api/v3`.
    #[ortho_config(cli_short = 'u')]
    pub repo_url: Option<String>,

    /// Local `SQLite` database path for the closed pull request cache.
    ///
    /// Defaults to [`DEFAULT_DATABASE_URL`] in the working directory. The
    /// database is created and migrated automatically on startup.
    #[ortho_config()]
    pub database_url: Option<String>,
}

impl Default for RevlagConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            repo_url: None,
            database_url: None,
        }
    }
}

impl RevlagConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] when no source provides a value.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(ConfigError::MissingToken)
    }

    /// Resolves the repository target, preferring `repo_url` over the
    /// `owner`/`repo` pair, each falling back to the legacy `GITHUB_OWNER`
    /// and `GITHUB_REPO` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingOwner`] or [`ConfigError::MissingRepo`]
    /// when the pair is incomplete and [`ConfigError::InvalidRepository`]
    /// when the configured target cannot be parsed.
    pub fn resolve_locator(&self) -> Result<RepositoryLocator, ConfigError> {
        if let Some(repo_url) = &self.repo_url {
            return RepositoryLocator::parse(repo_url).map_err(|error| {
                ConfigError::InvalidRepository {
                    message: error.to_string(),
                }
            });
        }

        let owner = self
            .owner
            .clone()
            .or_else(|| env::var("GITHUB_OWNER").ok())
            .ok_or(ConfigError::MissingOwner)?;
        let repo = self
            .repo
            .clone()
            .or_else(|| env::var("GITHUB_REPO").ok())
            .ok_or(ConfigError::MissingRepo)?;

        RepositoryLocator::from_owner_repo(&owner, &repo).map_err(|error| {
            ConfigError::InvalidRepository {
                message: error.to_string(),
            }
        })
    }

    /// Returns the configured database path or the default.
    #[must_use]
    pub fn resolve_database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned())
    }
}
