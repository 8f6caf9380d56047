//! Interactive CLI for review latency queries.
//!
//! The binary starts one [`revlag::StatsSession`] for the configured
//! repository, then reads `get_stats` commands from standard input until the
//! user quits. Query failures are printed and the loop continues; only
//! configuration and I/O failures end the process.

use std::io;

use thiserror::Error;

use revlag::{ConfigError, RemoteError, StatsError};

pub mod command;
pub mod interactive;
pub mod output;

/// Process-level CLI failures.
#[derive(Debug, Error)]
pub enum CliError {
    /// Startup configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Query failure escalated out of the loop (store failures only; remote
    /// query failures are printed and the loop continues).
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Gateway construction failure at startup.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Terminal I/O failure.
    #[error("I/O error: {message}")]
    Io {
        /// Detail from the failed read or write.
        message: String,
    },
}

impl CliError {
    pub(crate) fn io(error: &io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
