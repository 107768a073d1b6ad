//! Errors surfaced by the headless runner.

use thiserror::Error;

use skirmish_core::error::{ConfigError, GameError};

use crate::strategies::StrategyError;

/// Everything that can stop a headless command.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// Match setup failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Config or map file could not be used.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Autopilot strategy could not be loaded.
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result file could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A map catalog failed validation.
    #[error("Map catalog has {} problem(s): {}", .0.len(), .0.join("; "))]
    InvalidMaps(Vec<String>),

    /// Runs that should agree did not.
    #[error("Non-determinism detected: {unique} distinct hashes over {runs} runs")]
    Diverged {
        /// Runs compared.
        runs: usize,
        /// Distinct final hashes.
        unique: usize,
    },
}

/// Result alias for headless commands.
pub type Result<T> = std::result::Result<T, HeadlessError>;
