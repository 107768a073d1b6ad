//! Error types for the match simulation.
//!
//! Nothing inside a tick is fatal: economy and spawn refusals are soft
//! failures that the simulation loop turns into notices. The boundary
//! errors (config files, unknown maps) surface through [`GameError`].

use thiserror::Error;

use crate::player::PlayerId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for setting up and driving a match.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration or map data could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested map is not in the catalog.
    #[error("Unknown map: {0}")]
    UnknownMap(String),

    /// A presentation-layer command was rejected.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised while loading or validating configuration data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a data file.
    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse RON.
    #[error("Failed to parse data file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A value is outside its allowed range.
    #[error("Invalid config value '{field}': {message}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Refused gold transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EconomyError {
    /// The player does not have enough gold.
    #[error("Not enough gold: need {needed}, have {available}")]
    InsufficientGold {
        /// Gold required.
        needed: u32,
        /// Gold held.
        available: u32,
    },
}

/// Reasons a spawn request is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The match-wide unit cap is reached.
    #[error("Unit limit reached ({limit})")]
    GlobalCap {
        /// Match-wide unit limit.
        limit: usize,
    },

    /// The player's own unit cap is reached.
    #[error("{name} reached max units")]
    PlayerCap {
        /// Display name of the player.
        name: String,
        /// Per-player unit limit.
        limit: usize,
    },

    /// Unit type id is not recognised.
    #[error("Unknown unit type: {0}")]
    UnknownKind(String),

    /// Unit type exists but cannot be fielded under this match's combat policy.
    #[error("Unit type not available in this match: {0}")]
    Unavailable(&'static str),

    /// The player does not exist.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Spending the unit cost failed.
    #[error(transparent)]
    Economy(#[from] EconomyError),
}

impl SpawnError {
    /// Whether the refusal should be flashed to the player.
    ///
    /// Invalid unit type requests are refused silently.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::GlobalCap { .. } | Self::PlayerCap { .. } | Self::Economy(_)
        )
    }
}

/// Rejected presentation-layer commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command names a player that is not in this match.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// The player lacks the privilege for this command.
    #[error("Command not permitted for player {0}")]
    NotPermitted(PlayerId),

    /// The match is already over.
    #[error("Match has already ended")]
    MatchEnded,
}
