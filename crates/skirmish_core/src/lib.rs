//! # Skirmish Core
//!
//! Deterministic match simulation for a small real-time skirmish game.
//!
//! This crate contains **only** match logic:
//! - No rendering
//! - No IO (except explicit RON loaders for config and maps)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless runners and bots-only batches
//! - Replaying a match from its seed and command stream
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - match state, per-frame loop and commands
//! - [`spawner`], [`economy`], [`combat`], [`objectives`], [`ai`],
//!   [`match_clock`] - the systems, in tick order
//! - [`roster`], [`player`], [`unit`], [`unit_kind`] - the data they act on
//! - [`session`], [`map`], [`report`], [`view`] - boundaries to the lobby,
//!   map data, match registry and presentation layer
//! - [`config`] - gameplay tuning
//! - [`math`] - fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod combat;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod map;
pub mod match_clock;
pub mod math;
pub mod objectives;
pub mod player;
pub mod report;
pub mod rng;
pub mod roster;
pub mod session;
pub mod simulation;
pub mod spawner;
pub mod team;
pub mod unit;
pub mod unit_kind;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::CombatPolicy;
    pub use crate::config::{BotBehavior, BotProfile, Difficulty, GameplayConfig, SpawnPick};
    pub use crate::economy::PlayerEconomy;
    pub use crate::error::{CommandError, ConfigError, GameError, Result, SpawnError};
    pub use crate::events::{MatchOutcome, Notice, TickEvents};
    pub use crate::map::{MapCatalog, MapSnapshot, WorldMap};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::player::{Controller, Player, PlayerId, Stance};
    pub use crate::report::{MatchReport, MatchReporter, MatchSummary, NullReporter};
    pub use crate::roster::Roster;
    pub use crate::session::{MatchMode, MatchSetup, SessionSnapshot};
    pub use crate::simulation::{FrameHandle, MatchCommand, MatchState, SimulationLoop};
    pub use crate::spawner::SpawnOptions;
    pub use crate::team::Team;
    pub use crate::unit::{Unit, UnitId};
    pub use crate::unit_kind::UnitKind;
    pub use crate::view::MatchView;
}
