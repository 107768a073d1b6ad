//! Match registry hooks.
//!
//! The simulation tells an outside registry when a match is created and
//! when it finishes. Calls are fire-and-forget: a reporter cannot fail the
//! match and is never consulted for game state.

use serde::{Deserialize, Serialize};

use crate::combat::CombatPolicy;
use crate::config::Difficulty;
use crate::player::Player;
use crate::session::MatchMode;
use crate::team::Team;

/// One seat in a match summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    /// Player name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Whether the seat is a bot.
    pub bot: bool,
}

/// Sent once when a match is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Map id, if any.
    pub map_id: Option<String>,
    /// Seats per team.
    pub mode: MatchMode,
    /// Bot difficulty.
    pub difficulty: Difficulty,
    /// Combat rule set.
    pub combat: CombatPolicy,
    /// RNG seed.
    pub seed: u64,
    /// Match length.
    pub minutes: u32,
    /// Seats in player order.
    pub seats: Vec<SeatSummary>,
}

/// Final per-player numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReport {
    /// Player name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Whether the seat is a bot.
    pub bot: bool,
    /// Gold at the end.
    pub gold: u32,
    /// Gold cap at the end.
    pub gold_cap: u32,
    /// Units spawned.
    pub units_created: u32,
    /// Units lost.
    pub units_lost: u32,
    /// Units alive at the end.
    pub units_alive: usize,
}

impl From<&Player> for PlayerReport {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            team: player.team,
            bot: player.is_bot(),
            gold: player.economy.gold,
            gold_cap: player.economy.gold_cap,
            units_created: player.units_created,
            units_lost: player.units_lost,
            units_alive: player.units.len(),
        }
    }
}

/// Sent once when a match ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Map id, if any.
    pub map_id: Option<String>,
    /// Winning team.
    pub winner: Team,
    /// Why it won.
    pub reason: String,
    /// Simulated time in milliseconds.
    pub elapsed_ms: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Per-player results in seat order.
    pub players: Vec<PlayerReport>,
}

/// Receives match lifecycle notifications.
pub trait MatchReporter {
    /// A match was set up.
    fn match_created(&mut self, _summary: &MatchSummary) {}

    /// A match ended.
    fn match_finished(&mut self, _report: &MatchReport) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl MatchReporter for NullReporter {}

impl SeatSummary {
    /// Summarise a player seat.
    #[must_use]
    pub fn from_player(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            team: player.team,
            bot: player.is_bot(),
        }
    }
}
