//! Test fixtures and helpers.
//!
//! Pre-built matches and rosters for consistent testing. Every fixture
//! plays without a map unless it says otherwise, so units spawn at the
//! configured fallback point and no objectives exist.

use std::sync::{Arc, Mutex, PoisonError};

use fixed::types::I32F32;
use skirmish_core::combat::CombatPolicy;
use skirmish_core::config::{Difficulty, GameplayConfig};
use skirmish_core::economy::PlayerEconomy;
use skirmish_core::map::MapCatalog;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::player::{Controller, Player, PlayerId};
use skirmish_core::report::{MatchReport, MatchReporter, MatchSummary};
use skirmish_core::roster::Roster;
use skirmish_core::session::MatchSetup;
use skirmish_core::simulation::MatchState;
use skirmish_core::spawner::SpawnOptions;
use skirmish_core::team::Team;
use skirmish_core::unit::UnitId;

/// Seat of the human in two-player fixtures.
pub const BLUE: PlayerId = PlayerId(0);

/// Seat of the bot in two-player fixtures.
pub const RED: PlayerId = PlayerId(1);

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// A 50 ms frame in seconds.
#[must_use]
pub fn frame_50ms() -> I32F32 {
    fixed(50) / fixed(1000)
}

/// Blue human "Commander" and red bot "BOT RED 1", both with `gold`.
#[must_use]
pub fn two_players(gold: u32, gold_cap: u32) -> Vec<Player> {
    vec![
        Player::new(
            BLUE,
            "Commander",
            Team::Blue,
            PlayerEconomy::new(gold, gold_cap),
            Controller::Human,
        ),
        Player::new(
            RED,
            "BOT RED 1",
            Team::Red,
            PlayerEconomy::new(gold, gold_cap),
            Controller::Bot { mirror: None },
        ),
    ]
}

/// Two bots, one per team.
#[must_use]
pub fn two_bots(gold: u32, gold_cap: u32) -> Vec<Player> {
    Team::ALL
        .iter()
        .enumerate()
        .map(|(seat, &team)| {
            Player::new(
                PlayerId(seat),
                format!("BOT {} 1", team.label()),
                team,
                PlayerEconomy::new(gold, gold_cap),
                Controller::Bot { mirror: None },
            )
        })
        .collect()
}

/// Roster of [`two_players`] with 100 gold each.
#[must_use]
pub fn two_player_roster() -> Roster {
    Roster::new(two_players(100, 100))
}

/// Builder for scenario matches.
#[derive(Debug, Clone)]
pub struct MatchBuilder {
    config: GameplayConfig,
    setup: MatchSetup,
    players: Option<Vec<Player>>,
    map_id: Option<String>,
}

impl Default for MatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchBuilder {
    /// Default config, medium bots, melee, seed 7, no map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GameplayConfig::default(),
            setup: MatchSetup {
                map_id: None,
                seed: 7,
                ..MatchSetup::default()
            },
            players: None,
            map_id: None,
        }
    }

    /// Replace the gameplay config.
    #[must_use]
    pub fn config(mut self, config: GameplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Tweak the gameplay config in place.
    #[must_use]
    pub fn tune(mut self, f: impl FnOnce(&mut GameplayConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.setup.seed = seed;
        self
    }

    /// Combat rule set.
    #[must_use]
    pub fn combat(mut self, combat: CombatPolicy) -> Self {
        self.setup.combat = combat;
        self
    }

    /// Bot difficulty.
    #[must_use]
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.setup.difficulty = difficulty;
        self
    }

    /// Match length.
    #[must_use]
    pub fn minutes(mut self, minutes: u32) -> Self {
        self.setup.minutes = Some(minutes);
        self
    }

    /// Play on a builtin map.
    #[must_use]
    pub fn map(mut self, id: &str) -> Self {
        self.map_id = Some(id.to_string());
        self
    }

    /// Explicit seat list.
    #[must_use]
    pub fn players(mut self, players: Vec<Player>) -> Self {
        self.players = Some(players);
        self
    }

    /// Build the match.
    ///
    /// # Panics
    ///
    /// Panics if the requested map is not builtin.
    #[must_use]
    pub fn build(self) -> MatchState {
        let map = self.map_id.as_deref().map(|id| {
            MapCatalog::builtin()
                .require(id)
                .expect("fixture map must be builtin")
                .to_world(self.config.world_width, self.config.world_height)
        });
        let mut setup = self.setup;
        setup.map_id = self.map_id;
        let players = self
            .players
            .unwrap_or_else(|| two_players(self.config.starting_gold, self.config.base_gold_cap));
        MatchState::with_players(self.config, setup, players, map)
    }
}

/// Place a unit with a fixed strength, free of charge.
///
/// # Panics
///
/// Panics if the spawn is refused (caps or unknown seat).
pub fn place(state: &mut MatchState, seat: PlayerId, x: i32, y: i32, strength: u32) -> UnitId {
    state
        .spawn(seat, None, SpawnOptions::placed(Vec2Fixed::from_ints(x, y), strength))
        .expect("fixture spawn must succeed")
}

/// Place `count` units in a column at `x`, 30 units apart.
pub fn place_column(
    state: &mut MatchState,
    seat: PlayerId,
    x: i32,
    count: u32,
    strength: u32,
) -> Vec<UnitId> {
    (0..count)
        .map(|i| place(state, seat, x, i as i32 * 30, strength))
        .collect()
}

/// Everything a [`RecordingReporter`] has seen.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    /// Creation summaries.
    pub created: Vec<MatchSummary>,
    /// Final reports.
    pub finished: Vec<MatchReport>,
}

/// Reporter that keeps every notification for later inspection.
///
/// Clones share the same log, so keep one clone and hand the other to the
/// simulation loop.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    log: Arc<Mutex<Recorded>>,
}

impl RecordingReporter {
    /// Snapshot of the log.
    #[must_use]
    pub fn recorded(&self) -> Recorded {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MatchReporter for RecordingReporter {
    fn match_created(&mut self, summary: &MatchSummary) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .created
            .push(summary.clone());
    }

    fn match_finished(&mut self, report: &MatchReport) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finished
            .push(report.clone());
    }
}
