//! Core simulation loop.
//!
//! [`MatchState`] owns everything a match mutates. [`SimulationLoop`] owns
//! the state, turns caller timestamps into clamped frame deltas, applies
//! presentation-layer commands, and notifies the match registry.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness (one seeded [`SimRng`] per match)
//! - Consistent iteration order (spawn order for units, seat order for players)
//! - Same setup, seed and frame deltas always produce the same state hash
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use skirmish_core::prelude::*;
//!
//! let state = MatchState::from_setup(
//!     GameplayConfig::default(),
//!     &MatchSetup::default(),
//!     &SessionSnapshot::default(),
//!     &MapCatalog::builtin(),
//! )
//! .unwrap();
//! let mut sim = SimulationLoop::new(state);
//!
//! let handle = sim.start(Duration::ZERO);
//! sim.apply(MatchCommand::Spawn { player: PlayerId(0), kind: None }).unwrap();
//! sim.frame(handle, Duration::from_millis(16));
//! assert_eq!(sim.view().units.len(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::AiController;
use crate::combat::{self, CombatPolicy};
use crate::config::GameplayConfig;
use crate::economy::PassiveIncome;
use crate::error::{CommandError, Result, SpawnError};
use crate::events::{Notice, TickEvents};
use crate::map::{MapCatalog, WorldMap};
use crate::match_clock::MatchClock;
use crate::math::{Fixed, Vec2Fixed, MILLIS_PER_SECOND};
use crate::objectives::ObjectiveTracker;
use crate::player::{Player, PlayerId, Stance};
use crate::report::{
    MatchReport, MatchReporter, MatchSummary, NullReporter, PlayerReport, SeatSummary,
};
use crate::rng::SimRng;
use crate::roster::Roster;
use crate::session::{MatchSetup, SessionSnapshot};
use crate::spawner::{resolve_kind, SpawnOptions, Spawner};
use crate::unit::{UnitId, UnitOrder};
use crate::unit_kind::UnitKind;
use crate::view::MatchView;

/// Notice shown when a spawn is refused for lack of gold.
pub const NOT_ENOUGH_GOLD: &str = "Not enough gold";

/// Everything a running match mutates.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Economy** - passive income payouts
/// 2. **AI** - bot purchases, stances and formations
/// 3. **Movement** - every unit steps toward its target
/// 4. **Combat** - melee or ranged resolution
/// 5. **Objectives** - ownership flips and cap rewards
/// 6. **Match clock** - timeout and elimination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    config: GameplayConfig,
    setup: MatchSetup,
    map: Option<WorldMap>,
    roster: Roster,
    income: PassiveIncome,
    objectives: ObjectiveTracker,
    ai: AiController,
    clock: MatchClock,
    rng: SimRng,
    tick: u64,
    #[serde(with = "crate::math::fixed_serde")]
    elapsed_ms: Fixed,
}

impl MatchState {
    /// Set up a match from lobby choices.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GameError::Config`] for an invalid config and
    /// [`crate::error::GameError::UnknownMap`] if the setup names a map the
    /// catalog lacks.
    pub fn from_setup(
        config: GameplayConfig,
        setup: &MatchSetup,
        session: &SessionSnapshot,
        catalog: &MapCatalog,
    ) -> Result<Self> {
        config.validate()?;
        let map = match setup.map_id.as_deref() {
            Some(id) => Some(
                catalog
                    .require(id)?
                    .to_world(config.world_width, config.world_height),
            ),
            None => None,
        };
        let players = setup.build_players(session, &config);
        Ok(Self::with_players(config, setup.clone(), players, map))
    }

    /// Set up a match with an explicit seat list.
    #[must_use]
    pub fn with_players(
        config: GameplayConfig,
        setup: MatchSetup,
        players: Vec<Player>,
        map: Option<WorldMap>,
    ) -> Self {
        let ai = AiController::new(
            *config.difficulties.profile(setup.difficulty),
            config.formation_interval_ms,
            config.formation_radius(),
        );
        let objectives =
            ObjectiveTracker::from_map(map.as_ref(), config.capture_radius(), config.capture_bonus);
        let mut state = Self {
            income: PassiveIncome::new(
                config.passive_income_interval_ms,
                config.passive_income_amount,
            ),
            clock: MatchClock::new(setup.match_minutes(&config)),
            rng: SimRng::new(setup.seed),
            roster: Roster::new(players),
            objectives,
            ai,
            map,
            setup,
            config,
            tick: 0,
            elapsed_ms: Fixed::ZERO,
        };

        let spawner = Spawner::new(&state.config, state.setup.combat, state.map.as_ref());
        spawner.spawn_initial_armies(&mut state.roster, &mut state.rng);
        tracing::info!(
            map = state.map.as_ref().map_or("none", |m| m.id.as_str()),
            players = state.roster.players().len(),
            combat = state.setup.combat.id(),
            seed = state.setup.seed,
            "Match created"
        );
        state
    }

    /// Gameplay constants.
    #[must_use]
    pub const fn config(&self) -> &GameplayConfig {
        &self.config
    }

    /// Lobby choices.
    #[must_use]
    pub const fn setup(&self) -> &MatchSetup {
        &self.setup
    }

    /// Combat rule set.
    #[must_use]
    pub const fn combat(&self) -> CombatPolicy {
        self.setup.combat
    }

    /// Active map, if any.
    #[must_use]
    pub const fn map(&self) -> Option<&WorldMap> {
        self.map.as_ref()
    }

    /// Players and units.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Mutable players and units, for scenario setup.
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// Objectives.
    #[must_use]
    pub const fn objectives(&self) -> &ObjectiveTracker {
        &self.objectives
    }

    /// Match clock.
    #[must_use]
    pub const fn clock(&self) -> &MatchClock {
        &self.clock
    }

    /// Passive income timer.
    #[must_use]
    pub const fn income(&self) -> &PassiveIncome {
        &self.income
    }

    /// Ticks simulated.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time.
    #[must_use]
    pub const fn elapsed_ms(&self) -> Fixed {
        self.elapsed_ms
    }

    /// Whether the match is over.
    #[must_use]
    pub const fn ended(&self) -> bool {
        self.clock.ended()
    }

    /// Cheapest unit under this match's rules.
    #[must_use]
    pub fn min_unit_cost(&self) -> u32 {
        UnitKind::min_cost(self.setup.combat)
    }

    /// Spawn a unit for a player.
    ///
    /// # Errors
    ///
    /// Returns the [`SpawnError`] describing why the request was refused.
    pub fn spawn(
        &mut self,
        player: PlayerId,
        kind: Option<UnitKind>,
        options: SpawnOptions,
    ) -> std::result::Result<UnitId, SpawnError> {
        Spawner::new(&self.config, self.setup.combat, self.map.as_ref()).spawn(
            &mut self.roster,
            &mut self.rng,
            player,
            kind,
            options,
        )
    }

    /// Advance the match by `dt` seconds.
    ///
    /// Does nothing once the match has ended.
    pub fn step(&mut self, dt: Fixed) -> TickEvents {
        let mut events = TickEvents::default();
        if self.ended() {
            return events;
        }
        let frame_ms = dt * MILLIS_PER_SECOND;

        // 1. Economy
        events.income_payouts = self.income.update(self.roster.players_mut(), frame_ms);

        // 2. AI
        let spawner = Spawner::new(&self.config, self.setup.combat, self.map.as_ref());
        events.spawned = self
            .ai
            .update(frame_ms, &mut self.roster, &mut self.rng, &spawner);

        // 3. Movement
        for unit in self.roster.units_mut() {
            unit.advance(dt);
        }
        self.elapsed_ms += frame_ms;

        // 4. Combat
        events.deaths = combat::resolve(
            self.setup.combat,
            &mut self.roster,
            self.config.collision_distance(),
            self.elapsed_ms,
        );

        // 5. Objectives
        let (captures, notices) = self.objectives.update(&mut self.roster);
        events.captures = captures;
        events.notices = notices;

        // 6. Match clock
        let min_cost = self.min_unit_cost();
        events.outcome = self.clock.update(frame_ms, &self.roster, min_cost);
        if let Some(outcome) = &events.outcome {
            events
                .notices
                .push(Notice::info(format!("{} wins! {}", outcome.winner.label(), outcome.reason)));
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two matches with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.elapsed_ms.to_bits().hash(&mut hasher);
        self.rng.state().hash(&mut hasher);
        self.income.accumulated_ms().to_bits().hash(&mut hasher);
        self.clock.remaining_ms().to_bits().hash(&mut hasher);
        self.clock.outcome().map(|o| o.winner).hash(&mut hasher);

        for unit in self.roster.units() {
            unit.id.hash(&mut hasher);
            unit.owner.hash(&mut hasher);
            unit.kind.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.target.hash(&mut hasher);
            unit.health.hash(&mut hasher);
            unit.last_attack_ms.map(Fixed::to_bits).hash(&mut hasher);
        }
        for player in self.roster.players() {
            player.economy.gold.hash(&mut hasher);
            player.economy.gold_cap.hash(&mut hasher);
            player.stance.hash(&mut hasher);
            player.units_created.hash(&mut hasher);
            player.units_lost.hash(&mut hasher);
        }
        for objective in self.objectives.objectives() {
            objective.owner.hash(&mut hasher);
            objective.rewarded.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// End-of-match report, once the match is over.
    #[must_use]
    pub fn report(&self) -> Option<MatchReport> {
        let outcome = self.clock.outcome()?;
        Some(MatchReport {
            map_id: self.setup.map_id.clone(),
            winner: outcome.winner,
            reason: outcome.reason.clone(),
            elapsed_ms: self.elapsed_ms.to_num::<u64>(),
            ticks: self.tick,
            players: self.roster.players().iter().map(PlayerReport::from).collect(),
        })
    }

    /// Creation summary for the match registry.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            map_id: self.setup.map_id.clone(),
            mode: self.setup.mode,
            difficulty: self.setup.difficulty,
            combat: self.setup.combat,
            seed: self.setup.seed,
            minutes: self.setup.match_minutes(&self.config),
            seats: self
                .roster
                .players()
                .iter()
                .map(SeatSummary::from_player)
                .collect(),
        }
    }
}

/// Presentation-layer commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchCommand {
    /// Buy a unit; `kind = None` buys the default kind.
    Spawn {
        /// Buyer.
        player: PlayerId,
        /// Unit type id.
        kind: Option<String>,
    },
    /// Change a player's stance.
    SetStance {
        /// Player.
        player: PlayerId,
        /// New stance.
        stance: Stance,
    },
    /// Replace a player's selection.
    SelectUnits {
        /// Player.
        player: PlayerId,
        /// Units to select; units the player does not own are ignored.
        units: Vec<UnitId>,
    },
    /// Send the player's selected units to a point.
    MoveSelected {
        /// Player.
        player: PlayerId,
        /// Destination.
        target: Vec2Fixed,
    },
    /// Developer gold grant (clamped to the cap).
    GrantGold {
        /// Player.
        player: PlayerId,
        /// Amount.
        amount: u32,
    },
    /// Suspend ticking.
    Pause,
    /// Resume ticking.
    Resume,
}

/// Token returned by [`SimulationLoop::start`].
///
/// Frames presented with a handle from an earlier start are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle {
    generation: u64,
}

/// Per-frame driver owning one match.
pub struct SimulationLoop {
    state: MatchState,
    reporter: Box<dyn MatchReporter>,
    generation: u64,
    running: bool,
    paused: bool,
    last_frame: Option<Duration>,
}

impl std::fmt::Debug for SimulationLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationLoop")
            .field("tick", &self.state.tick)
            .field("generation", &self.generation)
            .field("running", &self.running)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl SimulationLoop {
    /// Wrap a match with no registry.
    #[must_use]
    pub fn new(state: MatchState) -> Self {
        Self::with_reporter(state, Box::new(NullReporter))
    }

    /// Wrap a match and announce it to `reporter`.
    #[must_use]
    pub fn with_reporter(state: MatchState, mut reporter: Box<dyn MatchReporter>) -> Self {
        reporter.match_created(&state.summary());
        Self {
            state,
            reporter,
            generation: 0,
            running: false,
            paused: false,
            last_frame: None,
        }
    }

    /// The match.
    #[must_use]
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

    /// The match, mutably, for scenario setup.
    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    /// Whether ticking is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether frames are being accepted.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Begin accepting frames, measuring deltas from `now`.
    ///
    /// Invalidates every earlier handle.
    pub fn start(&mut self, now: Duration) -> FrameHandle {
        self.generation += 1;
        self.running = true;
        self.last_frame = Some(now);
        FrameHandle {
            generation: self.generation,
        }
    }

    /// Stop accepting frames. Outstanding handles become no-ops.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.running = false;
        self.last_frame = None;
    }

    /// Suspend ticking.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume ticking.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Handle one animation frame at monotonic time `now`.
    ///
    /// The delta since the previous frame is clamped to the configured
    /// maximum step. Stale handles, stopped loops, paused loops and ended
    /// matches produce no events.
    pub fn frame(&mut self, handle: FrameHandle, now: Duration) -> TickEvents {
        if !self.running || handle.generation != self.generation {
            return TickEvents::default();
        }
        let last = self.last_frame.replace(now).unwrap_or(now);
        let delta = now.saturating_sub(last).min(self.state.config.max_frame_step());
        self.step(duration_to_seconds(delta))
    }

    /// Advance by exactly `dt` seconds, bypassing frame timing.
    pub fn step(&mut self, dt: Fixed) -> TickEvents {
        if self.paused || self.state.ended() {
            return TickEvents::default();
        }
        let events = self.state.step(dt);
        if events.outcome.is_some() {
            if let Some(report) = self.state.report() {
                self.reporter.match_finished(&report);
            }
        }
        events
    }

    /// Apply a presentation-layer command between frames.
    ///
    /// Refused spawns are not errors: they come back as notices.
    ///
    /// # Errors
    ///
    /// [`CommandError::MatchEnded`] after the match is over,
    /// [`CommandError::UnknownPlayer`] for a player outside the match, and
    /// [`CommandError::NotPermitted`] for a gold grant without developer
    /// privileges.
    pub fn apply(&mut self, command: MatchCommand) -> std::result::Result<TickEvents, CommandError> {
        if self.state.ended() {
            return Err(CommandError::MatchEnded);
        }
        let mut events = TickEvents::default();

        match command {
            MatchCommand::Pause => self.pause(),
            MatchCommand::Resume => self.resume(),
            MatchCommand::Spawn { player, kind } => {
                self.require_player(player)?;
                let resolved = resolve_kind(kind.as_deref(), self.state.combat());
                match resolved.and_then(|kind| self.state.spawn(player, Some(kind), SpawnOptions::default())) {
                    Ok(id) => events.spawned.push(id),
                    Err(err) if err.is_user_visible() => {
                        tracing::debug!(%player, error = %err, "Spawn refused");
                        let text = match err {
                            SpawnError::Economy(_) => NOT_ENOUGH_GOLD.to_string(),
                            other => other.to_string(),
                        };
                        events.notices.push(Notice::error(text));
                    }
                    Err(err) => tracing::debug!(%player, error = %err, "Invalid spawn request ignored"),
                }
            }
            MatchCommand::SetStance { player, stance } => {
                let player = self.player_mut(player)?;
                player.stance = stance;
            }
            MatchCommand::SelectUnits { player, units } => {
                self.require_player(player)?;
                for unit in self.state.roster.units_mut() {
                    if unit.owner == player {
                        unit.selected = units.contains(&unit.id);
                    }
                }
            }
            MatchCommand::MoveSelected { player, target } => {
                self.require_player(player)?;
                let target = self.state.config.clamp_to_world(target);
                for unit in self.state.roster.units_mut() {
                    if unit.owner == player && unit.selected {
                        unit.move_to(target, UnitOrder::Moving);
                    }
                }
            }
            MatchCommand::GrantGold { player, amount } => {
                let owner = self.player_mut(player)?;
                if !owner.developer {
                    return Err(CommandError::NotPermitted(player));
                }
                let gold = owner.economy.add_gold(amount);
                tracing::info!(%player, amount, gold, "Developer gold grant");
            }
        }
        Ok(events)
    }

    /// Read-only snapshot for drawing.
    #[must_use]
    pub fn view(&self) -> MatchView {
        MatchView::capture(&self.state, self.paused)
    }

    fn require_player(&self, player: PlayerId) -> std::result::Result<(), CommandError> {
        self.state
            .roster
            .player(player)
            .map(|_| ())
            .ok_or(CommandError::UnknownPlayer(player))
    }

    fn player_mut(&mut self, player: PlayerId) -> std::result::Result<&mut Player, CommandError> {
        self.state
            .roster
            .player_mut(player)
            .ok_or(CommandError::UnknownPlayer(player))
    }
}

/// Convert a frame delta to fixed-point seconds at microsecond precision.
#[must_use]
pub fn duration_to_seconds(delta: Duration) -> Fixed {
    let micros = i32::try_from(delta.as_micros()).unwrap_or(i32::MAX);
    Fixed::from_num(micros) / Fixed::from_num(1_000_000)
}
