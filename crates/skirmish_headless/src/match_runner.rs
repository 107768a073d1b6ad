//! Unattended single-match runner.
//!
//! Drives a [`SimulationLoop`] with a synthetic monotonic clock, one frame
//! per `frame_ms`, while an autopilot plays the human seat. Bots are run by
//! the core AI controller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use skirmish_core::config::GameplayConfig;
use skirmish_core::map::MapCatalog;
use skirmish_core::player::PlayerId;
use skirmish_core::report::{MatchReport, MatchReporter, MatchSummary};
use skirmish_core::session::{MatchSetup, SessionSnapshot};
use skirmish_core::simulation::{MatchState, SimulationLoop};
use skirmish_core::team::Team;

use crate::strategies::{Strategy, StrategyExecutor};

/// Seat the autopilot plays: the human is always seated first.
pub const HUMAN_SEAT: PlayerId = PlayerId(0);

/// Everything needed to play one match unattended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Gameplay constants.
    pub gameplay: GameplayConfig,
    /// Lobby choices (the seed lives here).
    pub setup: MatchSetup,
    /// Account data for the human seat.
    pub session: SessionSnapshot,
    /// Autopilot for the human seat.
    pub strategy: Strategy,
    /// Frame interval in milliseconds.
    pub frame_ms: u64,
    /// Stop after this many ticks even if the match is still running (0 = never).
    pub max_ticks: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            gameplay: GameplayConfig::default(),
            setup: MatchSetup::default(),
            session: SessionSnapshot::default(),
            strategy: Strategy::default(),
            frame_ms: 50,
            max_ticks: 0,
        }
    }
}

impl MatchConfig {
    /// Same match with another seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.setup.seed = seed;
        self
    }
}

/// Outcome of one unattended match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Seed played.
    pub seed: u64,
    /// Winner, if the match ended.
    pub winner: Option<Team>,
    /// Final report, if the match ended.
    pub report: Option<MatchReport>,
    /// Ticks simulated.
    pub ticks: u64,
    /// State hash after the last tick.
    pub final_state_hash: u64,
}

/// Reporter that writes lifecycle notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl MatchReporter for LogReporter {
    fn match_created(&mut self, summary: &MatchSummary) {
        tracing::debug!(
            map = summary.map_id.as_deref().unwrap_or("none"),
            seed = summary.seed,
            seats = summary.seats.len(),
            "Registry: match created"
        );
    }

    fn match_finished(&mut self, report: &MatchReport) {
        tracing::debug!(
            winner = %report.winner,
            reason = %report.reason,
            ticks = report.ticks,
            "Registry: match finished"
        );
    }
}

/// Play one match to the end (or to `max_ticks`).
///
/// # Errors
///
/// Fails only when the match cannot be set up (invalid config, unknown map).
pub fn run_match(config: &MatchConfig, catalog: &MapCatalog) -> skirmish_core::error::Result<MatchResult> {
    let state = MatchState::from_setup(
        config.gameplay.clone(),
        &config.setup,
        &config.session,
        catalog,
    )?;
    let mut sim = SimulationLoop::with_reporter(state, Box::new(LogReporter));
    let mut autopilot = StrategyExecutor::new(config.strategy.clone());

    let frame = Duration::from_millis(config.frame_ms.max(1));
    let mut now = Duration::ZERO;
    let handle = sim.start(now);

    while !sim.state().ended() && (config.max_ticks == 0 || sim.state().tick() < config.max_ticks) {
        let elapsed_ms = sim.state().elapsed_ms().to_num::<u64>();
        if autopilot.is_due(elapsed_ms) {
            let view = sim.view();
            for command in autopilot.decide(&view, HUMAN_SEAT, elapsed_ms) {
                match sim.apply(command) {
                    Ok(events) => {
                        for notice in events.notices {
                            tracing::trace!(text = %notice.text, "Autopilot notice");
                        }
                    }
                    Err(err) => tracing::debug!(error = %err, "Autopilot command rejected"),
                }
            }
        }

        now += frame;
        sim.frame(handle, now);
    }
    sim.stop();

    let state = sim.state();
    let report = state.report();
    if report.is_none() {
        tracing::debug!(seed = config.setup.seed, ticks = state.tick(), "Match stopped before the end");
    }
    Ok(MatchResult {
        seed: config.setup.seed,
        winner: report.as_ref().map(|r| r.winner),
        report,
        ticks: state.tick(),
        final_state_hash: state.state_hash(),
    })
}
