//! Headless match runner implementation.
//!
//! Reads JSON commands line by line, drives one [`SimulationLoop`] with a
//! synthetic clock and writes responses as JSON lines.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use skirmish_core::math::Vec2Fixed;
use skirmish_core::player::PlayerId;
use skirmish_core::simulation::{FrameHandle, MatchCommand, MatchState, SimulationLoop};

use crate::match_runner::{LogReporter, HUMAN_SEAT};
use crate::protocol::{Command, Response};

/// Headless runner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessConfig {
    /// Synthetic time between frames, in milliseconds.
    pub frame_ms: u64,
    /// Output state after every tick command (vs only on query).
    pub auto_state: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frame_ms: 50,
            auto_state: false,
        }
    }
}

/// Headless runner for agent-controlled matches.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: SimulationLoop,
    handle: FrameHandle,
    now: Duration,
    config: HeadlessConfig,
    seat: PlayerId,
    game_over_sent: bool,
}

impl HeadlessRunner {
    /// Wrap a freshly created match.
    #[must_use]
    pub fn new(state: MatchState, config: HeadlessConfig) -> Self {
        let mut sim = SimulationLoop::with_reporter(state, Box::new(LogReporter));
        let now = Duration::ZERO;
        let handle = sim.start(now);
        Self {
            sim,
            handle,
            now,
            config,
            seat: HUMAN_SEAT,
            game_over_sent: false,
        }
    }

    /// The match being driven.
    #[must_use]
    pub fn state(&self) -> &MatchState {
        self.sim.state()
    }

    /// Greeting written before any command is read.
    #[must_use]
    pub fn ready(&self) -> Response {
        Response::ready(self.sim.state().tick(), self.seat)
    }

    /// Parse and handle one input line.
    ///
    /// Returns the responses and whether the session should end.
    pub fn handle_line(&mut self, line: &str) -> (Vec<Response>, bool) {
        let line = line.trim();
        if line.is_empty() {
            return (Vec::new(), false);
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => (vec![Response::error(format!("Parse error: {e}"), None)], false),
        }
    }

    /// Handle one command.
    ///
    /// Returns the responses and whether the session should end.
    pub fn handle(&mut self, cmd: Command) -> (Vec<Response>, bool) {
        let cmd_name = cmd.name();
        let mut responses = Vec::new();

        let command = match cmd {
            Command::Quit => {
                responses.push(Response::Bye);
                return (responses, true);
            }
            Command::Query => {
                responses.push(self.state_response());
                return (responses, false);
            }
            Command::Hash => {
                let state = self.sim.state();
                responses.push(Response::Hash {
                    tick: state.tick(),
                    hash: state.state_hash(),
                });
                return (responses, false);
            }
            Command::Tick { count } => {
                self.tick(count, &mut responses);
                self.push_game_over(&mut responses);
                return (responses, false);
            }
            Command::Spawn { kind, player } => MatchCommand::Spawn {
                player: player.unwrap_or(self.seat),
                kind,
            },
            Command::Stance { stance, player } => MatchCommand::SetStance {
                player: player.unwrap_or(self.seat),
                stance,
            },
            Command::Select { units, player } => MatchCommand::SelectUnits {
                player: player.unwrap_or(self.seat),
                units,
            },
            Command::Move { x, y, player } => MatchCommand::MoveSelected {
                player: player.unwrap_or(self.seat),
                target: Vec2Fixed::from_ints(x, y),
            },
            Command::Grant { amount, player } => MatchCommand::GrantGold {
                player: player.unwrap_or(self.seat),
                amount,
            },
            Command::Pause => MatchCommand::Pause,
            Command::Resume => MatchCommand::Resume,
        };

        match self.sim.apply(command) {
            Ok(events) if events.is_empty() => responses.push(Response::ack(cmd_name)),
            Ok(events) => responses.push(Response::Events {
                tick: self.sim.state().tick(),
                events,
            }),
            Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
        }
        (responses, false)
    }

    /// Serve a whole session: write `ready`, then answer every line until
    /// `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns the first read or write failure.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        output.write_all(self.ready().to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let (responses, quit) = self.handle_line(&line?);
            for response in &responses {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
            if quit {
                tracing::debug!(tick = self.sim.state().tick(), "Session closed by quit");
                return Ok(());
            }
        }
        tracing::debug!(tick = self.sim.state().tick(), "Input closed");
        Ok(())
    }

    fn tick(&mut self, count: u32, responses: &mut Vec<Response>) {
        let frame = Duration::from_millis(self.config.frame_ms.max(1));
        let mut merged = skirmish_core::events::TickEvents::default();
        for _ in 0..count {
            if self.sim.state().ended() {
                break;
            }
            self.now += frame;
            merged.merge(self.sim.frame(self.handle, self.now));
        }
        responses.push(Response::Events {
            tick: self.sim.state().tick(),
            events: merged,
        });
        if self.config.auto_state {
            responses.push(self.state_response());
        }
    }

    fn state_response(&self) -> Response {
        Response::State {
            hash: self.sim.state().state_hash(),
            view: Box::new(self.sim.view()),
        }
    }

    fn push_game_over(&mut self, responses: &mut Vec<Response>) {
        if self.game_over_sent {
            return;
        }
        if let Some(report) = self.sim.state().report() {
            tracing::info!(winner = %report.winner, ticks = report.ticks, "Game over");
            responses.push(Response::GameOver { report });
            self.game_over_sent = true;
        }
    }
}
