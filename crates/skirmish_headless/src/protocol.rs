//! JSON protocol for headless match control.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controlling agent
//! **Output (stdout):** Match state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. The agent sends commands as JSON lines
//! 3. Runner answers each command; `tick` answers with the merged events
//! 4. When the match ends, outputs `{"type":"game_over",...}` once
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"seat":0}
//! -> {"cmd":"spawn"}
//! <- {"type":"events","tick":0,"events":{"spawned":[1],...}}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"events","tick":60,"events":{...}}
//! -> {"cmd":"stance","stance":"attack"}
//! <- {"type":"ack","cmd":"stance"}
//! -> {"cmd":"query"}
//! <- {"type":"state","hash":1234,"view":{...}}
//! ```

use serde::{Deserialize, Serialize};

use skirmish_core::events::TickEvents;
use skirmish_core::player::{PlayerId, Stance};
use skirmish_core::report::MatchReport;
use skirmish_core::unit::UnitId;
use skirmish_core::view::MatchView;

/// Protocol version announced in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (agent -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
///
/// Commands that act for a player default to the local human seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the match by N frames (default: 1).
    Tick {
        /// Frames to run.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query the current state without advancing time.
    Query,

    /// Buy a unit.
    Spawn {
        /// Unit type id; omitted buys the default kind.
        #[serde(default)]
        kind: Option<String>,
        /// Acting seat.
        #[serde(default)]
        player: Option<PlayerId>,
    },

    /// Change stance.
    Stance {
        /// New stance.
        stance: Stance,
        /// Acting seat.
        #[serde(default)]
        player: Option<PlayerId>,
    },

    /// Replace the selection.
    Select {
        /// Units to select.
        units: Vec<UnitId>,
        /// Acting seat.
        #[serde(default)]
        player: Option<PlayerId>,
    },

    /// Move selected units to a world point.
    Move {
        /// World X.
        x: i32,
        /// World Y.
        y: i32,
        /// Acting seat.
        #[serde(default)]
        player: Option<PlayerId>,
    },

    /// Suspend ticking.
    Pause,

    /// Resume ticking.
    Resume,

    /// Developer gold grant.
    Grant {
        /// Gold to add (clamped to the cap).
        amount: u32,
        /// Acting seat.
        #[serde(default)]
        player: Option<PlayerId>,
    },

    /// Current state hash (for determinism verification).
    Hash,

    /// Quit the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> agent)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
        /// Seat the runner acts for by default.
        seat: PlayerId,
    },

    /// Acknowledgment of a command.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, if the line parsed.
        cmd: Option<String>,
    },

    /// Current match state.
    State {
        /// State hash.
        hash: u64,
        /// Presentation snapshot.
        view: Box<MatchView>,
    },

    /// Events produced by a command or by ticking.
    Events {
        /// Tick after the command.
        tick: u64,
        /// Merged events.
        events: TickEvents,
    },

    /// State hash for determinism verification.
    Hash {
        /// Current tick.
        tick: u64,
        /// State hash.
        hash: u64,
    },

    /// The match has ended.
    GameOver {
        /// Final report.
        report: MatchReport,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64, seat: PlayerId) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
            seat,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Spawn { .. } => "spawn",
            Self::Stance { .. } => "stance",
            Self::Select { .. } => "select",
            Self::Move { .. } => "move",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Grant { .. } => "grant",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
