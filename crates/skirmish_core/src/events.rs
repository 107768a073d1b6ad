//! Events generated during a simulation tick.
//!
//! These events can be used by the presentation layer to flash messages,
//! play death effects, and show the end-of-match screen. The simulation
//! never reads them back.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;
use crate::team::Team;
use crate::unit::UnitId;

/// Severity of a transient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// A refused action.
    Error,
}

/// A transient UI message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub text: String,
}

impl Notice {
    /// Informational message.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    /// Error message.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Visual effect queued when a unit is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathEffect {
    /// Removed unit.
    pub unit: UnitId,
    /// Team of the removed unit (colour key).
    pub team: Team,
    /// Where it died.
    pub position: Vec2Fixed,
}

/// An objective changed hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    /// Index of the objective.
    pub objective: usize,
    /// Objective name.
    pub name: String,
    /// New owner.
    pub team: Team,
    /// Whether this capture raised the team's gold cap.
    pub rewarded: bool,
}

/// Final result of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Winning team.
    pub winner: Team,
    /// Human-readable reason.
    pub reason: String,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Transient messages.
    pub notices: Vec<Notice>,
    /// Units spawned this tick.
    pub spawned: Vec<UnitId>,
    /// Units removed this tick.
    pub deaths: Vec<DeathEffect>,
    /// Objective ownership changes.
    pub captures: Vec<CaptureEvent>,
    /// Number of passive income payouts.
    pub income_payouts: u32,
    /// Set on the tick the match ends.
    pub outcome: Option<MatchOutcome>,
}

impl TickEvents {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
            && self.spawned.is_empty()
            && self.deaths.is_empty()
            && self.captures.is_empty()
            && self.income_payouts == 0
            && self.outcome.is_none()
    }

    /// Append another batch of events.
    pub fn merge(&mut self, mut other: TickEvents) {
        self.notices.append(&mut other.notices);
        self.spawned.append(&mut other.spawned);
        self.deaths.append(&mut other.deaths);
        self.captures.append(&mut other.captures);
        self.income_payouts += other.income_payouts;
        if self.outcome.is_none() {
            self.outcome = other.outcome;
        }
    }
}
