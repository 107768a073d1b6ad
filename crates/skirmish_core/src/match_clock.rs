//! Match timer and win conditions.

use serde::{Deserialize, Serialize};

use crate::events::MatchOutcome;
use crate::math::{fixed_serde, Fixed};
use crate::roster::Roster;
use crate::team::Team;

/// Reason text for a timeout result.
pub const TIMEOUT_REASON: &str = "Time expired.";

/// Countdown plus terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchClock {
    #[serde(with = "fixed_serde")]
    remaining_ms: Fixed,
    outcome: Option<MatchOutcome>,
}

impl MatchClock {
    /// Start a clock with `minutes` on it, saturating at the [`Fixed`] range.
    #[must_use]
    pub fn new(minutes: u32) -> Self {
        Self::from_millis(Fixed::saturating_from_num(u64::from(minutes) * 60_000))
    }

    /// Start a clock with an exact duration.
    #[must_use]
    pub const fn from_millis(remaining_ms: Fixed) -> Self {
        Self {
            remaining_ms,
            outcome: None,
        }
    }

    /// Time left.
    #[must_use]
    pub const fn remaining_ms(&self) -> Fixed {
        self.remaining_ms
    }

    /// Whether the match is over.
    #[must_use]
    pub const fn ended(&self) -> bool {
        self.outcome.is_some()
    }

    /// Final result, once ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    /// End the match. Only the first call has any effect.
    ///
    /// Returns the outcome if this call ended the match.
    pub fn finish(&mut self, winner: Team, reason: impl Into<String>) -> Option<MatchOutcome> {
        if self.ended() {
            return None;
        }
        let outcome = MatchOutcome {
            winner,
            reason: reason.into(),
        };
        tracing::info!(winner = %winner, reason = %outcome.reason, "Match ended");
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Count down and check win conditions.
    ///
    /// Timeout is checked first: when the clock runs out the team with the
    /// larger total strength wins, Blue on equal strength. Then a team with
    /// no units whose players all hold less than `min_unit_cost` gold loses.
    pub fn update(
        &mut self,
        elapsed_ms: Fixed,
        roster: &Roster,
        min_unit_cost: u32,
    ) -> Option<MatchOutcome> {
        if self.ended() {
            return None;
        }

        self.remaining_ms = (self.remaining_ms - elapsed_ms).max(Fixed::ZERO);
        if self.remaining_ms == Fixed::ZERO {
            let winner = if roster.team_strength(Team::Blue) >= roster.team_strength(Team::Red) {
                Team::Blue
            } else {
                Team::Red
            };
            return self.finish(winner, TIMEOUT_REASON);
        }

        for team in Team::ALL {
            let broke = roster
                .team_players(team)
                .all(|p| p.economy.gold < min_unit_cost);
            if roster.living_count(team) == 0 && broke {
                return self.finish(
                    team.opponent(),
                    format!("{} ran out of units and gold.", team.label()),
                );
            }
        }
        None
    }
}
