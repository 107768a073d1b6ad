//! Gold economy.
//!
//! Each player holds gold up to a cap. Gold trickles in from a shared
//! passive-income timer and is spent on units. Capturing objectives raises
//! the cap for the whole team.
//!
//! All balances are integers; the income timer is fixed-point milliseconds.

use serde::{Deserialize, Serialize};

use crate::error::EconomyError;
use crate::events::Notice;
use crate::math::{fixed_serde, Fixed};
use crate::player::Player;
use crate::team::Team;

/// Player gold state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerEconomy {
    /// Current gold.
    pub gold: u32,
    /// Maximum gold the player may hold.
    pub gold_cap: u32,
}

impl PlayerEconomy {
    /// Create a player economy. Starting gold is clamped to the cap.
    #[must_use]
    pub fn new(gold: u32, gold_cap: u32) -> Self {
        Self {
            gold: gold.min(gold_cap),
            gold_cap,
        }
    }

    /// Check if player can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.gold >= cost
    }

    /// Spend gold if available. Leaves the balance untouched on failure.
    pub fn spend(&mut self, cost: u32) -> Result<(), EconomyError> {
        if !self.can_afford(cost) {
            return Err(EconomyError::InsufficientGold {
                needed: cost,
                available: self.gold,
            });
        }
        self.gold -= cost;
        Ok(())
    }

    /// Add gold, clamped to the cap.
    ///
    /// Returns the new balance.
    pub fn add_gold(&mut self, amount: u32) -> u32 {
        self.gold = self.gold_cap.min(self.gold.saturating_add(amount));
        self.gold
    }

    /// Raise the cap by `bonus`. Never lowers the current balance.
    pub fn raise_cap(&mut self, bonus: u32) {
        self.gold_cap = self.gold_cap.saturating_add(bonus);
        self.gold = self.gold.min(self.gold_cap);
    }
}

/// Catch-up timer that pays every player a fixed amount per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveIncome {
    /// Payout interval in milliseconds.
    pub interval_ms: u32,
    /// Gold per payout.
    pub amount: u32,
    /// Time accumulated toward the next payout.
    #[serde(with = "fixed_serde")]
    accumulated_ms: Fixed,
}

impl PassiveIncome {
    /// Create an empty timer.
    #[must_use]
    pub fn new(interval_ms: u32, amount: u32) -> Self {
        Self {
            interval_ms,
            amount,
            accumulated_ms: Fixed::ZERO,
        }
    }

    /// Time accumulated toward the next payout.
    #[must_use]
    pub const fn accumulated_ms(&self) -> Fixed {
        self.accumulated_ms
    }

    /// Accumulate `elapsed_ms` and return how many payouts are due.
    ///
    /// A long frame pays out several times; nothing is skipped.
    pub fn advance(&mut self, elapsed_ms: Fixed) -> u32 {
        self.accumulated_ms += elapsed_ms;
        if self.interval_ms == 0 {
            return 0;
        }

        let interval = Fixed::saturating_from_num(self.interval_ms);
        let mut payouts = 0;
        while self.accumulated_ms >= interval {
            self.accumulated_ms -= interval;
            payouts += 1;
        }
        payouts
    }

    /// Advance the timer and pay every player for each interval crossed.
    ///
    /// Returns the number of payouts.
    pub fn update(&mut self, players: &mut [Player], elapsed_ms: Fixed) -> u32 {
        let payouts = self.advance(elapsed_ms);
        for _ in 0..payouts {
            for player in players.iter_mut() {
                player.economy.add_gold(self.amount);
            }
        }
        if payouts > 0 {
            tracing::trace!(payouts, amount = self.amount, "Passive income paid");
        }
        payouts
    }
}

/// Raise the gold cap of every player on `team`.
pub fn increase_team_gold_cap(players: &mut [Player], team: Team, bonus: u32) -> Notice {
    for player in players.iter_mut().filter(|p| p.team == team) {
        player.economy.raise_cap(bonus);
    }
    Notice::info(format!(
        "{} captured area (+{bonus} gold cap)",
        team.label()
    ))
}
