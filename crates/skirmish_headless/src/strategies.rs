//! Scripted strategies for the human seat in headless matches.
//!
//! Bots are driven by the core AI controller. The human seat has no
//! controller of its own, so unattended runs give it an autopilot that
//! follows a build order and flips stance on a timer or on army strength.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skirmish_core::player::{PlayerId, Stance};
use skirmish_core::simulation::MatchCommand;
use skirmish_core::unit_kind::UnitKind;
use skirmish_core::view::MatchView;

/// Error type for strategy operations.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// File not found.
    #[error("Strategy file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read strategy file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse strategy: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// No preset with this name.
    #[error("Unknown strategy: {0}")]
    Unknown(String),
}

/// A complete autopilot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Strategy name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Opening purchases, in order.
    pub build_order: Vec<BuildOrderItem>,
    /// Match time of the first attack, in milliseconds.
    pub attack_at_ms: u64,
    /// Fall back to defense when fewer units than this are alive.
    pub regroup_below: usize,
    /// Gold kept back once the build order is done.
    pub reserve_gold: u32,
    /// Time between decisions, in milliseconds.
    pub think_interval_ms: u64,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            name: "Balanced".to_string(),
            description: "Build a line, hold, then push at the two minute mark".to_string(),
            build_order: vec![
                BuildOrderItem::Unit(None),
                BuildOrderItem::Unit(None),
                BuildOrderItem::Unit(None),
                BuildOrderItem::WaitForGold(30),
                BuildOrderItem::Unit(None),
                BuildOrderItem::Unit(None),
            ],
            attack_at_ms: 120_000,
            regroup_below: 3,
            reserve_gold: 0,
            think_interval_ms: 1000,
        }
    }
}

impl Strategy {
    /// Load a strategy from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StrategyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StrategyError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, StrategyError> {
        let strategy: Strategy = ron::from_str(ron)?;
        Ok(strategy)
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Result<Self, StrategyError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::default()),
            "rush" => Ok(Self::rush()),
            "turtle" => Ok(Self::turtle()),
            "idle" => Ok(Self::idle()),
            other => Err(StrategyError::Unknown(other.to_string())),
        }
    }

    /// Names accepted by [`Strategy::preset`].
    pub const PRESETS: [&'static str; 4] = ["balanced", "rush", "turtle", "idle"];

    /// Spend everything at once and attack immediately.
    #[must_use]
    pub fn rush() -> Self {
        Self {
            name: "Rush".to_string(),
            description: "Buy on every decision and attack from the start".to_string(),
            build_order: Vec::new(),
            attack_at_ms: 0,
            regroup_below: 0,
            reserve_gold: 0,
            think_interval_ms: 500,
        }
    }

    /// Bank gold, defend, and only attack late.
    #[must_use]
    pub fn turtle() -> Self {
        Self {
            name: "Turtle".to_string(),
            description: "Hold the spawn and keep a reserve, push in the last minutes".to_string(),
            build_order: vec![
                BuildOrderItem::Unit(None),
                BuildOrderItem::Unit(None),
                BuildOrderItem::WaitForUnits(2),
                BuildOrderItem::WaitForTime(60_000),
                BuildOrderItem::Unit(None),
            ],
            attack_at_ms: 480_000,
            regroup_below: 6,
            reserve_gold: 40,
            think_interval_ms: 2000,
        }
    }

    /// Do nothing at all.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "Idle".to_string(),
            description: "Never buys and never attacks".to_string(),
            build_order: Vec::new(),
            attack_at_ms: u64::MAX,
            regroup_below: 0,
            reserve_gold: u32::MAX,
            think_interval_ms: 1000,
        }
    }
}

/// A single item in a build order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOrderItem {
    /// Buy a unit; `None` buys the match's default kind.
    Unit(Option<String>),
    /// Wait until holding this much gold.
    WaitForGold(u32),
    /// Wait until this many units are alive.
    WaitForUnits(usize),
    /// Wait until this match time, in milliseconds.
    WaitForTime(u64),
}

/// Tactical decision types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacticalDecision {
    /// Keep the current stance.
    Hold,
    /// Switch to attack.
    Attack,
    /// Switch to defense.
    Defend,
}

/// Runtime state for executing a strategy.
#[derive(Debug, Clone)]
pub struct StrategyExecutor {
    strategy: Strategy,
    build_queue: VecDeque<BuildOrderItem>,
    current_index: usize,
    next_think_ms: u64,
}

impl StrategyExecutor {
    /// Create a new executor for a strategy.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        let build_queue = strategy.build_order.iter().cloned().collect();
        Self {
            strategy,
            build_queue,
            current_index: 0,
            next_think_ms: 0,
        }
    }

    /// Get the strategy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.strategy.name
    }

    /// Get build order progress as a fraction.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.strategy.build_order.is_empty() {
            1.0
        } else {
            self.current_index as f64 / self.strategy.build_order.len() as f64
        }
    }

    /// Pop the next purchase if its wait conditions hold and it is affordable.
    ///
    /// Returns the unit type id to buy (`None` = default kind).
    pub fn next_purchase(
        &mut self,
        elapsed_ms: u64,
        gold: u32,
        units: usize,
        default_cost: u32,
    ) -> Option<Option<String>> {
        loop {
            let Some(item) = self.build_queue.front() else {
                // Build order done: keep buying above the reserve.
                let budget = gold.saturating_sub(self.strategy.reserve_gold);
                return (budget >= default_cost).then_some(None);
            };

            let ready = match item {
                BuildOrderItem::WaitForGold(amount) => gold >= *amount,
                BuildOrderItem::WaitForUnits(count) => units >= *count,
                BuildOrderItem::WaitForTime(at) => elapsed_ms >= *at,
                BuildOrderItem::Unit(kind) => {
                    let cost = kind
                        .as_deref()
                        .and_then(UnitKind::from_id)
                        .map_or(default_cost, |k| k.stats().cost);
                    if gold < cost {
                        return None;
                    }
                    let kind = kind.clone();
                    self.build_queue.pop_front();
                    self.current_index += 1;
                    return Some(kind);
                }
            };
            if !ready {
                return None;
            }
            self.build_queue.pop_front();
            self.current_index += 1;
        }
    }

    /// Decide a stance change from time and army size.
    #[must_use]
    pub fn decide_action(
        &self,
        elapsed_ms: u64,
        own_units: usize,
        own_strength: u64,
        enemy_strength: u64,
    ) -> TacticalDecision {
        if own_units < self.strategy.regroup_below {
            return TacticalDecision::Defend;
        }
        if elapsed_ms >= self.strategy.attack_at_ms && own_units > 0 {
            return TacticalDecision::Attack;
        }
        if own_strength > enemy_strength.saturating_mul(2) && own_units > 0 {
            return TacticalDecision::Attack;
        }
        TacticalDecision::Hold
    }

    /// Whether the next decision is due at `elapsed_ms`.
    #[must_use]
    pub fn is_due(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.next_think_ms
    }

    /// Commands for `seat` after looking at the match.
    ///
    /// Only acts once per think interval of match time.
    pub fn decide(&mut self, view: &MatchView, seat: PlayerId, elapsed_ms: u64) -> Vec<MatchCommand> {
        if view.ended || !self.is_due(elapsed_ms) {
            return Vec::new();
        }
        self.next_think_ms = elapsed_ms + self.strategy.think_interval_ms;

        let Some(me) = view.player(seat) else {
            return Vec::new();
        };
        let mut commands = Vec::new();

        let default_cost = UnitKind::default_for(view.combat).stats().cost;
        if let Some(kind) = self.next_purchase(elapsed_ms, me.gold, me.alive, default_cost) {
            commands.push(MatchCommand::Spawn { player: seat, kind });
        }

        let enemy = me.team.opponent();
        let stance = match self.decide_action(
            elapsed_ms,
            me.alive,
            view.strength(me.team),
            view.strength(enemy),
        ) {
            TacticalDecision::Hold => None,
            TacticalDecision::Attack => Some(Stance::Attack),
            TacticalDecision::Defend => Some(Stance::Defense),
        };
        if let Some(stance) = stance.filter(|&s| s != me.stance) {
            commands.push(MatchCommand::SetStance { player: seat, stance });
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy() {
        let strategy = Strategy::default();
        assert_eq!(strategy.name, "Balanced");
        assert!(!strategy.build_order.is_empty());
    }

    #[test]
    fn test_presets() {
        for name in Strategy::PRESETS {
            assert!(Strategy::preset(name).is_ok(), "{name}");
        }
        assert!(matches!(
            Strategy::preset("zerg"),
            Err(StrategyError::Unknown(_))
        ));
    }

    #[test]
    fn test_build_order_waits() {
        let mut executor = StrategyExecutor::new(Strategy::turtle());
        assert_eq!(executor.next_purchase(0, 100, 0, 10), Some(None));
        assert_eq!(executor.next_purchase(0, 100, 1, 10), Some(None));
        // waiting for the clock
        assert_eq!(executor.next_purchase(1000, 100, 2, 10), None);
        assert_eq!(executor.next_purchase(60_000, 100, 2, 10), Some(None));
        assert!((executor.progress() - 1.0).abs() < f64::EPSILON);
        // reserve of 40 kept back afterwards
        assert_eq!(executor.next_purchase(60_000, 45, 3, 10), None);
        assert_eq!(executor.next_purchase(60_000, 50, 3, 10), Some(None));
    }

    #[test]
    fn test_unaffordable_item_stays_queued() {
        let mut executor = StrategyExecutor::new(Strategy {
            build_order: vec![BuildOrderItem::Unit(Some("artillery".into()))],
            ..Strategy::default()
        });
        assert_eq!(executor.next_purchase(0, 20, 0, 10), None);
        assert_eq!(
            executor.next_purchase(0, 40, 0, 10),
            Some(Some("artillery".to_string()))
        );
    }

    #[test]
    fn test_decide_action() {
        let executor = StrategyExecutor::new(Strategy::default());
        assert_eq!(executor.decide_action(0, 1, 10, 0), TacticalDecision::Defend);
        assert_eq!(executor.decide_action(0, 5, 100, 60), TacticalDecision::Hold);
        assert_eq!(executor.decide_action(0, 5, 130, 60), TacticalDecision::Attack);
        assert_eq!(executor.decide_action(120_000, 5, 10, 60), TacticalDecision::Attack);
    }

    #[test]
    fn test_strategy_from_ron() {
        let strategy = Strategy::from_ron_str(
            r#"(
                name: "Wall",
                description: "two units then wait",
                build_order: [Unit(None), Unit(Some("rifleman")), WaitForGold(50)],
                attack_at_ms: 300000,
                regroup_below: 2,
                reserve_gold: 10,
                think_interval_ms: 750,
            )"#,
        )
        .unwrap();
        assert_eq!(strategy.build_order.len(), 3);
        assert_eq!(strategy.think_interval_ms, 750);
    }
}
