//! Read-only snapshot for the presentation layer.
//!
//! Positions are converted to `f32` here and never flow back into the
//! simulation.

use serde::Serialize;

use crate::combat::CombatPolicy;
use crate::player::{PlayerId, Stance};
use crate::simulation::MatchState;
use crate::team::Team;
use crate::unit::{UnitId, UnitOrder};
use crate::unit_kind::UnitKind;

/// A unit as drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Owner.
    pub owner: PlayerId,
    /// Team colour.
    pub team: Team,
    /// Type tag.
    pub kind: UnitKind,
    /// World X.
    pub x: f32,
    /// World Y.
    pub y: f32,
    /// Health or strength.
    pub health: u32,
    /// Current order.
    pub order: UnitOrder,
    /// Selection flag.
    pub selected: bool,
}

/// A player as shown in the HUD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    /// Player id.
    pub id: PlayerId,
    /// Name.
    pub name: String,
    /// Team.
    pub team: Team,
    /// Gold.
    pub gold: u32,
    /// Gold cap.
    pub gold_cap: u32,
    /// Stance.
    pub stance: Stance,
    /// Living units.
    pub alive: usize,
    /// Units spawned.
    pub created: u32,
    /// Units lost.
    pub lost: u32,
    /// Bot flag.
    pub bot: bool,
}

/// An objective marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveView {
    /// Name.
    pub name: String,
    /// World X.
    pub x: f32,
    /// World Y.
    pub y: f32,
    /// Capture radius.
    pub radius: f32,
    /// Owner.
    pub owner: Option<Team>,
}

/// Everything the presentation layer may read after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchView {
    /// Ticks simulated.
    pub tick: u64,
    /// Map id.
    pub map_id: Option<String>,
    /// Combat rule set.
    pub combat: CombatPolicy,
    /// Whole milliseconds left on the clock.
    pub remaining_ms: u64,
    /// Paused flag.
    pub paused: bool,
    /// Ended flag.
    pub ended: bool,
    /// Winner, once ended.
    pub winner: Option<Team>,
    /// Win reason, once ended.
    pub reason: Option<String>,
    /// Living units in spawn order.
    pub units: Vec<UnitView>,
    /// Players in seat order.
    pub players: Vec<PlayerView>,
    /// Objectives.
    pub objectives: Vec<ObjectiveView>,
}

impl MatchView {
    /// Snapshot a match.
    #[must_use]
    pub fn capture(state: &MatchState, paused: bool) -> Self {
        let roster = state.roster();
        let outcome = state.clock().outcome();
        Self {
            tick: state.tick(),
            map_id: state.map().map(|m| m.id.clone()),
            combat: state.combat(),
            remaining_ms: state.clock().remaining_ms().to_num::<u64>(),
            paused,
            ended: outcome.is_some(),
            winner: outcome.map(|o| o.winner),
            reason: outcome.map(|o| o.reason.clone()),
            units: roster
                .units()
                .iter()
                .map(|u| {
                    let [x, y] = u.position.to_f32_pair();
                    UnitView {
                        id: u.id,
                        owner: u.owner,
                        team: u.team,
                        kind: u.kind,
                        x,
                        y,
                        health: u.health,
                        order: u.order,
                        selected: u.selected,
                    }
                })
                .collect(),
            players: roster
                .players()
                .iter()
                .map(|p| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    team: p.team,
                    gold: p.economy.gold,
                    gold_cap: p.economy.gold_cap,
                    stance: p.stance,
                    alive: p.units.len(),
                    created: p.units_created,
                    lost: p.units_lost,
                    bot: p.is_bot(),
                })
                .collect(),
            objectives: state
                .objectives()
                .objectives()
                .iter()
                .map(|o| {
                    let [x, y] = o.position.to_f32_pair();
                    ObjectiveView {
                        name: o.name.clone(),
                        x,
                        y,
                        radius: o.radius.to_num::<f32>(),
                        owner: o.owner,
                    }
                })
                .collect(),
        }
    }

    /// Look up a player's HUD entry.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Total strength per team as shown in the HUD.
    #[must_use]
    pub fn strength(&self, team: Team) -> u64 {
        self.units
            .iter()
            .filter(|u| u.team == team)
            .map(|u| u64::from(u.health))
            .sum()
    }
}
