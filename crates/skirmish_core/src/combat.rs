//! Combat resolution.
//!
//! A match uses one of two rule sets, chosen at setup:
//!
//! - **Melee proximity**: opposing units that touch trade strength. The
//!   stronger survives with the difference, the weaker dies, equal units
//!   both die. Each unit fights at most once per tick and deaths are applied
//!   after the whole scan.
//! - **Ranged cooldown**: each unit shoots the nearest enemy inside its range
//!   whenever its cooldown has elapsed. Kills are removed at once, so later
//!   shooters in the same tick pick a new target.
//!
//! Both scans walk the roster in spawn order, which makes the first-spawned
//! unit win every ordering tie.

use serde::{Deserialize, Serialize};

use crate::events::DeathEffect;
use crate::math::Fixed;
use crate::roster::Roster;
use crate::unit::{UnitId, UnitOrder};

/// Which combat rule set a match uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPolicy {
    /// Strength trade on contact.
    #[default]
    MeleeProximity,
    /// Damage over range with per-kind cooldowns.
    RangedCooldown,
}

impl CombatPolicy {
    /// Parse from an identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "melee" | "melee_proximity" => Some(Self::MeleeProximity),
            "ranged" | "ranged_cooldown" => Some(Self::RangedCooldown),
            _ => None,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::MeleeProximity => "melee",
            Self::RangedCooldown => "ranged",
        }
    }
}

/// Run one combat pass under `policy`.
///
/// `collision_distance` only applies to melee; `now_ms` only to ranged.
pub fn resolve(
    policy: CombatPolicy,
    roster: &mut Roster,
    collision_distance: Fixed,
    now_ms: Fixed,
) -> Vec<DeathEffect> {
    match policy {
        CombatPolicy::MeleeProximity => resolve_melee(roster, collision_distance),
        CombatPolicy::RangedCooldown => resolve_ranged(roster, now_ms),
    }
}

/// Melee pass. Returns the removed units in removal order.
pub fn resolve_melee(roster: &mut Roster, collision_distance: Fixed) -> Vec<DeathEffect> {
    let reach_sq = collision_distance.saturating_mul(collision_distance);
    let units = roster.units_mut();
    let mut matched = vec![false; units.len()];
    let mut doomed: Vec<UnitId> = Vec::new();

    for i in 0..units.len() {
        if matched[i] {
            continue;
        }
        for j in (i + 1)..units.len() {
            if matched[j] || units[i].team == units[j].team {
                continue;
            }
            if units[i].position.distance_squared(units[j].position) > reach_sq {
                continue;
            }

            let (a, b) = (units[i].health, units[j].health);
            if a > b {
                units[i].health = a - b;
                units[i].order = UnitOrder::Attacking;
                doomed.push(units[j].id);
            } else if b > a {
                units[j].health = b - a;
                units[j].order = UnitOrder::Attacking;
                doomed.push(units[i].id);
            } else {
                doomed.push(units[i].id);
                doomed.push(units[j].id);
            }
            matched[i] = true;
            matched[j] = true;
            break;
        }
    }

    doomed
        .into_iter()
        .filter_map(|id| roster.remove_unit(id))
        .collect()
}

/// Ranged pass at match time `now_ms`. Returns the removed units in kill order.
pub fn resolve_ranged(roster: &mut Roster, now_ms: Fixed) -> Vec<DeathEffect> {
    let shooters: Vec<UnitId> = roster.units().iter().map(|u| u.id).collect();
    let mut deaths = Vec::new();

    for shooter in shooters {
        let Some(unit) = roster.unit(shooter) else {
            continue;
        };
        if !unit.can_attack(now_ms) {
            continue;
        }
        let stats = unit.kind.stats();
        let Some(target) = roster
            .nearest_enemy(unit.position, unit.team, Some(stats.range))
            .map(|t| t.id)
        else {
            continue;
        };

        if let Some(unit) = roster.unit_mut(shooter) {
            unit.last_attack_ms = Some(now_ms);
            unit.order = UnitOrder::Attacking;
        }
        let killed = roster.unit_mut(target).is_some_and(|victim| {
            victim.health = victim.health.saturating_sub(stats.damage);
            victim.health == 0
        });
        if killed {
            deaths.extend(roster.remove_unit(target));
        }
    }
    deaths
}
