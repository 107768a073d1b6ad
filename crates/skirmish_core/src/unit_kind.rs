//! Unit types and their stats table.
//!
//! Every unit carries a [`UnitKind`] tag; behavior dispatches on the tag and
//! looks numbers up in a single static table instead of comparing strings.
//!
//! # Example
//!
//! ```
//! use skirmish_core::unit_kind::UnitKind;
//!
//! let kind = UnitKind::from_id("artillery").unwrap();
//! assert_eq!(kind.stats().cost, 40);
//! assert!(UnitKind::from_id("dragoon").is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::combat::CombatPolicy;
use crate::math::{fixed_int, Fixed};

/// Per-kind combat and movement numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Gold cost to spawn.
    pub cost: u32,
    /// Starting health. Melee matches roll a random strength for `Plain` instead.
    pub health: u32,
    /// Damage per attack under the ranged policy.
    pub damage: u32,
    /// Attack range in world units under the ranged policy.
    pub range: Fixed,
    /// Movement speed in world units per second.
    pub speed: Fixed,
    /// Minimum time between attacks, in milliseconds.
    pub cooldown_ms: u32,
}

/// Type tag for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Untyped infantry whose only stat is strength (melee matches).
    Plain,
    /// Line infantry with a medium-range rifle.
    Rifleman,
    /// Slow-firing infantry with a heavy short-range hit.
    Grenadier,
    /// Fast, tough melee rider.
    Cavalry,
    /// Fragile long-range gun.
    Artillery,
}

const PLAIN: UnitStats = UnitStats {
    cost: 10,
    health: 50,
    damage: 10,
    range: fixed_int(24),
    speed: fixed_int(120),
    cooldown_ms: 1000,
};

const RIFLEMAN: UnitStats = UnitStats {
    cost: 10,
    health: 60,
    damage: 12,
    range: fixed_int(140),
    speed: fixed_int(110),
    cooldown_ms: 1000,
};

const GRENADIER: UnitStats = UnitStats {
    cost: 20,
    health: 80,
    damage: 30,
    range: fixed_int(110),
    speed: fixed_int(95),
    cooldown_ms: 2200,
};

const CAVALRY: UnitStats = UnitStats {
    cost: 25,
    health: 120,
    damage: 18,
    range: fixed_int(30),
    speed: fixed_int(190),
    cooldown_ms: 800,
};

const ARTILLERY: UnitStats = UnitStats {
    cost: 40,
    health: 70,
    damage: 55,
    range: fixed_int(320),
    speed: fixed_int(60),
    cooldown_ms: 4000,
};

/// Inclusive range of the random strength rolled for melee `Plain` units.
pub const PLAIN_STRENGTH_RANGE: (u32, u32) = (1, 99);

impl UnitKind {
    /// Every kind, cheapest first (ties broken by declaration order).
    pub const ALL: [UnitKind; 5] = [
        UnitKind::Plain,
        UnitKind::Rifleman,
        UnitKind::Grenadier,
        UnitKind::Cavalry,
        UnitKind::Artillery,
    ];

    /// Kinds that ranged matches field.
    pub const TYPED: [UnitKind; 4] = [
        UnitKind::Rifleman,
        UnitKind::Grenadier,
        UnitKind::Cavalry,
        UnitKind::Artillery,
    ];

    /// Stats for this kind.
    #[must_use]
    pub const fn stats(self) -> &'static UnitStats {
        match self {
            Self::Plain => &PLAIN,
            Self::Rifleman => &RIFLEMAN,
            Self::Grenadier => &GRENADIER,
            Self::Cavalry => &CAVALRY,
            Self::Artillery => &ARTILLERY,
        }
    }

    /// Stable string identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Rifleman => "rifleman",
            Self::Grenadier => "grenadier",
            Self::Cavalry => "cavalry",
            Self::Artillery => "artillery",
        }
    }

    /// Look a kind up by identifier. Accepts the plural spellings used by the
    /// account service (`"riflemen"`) and the legacy `"infantry"` alias.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "plain" | "infantry" => Some(Self::Plain),
            "rifleman" | "riflemen" => Some(Self::Rifleman),
            "grenadier" | "grenadiers" => Some(Self::Grenadier),
            "cavalry" => Some(Self::Cavalry),
            "artillery" => Some(Self::Artillery),
            _ => None,
        }
    }

    /// Kinds that can be spawned under a combat policy.
    #[must_use]
    pub const fn available(policy: CombatPolicy) -> &'static [UnitKind] {
        match policy {
            CombatPolicy::MeleeProximity => &[UnitKind::Plain],
            CombatPolicy::RangedCooldown => &Self::TYPED,
        }
    }

    /// Kind used when a spawn request names no type.
    #[must_use]
    pub const fn default_for(policy: CombatPolicy) -> Self {
        match policy {
            CombatPolicy::MeleeProximity => Self::Plain,
            CombatPolicy::RangedCooldown => Self::Rifleman,
        }
    }

    /// Cheapest unit cost under a policy; a team that cannot pay this cannot rebuild.
    #[must_use]
    pub fn min_cost(policy: CombatPolicy) -> u32 {
        Self::available(policy)
            .iter()
            .map(|kind| kind.stats().cost)
            .min()
            .unwrap_or(0)
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for kind in UnitKind::ALL {
            assert_eq!(UnitKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(UnitKind::from_id("riflemen"), Some(UnitKind::Rifleman));
        assert_eq!(UnitKind::from_id(""), None);
    }

    #[test]
    fn test_available_kinds_per_policy() {
        assert_eq!(
            UnitKind::available(CombatPolicy::MeleeProximity),
            &[UnitKind::Plain]
        );
        assert!(!UnitKind::available(CombatPolicy::RangedCooldown).contains(&UnitKind::Plain));
    }

    #[test]
    fn test_min_cost() {
        assert_eq!(UnitKind::min_cost(CombatPolicy::MeleeProximity), 10);
        assert_eq!(UnitKind::min_cost(CombatPolicy::RangedCooldown), 10);
    }

    #[test]
    fn test_all_is_sorted_by_cost() {
        let costs: Vec<u32> = UnitKind::ALL.iter().map(|k| k.stats().cost).collect();
        let mut sorted = costs.clone();
        sorted.sort_unstable();
        assert_eq!(costs, sorted);
    }

    #[test]
    fn test_plain_speed() {
        assert_eq!(UnitKind::Plain.stats().speed, Fixed::from_num(120));
    }
}
