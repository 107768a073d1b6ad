//! Combatant units and straight-line movement.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed, MILLIS_PER_SECOND};
use crate::player::PlayerId;
use crate::team::Team;
use crate::unit_kind::UnitKind;

/// Unique identifier for units. Never reused within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Remaining distance under which a unit counts as arrived.
pub fn arrival_epsilon() -> Fixed {
    Fixed::from_num(1) / Fixed::from_num(100)
}

/// What a unit was last told to do. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOrder {
    /// Standing at its spawn point.
    #[default]
    Idle,
    /// Moving to a manually chosen point.
    Moving,
    /// Holding a defensive ring.
    Defending,
    /// Closing on an enemy.
    Attacking,
}

/// A single combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Owning player (weak back-reference into the player arena).
    pub owner: PlayerId,
    /// Copy of the owner's team.
    pub team: Team,
    /// Type tag.
    pub kind: UnitKind,
    /// World position.
    pub position: Vec2Fixed,
    /// Where the unit is heading.
    pub target: Vec2Fixed,
    /// Health. Doubles as strength in melee matches.
    pub health: u32,
    /// Match time of the last ranged attack, in milliseconds.
    #[serde(default, with = "option_millis")]
    pub last_attack_ms: Option<Fixed>,
    /// Last order, for display.
    pub order: UnitOrder,
    /// Selected by the human player's UI.
    pub selected: bool,
}

impl Unit {
    /// Create a unit standing still at `position`.
    #[must_use]
    pub fn new(
        id: UnitId,
        owner: PlayerId,
        team: Team,
        kind: UnitKind,
        position: Vec2Fixed,
        health: u32,
    ) -> Self {
        Self {
            id,
            owner,
            team,
            kind,
            position,
            target: position,
            health,
            last_attack_ms: None,
            order: UnitOrder::Idle,
            selected: false,
        }
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub fn speed(&self) -> Fixed {
        self.kind.stats().speed
    }

    /// Set a new destination.
    pub fn move_to(&mut self, target: Vec2Fixed, order: UnitOrder) {
        self.target = target;
        self.order = order;
    }

    /// Whether the unit has reached its target.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.position.distance(self.target) < arrival_epsilon()
    }

    /// Move toward the target for `dt` seconds.
    ///
    /// Snaps exactly onto the target when the remaining distance fits in
    /// this step, so repeated calls converge without overshoot.
    pub fn advance(&mut self, dt: Fixed) {
        let offset = self.target - self.position;
        let distance = offset.length();
        if distance < arrival_epsilon() {
            return;
        }

        let step = self.speed() * dt;
        if distance <= step {
            self.position = self.target;
            return;
        }

        // Multiply before dividing to keep axis-aligned moves exact.
        let delta = Vec2Fixed::new(offset.x * step / distance, offset.y * step / distance);
        self.position = self.position + delta;
    }

    /// Whether the ranged cooldown has elapsed at match time `now_ms`.
    #[must_use]
    pub fn can_attack(&self, now_ms: Fixed) -> bool {
        match self.last_attack_ms {
            None => true,
            Some(last) => now_ms - last >= Fixed::from_num(self.kind.stats().cooldown_ms),
        }
    }
}

/// Convert a frame delta in seconds to milliseconds.
#[must_use]
pub fn seconds_to_millis(dt: Fixed) -> Fixed {
    dt * MILLIS_PER_SECOND
}

/// Serde support for the optional attack timestamp.
mod option_millis {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(Fixed::to_bits).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Fixed::from_bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(x: i32, y: i32) -> Unit {
        Unit::new(
            UnitId(1),
            PlayerId(0),
            Team::Blue,
            UnitKind::Plain,
            Vec2Fixed::from_ints(x, y),
            10,
        )
    }

    #[test]
    fn test_advance_moves_by_speed() {
        let mut unit = unit_at(0, 0);
        unit.move_to(Vec2Fixed::from_ints(1000, 0), UnitOrder::Moving);
        // 120 units/s for half a second
        unit.advance(Fixed::from_num(0.5));
        assert_eq!(unit.position, Vec2Fixed::from_ints(60, 0));
    }

    #[test]
    fn test_advance_snaps_to_target() {
        let mut unit = unit_at(0, 0);
        unit.move_to(Vec2Fixed::from_ints(3, 4), UnitOrder::Moving);
        unit.advance(Fixed::from_num(0.05)); // step 6 > distance 5
        assert_eq!(unit.position, Vec2Fixed::from_ints(3, 4));
        assert!(unit.has_arrived());
    }

    #[test]
    fn test_advance_ignores_tiny_offsets() {
        let mut unit = unit_at(0, 0);
        let target = Vec2Fixed::new(Fixed::from_num(1) / Fixed::from_num(1000), Fixed::ZERO);
        unit.move_to(target, UnitOrder::Moving);
        unit.advance(Fixed::from_num(0.016));
        assert_eq!(unit.position, Vec2Fixed::ZERO);
        assert!(unit.has_arrived());
    }

    #[test]
    fn test_cooldown_gate() {
        let mut unit = unit_at(0, 0);
        assert!(unit.can_attack(Fixed::ZERO));
        unit.last_attack_ms = Some(Fixed::from_num(500));
        assert!(!unit.can_attack(Fixed::from_num(1499)));
        assert!(unit.can_attack(Fixed::from_num(1500)));
    }
}
