//! Unit creation.
//!
//! [`Spawner`] borrows the match configuration and map and performs every
//! check a spawn request must pass before touching the roster:
//!
//! 1. kind available under the match's combat policy (silent refusal)
//! 2. match-wide unit cap
//! 3. per-player unit cap
//! 4. unit cost, unless the request skips it
//!
//! A refused request leaves gold and both rosters untouched.

use crate::combat::CombatPolicy;
use crate::config::GameplayConfig;
use crate::error::SpawnError;
use crate::map::WorldMap;
use crate::math::Vec2Fixed;
use crate::player::{PlayerId, Stance};
use crate::rng::SimRng;
use crate::roster::Roster;
use crate::team::Team;
use crate::unit::UnitId;
use crate::unit_kind::{UnitKind, PLAIN_STRENGTH_RANGE};

/// Per-request spawn overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Do not charge the unit cost (starting armies).
    pub skip_cost: bool,
    /// Fixed health/strength instead of the rolled or table value.
    pub strength: Option<u32>,
    /// Exact position instead of the jittered spawn point.
    pub position: Option<Vec2Fixed>,
}

impl SpawnOptions {
    /// Free spawn at the spawn point.
    #[must_use]
    pub const fn free() -> Self {
        Self {
            skip_cost: true,
            strength: None,
            position: None,
        }
    }

    /// Free spawn with fixed strength at an exact point.
    #[must_use]
    pub const fn placed(position: Vec2Fixed, strength: u32) -> Self {
        Self {
            skip_cost: true,
            strength: Some(strength),
            position: Some(position),
        }
    }
}

/// Resolve a requested unit type id.
///
/// `None` or an empty id selects the policy's default kind.
pub fn resolve_kind(id: Option<&str>, policy: CombatPolicy) -> Result<UnitKind, SpawnError> {
    let Some(id) = id.filter(|id| !id.trim().is_empty()) else {
        return Ok(UnitKind::default_for(policy));
    };
    let kind = UnitKind::from_id(id).ok_or_else(|| SpawnError::UnknownKind(id.to_string()))?;
    if UnitKind::available(policy).contains(&kind) {
        Ok(kind)
    } else {
        Err(SpawnError::Unavailable(kind.id()))
    }
}

/// Creates units for players.
#[derive(Debug, Clone, Copy)]
pub struct Spawner<'a> {
    config: &'a GameplayConfig,
    policy: CombatPolicy,
    map: Option<&'a WorldMap>,
}

impl<'a> Spawner<'a> {
    /// Create a spawner for a match.
    #[must_use]
    pub const fn new(
        config: &'a GameplayConfig,
        policy: CombatPolicy,
        map: Option<&'a WorldMap>,
    ) -> Self {
        Self {
            config,
            policy,
            map,
        }
    }

    /// Combat policy of the match.
    #[must_use]
    pub const fn policy(&self) -> CombatPolicy {
        self.policy
    }

    /// Base spawn point for a team, before jitter.
    #[must_use]
    pub fn spawn_point(&self, team: Team) -> Vec2Fixed {
        self.map
            .map_or_else(|| self.config.fallback_spawn(), |map| map.spawn(team))
    }

    /// Spawn one unit for `player`.
    ///
    /// `kind = None` spawns the policy's default kind.
    pub fn spawn(
        &self,
        roster: &mut Roster,
        rng: &mut SimRng,
        player: PlayerId,
        kind: Option<UnitKind>,
        options: SpawnOptions,
    ) -> Result<UnitId, SpawnError> {
        let kind = kind.unwrap_or_else(|| UnitKind::default_for(self.policy));
        if !UnitKind::available(self.policy).contains(&kind) {
            return Err(SpawnError::Unavailable(kind.id()));
        }

        if roster.len() >= self.config.max_total_units {
            return Err(SpawnError::GlobalCap {
                limit: self.config.max_total_units,
            });
        }

        let owner = roster
            .player_mut(player)
            .ok_or(SpawnError::UnknownPlayer(player))?;
        if owner.units.len() >= self.config.max_units_per_player {
            return Err(SpawnError::PlayerCap {
                name: owner.name.clone(),
                limit: self.config.max_units_per_player,
            });
        }
        if !options.skip_cost {
            owner.economy.spend(kind.stats().cost)?;
        }
        let team = owner.team;

        let position = options.position.unwrap_or_else(|| {
            let origin = self.spawn_point(team);
            let span = self.config.spawn_jitter();
            let dx = rng.jitter(span);
            let dy = rng.jitter(span);
            Vec2Fixed::new(origin.x + dx, origin.y + dy)
        });
        let health = options.strength.unwrap_or_else(|| match kind {
            UnitKind::Plain => rng.range_inclusive(PLAIN_STRENGTH_RANGE.0, PLAIN_STRENGTH_RANGE.1),
            _ => kind.stats().health,
        });

        let id = roster
            .insert(player, kind, position, health)
            .ok_or(SpawnError::UnknownPlayer(player))?;
        tracing::trace!(unit = %id, %player, %kind, health, "Unit spawned");
        Ok(id)
    }

    /// Reset rosters and stances, then hand out the free starting armies.
    pub fn spawn_initial_armies(&self, roster: &mut Roster, rng: &mut SimRng) -> Vec<UnitId> {
        roster.clear_units();
        for player in roster.players_mut() {
            player.stance = Stance::Defense;
        }

        let mut spawned = Vec::new();
        let seats: Vec<PlayerId> = roster.players().iter().map(|p| p.id).collect();
        for player in seats {
            for _ in 0..self.config.initial_army_size {
                match self.spawn(roster, rng, player, None, SpawnOptions::free()) {
                    Ok(id) => spawned.push(id),
                    Err(err) => {
                        tracing::debug!(%player, error = %err, "Starting army cut short");
                        break;
                    }
                }
            }
        }
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::PlayerEconomy;
    use crate::error::EconomyError;
    use crate::math::Fixed;
    use crate::player::{Controller, Player};

    fn roster(gold: u32) -> Roster {
        Roster::new(vec![
            Player::new(
                PlayerId(0),
                "Commander",
                Team::Blue,
                PlayerEconomy::new(gold, 100),
                Controller::Human,
            ),
            Player::new(
                PlayerId(1),
                "Marshal Bot",
                Team::Red,
                PlayerEconomy::new(gold, 100),
                Controller::Bot { mirror: None },
            ),
        ])
    }

    #[test]
    fn test_spawn_charges_cost_and_jitters() {
        let config = GameplayConfig::default();
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut roster = roster(100);
        let mut rng = SimRng::new(1);

        let id = spawner
            .spawn(&mut roster, &mut rng, PlayerId(0), None, SpawnOptions::default())
            .unwrap();
        let unit = roster.unit(id).unwrap();
        assert_eq!(roster.players()[0].economy.gold, 90);
        assert_eq!(unit.kind, UnitKind::Plain);
        assert!((1..=99).contains(&unit.health));
        let origin = Vec2Fixed::from_ints(300, 300);
        assert!((unit.position.x - origin.x).abs() <= Fixed::from_num(25));
        assert!((unit.position.y - origin.y).abs() <= Fixed::from_num(25));
    }

    #[test]
    fn test_spawn_refused_without_gold() {
        let config = GameplayConfig::default();
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut roster = roster(5);
        let mut rng = SimRng::new(1);

        let err = spawner
            .spawn(&mut roster, &mut rng, PlayerId(0), None, SpawnOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            SpawnError::Economy(EconomyError::InsufficientGold {
                needed: 10,
                available: 5
            })
        );
        assert!(roster.is_empty());
        assert_eq!(roster.players()[0].economy.gold, 5);
    }

    #[test]
    fn test_player_cap() {
        let config = GameplayConfig {
            max_units_per_player: 2,
            ..GameplayConfig::default()
        };
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut roster = roster(100);
        let mut rng = SimRng::new(1);
        for _ in 0..2 {
            spawner
                .spawn(&mut roster, &mut rng, PlayerId(1), None, SpawnOptions::free())
                .unwrap();
        }
        let err = spawner
            .spawn(&mut roster, &mut rng, PlayerId(1), None, SpawnOptions::free())
            .unwrap_err();
        assert_eq!(err.to_string(), "Marshal Bot reached max units");
    }

    #[test]
    fn test_global_cap() {
        let config = GameplayConfig {
            max_total_units: 3,
            ..GameplayConfig::default()
        };
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut roster = roster(100);
        let mut rng = SimRng::new(1);
        for seat in [0, 1, 0] {
            spawner
                .spawn(&mut roster, &mut rng, PlayerId(seat), None, SpawnOptions::free())
                .unwrap();
        }
        let err = spawner
            .spawn(&mut roster, &mut rng, PlayerId(1), None, SpawnOptions::free())
            .unwrap_err();
        assert_eq!(err, SpawnError::GlobalCap { limit: 3 });
    }

    #[test]
    fn test_unavailable_kind_is_silent() {
        let config = GameplayConfig::default();
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut roster = roster(100);
        let mut rng = SimRng::new(1);
        let err = spawner
            .spawn(
                &mut roster,
                &mut rng,
                PlayerId(0),
                Some(UnitKind::Artillery),
                SpawnOptions::default(),
            )
            .unwrap_err();
        assert!(!err.is_user_visible());
        assert_eq!(roster.players()[0].economy.gold, 100);
    }

    #[test]
    fn test_resolve_kind() {
        assert_eq!(
            resolve_kind(None, CombatPolicy::RangedCooldown),
            Ok(UnitKind::Rifleman)
        );
        assert_eq!(
            resolve_kind(Some("grenadiers"), CombatPolicy::RangedCooldown),
            Ok(UnitKind::Grenadier)
        );
        assert_eq!(
            resolve_kind(Some("dragoon"), CombatPolicy::RangedCooldown),
            Err(SpawnError::UnknownKind("dragoon".into()))
        );
        assert_eq!(
            resolve_kind(Some("cavalry"), CombatPolicy::MeleeProximity),
            Err(SpawnError::Unavailable("cavalry"))
        );
    }

    #[test]
    fn test_initial_armies_are_free() {
        let config = GameplayConfig {
            initial_army_size: 3,
            ..GameplayConfig::default()
        };
        let spawner = Spawner::new(&config, CombatPolicy::RangedCooldown, None);
        let mut roster = roster(0);
        roster.players_mut()[0].stance = Stance::Attack;
        let mut rng = SimRng::new(1);

        let spawned = spawner.spawn_initial_armies(&mut roster, &mut rng);
        assert_eq!(spawned.len(), 6);
        assert_eq!(roster.players()[0].stance, Stance::Defense);
        assert!(roster.players().iter().all(|p| p.economy.gold == 0));
        assert!(roster
            .units()
            .iter()
            .all(|u| u.kind == UnitKind::Rifleman && u.health == 60));
    }
}
