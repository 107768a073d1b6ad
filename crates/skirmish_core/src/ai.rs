//! Rule-based bot AI and formation movement.
//!
//! Two timers run independently of the frame rate:
//!
//! - the **think** timer (per-difficulty interval) lets every bot buy a unit
//!   and pick a stance;
//! - the **formation** timer re-targets every player's units, human
//!   included, according to their stance.
//!
//! Both timers reset to zero when they fire. A long frame fires them at most
//! once.

use serde::{Deserialize, Serialize};

use crate::config::{BotBehavior, BotProfile, SpawnPick};
use crate::math::{fixed_serde, Fixed, Vec2Fixed, TAU};
use crate::player::{Controller, PlayerId, Stance};
use crate::rng::SimRng;
use crate::roster::Roster;
use crate::spawner::{SpawnOptions, Spawner};
use crate::team::Team;
use crate::unit::{UnitId, UnitOrder};
use crate::unit_kind::UnitKind;

/// Drives bot players and formations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiController {
    profile: BotProfile,
    formation_interval_ms: u32,
    #[serde(with = "fixed_serde")]
    formation_radius: Fixed,
    #[serde(with = "fixed_serde")]
    think_accumulator_ms: Fixed,
    #[serde(with = "fixed_serde")]
    formation_accumulator_ms: Fixed,
}

impl AiController {
    /// Create a controller with empty timers.
    #[must_use]
    pub fn new(profile: BotProfile, formation_interval_ms: u32, formation_radius: Fixed) -> Self {
        Self {
            profile,
            formation_interval_ms,
            formation_radius,
            think_accumulator_ms: Fixed::ZERO,
            formation_accumulator_ms: Fixed::ZERO,
        }
    }

    /// Active bot profile.
    #[must_use]
    pub const fn profile(&self) -> &BotProfile {
        &self.profile
    }

    /// Advance both timers by `elapsed_ms` and run whatever fires.
    ///
    /// Returns the units bots spawned.
    pub fn update(
        &mut self,
        elapsed_ms: Fixed,
        roster: &mut Roster,
        rng: &mut SimRng,
        spawner: &Spawner<'_>,
    ) -> Vec<UnitId> {
        self.think_accumulator_ms += elapsed_ms;
        self.formation_accumulator_ms += elapsed_ms;

        let mut spawned = Vec::new();
        if self.think_accumulator_ms >= Fixed::saturating_from_num(self.profile.think_interval_ms) {
            let bots: Vec<PlayerId> = roster
                .players()
                .iter()
                .filter(|p| p.is_bot())
                .map(|p| p.id)
                .collect();
            for bot in bots {
                spawned.extend(self.think(bot, roster, rng, spawner));
            }
            self.think_accumulator_ms = Fixed::ZERO;
        }

        if self.formation_accumulator_ms >= Fixed::saturating_from_num(self.formation_interval_ms) {
            let seats: Vec<PlayerId> = roster.players().iter().map(|p| p.id).collect();
            for player in seats {
                apply_formation(roster, player, self.formation_radius);
            }
            self.formation_accumulator_ms = Fixed::ZERO;
        }
        spawned
    }

    /// One decision cycle for a bot.
    fn think(
        &self,
        bot: PlayerId,
        roster: &mut Roster,
        rng: &mut SimRng,
        spawner: &Spawner<'_>,
    ) -> Option<UnitId> {
        let (team, gold, current, mirror) = {
            let player = roster.player(bot)?;
            (player.team, player.economy.gold, player.stance, player.mirror())
        };

        let mut spawned = None;
        if let Some(kind) = self.pick_kind(spawner, gold, rng) {
            match spawner.spawn(roster, rng, bot, Some(kind), SpawnOptions::default()) {
                Ok(id) => spawned = Some(id),
                Err(err) => tracing::debug!(%bot, error = %err, "Bot spawn refused"),
            }
        }

        let own = roster.team_strength(team);
        let mut stance = match self.profile.behavior {
            BotBehavior::Passive => {
                if rng.chance(self.profile.stance_flip_percent) {
                    if rng.chance(50) {
                        Stance::Attack
                    } else {
                        Stance::Defense
                    }
                } else {
                    current
                }
            }
            BotBehavior::Adaptive => {
                let rival = human_team(roster).unwrap_or_else(|| team.opponent());
                attack_if(own > roster.team_strength(rival))
            }
            BotBehavior::Strategic => attack_if(own > roster.team_strength(team.opponent())),
            BotBehavior::Hunter => Stance::Attack,
        };
        if let Some(human) = mirror.and_then(|id| roster.player(id)) {
            stance = human.stance;
        }

        if let Some(player) = roster.player_mut(bot) {
            if player.stance != stance {
                tracing::debug!(%bot, stance = stance.label(), "Bot changed stance");
            }
            player.stance = stance;
        }
        if self.profile.behavior == BotBehavior::Hunter && stance == Stance::Attack {
            charge_nearest(roster, bot);
        }
        spawned
    }

    fn pick_kind(&self, spawner: &Spawner<'_>, gold: u32, rng: &mut SimRng) -> Option<UnitKind> {
        let affordable: Vec<UnitKind> = UnitKind::available(spawner.policy())
            .iter()
            .copied()
            .filter(|kind| kind.stats().cost <= gold)
            .collect();
        match self.profile.spawn_pick {
            SpawnPick::Cheapest => affordable.into_iter().min_by_key(|kind| kind.stats().cost),
            SpawnPick::RandomAffordable => {
                if affordable.is_empty() {
                    return None;
                }
                let index = rng.next_below(affordable.len() as u32) as usize;
                affordable.get(index).copied()
            }
        }
    }
}

const fn attack_if(stronger: bool) -> Stance {
    if stronger {
        Stance::Attack
    } else {
        Stance::Defense
    }
}

fn human_team(roster: &Roster) -> Option<Team> {
    roster
        .players()
        .iter()
        .find(|p| p.controller == Controller::Human)
        .map(|p| p.team)
}

/// Send every unit of `player` toward its nearest enemy.
///
/// Units keep their current target when no enemy is alive.
pub fn charge_nearest(roster: &mut Roster, player: PlayerId) {
    let targets: Vec<(UnitId, Vec2Fixed)> = roster
        .units_of(player)
        .filter_map(|unit| {
            roster
                .nearest_enemy(unit.position, unit.team, None)
                .map(|enemy| (unit.id, enemy.position))
        })
        .collect();
    for (id, target) in targets {
        if let Some(unit) = roster.unit_mut(id) {
            unit.move_to(target, UnitOrder::Attacking);
        }
    }
}

/// Re-target a player's units according to their stance.
///
/// Defense spreads unit `i` of `n` onto a ring of `radius` around the
/// group's centroid at angle `2π·i/n`. Attack sends each unit at its
/// nearest enemy.
pub fn apply_formation(roster: &mut Roster, player: PlayerId, radius: Fixed) {
    let Some(owner) = roster.player(player) else {
        return;
    };
    if owner.units.is_empty() {
        return;
    }
    let stance = owner.stance;
    let ids = owner.units.clone();

    match stance {
        Stance::Attack => charge_nearest(roster, player),
        Stance::Defense => {
            let Some(center) =
                Vec2Fixed::centroid(ids.iter().filter_map(|&id| roster.unit(id)).map(|u| u.position))
            else {
                return;
            };
            let count = Fixed::from_num(ids.len());
            for (index, id) in ids.into_iter().enumerate() {
                let angle = TAU * Fixed::from_num(index) / count;
                if let Some(unit) = roster.unit_mut(id) {
                    unit.move_to(center.on_circle(radius, angle), UnitOrder::Defending);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatPolicy;
    use crate::config::{Difficulty, GameplayConfig};
    use crate::economy::PlayerEconomy;
    use crate::player::Player;

    fn player(name: &str, team: Team, controller: Controller) -> Player {
        Player::new(
            PlayerId(0),
            name,
            team,
            PlayerEconomy::new(100, 100),
            controller,
        )
    }

    fn controller(config: &GameplayConfig, difficulty: Difficulty) -> AiController {
        AiController::new(
            *config.difficulties.profile(difficulty),
            config.formation_interval_ms,
            config.formation_radius(),
        )
    }

    fn close(a: Vec2Fixed, b: Vec2Fixed) -> bool {
        a.distance(b) < Fixed::from_num(0.001)
    }

    #[test]
    fn test_defense_ring_geometry() {
        let mut roster = Roster::new(vec![player("blue", Team::Blue, Controller::Human)]);
        for (x, y) in [(0, 0), (100, 0), (100, 100), (0, 100)] {
            roster.insert(PlayerId(0), UnitKind::Plain, Vec2Fixed::from_ints(x, y), 10);
        }

        apply_formation(&mut roster, PlayerId(0), Fixed::from_num(30));
        let targets: Vec<Vec2Fixed> = roster.units().iter().map(|u| u.target).collect();
        assert!(close(targets[0], Vec2Fixed::from_ints(80, 50)));
        assert!(close(targets[1], Vec2Fixed::from_ints(50, 80)));
        assert!(close(targets[2], Vec2Fixed::from_ints(20, 50)));
        assert!(close(targets[3], Vec2Fixed::from_ints(50, 20)));
        assert!(roster
            .units()
            .iter()
            .all(|u| u.order == UnitOrder::Defending));
    }

    #[test]
    fn test_attack_targets_nearest_enemy() {
        let mut roster = Roster::new(vec![
            player("blue", Team::Blue, Controller::Human),
            player("red", Team::Red, Controller::Bot { mirror: None }),
        ]);
        let a = roster
            .insert(PlayerId(0), UnitKind::Plain, Vec2Fixed::from_ints(0, 0), 10)
            .unwrap();
        let b = roster
            .insert(PlayerId(0), UnitKind::Plain, Vec2Fixed::from_ints(1000, 0), 10)
            .unwrap();
        roster.insert(PlayerId(1), UnitKind::Plain, Vec2Fixed::from_ints(100, 0), 10);
        roster.insert(PlayerId(1), UnitKind::Plain, Vec2Fixed::from_ints(900, 0), 10);
        roster.players_mut()[0].stance = Stance::Attack;

        apply_formation(&mut roster, PlayerId(0), Fixed::from_num(30));
        assert_eq!(roster.unit(a).unwrap().target, Vec2Fixed::from_ints(100, 0));
        assert_eq!(roster.unit(b).unwrap().target, Vec2Fixed::from_ints(900, 0));
        assert_eq!(roster.unit(a).unwrap().order, UnitOrder::Attacking);
    }

    #[test]
    fn test_attack_without_enemies_keeps_target() {
        let mut roster = Roster::new(vec![player("blue", Team::Blue, Controller::Human)]);
        let id = roster
            .insert(PlayerId(0), UnitKind::Plain, Vec2Fixed::from_ints(5, 5), 10)
            .unwrap();
        roster.players_mut()[0].stance = Stance::Attack;
        apply_formation(&mut roster, PlayerId(0), Fixed::from_num(30));
        assert_eq!(roster.unit(id).unwrap().target, Vec2Fixed::from_ints(5, 5));
    }

    #[test]
    fn test_think_interval_gates_spawning() {
        let config = GameplayConfig::default();
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut ai = controller(&config, Difficulty::Medium);
        let mut roster = Roster::new(vec![
            player("blue", Team::Blue, Controller::Human),
            player("red", Team::Red, Controller::Bot { mirror: None }),
        ]);
        let mut rng = SimRng::new(5);

        assert!(ai
            .update(Fixed::from_num(2999), &mut roster, &mut rng, &spawner)
            .is_empty());
        let spawned = ai.update(Fixed::from_num(1), &mut roster, &mut rng, &spawner);
        assert_eq!(spawned.len(), 1);
        assert_eq!(roster.players()[1].economy.gold, 90);
        // timer reset, not carried over
        assert!(ai
            .update(Fixed::from_num(2999), &mut roster, &mut rng, &spawner)
            .is_empty());
    }

    #[test]
    fn test_adaptive_bot_attacks_when_stronger() {
        let config = GameplayConfig::default();
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut ai = controller(&config, Difficulty::Medium);
        let mut roster = Roster::new(vec![
            player("blue", Team::Blue, Controller::Human),
            player("red", Team::Red, Controller::Bot { mirror: None }),
        ]);
        roster.players_mut()[1].economy = PlayerEconomy::new(0, 100);
        roster.insert(PlayerId(1), UnitKind::Plain, Vec2Fixed::ZERO, 20);
        roster.insert(PlayerId(0), UnitKind::Plain, Vec2Fixed::from_ints(500, 0), 5);
        let mut rng = SimRng::new(5);

        ai.update(Fixed::from_num(3000), &mut roster, &mut rng, &spawner);
        assert_eq!(roster.players()[1].stance, Stance::Attack);
    }

    #[test]
    fn test_teammate_mirrors_human() {
        let config = GameplayConfig::default();
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut ai = controller(&config, Difficulty::Hard);
        let mut roster = Roster::new(vec![
            player("blue", Team::Blue, Controller::Human),
            player(
                "ally",
                Team::Blue,
                Controller::Bot {
                    mirror: Some(PlayerId(0)),
                },
            ),
            player("red", Team::Red, Controller::Bot { mirror: None }),
        ]);
        roster.players_mut()[0].stance = Stance::Attack;
        let mut rng = SimRng::new(5);

        ai.update(Fixed::from_num(200), &mut roster, &mut rng, &spawner);
        assert_eq!(roster.players()[1].stance, Stance::Attack);
    }

    #[test]
    fn test_hunter_charges_immediately() {
        let mut config = GameplayConfig::default();
        config.difficulties.easy.behavior = BotBehavior::Hunter;
        let spawner = Spawner::new(&config, CombatPolicy::MeleeProximity, None);
        let mut ai = controller(&config, Difficulty::Easy);
        let mut roster = Roster::new(vec![
            player("blue", Team::Blue, Controller::Human),
            player("red", Team::Red, Controller::Bot { mirror: None }),
        ]);
        roster.players_mut()[1].economy = PlayerEconomy::new(0, 100);
        let hunter = roster
            .insert(PlayerId(1), UnitKind::Plain, Vec2Fixed::ZERO, 20)
            .unwrap();
        roster.insert(PlayerId(0), UnitKind::Plain, Vec2Fixed::from_ints(700, 0), 5);
        let mut rng = SimRng::new(5);

        ai.update(Fixed::from_num(5000), &mut roster, &mut rng, &spawner);
        assert_eq!(
            roster.unit(hunter).unwrap().target,
            Vec2Fixed::from_ints(700, 0)
        );
    }

    #[test]
    fn test_cheapest_pick_skips_unaffordable() {
        let config = GameplayConfig::default();
        let spawner = Spawner::new(&config, CombatPolicy::RangedCooldown, None);
        let ai = controller(&config, Difficulty::Medium);
        let mut rng = SimRng::new(5);
        assert_eq!(ai.pick_kind(&spawner, 9, &mut rng), None);
        assert_eq!(
            ai.pick_kind(&spawner, 100, &mut rng),
            Some(UnitKind::Rifleman)
        );
    }
}
