//! Player and unit arenas.
//!
//! The roster owns every [`Unit`] in spawn order and every [`Player`] in
//! seat order. Players refer to their units by [`UnitId`]; units refer back
//! to their owner by [`PlayerId`]. Both sides are only ever changed together
//! through [`Roster::insert`] and [`Roster::remove_unit`].

use serde::{Deserialize, Serialize};

use crate::events::DeathEffect;
use crate::math::{Fixed, Vec2Fixed};
use crate::player::{Player, PlayerId};
use crate::team::Team;
use crate::unit::{Unit, UnitId};
use crate::unit_kind::UnitKind;

/// All players and living units of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
    /// Living units, ascending by id (spawn order).
    units: Vec<Unit>,
    next_unit_id: u32,
}

impl Roster {
    /// Create a roster. Player ids are reassigned to their seat index.
    #[must_use]
    pub fn new(mut players: Vec<Player>) -> Self {
        for (index, player) in players.iter_mut().enumerate() {
            player.id = PlayerId(index);
            player.units.clear();
        }
        Self {
            players,
            units: Vec::new(),
            next_unit_id: 1,
        }
    }

    /// All players in seat order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Mutable access to players. Unit lists must not be edited through this.
    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    /// Look up a player mutably.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.0)
    }

    /// Players on a team.
    pub fn team_players(&self, team: Team) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.team == team)
    }

    /// Living units in spawn order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Mutable living units in spawn order.
    pub fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    /// Number of living units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no units are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn index_of(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |u| u.id).ok()
    }

    /// Look up a living unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.index_of(id).map(|i| &self.units[i])
    }

    /// Look up a living unit mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.index_of(id).map(move |i| &mut self.units[i])
    }

    /// Whether the unit is alive.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.index_of(id).is_some()
    }

    /// Id the next spawned unit will receive.
    #[must_use]
    pub const fn next_unit_id(&self) -> UnitId {
        UnitId(self.next_unit_id)
    }

    /// Add a unit for `owner` to both rosters. Returns `None` for an unknown owner.
    pub fn insert(
        &mut self,
        owner: PlayerId,
        kind: UnitKind,
        position: Vec2Fixed,
        health: u32,
    ) -> Option<UnitId> {
        let player = self.players.get_mut(owner.0)?;
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;

        player.units.push(id);
        player.units_created += 1;
        self.units
            .push(Unit::new(id, owner, player.team, kind, position, health));
        Some(id)
    }

    /// Remove a unit from both rosters and count the loss.
    ///
    /// Returns the death effect, or `None` if the unit was already gone.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<DeathEffect> {
        let index = self.index_of(id)?;
        let unit = self.units.remove(index);

        if let Some(owner) = self.players.get_mut(unit.owner.0) {
            owner.units.retain(|&owned| owned != id);
            owner.units_lost += 1;
        }

        Some(DeathEffect {
            unit: id,
            team: unit.team,
            position: unit.position,
        })
    }

    /// Drop every unit without counting losses. Ids keep increasing.
    pub fn clear_units(&mut self) {
        self.units.clear();
        for player in &mut self.players {
            player.units.clear();
        }
    }

    /// Living units owned by a player.
    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.owner == owner)
    }

    /// Living units on a team.
    pub fn team_units(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.team == team)
    }

    /// Number of living units on a team.
    #[must_use]
    pub fn living_count(&self, team: Team) -> usize {
        self.team_units(team).count()
    }

    /// Sum of unit health on a team.
    #[must_use]
    pub fn team_strength(&self, team: Team) -> u64 {
        self.team_units(team).map(|u| u64::from(u.health)).sum()
    }

    /// Nearest living unit not on `team`, optionally limited to `max_range`.
    ///
    /// Exact distance ties go to the earliest spawned unit.
    #[must_use]
    pub fn nearest_enemy(
        &self,
        from: Vec2Fixed,
        team: Team,
        max_range: Option<Fixed>,
    ) -> Option<&Unit> {
        let limit = max_range.map(|r| r.saturating_mul(r));
        let mut best: Option<(&Unit, Fixed)> = None;
        for unit in self.units.iter().filter(|u| u.team != team) {
            let dist_sq = from.distance_squared(unit.position);
            if limit.is_some_and(|limit| dist_sq > limit) {
                continue;
            }
            if best.map_or(true, |(_, best_sq)| dist_sq < best_sq) {
                best = Some((unit, dist_sq));
            }
        }
        best.map(|(unit, _)| unit)
    }
}
