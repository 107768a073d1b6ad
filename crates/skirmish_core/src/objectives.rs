//! Capturable map points.

use serde::{Deserialize, Serialize};

use crate::economy::increase_team_gold_cap;
use crate::events::{CaptureEvent, Notice};
use crate::map::WorldMap;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::roster::Roster;
use crate::team::Team;

/// A town or other point whose owner gains a gold cap bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Display name.
    pub name: String,
    /// World position.
    pub position: Vec2Fixed,
    /// Capture radius (inclusive).
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Current owner.
    pub owner: Option<Team>,
    /// Teams that have already been paid for capturing this point.
    pub rewarded: Vec<Team>,
}

impl Objective {
    /// Create an unowned objective.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec2Fixed, radius: Fixed) -> Self {
        Self {
            name: name.into(),
            position,
            radius,
            owner: None,
            rewarded: Vec::new(),
        }
    }

    /// Count living units of each team inside the radius.
    #[must_use]
    pub fn presence(&self, roster: &Roster) -> (usize, usize) {
        let radius_sq = self.radius.saturating_mul(self.radius);
        roster
            .units()
            .iter()
            .filter(|u| u.position.distance_squared(self.position) <= radius_sq)
            .fold((0, 0), |(blue, red), u| match u.team {
                Team::Blue => (blue + 1, red),
                Team::Red => (blue, red + 1),
            })
    }
}

/// Tracks every objective on the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveTracker {
    objectives: Vec<Objective>,
    capture_bonus: u32,
}

impl ObjectiveTracker {
    /// Build objectives from a scaled map. No map means no objectives.
    #[must_use]
    pub fn from_map(map: Option<&WorldMap>, radius: Fixed, capture_bonus: u32) -> Self {
        let objectives = map
            .map(|map| {
                map.objectives
                    .iter()
                    .map(|(name, position)| Objective::new(name.clone(), *position, radius))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            objectives,
            capture_bonus,
        }
    }

    /// Current objectives.
    #[must_use]
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Flip ownership where one team has strictly more units present.
    ///
    /// A team's first capture of each objective raises its players' gold caps.
    pub fn update(&mut self, roster: &mut Roster) -> (Vec<CaptureEvent>, Vec<Notice>) {
        let mut captures = Vec::new();
        let mut notices = Vec::new();

        for (index, objective) in self.objectives.iter_mut().enumerate() {
            let (blue, red) = objective.presence(roster);
            let leader = match blue.cmp(&red) {
                std::cmp::Ordering::Greater => Team::Blue,
                std::cmp::Ordering::Less => Team::Red,
                std::cmp::Ordering::Equal => continue,
            };
            if objective.owner == Some(leader) {
                continue;
            }

            objective.owner = Some(leader);
            let rewarded = !objective.rewarded.contains(&leader);
            if rewarded {
                objective.rewarded.push(leader);
                notices.push(increase_team_gold_cap(
                    roster.players_mut(),
                    leader,
                    self.capture_bonus,
                ));
            }
            tracing::info!(objective = %objective.name, team = %leader, rewarded, "Objective captured");
            captures.push(CaptureEvent {
                objective: index,
                name: objective.name.clone(),
                team: leader,
                rewarded,
            });
        }
        (captures, notices)
    }
}
