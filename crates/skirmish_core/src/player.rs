//! Players (human or bot) and their stances.

use serde::{Deserialize, Serialize};

use crate::economy::PlayerEconomy;
use crate::team::Team;
use crate::unit::UnitId;

/// Index of a player in the match's player arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Aggregate behavioral mode governing formation and targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Every unit heads for its nearest enemy.
    Attack,
    /// Units form a ring around their centroid.
    #[default]
    Defense,
}

impl Stance {
    /// Parse a stance from its identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "attack" => Some(Self::Attack),
            "defense" | "defence" => Some(Self::Defense),
            _ => None,
        }
    }

    /// Uppercase label for messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Attack => "ATTACK",
            Self::Defense => "DEFENSE",
        }
    }
}

/// Who makes decisions for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    /// Local human, driven by presentation-layer commands.
    Human,
    /// Bot driven by the AI controller.
    Bot {
        /// Human teammate whose stance this bot copies (2v2).
        mirror: Option<PlayerId>,
    },
}

/// A participant in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Arena index.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Side.
    pub team: Team,
    /// Gold balance and cap.
    pub economy: PlayerEconomy,
    /// Current stance.
    pub stance: Stance,
    /// Living units owned by this player, in spawn order.
    pub units: Vec<UnitId>,
    /// Units ever spawned.
    pub units_created: u32,
    /// Units ever lost.
    pub units_lost: u32,
    /// Decision maker.
    pub controller: Controller,
    /// Developer privileges from the session (cheat commands).
    pub developer: bool,
}

impl Player {
    /// Create a player with empty rosters in `Defense` stance.
    #[must_use]
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        team: Team,
        economy: PlayerEconomy,
        controller: Controller,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            team,
            economy,
            stance: Stance::Defense,
            units: Vec::new(),
            units_created: 0,
            units_lost: 0,
            controller,
            developer: false,
        }
    }

    /// Whether the AI controller drives this player.
    #[must_use]
    pub const fn is_bot(&self) -> bool {
        matches!(self.controller, Controller::Bot { .. })
    }

    /// Human teammate this bot mirrors, if any.
    #[must_use]
    pub const fn mirror(&self) -> Option<PlayerId> {
        match self.controller {
            Controller::Bot { mirror } => mirror,
            Controller::Human => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new(
            PlayerId(1),
            "BOT RED 1",
            Team::Red,
            PlayerEconomy::new(100, 100),
            Controller::Bot { mirror: None },
        );
        assert_eq!(player.stance, Stance::Defense);
        assert!(player.units.is_empty());
        assert!(player.is_bot());
        assert_eq!(player.mirror(), None);
    }

    #[test]
    fn test_stance_from_id() {
        assert_eq!(Stance::from_id("ATTACK"), Some(Stance::Attack));
        assert_eq!(Stance::from_id("defence"), Some(Stance::Defense));
        assert_eq!(Stance::from_id("flank"), None);
    }
}
