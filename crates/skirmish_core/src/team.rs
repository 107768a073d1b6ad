//! Team identifiers.

use serde::{Deserialize, Serialize};

/// One of the two sides in a match.
///
/// Ordering is significant: `Blue` is always evaluated first, which makes it
/// the winner of timeout ties and the first team checked for elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// The blue side.
    Blue,
    /// The red side.
    Red,
}

impl Team {
    /// Both teams in evaluation order.
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }

    /// Lowercase identifier, also used as the colour key for effects.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    /// Uppercase label used in match messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blue => "BLUE",
            Self::Red => "RED",
        }
    }

    /// Parse a team from its identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "blue" => Some(Self::Blue),
            "red" => Some(Self::Red),
            _ => None,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_round_trip() {
        for team in Team::ALL {
            assert_ne!(team, team.opponent());
            assert_eq!(team, team.opponent().opponent());
        }
    }

    #[test]
    fn test_from_id() {
        assert_eq!(Team::from_id("Blue"), Some(Team::Blue));
        assert_eq!(Team::from_id(" red "), Some(Team::Red));
        assert_eq!(Team::from_id("green"), None);
    }
}
