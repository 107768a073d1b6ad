//! Gameplay tuning.
//!
//! Every number the simulation uses lives in [`GameplayConfig`]. The
//! defaults reproduce the classic skirmish rules; a RON file can override
//! any subset of fields:
//!
//! ```ron
//! (
//!     max_units_per_player: 30,
//!     difficulties: (
//!         hard: (think_interval_ms: 500, behavior: strategic, spawn_pick: cheapest),
//!     ),
//! )
//! ```
//!
//! This module performs no IO except in [`GameplayConfig::load`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::{Fixed, Vec2Fixed};

/// Largest world side and simulation distance, in world units.
///
/// Keeps squared distances across the whole world inside the [`Fixed`] range.
pub const MAX_WORLD_EXTENT: u32 = 30_000;

/// Longest match a setup or config may ask for.
pub const MAX_MATCH_MINUTES: u32 = 24 * 60;

/// Longest timer interval, one hour.
pub const MAX_INTERVAL_MS: u32 = 60 * 60 * 1000;

/// Bot difficulty selected in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Slow, erratic bots.
    Easy,
    /// Bots that react to the human's army.
    #[default]
    Medium,
    /// Fast bots that weigh the whole enemy team.
    Hard,
}

impl Difficulty {
    /// All difficulties, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parse from an identifier. Unknown ids yield `None`.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" | "normal" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// How a bot chooses its stance on each think cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotBehavior {
    /// Occasionally flips to a random stance.
    Passive,
    /// Attacks when its team outweighs the human's team.
    Adaptive,
    /// Attacks when its team outweighs the whole opposing team.
    Strategic,
    /// Sends every unit straight at the nearest enemy on each think.
    Hunter,
}

/// How a bot chooses which unit to buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPick {
    /// Always the cheapest available kind.
    Cheapest,
    /// A uniformly random kind among those it can afford.
    RandomAffordable,
}

/// Per-difficulty bot tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    /// Time between think cycles.
    pub think_interval_ms: u32,
    /// Stance policy.
    pub behavior: BotBehavior,
    /// Unit purchase policy.
    pub spawn_pick: SpawnPick,
    /// Chance per think cycle that a `Passive` bot picks a new random stance.
    #[serde(default)]
    pub stance_flip_percent: u8,
}

/// Bot profiles for every difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    /// Easy bots.
    pub easy: BotProfile,
    /// Medium bots.
    pub medium: BotProfile,
    /// Hard bots.
    pub hard: BotProfile,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: BotProfile {
                think_interval_ms: 5000,
                behavior: BotBehavior::Passive,
                spawn_pick: SpawnPick::Cheapest,
                stance_flip_percent: 25,
            },
            medium: BotProfile {
                think_interval_ms: 3000,
                behavior: BotBehavior::Adaptive,
                spawn_pick: SpawnPick::Cheapest,
                stance_flip_percent: 0,
            },
            hard: BotProfile {
                think_interval_ms: 200,
                behavior: BotBehavior::Strategic,
                spawn_pick: SpawnPick::RandomAffordable,
                stance_flip_percent: 0,
            },
        }
    }
}

impl DifficultyTable {
    /// Profile for a difficulty.
    #[must_use]
    pub const fn profile(&self, difficulty: Difficulty) -> &BotProfile {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

/// All gameplay constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Living units one player may own.
    pub max_units_per_player: usize,
    /// Living units in the whole match.
    pub max_total_units: usize,
    /// Gold every player receives per payout.
    pub passive_income_amount: u32,
    /// Time between payouts.
    pub passive_income_interval_ms: u32,
    /// Gold each player starts with (clamped to the cap).
    pub starting_gold: u32,
    /// Gold cap each player starts with.
    pub base_gold_cap: u32,
    /// Cap increase for a team's first capture of an objective.
    pub capture_bonus: u32,
    /// Objective capture radius in world units.
    pub capture_radius: u32,
    /// Melee engagement distance in world units.
    pub collision_distance: u32,
    /// Full width of the random spawn offset on each axis.
    pub spawn_jitter: u32,
    /// Spawn point used when no map is loaded.
    pub fallback_spawn: (i32, i32),
    /// Simulation world width.
    pub world_width: u32,
    /// Simulation world height.
    pub world_height: u32,
    /// Radius of the defensive ring.
    pub formation_radius: u32,
    /// Time between formation passes.
    pub formation_interval_ms: u32,
    /// Longest frame the loop will simulate in one tick.
    pub max_frame_step_ms: u32,
    /// Match length when the setup does not name one.
    pub default_match_minutes: u32,
    /// Free units each player receives at match start.
    pub initial_army_size: u32,
    /// Bot tuning.
    pub difficulties: DifficultyTable,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            max_units_per_player: 50,
            max_total_units: 100,
            passive_income_amount: 2,
            passive_income_interval_ms: 3000,
            starting_gold: 100,
            base_gold_cap: 100,
            capture_bonus: 50,
            capture_radius: 80,
            collision_distance: 24,
            spawn_jitter: 50,
            fallback_spawn: (300, 300),
            world_width: 3000,
            world_height: 2000,
            formation_radius: 30,
            formation_interval_ms: 500,
            max_frame_step_ms: 50,
            default_match_minutes: 10,
            initial_army_size: 0,
            difficulties: DifficultyTable::default(),
        }
    }
}

impl GameplayConfig {
    /// Parse a config from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&contents)?;
        tracing::debug!(path = %path.display(), "Loaded gameplay config");
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: "must be greater than zero".into(),
                });
            }
            Ok(())
        }

        fn at_most(field: &'static str, value: u32, max: u32) -> Result<(), ConfigError> {
            if value > max {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("{value} is above the limit of {max}"),
                });
            }
            Ok(())
        }

        positive("max_units_per_player", self.max_units_per_player as u64)?;
        positive("max_total_units", self.max_total_units as u64)?;
        positive(
            "passive_income_interval_ms",
            self.passive_income_interval_ms.into(),
        )?;
        positive("formation_interval_ms", self.formation_interval_ms.into())?;
        positive("max_frame_step_ms", self.max_frame_step_ms.into())?;
        positive("world_width", self.world_width.into())?;
        positive("world_height", self.world_height.into())?;
        positive("default_match_minutes", self.default_match_minutes.into())?;

        at_most("world_width", self.world_width, MAX_WORLD_EXTENT)?;
        at_most("world_height", self.world_height, MAX_WORLD_EXTENT)?;
        at_most("capture_radius", self.capture_radius, MAX_WORLD_EXTENT)?;
        at_most("collision_distance", self.collision_distance, MAX_WORLD_EXTENT)?;
        at_most("spawn_jitter", self.spawn_jitter, MAX_WORLD_EXTENT)?;
        at_most("formation_radius", self.formation_radius, MAX_WORLD_EXTENT)?;
        at_most("fallback_spawn", self.fallback_spawn.0.unsigned_abs(), MAX_WORLD_EXTENT)?;
        at_most("fallback_spawn", self.fallback_spawn.1.unsigned_abs(), MAX_WORLD_EXTENT)?;
        at_most(
            "default_match_minutes",
            self.default_match_minutes,
            MAX_MATCH_MINUTES,
        )?;
        at_most(
            "passive_income_interval_ms",
            self.passive_income_interval_ms,
            MAX_INTERVAL_MS,
        )?;
        at_most("formation_interval_ms", self.formation_interval_ms, MAX_INTERVAL_MS)?;
        at_most("max_frame_step_ms", self.max_frame_step_ms, MAX_INTERVAL_MS)?;

        for difficulty in Difficulty::ALL {
            let profile = self.difficulties.profile(difficulty);
            positive("think_interval_ms", profile.think_interval_ms.into())?;
            at_most("think_interval_ms", profile.think_interval_ms, MAX_INTERVAL_MS)?;
            if profile.stance_flip_percent > 100 {
                return Err(ConfigError::Invalid {
                    field: "stance_flip_percent",
                    message: format!(
                        "{} is above 100 for {}",
                        profile.stance_flip_percent,
                        difficulty.id()
                    ),
                });
            }
        }

        if self.initial_army_size as usize > self.max_units_per_player {
            return Err(ConfigError::Invalid {
                field: "initial_army_size",
                message: "exceeds max_units_per_player".into(),
            });
        }
        Ok(())
    }

    /// Melee engagement distance.
    #[must_use]
    pub fn collision_distance(&self) -> Fixed {
        Fixed::saturating_from_num(self.collision_distance)
    }

    /// Objective capture radius.
    #[must_use]
    pub fn capture_radius(&self) -> Fixed {
        Fixed::saturating_from_num(self.capture_radius)
    }

    /// Defensive ring radius.
    #[must_use]
    pub fn formation_radius(&self) -> Fixed {
        Fixed::saturating_from_num(self.formation_radius)
    }

    /// Spawn jitter span.
    #[must_use]
    pub fn spawn_jitter(&self) -> Fixed {
        Fixed::saturating_from_num(self.spawn_jitter)
    }

    /// Fallback spawn point.
    #[must_use]
    pub fn fallback_spawn(&self) -> Vec2Fixed {
        Vec2Fixed::from_ints(self.fallback_spawn.0, self.fallback_spawn.1)
    }

    /// Pull `point` inside the world rectangle.
    #[must_use]
    pub fn clamp_to_world(&self, point: Vec2Fixed) -> Vec2Fixed {
        let width = Fixed::saturating_from_num(self.world_width);
        let height = Fixed::saturating_from_num(self.world_height);
        Vec2Fixed::new(
            point.x.clamp(Fixed::ZERO, width),
            point.y.clamp(Fixed::ZERO, height),
        )
    }

    /// Longest simulated frame.
    #[must_use]
    pub fn max_frame_step(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.max_frame_step_ms.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(GameplayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_override() {
        let config = GameplayConfig::from_ron_str("(max_units_per_player: 30, capture_bonus: 75)")
            .unwrap();
        assert_eq!(config.max_units_per_player, 30);
        assert_eq!(config.capture_bonus, 75);
        assert_eq!(config.max_total_units, 100);
        assert_eq!(config.difficulties.hard.think_interval_ms, 200);
    }

    #[test]
    fn test_difficulty_override() {
        let text = "(difficulties: (easy: (think_interval_ms: 1000, behavior: hunter, spawn_pick: cheapest)))";
        let config = GameplayConfig::from_ron_str(text).unwrap();
        let easy = config.difficulties.profile(Difficulty::Easy);
        assert_eq!(easy.behavior, BotBehavior::Hunter);
        assert_eq!(easy.stance_flip_percent, 0);
        assert_eq!(config.difficulties.medium.behavior, BotBehavior::Adaptive);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = GameplayConfig::from_ron_str("(passive_income_interval_ms: 0)").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "passive_income_interval_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_distances_rejected() {
        let config = GameplayConfig {
            capture_radius: u32::MAX,
            ..GameplayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "capture_radius",
                ..
            })
        ));
        assert_eq!(config.capture_radius(), Fixed::MAX);

        let err = GameplayConfig::from_ron_str("(world_width: 3000000000)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "world_width", .. }));

        let err = GameplayConfig::from_ron_str("(default_match_minutes: 40000)").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "default_match_minutes",
                ..
            }
        ));
    }

    #[test]
    fn test_clamp_to_world() {
        let config = GameplayConfig::default();
        assert_eq!(
            config.clamp_to_world(Vec2Fixed::from_ints(100_000, -5)),
            Vec2Fixed::from_ints(3000, 0)
        );
        assert_eq!(
            config.clamp_to_world(Vec2Fixed::from_ints(1200, 900)),
            Vec2Fixed::from_ints(1200, 900)
        );
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            GameplayConfig::from_ron_str("(max_units_per_player: \"many\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_difficulty_ids() {
        for difficulty in Difficulty::ALL {
            assert_eq!(Difficulty::from_id(difficulty.id()), Some(difficulty));
        }
        assert_eq!(Difficulty::from_id("nightmare"), None);
    }
}
