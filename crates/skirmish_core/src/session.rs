//! Match setup: who plays, on which map, under which rules.
//!
//! The lobby and account service live outside the simulation. They hand
//! over a [`SessionSnapshot`] (read once) and a [`MatchSetup`], from which
//! the seat list is built.

use serde::{Deserialize, Serialize};

use crate::combat::CombatPolicy;
use crate::config::{Difficulty, GameplayConfig, MAX_MATCH_MINUTES};
use crate::economy::PlayerEconomy;
use crate::player::{Controller, Player, PlayerId};
use crate::team::Team;

/// Name used when the session has no logged-in user.
pub const GUEST_NAME: &str = "Guest";

/// Name of the bot added when no other bot would play.
pub const FALLBACK_BOT_NAME: &str = "Marshal Bot";

/// Prefix that marks a lobby slot as a bot.
const BOT_PREFIX: &str = "BOT";

/// Prefix of an unfilled lobby slot.
const OPEN_PREFIX: &str = "OPEN";

/// Account data the match needs from the session service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Logged-in user name.
    pub username: Option<String>,
    /// Starting gold override (still clamped to the cap).
    pub starting_gold: Option<u32>,
    /// Developer privileges (gold grants).
    #[serde(default)]
    pub developer: bool,
}

impl SessionSnapshot {
    /// Display name for the local human.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(GUEST_NAME)
    }
}

/// Seats per team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// One seat per team.
    #[default]
    OneVsOne,
    /// Two seats per team.
    TwoVsTwo,
}

impl MatchMode {
    /// Seats on each team.
    #[must_use]
    pub const fn slots_per_team(self) -> usize {
        match self {
            Self::OneVsOne => 1,
            Self::TwoVsTwo => 2,
        }
    }

    /// Parse `"1v1"` / `"2v2"`.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "1v1" | "one_vs_one" => Some(Self::OneVsOne),
            "2v2" | "two_vs_two" => Some(Self::TwoVsTwo),
            _ => None,
        }
    }
}

/// Lobby seat names per team. Empty or `OPEN…` seats become bots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySlots {
    /// Blue seats.
    #[serde(default)]
    pub blue: Vec<String>,
    /// Red seats.
    #[serde(default)]
    pub red: Vec<String>,
}

impl LobbySlots {
    fn team_mut(&mut self, team: Team) -> &mut Vec<String> {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }

    fn team(&self, team: Team) -> &[String] {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
        }
    }
}

/// Everything chosen in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSetup {
    /// Map id; `None` plays on an empty field with the fallback spawn.
    pub map_id: Option<String>,
    /// Seats per team.
    pub mode: MatchMode,
    /// Team of the local human.
    pub human_team: Team,
    /// Bot difficulty.
    pub difficulty: Difficulty,
    /// Match length; `None` uses the config default.
    pub minutes: Option<u32>,
    /// Combat rule set.
    pub combat: CombatPolicy,
    /// RNG seed.
    pub seed: u64,
    /// LAN lobby: seats held by other humans are not filled with bots.
    pub lan: bool,
    /// Named lobby seats.
    pub lobby: LobbySlots,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            map_id: Some("waterloo".into()),
            mode: MatchMode::OneVsOne,
            human_team: Team::Blue,
            difficulty: Difficulty::Medium,
            minutes: None,
            combat: CombatPolicy::MeleeProximity,
            seed: 0,
            lan: false,
            lobby: LobbySlots::default(),
        }
    }
}

impl MatchSetup {
    /// Match length in minutes, never zero and at most [`MAX_MATCH_MINUTES`].
    #[must_use]
    pub fn match_minutes(&self, config: &GameplayConfig) -> u32 {
        self.minutes
            .filter(|&m| m > 0)
            .unwrap_or(config.default_match_minutes)
            .clamp(1, MAX_MATCH_MINUTES)
    }

    /// Build the seat list: the human first, then bots in team order.
    ///
    /// Bots fill open seats. In 2v2, bots on the human's team mirror the
    /// human's stance. If no seat ends up with a bot, a fallback bot joins
    /// the other team.
    #[must_use]
    pub fn build_players(&self, session: &SessionSnapshot, config: &GameplayConfig) -> Vec<Player> {
        let human_name = session.display_name().to_string();
        let gold = session.starting_gold.unwrap_or(config.starting_gold);
        let economy = || PlayerEconomy::new(gold, config.base_gold_cap);

        let mut human = Player::new(
            PlayerId(0),
            human_name.clone(),
            self.human_team,
            economy(),
            Controller::Human,
        );
        human.developer = session.developer;

        let mut slots = self.lobby.clone();
        let seats = self.mode.slots_per_team();
        if !slots.team(self.human_team).contains(&human_name) {
            slots.team_mut(self.human_team).insert(0, human_name.clone());
        }
        for team in Team::ALL {
            let names = slots.team_mut(team);
            if names.len() < seats {
                names.resize(seats, String::new());
            }
        }

        let other_human = Team::ALL.iter().any(|&team| {
            slots
                .team(team)
                .iter()
                .any(|name| !name.is_empty() && !name.starts_with(BOT_PREFIX) && *name != human_name)
        });
        if !self.lan || !other_human {
            for team in Team::ALL {
                for (index, name) in slots.team_mut(team).iter_mut().enumerate() {
                    if name.is_empty() || name.starts_with(OPEN_PREFIX) {
                        *name = format!("{BOT_PREFIX} {} {}", team.label(), index + 1);
                    }
                }
            }
        }

        let mirror_teammates = self.mode == MatchMode::TwoVsTwo;
        let mut players = vec![human];
        for team in Team::ALL {
            for name in slots.team(team) {
                if *name == human_name || !name.starts_with(BOT_PREFIX) {
                    continue;
                }
                let mirror = (mirror_teammates && team == self.human_team).then_some(PlayerId(0));
                players.push(Player::new(
                    PlayerId(players.len()),
                    name.clone(),
                    team,
                    economy(),
                    Controller::Bot { mirror },
                ));
            }
        }

        if players.len() == 1 {
            players.push(Player::new(
                PlayerId(1),
                FALLBACK_BOT_NAME,
                self.human_team.opponent(),
                economy(),
                Controller::Bot { mirror: None },
            ));
        }
        players
    }
}
