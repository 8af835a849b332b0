//! Domain types for Traitor, the hidden-role elimination game.

use serde::{Deserialize, Serialize};

use crate::engine::models::{Faction, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mafia,
    Detective,
    Doctor,
    Civilian,
}

impl Role {
    pub fn faction(self) -> Faction {
        match self {
            Role::Mafia => Faction::Mafia,
            _ => Faction::Town,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Mafia => "mafia",
            Role::Detective => "detective",
            Role::Doctor => "doctor",
            Role::Civilian => "civilian",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitorPhase {
    Night,
    Day,
}

impl TraitorPhase {
    pub fn name(self) -> &'static str {
        match self {
            TraitorPhase::Night => "night",
            TraitorPhase::Day => "day",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EliminationReason {
    Vote,
    Kill,
    /// Exposed by the detective under the investigative-elimination rule.
    Investigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    pub mafia: u32,
    pub detective: u32,
    pub doctor: u32,
    pub civilian: u32,
}

impl RoleConfig {
    /// Fill the remaining seats with civilians.
    pub fn with_civilians(player_count: usize, mafia: u32, detective: u32, doctor: u32) -> Self {
        let specials = (mafia + detective + doctor) as usize;
        Self {
            mafia,
            detective,
            doctor,
            civilian: player_count.saturating_sub(specials) as u32,
        }
    }

    pub fn total(&self) -> usize {
        (self.mafia + self.detective + self.doctor + self.civilian) as usize
    }
}

/// Optional rule toggles. Both are off unless configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraitorRules {
    /// A detective check that finds an unprotected mafia member eliminates them.
    pub investigative_elimination: bool,
    /// Mafia wins as soon as no detective is left alive (when one was dealt).
    pub detective_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitorConfig {
    pub roles: RoleConfig,
    #[serde(default)]
    pub rules: TraitorRules,
    /// Seed for role assignment; `None` draws one from the OS.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitorPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub role: Role,
    pub is_alive: bool,
    /// Saved by the doctor last night. Cleared when the day ends.
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub elimination_reason: Option<EliminationReason>,
    /// Number of the `TraitorRound` the elimination belongs to, whether it
    /// happened that night or in the day after it.
    #[serde(default)]
    pub eliminated_round: Option<u32>,
}

/// Choices gathered from the moderator before ending the night.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightActions {
    #[serde(default)]
    pub mafia_target: Option<PlayerId>,
    #[serde(default)]
    pub doctor_save: Option<PlayerId>,
    #[serde(default)]
    pub detective_check: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investigation {
    pub detective: PlayerId,
    pub target: PlayerId,
    pub result: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightOutcome {
    /// Actions that took effect; choices ignored for lack of a living role
    /// holder are dropped.
    pub actions: NightActions,
    #[serde(default)]
    pub investigation: Option<Investigation>,
    #[serde(default)]
    pub eliminated: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutcome {
    /// `None` when the day ended without a vote.
    pub eliminated: Option<PlayerId>,
}

/// A night and the day that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitorRound {
    pub round_number: u32,
    pub night: NightOutcome,
    #[serde(default)]
    pub day: Option<DayOutcome>,
}

/// Full Traitor game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitorState {
    pub players: Vec<TraitorPlayer>,
    pub rounds: Vec<TraitorRound>,
    pub current_round: u32,
    pub phase: TraitorPhase,
    pub config: TraitorConfig,
    #[serde(default)]
    pub last_investigation: Option<Investigation>,
    pub game_ended: bool,
    #[serde(default)]
    pub winner: Option<Faction>,
}

impl TraitorState {
    pub fn player(&self, player_id: &str) -> Option<&TraitorPlayer> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn living(&self) -> impl Iterator<Item = &TraitorPlayer> {
        self.players.iter().filter(|p| p.is_alive)
    }

    pub fn living_with_role(&self, role: Role) -> impl Iterator<Item = &TraitorPlayer> {
        self.living().filter(move |p| p.role == role)
    }
}
