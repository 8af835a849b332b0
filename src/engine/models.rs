//! Core engine data types shared by every game.

use serde::{Deserialize, Serialize};

pub type PlayerId = String;

/// A player as handed to a game at setup. Ids are opaque and come from an
/// [`IdSource`](crate::engine::identity::IdSource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeat {
    pub player_id: PlayerId,
    pub display_name: String,
}

impl PlayerSeat {
    pub fn new(player_id: impl Into<PlayerId>, display_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Which game a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Hearts,
    Kachuful,
    Traitor,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Hearts, GameKind::Kachuful, GameKind::Traitor];

    pub fn game_id(self) -> &'static str {
        match self {
            GameKind::Hearts => "hearts",
            GameKind::Kachuful => "kachuful",
            GameKind::Traitor => "traitor",
        }
    }

    /// Store key holding the active game of this kind.
    pub fn storage_key(self) -> &'static str {
        match self {
            GameKind::Hearts => "hearts-game",
            GameKind::Kachuful => "kachuful-game",
            GameKind::Traitor => "traitor-game",
        }
    }

    pub fn from_game_id(game_id: &str) -> Option<GameKind> {
        GameKind::ALL.into_iter().find(|k| k.game_id() == game_id)
    }

    /// Lower totals win in Hearts; every other game rewards higher scores.
    pub fn lower_is_better(self) -> bool {
        matches!(self, GameKind::Hearts)
    }
}

/// Traitor factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Mafia,
    Town,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Winner {
    /// Every player sharing the winning total.
    Players { player_ids: Vec<PlayerId> },
    Faction { faction: Faction },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(event_type: &str, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            player_id: None,
            payload,
        }
    }

    pub fn for_player(event_type: &str, player_id: &str, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            player_id: Some(player_id.into()),
            payload,
        }
    }
}

/// Result of a successful transition: the next state plus what happened.
#[derive(Debug, Clone)]
pub struct Transition<S> {
    pub state: S,
    pub events: Vec<Event>,
}

impl<S> Transition<S> {
    pub fn new(state: S, events: Vec<Event>) -> Self {
        Self { state, events }
    }
}

/// One row of a scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub display_name: String,
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<Faction>,
}

/// Game-independent view of a state, used by the registry and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: String,
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    pub standings: Vec<Standing>,
    pub game_over: bool,
    #[serde(default)]
    pub winner: Option<Winner>,
}

impl GameSummary {
    pub fn is_winner(&self, player_id: &str) -> bool {
        match &self.winner {
            Some(Winner::Players { player_ids }) => player_ids.iter().any(|p| p == player_id),
            Some(Winner::Faction { faction }) => self
                .standings
                .iter()
                .any(|s| s.player_id == player_id && s.faction == Some(*faction)),
            None => false,
        }
    }
}
