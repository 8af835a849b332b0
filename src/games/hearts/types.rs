//! Domain types for Hearts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::models::PlayerId;

/// Points in play per deck (13 hearts + 13 for the queen of spades).
pub const POINTS_PER_DECK: u32 = 26;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartsConfig {
    /// 1-3 decks.
    pub deck_count: u32,
    /// The game ends once any total reaches this.
    pub max_points: u32,
    /// Reject non-moon rounds whose points don't add up to the points in play.
    #[serde(default)]
    pub strict_round_totals: bool,
}

impl HeartsConfig {
    pub fn max_round_points(&self) -> u32 {
        POINTS_PER_DECK * self.deck_count
    }
}

impl Default for HeartsConfig {
    fn default() -> Self {
        Self {
            deck_count: 1,
            max_points: 100,
            strict_round_totals: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartsPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub total_score: u32,
    /// Points taken each round, in round order.
    pub rounds: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPoints {
    pub player_id: PlayerId,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartsRound {
    pub round_number: u32,
    /// One entry per player. Entries are matched by id, not position.
    pub player_scores: Vec<RoundPoints>,
    pub moon_shooter: Option<PlayerId>,
}

impl HeartsRound {
    pub fn points_for(&self, player_id: &str) -> Option<u32> {
        self.player_scores
            .iter()
            .find(|s| s.player_id == player_id)
            .map(|s| s.points)
    }
}

/// Full Hearts game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartsState {
    pub players: Vec<HeartsPlayer>,
    pub rounds: Vec<HeartsRound>,
    /// Next round to be played.
    pub current_round: u32,
    pub config: HeartsConfig,
    pub game_ended: bool,
    /// Every player sharing the lowest total once the game has ended.
    #[serde(default)]
    pub winners: Vec<PlayerId>,
}

impl HeartsState {
    pub fn player(&self, player_id: &str) -> Option<&HeartsPlayer> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}

/// What the scorekeeper enters after a hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundInput {
    /// Points taken by each player.
    Points { points: HashMap<PlayerId, u32> },
    /// One player took every point card; any manual entries are discarded.
    MoonShot { shooter: PlayerId },
}
