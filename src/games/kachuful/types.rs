//! Domain types for Kachuful (Judgment).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::models::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrumpSuit {
    Spades,
    Diamonds,
    Clubs,
    Hearts,
}

impl TrumpSuit {
    /// Rotation order, starting with round 1.
    pub const ROTATION: [TrumpSuit; 4] = [
        TrumpSuit::Spades,
        TrumpSuit::Diamonds,
        TrumpSuit::Clubs,
        TrumpSuit::Hearts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TrumpSuit::Spades => "spades",
            TrumpSuit::Diamonds => "diamonds",
            TrumpSuit::Clubs => "clubs",
            TrumpSuit::Hearts => "hearts",
        }
    }
}

/// What a missed bid costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyPolicy {
    /// A miss scores 0.
    #[default]
    Off,
    /// A missed bid of n scores -n; a missed zero bid scores -zero_bid_bonus.
    LoseBid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KachufulConfig {
    /// 1-3 decks.
    pub deck_count: u32,
    /// Awarded for bidding zero and taking nothing.
    pub zero_bid_bonus: u32,
    #[serde(default)]
    pub penalty: PenaltyPolicy,
}

impl Default for KachufulConfig {
    fn default() -> Self {
        Self {
            deck_count: 1,
            zero_bid_bonus: 10,
            penalty: PenaltyPolicy::Off,
        }
    }
}

/// One player's line for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRound {
    pub bid: u32,
    pub tricks: u32,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KachufulPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub total_score: i32,
    pub rounds: Vec<PlayerRound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRoundEntry {
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub result: PlayerRound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KachufulRound {
    pub round_number: u32,
    pub cards: u32,
    pub trump_suit: TrumpSuit,
    /// One entry per player. Entries are matched by id, not position.
    pub player_scores: Vec<PlayerRoundEntry>,
}

impl KachufulRound {
    pub fn result_for(&self, player_id: &str) -> Option<PlayerRound> {
        self.player_scores
            .iter()
            .find(|e| e.player_id == player_id)
            .map(|e| e.result)
    }
}

/// Full Kachuful game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KachufulState {
    pub players: Vec<KachufulPlayer>,
    pub rounds: Vec<KachufulRound>,
    /// Next round to be played.
    pub current_round: u32,
    pub max_cards_per_round: u32,
    pub total_rounds: u32,
    pub config: KachufulConfig,
    /// Round currently open for correction, if any.
    #[serde(default)]
    pub editing_round: Option<u32>,
    pub game_ended: bool,
    /// Every player sharing the highest total once the game has ended.
    #[serde(default)]
    pub winners: Vec<PlayerId>,
}

impl KachufulState {
    pub fn player(&self, player_id: &str) -> Option<&KachufulPlayer> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn round(&self, round_number: u32) -> Option<&KachufulRound> {
        round_number
            .checked_sub(1)
            .and_then(|i| self.rounds.get(i as usize))
    }
}

/// Bid and tricks taken, as entered for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidEntry {
    pub bid: u32,
    pub tricks: u32,
}

pub type RoundEntries = HashMap<PlayerId, BidEntry>;
