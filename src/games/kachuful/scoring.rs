//! Scoring for Kachuful. Exact bids pay; misses optionally cost.

use crate::engine::models::PlayerId;

use super::types::{KachufulPlayer, KachufulRound, PenaltyPolicy, PlayerRound};

/// Points for one player's round.
pub fn score_bid(bid: u32, tricks: u32, zero_bid_bonus: u32, penalty: PenaltyPolicy) -> i32 {
    if bid == tricks {
        return if bid == 0 {
            zero_bid_bonus as i32
        } else {
            10 + bid as i32
        };
    }
    match penalty {
        PenaltyPolicy::Off => 0,
        PenaltyPolicy::LoseBid if bid == 0 => -(zero_bid_bonus as i32),
        PenaltyPolicy::LoseBid => -(bid as i32),
    }
}

/// Rebuild every player's history and total from the round log, in order.
pub fn replay_totals(players: &mut [KachufulPlayer], rounds: &[KachufulRound]) {
    for player in players.iter_mut() {
        let history: Vec<PlayerRound> = rounds.iter().filter_map(|r| r.result_for(&player.player_id)).collect();
        player.total_score = history.iter().map(|r| r.score).sum();
        player.rounds = history;
    }
}

/// Every player sharing the highest total, in seat order.
pub fn highest_total_players(players: &[KachufulPlayer]) -> Vec<PlayerId> {
    let Some(high) = players.iter().map(|p| p.total_score).max() else {
        return vec![];
    };
    players
        .iter()
        .filter(|p| p.total_score == high)
        .map(|p| p.player_id.clone())
        .collect()
}
