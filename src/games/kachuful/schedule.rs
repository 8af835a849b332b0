//! Round schedule: the rising/falling card count and the trump rotation.

use super::types::TrumpSuit;

pub const CARDS_PER_DECK: u32 = 52;

/// Most cards each player can be dealt.
pub fn max_cards_per_round(deck_count: u32, player_count: u32) -> u32 {
    if player_count == 0 {
        return 0;
    }
    CARDS_PER_DECK * deck_count / player_count
}

/// Rounds climb 1..=max and then fall back to 1.
pub fn total_rounds(max_cards: u32) -> u32 {
    (2 * max_cards).saturating_sub(1)
}

/// Cards dealt in 1-indexed round `round`.
pub fn cards_for_round(round: u32, max_cards: u32) -> u32 {
    if round <= max_cards {
        round
    } else {
        max_cards.saturating_sub(round - max_cards)
    }
}

pub fn trump_for_round(round: u32) -> TrumpSuit {
    let idx = (round.max(1) - 1) as usize % TrumpSuit::ROTATION.len();
    TrumpSuit::ROTATION[idx]
}
