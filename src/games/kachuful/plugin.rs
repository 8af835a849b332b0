//! KachufulPlugin: the GamePlugin implementation for Kachuful.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::models::*;
use crate::engine::plugin::{check_round_entries, check_round_sequence, GamePlugin};

use super::schedule::{cards_for_round, max_cards_per_round, total_rounds, trump_for_round};
use super::scoring::{highest_total_players, replay_totals, score_bid};
use super::types::*;

const MAX_DECKS: u32 = 3;

pub struct KachufulPlugin;

impl GamePlugin for KachufulPlugin {
    type State = KachufulState;
    type Config = KachufulConfig;

    fn game_id(&self) -> &str {
        "kachuful"
    }
    fn display_name(&self) -> &str {
        "Kachuful"
    }
    fn description(&self) -> &str {
        "Bid on the exact number of tricks you will take. Card counts rise and \
         fall each round while the trump suit rotates."
    }
    fn min_players(&self) -> u32 {
        2
    }
    fn max_players(&self) -> u32 {
        10
    }

    fn create_initial_state(
        &self,
        players: &[PlayerSeat],
        config: &KachufulConfig,
    ) -> EngineResult<Transition<KachufulState>> {
        self.validate_seats(players)?;
        if config.deck_count == 0 || config.deck_count > MAX_DECKS {
            return Err(EngineError::InvalidConfig(format!(
                "deck count must be 1-{MAX_DECKS}, got {}",
                config.deck_count
            )));
        }

        let max_cards = max_cards_per_round(config.deck_count, players.len() as u32);
        let rounds_total = total_rounds(max_cards);
        let state = KachufulState {
            players: players
                .iter()
                .map(|p| KachufulPlayer {
                    player_id: p.player_id.clone(),
                    name: p.display_name.clone(),
                    total_score: 0,
                    rounds: vec![],
                })
                .collect(),
            rounds: vec![],
            current_round: 1,
            max_cards_per_round: max_cards,
            total_rounds: rounds_total,
            config: config.clone(),
            editing_round: None,
            game_ended: false,
            winners: vec![],
        };
        let events = vec![Event::new(
            "game_started",
            serde_json::json!({
                "game": self.game_id(),
                "players": players.iter().map(|p| &p.player_id).collect::<Vec<_>>(),
                "max_cards_per_round": max_cards,
                "total_rounds": rounds_total,
            }),
        )];
        Ok(Transition::new(state, events))
    }

    fn summary(&self, state: &KachufulState) -> GameSummary {
        GameSummary {
            game_id: self.game_id().into(),
            round: state.current_round,
            phase: state.editing_round.map(|r| format!("editing round {r}")),
            standings: state
                .players
                .iter()
                .map(|p| Standing {
                    player_id: p.player_id.clone(),
                    display_name: p.name.clone(),
                    score: p.total_score as i64,
                    status: None,
                    faction: None,
                })
                .collect(),
            game_over: state.game_ended,
            winner: state.game_ended.then(|| Winner::Players {
                player_ids: state.winners.clone(),
            }),
        }
    }

    fn decode_state(&self, snapshot: &serde_json::Value) -> EngineResult<KachufulState> {
        let state: KachufulState = serde_json::from_value(snapshot.clone())?;
        let ids: Vec<&str> = state.players.iter().map(|p| p.player_id.as_str()).collect();
        check_round_sequence(&ids, state.current_round, state.rounds.iter().map(|r| r.round_number))?;
        if state.rounds.len() > state.total_rounds as usize {
            return Err(EngineError::InconsistentSnapshot(format!(
                "{} rounds played in a {}-round game",
                state.rounds.len(),
                state.total_rounds
            )));
        }
        for round in &state.rounds {
            let entries: Vec<&str> = round.player_scores.iter().map(|e| e.player_id.as_str()).collect();
            check_round_entries(round.round_number, &ids, &entries)?;
        }
        if let Some(open) = state.editing_round {
            if state.round(open).is_none() {
                return Err(EngineError::InconsistentSnapshot(format!(
                    "round {open} is open for editing but was never played"
                )));
            }
        }
        let mut replayed = state.players.clone();
        replay_totals(&mut replayed, &state.rounds);
        if replayed != state.players {
            return Err(EngineError::InconsistentSnapshot(
                "player totals do not match the round log".into(),
            ));
        }
        Ok(state)
    }
}

impl KachufulPlugin {
    /// Cards dealt and trump for the next round to be played.
    pub fn next_deal(&self, state: &KachufulState) -> (u32, TrumpSuit) {
        (
            cards_for_round(state.current_round, state.max_cards_per_round),
            trump_for_round(state.current_round),
        )
    }

    /// Score the current round from every player's bid and tricks.
    pub fn submit_round(
        &self,
        state: &KachufulState,
        entries: &RoundEntries,
    ) -> EngineResult<Transition<KachufulState>> {
        if state.game_ended {
            return Err(EngineError::GameOver);
        }
        if let Some(open) = state.editing_round {
            return Err(EngineError::EditInProgress(open));
        }

        let round_number = state.current_round;
        let cards = cards_for_round(round_number, state.max_cards_per_round);
        let player_scores = score_entries(state, entries, cards)?;

        let mut next = state.clone();
        next.rounds.push(KachufulRound {
            round_number,
            cards,
            trump_suit: trump_for_round(round_number),
            player_scores,
        });
        replay_totals(&mut next.players, &next.rounds);
        next.current_round += 1;

        let mut events = vec![round_event("round_scored", &next, round_number)];
        if next.current_round > next.total_rounds {
            next.game_ended = true;
            next.winners = highest_total_players(&next.players);
            tracing::info!(game = "kachuful", round = round_number, winners = ?next.winners, "game ended");
            events.push(Event::new(
                "game_ended",
                serde_json::json!({"winners": next.winners, "round": round_number}),
            ));
        } else {
            tracing::debug!(game = "kachuful", round = round_number, cards, "round applied");
        }
        Ok(Transition::new(next, events))
    }

    /// Open a completed round for correction. Only one round may be open.
    pub fn begin_edit(&self, state: &KachufulState, round_number: u32) -> EngineResult<Transition<KachufulState>> {
        if let Some(open) = state.editing_round {
            return Err(EngineError::EditInProgress(open));
        }
        if state.round(round_number).is_none() {
            return Err(EngineError::RoundNotFound(round_number));
        }
        let mut next = state.clone();
        next.editing_round = Some(round_number);
        let events = vec![Event::new("edit_started", serde_json::json!({"round": round_number}))];
        Ok(Transition::new(next, events))
    }

    pub fn cancel_edit(&self, state: &KachufulState) -> EngineResult<Transition<KachufulState>> {
        let Some(round_number) = state.editing_round else {
            return Err(EngineError::NoEditOpen);
        };
        let mut next = state.clone();
        next.editing_round = None;
        let events = vec![Event::new("edit_cancelled", serde_json::json!({"round": round_number}))];
        Ok(Transition::new(next, events))
    }

    /// Replace a completed round's bids and tricks, then replay every round to
    /// rebuild totals. Round numbers, order and `current_round` never change.
    /// A finished game stays finished but its winners are re-evaluated.
    pub fn edit_round(
        &self,
        state: &KachufulState,
        round_number: u32,
        entries: &RoundEntries,
    ) -> EngineResult<Transition<KachufulState>> {
        if let Some(open) = state.editing_round {
            if open != round_number {
                return Err(EngineError::EditInProgress(open));
            }
        }
        let cards = state
            .round(round_number)
            .map(|r| r.cards)
            .ok_or(EngineError::RoundNotFound(round_number))?;
        let player_scores = score_entries(state, entries, cards)?;

        let mut next = state.clone();
        next.rounds[(round_number - 1) as usize].player_scores = player_scores;
        replay_totals(&mut next.players, &next.rounds);
        next.editing_round = None;

        let mut events = vec![round_event("round_edited", &next, round_number)];
        if next.game_ended {
            let winners = highest_total_players(&next.players);
            if winners != next.winners {
                tracing::info!(game = "kachuful", round = round_number, winners = ?winners, "winners changed by edit");
                events.push(Event::new(
                    "game_ended",
                    serde_json::json!({"winners": winners, "round": next.total_rounds}),
                ));
            }
            next.winners = winners;
        }
        tracing::debug!(game = "kachuful", round = round_number, "round edited");
        Ok(Transition::new(next, events))
    }
}

fn score_entries(
    state: &KachufulState,
    entries: &RoundEntries,
    cards: u32,
) -> EngineResult<Vec<PlayerRoundEntry>> {
    if let Some(unknown) = entries.keys().find(|id| state.player(id).is_none()) {
        return Err(EngineError::UnknownPlayer(unknown.clone()));
    }
    let config = &state.config;
    state
        .players
        .iter()
        .map(|p| {
            let entry = entries.get(&p.player_id).ok_or_else(|| EngineError::MissingEntry {
                player_id: p.player_id.clone(),
                field: "bid and tricks",
            })?;
            for (field, value) in [("bid", entry.bid), ("tricks", entry.tricks)] {
                if value > cards {
                    return Err(EngineError::OutOfRange {
                        player_id: p.player_id.clone(),
                        field,
                        value,
                        max: cards,
                    });
                }
            }
            Ok(PlayerRoundEntry {
                player_id: p.player_id.clone(),
                result: PlayerRound {
                    bid: entry.bid,
                    tricks: entry.tricks,
                    score: score_bid(entry.bid, entry.tricks, config.zero_bid_bonus, config.penalty),
                },
            })
        })
        .collect()
}

fn round_event(event_type: &str, state: &KachufulState, round_number: u32) -> Event {
    let scores: serde_json::Map<String, serde_json::Value> = state
        .round(round_number)
        .map(|r| {
            r.player_scores
                .iter()
                .map(|s| (s.player_id.clone(), serde_json::json!(s.result)))
                .collect()
        })
        .unwrap_or_default();
    let totals: serde_json::Map<String, serde_json::Value> = state
        .players
        .iter()
        .map(|p| (p.player_id.clone(), serde_json::json!(p.total_score)))
        .collect();
    Event::new(
        event_type,
        serde_json::json!({
            "game": "kachuful",
            "round": round_number,
            "scores": scores,
            "totals": totals,
        }),
    )
}
