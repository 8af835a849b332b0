//! HeartsPlugin: the GamePlugin implementation for Hearts.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::models::*;
use crate::engine::plugin::{check_round_entries, check_round_sequence, GamePlugin};

use super::scoring::{lowest_total_players, moon_shot_points, reached_ceiling, replay_totals};
use super::types::*;

const MAX_DECKS: u32 = 3;

pub struct HeartsPlugin;

impl GamePlugin for HeartsPlugin {
    type State = HeartsState;
    type Config = HeartsConfig;

    fn game_id(&self) -> &str {
        "hearts"
    }
    fn display_name(&self) -> &str {
        "Hearts"
    }
    fn description(&self) -> &str {
        "Avoid hearts and the Queen of Spades. Lowest total wins once anyone \
         crosses the point ceiling."
    }
    fn min_players(&self) -> u32 {
        3
    }
    fn max_players(&self) -> u32 {
        5
    }

    fn create_initial_state(
        &self,
        players: &[PlayerSeat],
        config: &HeartsConfig,
    ) -> EngineResult<Transition<HeartsState>> {
        self.validate_seats(players)?;
        if config.deck_count == 0 || config.deck_count > MAX_DECKS {
            return Err(EngineError::InvalidConfig(format!(
                "deck count must be 1-{MAX_DECKS}, got {}",
                config.deck_count
            )));
        }
        if config.max_points == 0 {
            return Err(EngineError::InvalidConfig("max points must be positive".into()));
        }

        let state = HeartsState {
            players: players
                .iter()
                .map(|p| HeartsPlayer {
                    player_id: p.player_id.clone(),
                    name: p.display_name.clone(),
                    total_score: 0,
                    rounds: vec![],
                })
                .collect(),
            rounds: vec![],
            current_round: 1,
            config: config.clone(),
            game_ended: false,
            winners: vec![],
        };
        let events = vec![Event::new(
            "game_started",
            serde_json::json!({
                "game": self.game_id(),
                "players": players.iter().map(|p| &p.player_id).collect::<Vec<_>>(),
                "deck_count": config.deck_count,
                "max_points": config.max_points,
            }),
        )];
        Ok(Transition::new(state, events))
    }

    fn summary(&self, state: &HeartsState) -> GameSummary {
        GameSummary {
            game_id: self.game_id().into(),
            round: state.current_round,
            phase: None,
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

    /// Rejects snapshots whose round log does not line up with the players.
    fn decode_state(&self, snapshot: &serde_json::Value) -> EngineResult<HeartsState> {
        let state: HeartsState = serde_json::from_value(snapshot.clone())?;
        let ids: Vec<&str> = state.players.iter().map(|p| p.player_id.as_str()).collect();
        check_round_sequence(&ids, state.current_round, state.rounds.iter().map(|r| r.round_number))?;
        for round in &state.rounds {
            let entries: Vec<&str> = round.player_scores.iter().map(|s| s.player_id.as_str()).collect();
            check_round_entries(round.round_number, &ids, &entries)?;
            if let Some(shooter) = &round.moon_shooter {
                if !ids.contains(&shooter.as_str()) {
                    return Err(EngineError::InconsistentSnapshot(format!(
                        "round {} moon shooter {shooter} is not playing",
                        round.round_number
                    )));
                }
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

impl HeartsPlugin {
    /// Record one hand and check the point ceiling.
    pub fn submit_round(
        &self,
        state: &HeartsState,
        input: &RoundInput,
    ) -> EngineResult<Transition<HeartsState>> {
        if state.game_ended {
            return Err(EngineError::GameOver);
        }
        let max_round_points = state.config.max_round_points();

        let (player_scores, moon_shooter) = match input {
            RoundInput::MoonShot { shooter } => {
                if state.player(shooter).is_none() {
                    return Err(EngineError::UnknownPlayer(shooter.clone()));
                }
                (
                    moon_shot_points(&state.players, shooter, max_round_points),
                    Some(shooter.clone()),
                )
            }
            RoundInput::Points { points } => {
                (validate_points(state, points, max_round_points)?, None)
            }
        };

        let round_number = state.current_round;
        let mut next = state.clone();
        next.rounds.push(HeartsRound {
            round_number,
            player_scores,
            moon_shooter: moon_shooter.clone(),
        });
        replay_totals(&mut next.players, &next.rounds);
        next.current_round += 1;

        let mut events = vec![];
        if let Some(shooter) = &moon_shooter {
            events.push(Event::for_player(
                "moon_shot",
                shooter,
                serde_json::json!({"round": round_number, "points": max_round_points}),
            ));
        }
        events.push(round_scored_event(&next, round_number));

        if reached_ceiling(&next.players, next.config.max_points) {
            next.game_ended = true;
            next.winners = lowest_total_players(&next.players);
            tracing::info!(game = "hearts", round = round_number, winners = ?next.winners, "game ended");
            events.push(Event::new(
                "game_ended",
                serde_json::json!({"winners": next.winners, "round": round_number}),
            ));
        } else {
            tracing::debug!(game = "hearts", round = round_number, "round applied");
        }

        Ok(Transition::new(next, events))
    }
}

fn validate_points(
    state: &HeartsState,
    points: &std::collections::HashMap<PlayerId, u32>,
    max_round_points: u32,
) -> EngineResult<Vec<RoundPoints>> {
    if let Some(unknown) = points.keys().find(|id| state.player(id).is_none()) {
        return Err(EngineError::UnknownPlayer(unknown.clone()));
    }
    let mut scores = Vec::with_capacity(state.players.len());
    for p in &state.players {
        let value = *points.get(&p.player_id).ok_or_else(|| EngineError::MissingEntry {
            player_id: p.player_id.clone(),
            field: "points",
        })?;
        if value > max_round_points {
            return Err(EngineError::OutOfRange {
                player_id: p.player_id.clone(),
                field: "points",
                value,
                max: max_round_points,
            });
        }
        scores.push(RoundPoints {
            player_id: p.player_id.clone(),
            points: value,
        });
    }
    if state.config.strict_round_totals {
        let actual: u32 = scores.iter().map(|s| s.points).sum();
        if actual != max_round_points {
            return Err(EngineError::RoundTotalMismatch {
                expected: max_round_points,
                actual,
            });
        }
    }
    Ok(scores)
}

fn round_scored_event(state: &HeartsState, round_number: u32) -> Event {
    let points: serde_json::Map<String, serde_json::Value> = state
        .rounds
        .last()
        .map(|r| {
            r.player_scores
                .iter()
                .map(|s| (s.player_id.clone(), serde_json::json!(s.points)))
                .collect()
        })
        .unwrap_or_default();
    Event::new(
        "round_scored",
        serde_json::json!({"game": "hearts", "round": round_number, "points": points}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_players(n: usize) -> Vec<PlayerSeat> {
        ["A", "B", "C", "D", "E"]
            .iter()
            .take(n)
            .map(|name| PlayerSeat::new(name.to_lowercase(), *name))
            .collect()
    }

    fn new_game(n: usize, config: HeartsConfig) -> HeartsState {
        HeartsPlugin
            .create_initial_state(&test_players(n), &config)
            .unwrap()
            .state
    }

    fn points(entries: &[(&str, u32)]) -> RoundInput {
        RoundInput::Points {
            points: entries.iter().map(|(id, p)| (id.to_string(), *p)).collect(),
        }
    }

    fn totals(state: &HeartsState) -> Vec<u32> {
        state.players.iter().map(|p| p.total_score).collect()
    }

    #[test]
    fn test_metadata() {
        let plugin = HeartsPlugin;
        assert_eq!(plugin.game_id(), "hearts");
        assert_eq!(plugin.min_players(), 3);
        assert_eq!(plugin.max_players(), 5);
    }

    #[test]
    fn test_create_initial_state() {
        let t = HeartsPlugin
            .create_initial_state(&test_players(4), &HeartsConfig::default())
            .unwrap();
        assert_eq!(t.state.current_round, 1);
        assert!(t.state.rounds.is_empty());
        assert_eq!(totals(&t.state), vec![0, 0, 0, 0]);
        assert_eq!(t.events[0].event_type, "game_started");
    }

    #[test]
    fn test_setup_validation() {
        let plugin = HeartsPlugin;
        let config = HeartsConfig::default();
        assert!(matches!(
            plugin.create_initial_state(&test_players(2), &config),
            Err(EngineError::PlayerCount { actual: 2, .. })
        ));
        let bad_decks = HeartsConfig { deck_count: 4, ..config.clone() };
        assert!(matches!(
            plugin.create_initial_state(&test_players(4), &bad_decks),
            Err(EngineError::InvalidConfig(_))
        ));
        let mut dup = test_players(3);
        dup[2].player_id = "a".into();
        assert!(matches!(
            plugin.create_initial_state(&dup, &config),
            Err(EngineError::DuplicatePlayer(_))
        ));
    }

    #[test]
    fn test_moon_shot_round() {
        let state = new_game(4, HeartsConfig::default());
        let t = HeartsPlugin
            .submit_round(&state, &RoundInput::MoonShot { shooter: "c".into() })
            .unwrap();
        assert_eq!(totals(&t.state), vec![26, 26, 0, 26]);
        assert_eq!(t.state.rounds[0].moon_shooter.as_deref(), Some("c"));
        assert_eq!(t.state.current_round, 2);
        assert_eq!(t.events[0].event_type, "moon_shot");
        assert_eq!(t.events[0].player_id.as_deref(), Some("c"));
    }

    #[test]
    fn test_manual_points_accumulate() {
        let state = new_game(4, HeartsConfig::default());
        let t = HeartsPlugin
            .submit_round(&state, &points(&[("a", 13), ("b", 0), ("c", 13), ("d", 0)]))
            .unwrap();
        let t = HeartsPlugin
            .submit_round(&t.state, &points(&[("a", 1), ("b", 5), ("c", 7), ("d", 13)]))
            .unwrap();
        assert_eq!(totals(&t.state), vec![14, 5, 20, 13]);
        assert_eq!(t.state.players[2].rounds, vec![13, 7]);
        assert_eq!(t.state.rounds.len(), 2);
        assert_eq!(t.state.rounds[1].round_number, 2);
        assert!(!t.state.game_ended);
    }

    #[test]
    fn test_sum_is_not_checked_unless_strict() {
        let state = new_game(3, HeartsConfig::default());
        let input = points(&[("a", 1), ("b", 2), ("c", 3)]);
        assert!(HeartsPlugin.submit_round(&state, &input).is_ok());

        let strict = new_game(3, HeartsConfig { strict_round_totals: true, ..Default::default() });
        assert!(matches!(
            HeartsPlugin.submit_round(&strict, &input),
            Err(EngineError::RoundTotalMismatch { expected: 26, actual: 6 })
        ));
    }

    #[test]
    fn test_invalid_input_is_rejected_whole() {
        let state = new_game(3, HeartsConfig::default());
        assert!(matches!(
            HeartsPlugin.submit_round(&state, &points(&[("a", 26), ("b", 0)])),
            Err(EngineError::MissingEntry { .. })
        ));
        assert!(matches!(
            HeartsPlugin.submit_round(&state, &points(&[("a", 27), ("b", 0), ("c", 0)])),
            Err(EngineError::OutOfRange { value: 27, max: 26, .. })
        ));
        assert!(matches!(
            HeartsPlugin.submit_round(&state, &points(&[("a", 0), ("b", 0), ("c", 0), ("z", 26)])),
            Err(EngineError::UnknownPlayer(_))
        ));
        assert!(matches!(
            HeartsPlugin.submit_round(&state, &RoundInput::MoonShot { shooter: "z".into() }),
            Err(EngineError::UnknownPlayer(_))
        ));
        assert!(state.rounds.is_empty());
        assert_eq!(state.current_round, 1);
    }

    #[test]
    fn test_game_ends_at_ceiling_with_lowest_winner() {
        let config = HeartsConfig { max_points: 50, ..Default::default() };
        let mut state = new_game(4, config);
        for _ in 0..2 {
            state = HeartsPlugin
                .submit_round(&state, &points(&[("a", 20), ("b", 2), ("c", 4), ("d", 0)]))
                .unwrap()
                .state;
        }
        assert!(!state.game_ended);
        let t = HeartsPlugin
            .submit_round(&state, &points(&[("a", 10), ("b", 6), ("c", 0), ("d", 10)]))
            .unwrap();
        assert!(t.state.game_ended);
        assert_eq!(totals(&t.state), vec![50, 10, 8, 10]);
        assert_eq!(t.state.winners, vec!["c".to_string()]);
        assert_eq!(t.events.last().unwrap().event_type, "game_ended");

        assert!(matches!(
            HeartsPlugin.submit_round(&t.state, &RoundInput::MoonShot { shooter: "a".into() }),
            Err(EngineError::GameOver)
        ));

        let summary = HeartsPlugin.summary(&t.state);
        assert!(summary.game_over);
        assert!(summary.is_winner("c"));
        assert!(!summary.is_winner("b"));
    }

    #[test]
    fn test_tied_low_totals_share_the_win() {
        let config = HeartsConfig { max_points: 26, ..Default::default() };
        let state = new_game(3, config);
        let t = HeartsPlugin
            .submit_round(&state, &points(&[("a", 26), ("b", 0), ("c", 0)]))
            .unwrap();
        assert_eq!(t.state.winners, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let state = new_game(3, HeartsConfig::default());
        let state = HeartsPlugin
            .submit_round(&state, &RoundInput::MoonShot { shooter: "b".into() })
            .unwrap()
            .state;
        let snapshot = HeartsPlugin.encode_state(&state).unwrap();
        assert_eq!(HeartsPlugin.decode_state(&snapshot).unwrap(), state);

        let unused: HashMap<String, u32> = HashMap::new();
        assert!(HeartsPlugin
            .submit_round(&state, &RoundInput::Points { points: unused })
            .is_err());
    }

    fn played_snapshot() -> serde_json::Value {
        let state = new_game(3, HeartsConfig::default());
        let state = HeartsPlugin
            .submit_round(&state, &points(&[("a", 0), ("b", 0), ("c", 26)]))
            .unwrap()
            .state;
        HeartsPlugin.encode_state(&state).unwrap()
    }

    #[test]
    fn test_decode_rejects_round_missing_a_player() {
        let mut snapshot = played_snapshot();
        snapshot["rounds"][0]["player_scores"]
            .as_array_mut()
            .unwrap()
            .retain(|e| e["player_id"] != "c");
        assert!(matches!(
            HeartsPlugin.decode_state(&snapshot),
            Err(EngineError::InconsistentSnapshot(_))
        ));
    }

    #[test]
    fn test_reordered_round_keeps_points_with_their_player() {
        let mut snapshot = played_snapshot();
        snapshot["rounds"][0]["player_scores"]
            .as_array_mut()
            .unwrap()
            .reverse();
        let state = HeartsPlugin.decode_state(&snapshot).unwrap();
        assert_eq!(state.rounds[0].player_scores[0].player_id, "c");

        let t = HeartsPlugin
            .submit_round(&state, &points(&[("a", 1), ("b", 0), ("c", 0)]))
            .unwrap();
        assert_eq!(totals(&t.state), vec![1, 0, 26]);
    }

    #[test]
    fn test_decode_rejects_tampered_totals_and_numbering() {
        let mut snapshot = played_snapshot();
        snapshot["players"][2]["total_score"] = serde_json::json!(0);
        assert!(HeartsPlugin.decode_state(&snapshot).is_err());

        let mut snapshot = played_snapshot();
        snapshot["rounds"][0]["round_number"] = serde_json::json!(4);
        assert!(matches!(
            HeartsPlugin.decode_state(&snapshot),
            Err(EngineError::InconsistentSnapshot(_))
        ));
    }
}
