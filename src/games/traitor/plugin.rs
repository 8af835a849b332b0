//! TraitorPlugin: the GamePlugin implementation for Traitor.
//!
//! Phase cycle: night -> day -> night ... Votes happen during the day. The
//! night pointer starts at round 1 and every resolved night bumps the round.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::identity::{SeededShuffle, Shuffle};
use crate::engine::models::*;
use crate::engine::plugin::{check_round_sequence, GamePlugin};

use super::roles::assign_roles;
use super::rules::check_winner;
use super::types::*;

pub struct TraitorPlugin;

impl GamePlugin for TraitorPlugin {
    type State = TraitorState;
    type Config = TraitorConfig;

    fn game_id(&self) -> &str {
        "traitor"
    }
    fn display_name(&self) -> &str {
        "Traitor"
    }
    fn description(&self) -> &str {
        "Hidden mafia members pick off the town at night while the town votes \
         out suspects by day."
    }
    fn min_players(&self) -> u32 {
        5
    }
    fn max_players(&self) -> u32 {
        20
    }

    fn create_initial_state(
        &self,
        players: &[PlayerSeat],
        config: &TraitorConfig,
    ) -> EngineResult<Transition<TraitorState>> {
        let mut shuffle = SeededShuffle::new(config.random_seed);
        self.create_with_shuffle(players, config, &mut shuffle)
    }

    fn summary(&self, state: &TraitorState) -> GameSummary {
        GameSummary {
            game_id: self.game_id().into(),
            round: state.current_round,
            phase: Some(state.phase.name().into()),
            standings: state
                .players
                .iter()
                .map(|p| Standing {
                    player_id: p.player_id.clone(),
                    display_name: p.name.clone(),
                    score: if p.is_alive { 1 } else { 0 },
                    status: Some(player_status(p)),
                    faction: Some(p.role.faction()),
                })
                .collect(),
            game_over: state.game_ended,
            winner: state.winner.map(|faction| Winner::Faction { faction }),
        }
    }

    /// Every player named in the round log must exist and be eliminated.
    fn decode_state(&self, snapshot: &serde_json::Value) -> EngineResult<TraitorState> {
        let state: TraitorState = serde_json::from_value(snapshot.clone())?;
        let ids: Vec<&str> = state.players.iter().map(|p| p.player_id.as_str()).collect();
        check_round_sequence(&ids, state.current_round, state.rounds.iter().map(|r| r.round_number))?;
        for round in &state.rounds {
            let day = round.day.as_ref().and_then(|d| d.eliminated.as_ref());
            for id in round.night.eliminated.iter().chain(day) {
                if state.player(id).map_or(true, |p| p.is_alive) {
                    return Err(EngineError::InconsistentSnapshot(format!(
                        "round {} eliminated {id}, who is not an eliminated player",
                        round.round_number
                    )));
                }
            }
        }
        Ok(state)
    }
}

impl TraitorPlugin {
    /// Set up a game with an injected shuffle for the role deal.
    pub fn create_with_shuffle<S: Shuffle>(
        &self,
        players: &[PlayerSeat],
        config: &TraitorConfig,
        shuffle: &mut S,
    ) -> EngineResult<Transition<TraitorState>> {
        self.validate_seats(players)?;
        let dealt = assign_roles(players, &config.roles, shuffle)?;

        let state = TraitorState {
            players: dealt,
            rounds: vec![],
            current_round: 1,
            phase: TraitorPhase::Night,
            config: config.clone(),
            last_investigation: None,
            game_ended: false,
            winner: None,
        };
        let roles = &config.roles;
        let events = vec![
            Event::new(
                "game_started",
                serde_json::json!({
                    "game": self.game_id(),
                    "players": players.iter().map(|p| &p.player_id).collect::<Vec<_>>(),
                }),
            ),
            Event::new(
                "roles_assigned",
                serde_json::json!({
                    "mafia": roles.mafia,
                    "detective": roles.detective,
                    "doctor": roles.doctor,
                    "civilian": roles.civilian,
                }),
            ),
        ];
        Ok(Transition::new(state, events))
    }

    /// Apply the night's kill, save and investigation, then move to day.
    pub fn resolve_night(
        &self,
        state: &TraitorState,
        actions: &NightActions,
    ) -> EngineResult<Transition<TraitorState>> {
        ensure_phase(state, TraitorPhase::Night, "resolve_night")?;

        if let Some(target) = &actions.mafia_target {
            let p = living_target(state, target)?;
            if p.role == Role::Mafia {
                return Err(EngineError::InvalidTarget {
                    player_id: target.clone(),
                    reason: "mafia cannot target their own",
                });
            }
        }

        let doctor_alive = state.living_with_role(Role::Doctor).next().is_some();
        let doctor_save = match &actions.doctor_save {
            Some(target) if doctor_alive => {
                living_target(state, target)?;
                Some(target.clone())
            }
            _ => None,
        };

        let detective = state.living_with_role(Role::Detective).next().map(|p| p.player_id.clone());
        let investigation = match (&actions.detective_check, detective) {
            (Some(target), Some(detective)) => {
                let p = living_target(state, target)?;
                if *target == detective {
                    return Err(EngineError::InvalidTarget {
                        player_id: target.clone(),
                        reason: "the detective cannot investigate themself",
                    });
                }
                Some(Investigation {
                    detective,
                    target: target.clone(),
                    result: p.role,
                })
            }
            _ => None,
        };

        let round_number = state.current_round;
        let mut next = state.clone();
        let mut events = vec![];
        for p in &mut next.players {
            p.is_protected = doctor_save.as_deref() == Some(p.player_id.as_str());
        }

        let mut eliminated = vec![];
        if let Some(inv) = &investigation {
            events.push(Event::for_player(
                "player_investigated",
                &inv.detective,
                serde_json::json!({"target": inv.target, "result": inv.result}),
            ));
            let exposed = state.config.rules.investigative_elimination
                && inv.result == Role::Mafia
                && doctor_save.as_ref() != Some(&inv.target);
            if exposed {
                eliminate(&mut next, &inv.target, EliminationReason::Investigation, round_number);
                eliminated.push(inv.target.clone());
            }
        }

        if let Some(target) = &actions.mafia_target {
            if doctor_save.as_ref() == Some(target) {
                events.push(Event::for_player("player_saved", target, serde_json::json!({"round": round_number})));
            } else if !eliminated.contains(target) {
                eliminate(&mut next, target, EliminationReason::Kill, round_number);
                eliminated.push(target.clone());
            }
        }
        for id in &eliminated {
            let reason = next.player(id).and_then(|p| p.elimination_reason);
            events.push(Event::for_player(
                "player_eliminated",
                id,
                serde_json::json!({"reason": reason, "round": round_number}),
            ));
        }

        next.last_investigation = investigation.clone();
        next.rounds.push(TraitorRound {
            round_number,
            night: NightOutcome {
                actions: NightActions {
                    mafia_target: actions.mafia_target.clone(),
                    doctor_save,
                    detective_check: investigation.as_ref().map(|i| i.target.clone()),
                },
                investigation,
                eliminated: eliminated.clone(),
            },
            day: None,
        });
        next.phase = TraitorPhase::Day;
        next.current_round += 1;

        events.insert(
            0,
            Event::new(
                "night_resolved",
                serde_json::json!({"round": round_number, "eliminated": eliminated}),
            ),
        );
        tracing::debug!(game = "traitor", round = round_number, eliminated = ?eliminated, "night resolved");
        finish_if_won(&mut next, &mut events);
        Ok(Transition::new(next, events))
    }

    /// The town votes a player out, then night falls.
    pub fn eliminate_by_vote(&self, state: &TraitorState, target: &str) -> EngineResult<Transition<TraitorState>> {
        ensure_phase(state, TraitorPhase::Day, "eliminate_by_vote")?;
        living_target(state, target)?;

        let round_number = day_round(state);
        let mut next = state.clone();
        eliminate(&mut next, target, EliminationReason::Vote, round_number);
        end_day(&mut next, Some(target.to_string()));

        let mut events = vec![Event::for_player(
            "player_eliminated",
            target,
            serde_json::json!({"reason": EliminationReason::Vote, "round": round_number}),
        )];
        tracing::debug!(game = "traitor", round = round_number, player = target, "voted out");
        finish_if_won(&mut next, &mut events);
        if !next.game_ended {
            next.phase = TraitorPhase::Night;
        }
        Ok(Transition::new(next, events))
    }

    /// End the day with no elimination (e.g. a tied vote).
    pub fn skip_day(&self, state: &TraitorState) -> EngineResult<Transition<TraitorState>> {
        ensure_phase(state, TraitorPhase::Day, "skip_day")?;
        let mut next = state.clone();
        end_day(&mut next, None);
        next.phase = TraitorPhase::Night;
        let events = vec![Event::new("day_skipped", serde_json::json!({"round": day_round(state)}))];
        Ok(Transition::new(next, events))
    }
}

fn ensure_phase(state: &TraitorState, expected: TraitorPhase, operation: &'static str) -> EngineResult<()> {
    if state.game_ended {
        return Err(EngineError::GameOver);
    }
    if state.phase != expected {
        return Err(EngineError::WrongPhase {
            operation,
            expected: expected.name(),
            actual: state.phase.name(),
        });
    }
    Ok(())
}

fn living_target<'a>(state: &'a TraitorState, target: &str) -> EngineResult<&'a TraitorPlayer> {
    let p = state
        .player(target)
        .ok_or_else(|| EngineError::UnknownPlayer(target.to_string()))?;
    if !p.is_alive {
        return Err(EngineError::InvalidTarget {
            player_id: target.to_string(),
            reason: "player is already eliminated",
        });
    }
    Ok(p)
}

fn eliminate(state: &mut TraitorState, target: &str, reason: EliminationReason, round: u32) {
    if let Some(p) = state.players.iter_mut().find(|p| p.player_id == target) {
        p.is_alive = false;
        p.is_protected = false;
        p.elimination_reason = Some(reason);
        p.eliminated_round = Some(round);
    }
}

/// A day belongs to the round of the night before it, so a vote is recorded
/// under the same number as the `TraitorRound` holding its outcome.
fn day_round(state: &TraitorState) -> u32 {
    state
        .rounds
        .last()
        .map(|r| r.round_number)
        .unwrap_or(state.current_round)
}

fn end_day(state: &mut TraitorState, eliminated: Option<PlayerId>) {
    for p in &mut state.players {
        p.is_protected = false;
    }
    if let Some(round) = state.rounds.last_mut() {
        round.day = Some(DayOutcome { eliminated });
    }
}

fn finish_if_won(state: &mut TraitorState, events: &mut Vec<Event>) {
    if let Some(faction) = check_winner(&state.players, &state.config.roles, &state.config.rules) {
        state.game_ended = true;
        state.winner = Some(faction);
        tracing::info!(game = "traitor", round = state.current_round, winner = ?faction, "game ended");
        events.push(Event::new("game_ended", serde_json::json!({"winner": faction})));
    }
}

fn player_status(p: &TraitorPlayer) -> String {
    match (p.is_alive, p.elimination_reason, p.eliminated_round) {
        (true, _, _) if p.is_protected => "alive (protected)".into(),
        (true, _, _) => "alive".into(),
        (false, Some(reason), Some(round)) => {
            let how = match reason {
                EliminationReason::Vote => "voted out",
                EliminationReason::Kill => "killed",
                EliminationReason::Investigation => "exposed",
            };
            format!("{how} in round {round}")
        }
        (false, _, _) => "eliminated".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::identity::NoShuffle;

    fn test_players(n: usize) -> Vec<PlayerSeat> {
        (1..=n).map(|i| PlayerSeat::new(format!("p{i}"), format!("Player {i}"))).collect()
    }

    /// Unshuffled deal: mafia first, then detectives, doctors, civilians.
    fn new_game(n: usize, roles: RoleConfig, rules: TraitorRules) -> TraitorState {
        let config = TraitorConfig { roles, rules, random_seed: None };
        TraitorPlugin
            .create_with_shuffle(&test_players(n), &config, &mut NoShuffle)
            .unwrap()
            .state
    }

    /// p1 mafia, p2 detective, p3 doctor, p4..p6 civilians.
    fn six_player_game() -> TraitorState {
        new_game(6, RoleConfig { mafia: 1, detective: 1, doctor: 1, civilian: 3 }, TraitorRules::default())
    }

    fn night(kill: Option<&str>, save: Option<&str>, check: Option<&str>) -> NightActions {
        NightActions {
            mafia_target: kill.map(String::from),
            doctor_save: save.map(String::from),
            detective_check: check.map(String::from),
        }
    }

    #[test]
    fn test_create_initial_state() {
        let state = six_player_game();
        assert_eq!(state.phase, TraitorPhase::Night);
        assert_eq!(state.current_round, 1);
        assert_eq!(state.players[0].role, Role::Mafia);
        assert_eq!(state.players[1].role, Role::Detective);
        assert!(state.players.iter().all(|p| p.is_alive));
    }

    #[test]
    fn test_setup_rejects_bad_roles() {
        let config = TraitorConfig {
            roles: RoleConfig { mafia: 1, detective: 1, doctor: 1, civilian: 1 },
            rules: TraitorRules::default(),
            random_seed: Some(1),
        };
        assert!(matches!(
            TraitorPlugin.create_initial_state(&test_players(5), &config),
            Err(EngineError::RoleCountMismatch { expected: 5, actual: 4 })
        ));
        let config = TraitorConfig { roles: RoleConfig::with_civilians(4, 1, 0, 0), ..config };
        assert!(matches!(
            TraitorPlugin.create_initial_state(&test_players(4), &config),
            Err(EngineError::PlayerCount { .. })
        ));
    }

    #[test]
    fn test_seeded_setup_is_reproducible() {
        let config = TraitorConfig {
            roles: RoleConfig::with_civilians(8, 2, 1, 1),
            rules: TraitorRules::default(),
            random_seed: Some(77),
        };
        let a = TraitorPlugin.create_initial_state(&test_players(8), &config).unwrap().state;
        let b = TraitorPlugin.create_initial_state(&test_players(8), &config).unwrap().state;
        assert_eq!(a, b);
    }

    #[test]
    fn test_night_kill() {
        let state = six_player_game();
        let t = TraitorPlugin.resolve_night(&state, &night(Some("p4"), Some("p5"), None)).unwrap();
        let victim = t.state.player("p4").unwrap();
        assert!(!victim.is_alive);
        assert_eq!(victim.elimination_reason, Some(EliminationReason::Kill));
        assert_eq!(victim.eliminated_round, Some(1));
        assert!(t.state.player("p5").unwrap().is_protected);
        assert_eq!(t.state.phase, TraitorPhase::Day);
        assert_eq!(t.state.current_round, 2);
        assert_eq!(t.state.rounds[0].round_number, 1);
        assert_eq!(t.state.rounds[0].night.eliminated, vec!["p4".to_string()]);
        assert!(!t.state.game_ended);
    }

    #[test]
    fn test_doctor_save_cancels_kill() {
        let state = six_player_game();
        let t = TraitorPlugin.resolve_night(&state, &night(Some("p4"), Some("p4"), None)).unwrap();
        let target = t.state.player("p4").unwrap();
        assert!(target.is_alive);
        assert_eq!(target.elimination_reason, None);
        assert!(t.events.iter().any(|e| e.event_type == "player_saved"));
        assert!(t.state.rounds[0].night.eliminated.is_empty());
    }

    #[test]
    fn test_save_ignored_without_living_doctor() {
        let state = six_player_game();
        let t = TraitorPlugin.resolve_night(&state, &night(Some("p3"), None, None)).unwrap();
        let t = TraitorPlugin.skip_day(&t.state).unwrap();
        // Doctor is dead, so naming p4 as the save does nothing.
        let t = TraitorPlugin.resolve_night(&t.state, &night(Some("p4"), Some("p4"), None)).unwrap();
        assert!(!t.state.player("p4").unwrap().is_alive);
        assert_eq!(t.state.rounds[1].night.actions.doctor_save, None);
    }

    #[test]
    fn test_investigation_reveals_role() {
        let state = six_player_game();
        let t = TraitorPlugin.resolve_night(&state, &night(None, None, Some("p1"))).unwrap();
        let inv = t.state.last_investigation.clone().unwrap();
        assert_eq!(inv.detective, "p2");
        assert_eq!(inv.target, "p1");
        assert_eq!(inv.result, Role::Mafia);
        assert!(t.state.player("p1").unwrap().is_alive);

        assert!(matches!(
            TraitorPlugin.resolve_night(&state, &night(None, None, Some("p2"))),
            Err(EngineError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_investigative_elimination_rule() {
        let rules = TraitorRules { investigative_elimination: true, ..Default::default() };
        let roles = RoleConfig { mafia: 2, detective: 1, doctor: 1, civilian: 3 };
        let state = new_game(7, roles, rules);
        // p1, p2 mafia; p3 detective; p4 doctor.
        let t = TraitorPlugin.resolve_night(&state, &night(Some("p5"), None, Some("p1"))).unwrap();
        let exposed = t.state.player("p1").unwrap();
        assert!(!exposed.is_alive);
        assert_eq!(exposed.elimination_reason, Some(EliminationReason::Investigation));
        assert!(!t.state.player("p5").unwrap().is_alive);

        let t = TraitorPlugin.resolve_night(&state, &night(None, Some("p1"), Some("p1"))).unwrap();
        assert!(t.state.player("p1").unwrap().is_alive);
    }

    #[test]
    fn test_night_target_validation() {
        let state = six_player_game();
        assert!(matches!(
            TraitorPlugin.resolve_night(&state, &night(Some("p1"), None, None)),
            Err(EngineError::InvalidTarget { .. })
        ));
        assert!(matches!(
            TraitorPlugin.resolve_night(&state, &night(Some("p99"), None, None)),
            Err(EngineError::UnknownPlayer(_))
        ));
        let t = TraitorPlugin.resolve_night(&state, &night(Some("p4"), None, None)).unwrap();
        let t = TraitorPlugin.skip_day(&t.state).unwrap();
        assert!(matches!(
            TraitorPlugin.resolve_night(&t.state, &night(Some("p4"), None, None)),
            Err(EngineError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_phase_guards() {
        let state = six_player_game();
        assert!(matches!(
            TraitorPlugin.eliminate_by_vote(&state, "p4"),
            Err(EngineError::WrongPhase { expected: "day", actual: "night", .. })
        ));
        assert!(matches!(TraitorPlugin.skip_day(&state), Err(EngineError::WrongPhase { .. })));

        let day = TraitorPlugin.resolve_night(&state, &NightActions::default()).unwrap().state;
        assert!(matches!(
            TraitorPlugin.resolve_night(&day, &NightActions::default()),
            Err(EngineError::WrongPhase { expected: "night", actual: "day", .. })
        ));
    }

    #[test]
    fn test_vote_returns_to_night() {
        let state = six_player_game();
        let day = TraitorPlugin.resolve_night(&state, &night(None, Some("p4"), None)).unwrap().state;
        let t = TraitorPlugin.eliminate_by_vote(&day, "p5").unwrap();
        let voted = t.state.player("p5").unwrap();
        assert_eq!(voted.elimination_reason, Some(EliminationReason::Vote));
        // Same number as the round record the vote is attached to.
        assert_eq!(voted.eliminated_round, Some(t.state.rounds[0].round_number));
        assert_eq!(t.state.current_round, 2);
        assert_eq!(t.state.phase, TraitorPhase::Night);
        assert!(t.state.players.iter().all(|p| !p.is_protected));
        assert_eq!(
            t.state.rounds[0].day,
            Some(DayOutcome { eliminated: Some("p5".into()) })
        );
    }

    #[test]
    fn test_parity_win_by_votes() {
        // p1 mafia, p2 detective, p3..p5 civilians; one civilian is already gone.
        let mut state = new_game(5, RoleConfig { mafia: 1, detective: 1, doctor: 0, civilian: 3 }, TraitorRules::default());
        state.players[4].is_alive = false;
        state.phase = TraitorPhase::Day;
        assert_eq!(check_winner(&state.players, &state.config.roles, &state.config.rules), None);

        let t = TraitorPlugin.eliminate_by_vote(&state, "p3").unwrap();
        assert!(!t.state.game_ended);
        let t = TraitorPlugin.resolve_night(&t.state, &NightActions::default()).unwrap();
        let t = TraitorPlugin.eliminate_by_vote(&t.state, "p4").unwrap();
        assert!(t.state.game_ended);
        assert_eq!(t.state.winner, Some(Faction::Mafia));
        assert_eq!(t.state.phase, TraitorPhase::Day);
        assert!(matches!(
            TraitorPlugin.resolve_night(&t.state, &NightActions::default()),
            Err(EngineError::GameOver)
        ));
    }

    #[test]
    fn test_town_wins_by_voting_out_mafia() {
        let state = six_player_game();
        let day = TraitorPlugin.resolve_night(&state, &NightActions::default()).unwrap().state;
        let t = TraitorPlugin.eliminate_by_vote(&day, "p1").unwrap();
        assert_eq!(t.state.winner, Some(Faction::Town));
        let summary = TraitorPlugin.summary(&t.state);
        assert!(summary.game_over);
        assert!(summary.is_winner("p2"));
        assert!(!summary.is_winner("p1"));
        assert_eq!(t.events.last().unwrap().event_type, "game_ended");
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let state = six_player_game();
        let state = TraitorPlugin
            .resolve_night(&state, &night(Some("p6"), Some("p5"), Some("p4")))
            .unwrap()
            .state;
        let snapshot = TraitorPlugin.encode_state(&state).unwrap();
        assert_eq!(TraitorPlugin.decode_state(&snapshot).unwrap(), state);
    }

    #[test]
    fn test_decode_rejects_broken_round_log() {
        let state = six_player_game();
        let state = TraitorPlugin
            .resolve_night(&state, &night(Some("p6"), None, None))
            .unwrap()
            .state;
        let snapshot = TraitorPlugin.encode_state(&state).unwrap();

        let mut revived = snapshot.clone();
        revived["players"][5]["is_alive"] = serde_json::json!(true);
        assert!(matches!(
            TraitorPlugin.decode_state(&revived),
            Err(EngineError::InconsistentSnapshot(_))
        ));

        let mut skipped = snapshot;
        skipped["current_round"] = serde_json::json!(5);
        assert!(matches!(
            TraitorPlugin.decode_state(&skipped),
            Err(EngineError::InconsistentSnapshot(_))
        ));
    }
}
