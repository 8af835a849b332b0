//! The GamePlugin trait every game implements.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::models::*;

/// Trait that every game must implement.
///
/// Transitions never mutate the state they are handed: they validate the whole
/// input first and return a fresh state, so a failed call leaves nothing half
/// applied.
pub trait GamePlugin: Send + Sync {
    type State: Clone + PartialEq + Serialize + DeserializeOwned;
    type Config;

    fn game_id(&self) -> &str;
    fn display_name(&self) -> &str;
    fn description(&self) -> &str;
    fn min_players(&self) -> u32;
    fn max_players(&self) -> u32;

    /// Create initial game state from players + config.
    fn create_initial_state(
        &self,
        players: &[PlayerSeat],
        config: &Self::Config,
    ) -> EngineResult<Transition<Self::State>>;

    /// Scoreboard view of a state.
    fn summary(&self, state: &Self::State) -> GameSummary;

    fn is_over(&self, state: &Self::State) -> bool {
        self.summary(state).game_over
    }

    /// Deserialize a stored snapshot into strongly-typed game state.
    fn decode_state(&self, snapshot: &serde_json::Value) -> EngineResult<Self::State> {
        Ok(serde_json::from_value(snapshot.clone())?)
    }

    /// Serialize strongly-typed game state into a snapshot.
    fn encode_state(&self, state: &Self::State) -> EngineResult<serde_json::Value> {
        Ok(serde_json::to_value(state)?)
    }

    /// Check seat count, empty names and duplicate ids.
    fn validate_seats(&self, players: &[PlayerSeat]) -> EngineResult<()> {
        let n = players.len();
        if n < self.min_players() as usize || n > self.max_players() as usize {
            return Err(EngineError::PlayerCount {
                game: self.display_name().to_string(),
                min: self.min_players(),
                max: self.max_players(),
                actual: n,
            });
        }
        for (i, p) in players.iter().enumerate() {
            if p.display_name.trim().is_empty() {
                return Err(EngineError::EmptyName);
            }
            if players[..i].iter().any(|q| q.player_id == p.player_id) {
                return Err(EngineError::DuplicatePlayer(p.player_id.clone()));
            }
        }
        Ok(())
    }
}

/// Object-safe view of a plugin that works on raw snapshots, so a registry can
/// hold every game behind one type.
pub trait DynGame: Send + Sync {
    fn game_id(&self) -> &str;
    fn display_name(&self) -> &str;
    fn description(&self) -> &str;
    fn min_players(&self) -> u32;
    fn max_players(&self) -> u32;
    fn summarize(&self, snapshot: &serde_json::Value) -> EngineResult<GameSummary>;
    /// Decode and validate a raw snapshot without keeping the state.
    fn check_snapshot(&self, snapshot: &serde_json::Value) -> EngineResult<()>;
}

/// Wraps a typed plugin as a [`DynGame`].
pub struct SnapshotAdapter<P>(pub P);

impl<P: GamePlugin> DynGame for SnapshotAdapter<P> {
    fn game_id(&self) -> &str {
        self.0.game_id()
    }
    fn display_name(&self) -> &str {
        self.0.display_name()
    }
    fn description(&self) -> &str {
        self.0.description()
    }
    fn min_players(&self) -> u32 {
        self.0.min_players()
    }
    fn max_players(&self) -> u32 {
        self.0.max_players()
    }

    fn summarize(&self, snapshot: &serde_json::Value) -> EngineResult<GameSummary> {
        let state = self.0.decode_state(snapshot)?;
        Ok(self.0.summary(&state))
    }

    fn check_snapshot(&self, snapshot: &serde_json::Value) -> EngineResult<()> {
        self.0.decode_state(snapshot).map(|_| ())
    }
}

/// Structural checks for a decoded snapshot: player ids are unique, rounds are
/// numbered `1..=n` in order and `current_round` is the one after the last.
pub fn check_round_sequence(
    player_ids: &[&str],
    current_round: u32,
    round_numbers: impl IntoIterator<Item = u32>,
) -> EngineResult<()> {
    for (i, id) in player_ids.iter().enumerate() {
        if player_ids[..i].contains(id) {
            return Err(EngineError::DuplicatePlayer(id.to_string()));
        }
    }
    let mut played = 0;
    for (i, number) in round_numbers.into_iter().enumerate() {
        let expected = i as u32 + 1;
        if number != expected {
            return Err(EngineError::InconsistentSnapshot(format!(
                "round {number} found where round {expected} belongs"
            )));
        }
        played = expected;
    }
    if current_round != played + 1 {
        return Err(EngineError::InconsistentSnapshot(format!(
            "current round is {current_round} after {played} played rounds"
        )));
    }
    Ok(())
}

/// A scored round must hold exactly one entry for every player id, in any order.
pub fn check_round_entries(round_number: u32, player_ids: &[&str], entry_ids: &[&str]) -> EngineResult<()> {
    if let Some(unknown) = entry_ids.iter().find(|id| !player_ids.contains(*id)) {
        return Err(EngineError::InconsistentSnapshot(format!(
            "round {round_number} scores unknown player {unknown}"
        )));
    }
    if let Some(missing) = player_ids.iter().find(|id| !entry_ids.contains(*id)) {
        return Err(EngineError::InconsistentSnapshot(format!(
            "round {round_number} has no entry for {missing}"
        )));
    }
    if entry_ids.len() != player_ids.len() {
        return Err(EngineError::InconsistentSnapshot(format!(
            "round {round_number} scores a player more than once"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_sequence() {
        let ids = ["a", "b"];
        assert!(check_round_sequence(&ids, 1, []).is_ok());
        assert!(check_round_sequence(&ids, 3, [1, 2]).is_ok());
        assert!(matches!(
            check_round_sequence(&ids, 3, [1, 3]),
            Err(EngineError::InconsistentSnapshot(_))
        ));
        assert!(matches!(
            check_round_sequence(&ids, 2, [1, 2]),
            Err(EngineError::InconsistentSnapshot(_))
        ));
        assert!(matches!(
            check_round_sequence(&["a", "a"], 1, []),
            Err(EngineError::DuplicatePlayer(_))
        ));
    }

    #[test]
    fn test_round_entries_match_players_in_any_order() {
        let ids = ["a", "b", "c"];
        assert!(check_round_entries(1, &ids, &["c", "a", "b"]).is_ok());
        let bad: [&[&str]; 3] = [&["a", "b"], &["a", "b", "z"], &["a", "b", "c", "c"]];
        for bad in bad {
            assert!(matches!(
                check_round_entries(1, &ids, bad),
                Err(EngineError::InconsistentSnapshot(_))
            ));
        }
    }
}
