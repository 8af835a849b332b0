//! Lifetime statistics per player name and game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::models::{GameKind, GameSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub games_played: u32,
    pub wins: u32,
    pub average_score: f64,
    /// Lowest total for Hearts, highest otherwise. `None` until a game is recorded.
    #[serde(default)]
    pub best_score: Option<i64>,
}

impl GameStats {
    fn empty() -> Self {
        Self {
            games_played: 0,
            wins: 0,
            average_score: 0.0,
            best_score: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub players: BTreeMap<String, BTreeMap<GameKind, GameStats>>,
}

impl PlayerStats {
    pub fn get(&self, name: &str, kind: GameKind) -> Option<&GameStats> {
        self.players.get(name).and_then(|games| games.get(&kind))
    }

    pub fn record_result(&mut self, name: &str, kind: GameKind, score: i64, won: bool) {
        let stats = self
            .players
            .entry(name.to_string())
            .or_default()
            .entry(kind)
            .or_insert_with(GameStats::empty);

        let played = stats.games_played as f64;
        stats.average_score = (stats.average_score * played + score as f64) / (played + 1.0);
        stats.games_played += 1;
        if won {
            stats.wins += 1;
        }
        stats.best_score = Some(match stats.best_score {
            None => score,
            Some(best) if kind.lower_is_better() => best.min(score),
            Some(best) => best.max(score),
        });
    }

    /// Record every standing of a finished game. Unfinished games are ignored.
    pub fn record_finished_game(&mut self, summary: &GameSummary) {
        if !summary.game_over {
            return;
        }
        let Some(kind) = GameKind::from_game_id(&summary.game_id) else {
            return;
        };
        for standing in &summary.standings {
            let won = summary.is_winner(&standing.player_id);
            self.record_result(&standing.display_name, kind, standing.score, won);
        }
    }
}
