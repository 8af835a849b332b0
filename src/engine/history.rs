//! Log of finished games, kept across resets.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::models::{Faction, GameKind, GameSummary, Standing, Winner};

/// One finished game as it stood when it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub game: GameKind,
    /// Seconds since the Unix epoch.
    pub finished_at: u64,
    /// Rounds played.
    pub rounds: u32,
    /// Display names of every winner. For Traitor, the winning faction's players.
    pub winners: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_faction: Option<Faction>,
    pub final_standings: Vec<Standing>,
}

impl GameRecord {
    /// `None` unless the summary describes a finished game of a known kind.
    pub fn from_summary(summary: &GameSummary, id: String, finished_at: u64) -> Option<Self> {
        if !summary.game_over {
            return None;
        }
        let game = GameKind::from_game_id(&summary.game_id)?;
        let winners = summary
            .standings
            .iter()
            .filter(|s| summary.is_winner(&s.player_id))
            .map(|s| s.display_name.clone())
            .collect();
        let winning_faction = match &summary.winner {
            Some(Winner::Faction { faction }) => Some(*faction),
            _ => None,
        };
        Some(Self {
            id,
            game,
            finished_at,
            // The summary round is the next one to play.
            rounds: summary.round.saturating_sub(1),
            winners,
            winning_faction,
            final_standings: summary.standings.clone(),
        })
    }

    pub fn score_of(&self, name: &str) -> Option<i64> {
        self.final_standings
            .iter()
            .find(|s| s.display_name == name)
            .map(|s| s.score)
    }
}

/// Records in the order the games ended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameHistory {
    pub games: Vec<GameRecord>,
}

impl GameHistory {
    pub fn record(&mut self, record: GameRecord) {
        self.games.push(record);
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Matching records, newest first. Player names match ignoring case.
    pub fn filtered<'a>(
        &'a self,
        game: Option<GameKind>,
        player: Option<&'a str>,
    ) -> impl Iterator<Item = &'a GameRecord> + 'a {
        self.games.iter().rev().filter(move |r| {
            game.map_or(true, |g| r.game == g)
                && player.map_or(true, |name| {
                    r.final_standings
                        .iter()
                        .any(|s| s.display_name.eq_ignore_ascii_case(name))
                })
        })
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(id: &str, name: &str, score: i64) -> Standing {
        Standing {
            player_id: id.into(),
            display_name: name.into(),
            score,
            status: None,
            faction: None,
        }
    }

    fn hearts_summary(game_over: bool) -> GameSummary {
        GameSummary {
            game_id: "hearts".into(),
            round: 4,
            phase: None,
            standings: vec![standing("p1", "Ann", 104), standing("p2", "Ben", 31), standing("p3", "Cat", 31)],
            game_over,
            winner: Some(Winner::Players {
                player_ids: vec!["p2".into(), "p3".into()],
            }),
        }
    }

    #[test]
    fn test_record_from_finished_summary() {
        assert!(GameRecord::from_summary(&hearts_summary(false), "g1".into(), 0).is_none());

        let record = GameRecord::from_summary(&hearts_summary(true), "g1".into(), 1_700_000_000).unwrap();
        assert_eq!(record.game, GameKind::Hearts);
        assert_eq!(record.rounds, 3);
        assert_eq!(record.winners, vec!["Ben".to_string(), "Cat".to_string()]);
        assert_eq!(record.winning_faction, None);
        assert_eq!(record.score_of("Ann"), Some(104));
        assert_eq!(record.score_of("Dan"), None);
    }

    #[test]
    fn test_faction_winners_are_named() {
        let mut mafia = standing("p1", "Ann", 1);
        mafia.faction = Some(Faction::Mafia);
        let mut town = standing("p2", "Ben", 0);
        town.faction = Some(Faction::Town);
        let summary = GameSummary {
            game_id: "traitor".into(),
            round: 3,
            phase: Some("night".into()),
            standings: vec![mafia, town],
            game_over: true,
            winner: Some(Winner::Faction { faction: Faction::Mafia }),
        };
        let record = GameRecord::from_summary(&summary, "g2".into(), 0).unwrap();
        assert_eq!(record.winners, vec!["Ann".to_string()]);
        assert_eq!(record.winning_faction, Some(Faction::Mafia));
    }

    #[test]
    fn test_filtered_newest_first() {
        let mut history = GameHistory::default();
        let mut first = GameRecord::from_summary(&hearts_summary(true), "g1".into(), 10).unwrap();
        history.record(first.clone());
        first.id = "g2".into();
        first.game = GameKind::Kachuful;
        history.record(first);

        let ids: Vec<&str> = history.filtered(None, None).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["g2", "g1"]);
        assert_eq!(history.filtered(Some(GameKind::Hearts), None).count(), 1);
        assert_eq!(history.filtered(None, Some("cat")).count(), 2);
        assert_eq!(history.filtered(None, Some("Dan")).count(), 0);

        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(serde_json::from_value::<GameHistory>(json).unwrap(), history);
    }
}
