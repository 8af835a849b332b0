//! Scoring for Hearts: per-round points, moon shots, and the end-of-game check.

use crate::engine::models::PlayerId;

use super::types::{HeartsPlayer, HeartsRound, RoundPoints};

/// Shooter takes 0, everyone else takes every point in play.
pub fn moon_shot_points(players: &[HeartsPlayer], shooter: &str, max_round_points: u32) -> Vec<RoundPoints> {
    players
        .iter()
        .map(|p| RoundPoints {
            player_id: p.player_id.clone(),
            points: if p.player_id == shooter { 0 } else { max_round_points },
        })
        .collect()
}

/// Totals are rebuilt from the round log rather than kept as running sums.
/// Each player's points are looked up by id in every round.
pub fn replay_totals(players: &mut [HeartsPlayer], rounds: &[HeartsRound]) {
    for player in players.iter_mut() {
        let history: Vec<u32> = rounds.iter().filter_map(|r| r.points_for(&player.player_id)).collect();
        player.total_score = history.iter().sum();
        player.rounds = history;
    }
}

pub fn reached_ceiling(players: &[HeartsPlayer], max_points: u32) -> bool {
    players.iter().any(|p| p.total_score >= max_points)
}

/// Every player sharing the lowest total, in seat order.
pub fn lowest_total_players(players: &[HeartsPlayer]) -> Vec<PlayerId> {
    let Some(low) = players.iter().map(|p| p.total_score).min() else {
        return vec![];
    };
    players
        .iter()
        .filter(|p| p.total_score == low)
        .map(|p| p.player_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, total: u32) -> HeartsPlayer {
        HeartsPlayer {
            player_id: id.into(),
            name: id.to_uppercase(),
            total_score: total,
            rounds: vec![],
        }
    }

    #[test]
    fn test_moon_shot_points() {
        let players = vec![player("a", 0), player("b", 0), player("c", 0), player("d", 0)];
        let points: Vec<u32> = moon_shot_points(&players, "c", 26).iter().map(|r| r.points).collect();
        assert_eq!(points, vec![26, 26, 0, 26]);
    }

    #[test]
    fn test_moon_shot_scales_with_decks() {
        let players = vec![player("a", 0), player("b", 0), player("c", 0)];
        let points: Vec<u32> = moon_shot_points(&players, "a", 52).iter().map(|r| r.points).collect();
        assert_eq!(points, vec![0, 52, 52]);
    }

    #[test]
    fn test_replay_totals() {
        let mut players = vec![player("a", 99), player("b", 99)];
        let round = |n, a, b| HeartsRound {
            round_number: n,
            player_scores: vec![
                RoundPoints { player_id: "a".into(), points: a },
                RoundPoints { player_id: "b".into(), points: b },
            ],
            moon_shooter: None,
        };
        replay_totals(&mut players, &[round(1, 20, 6), round(2, 0, 26)]);
        assert_eq!(players[0].rounds, vec![20, 0]);
        assert_eq!(players[0].total_score, 20);
        assert_eq!(players[1].total_score, 32);
    }

    #[test]
    fn test_replay_matches_entries_by_id() {
        let mut players = vec![player("a", 0), player("b", 0), player("c", 0)];
        let round = HeartsRound {
            round_number: 1,
            player_scores: vec![
                RoundPoints { player_id: "c".into(), points: 26 },
                RoundPoints { player_id: "a".into(), points: 0 },
                RoundPoints { player_id: "b".into(), points: 0 },
            ],
            moon_shooter: None,
        };
        replay_totals(&mut players, &[round]);
        let totals: Vec<u32> = players.iter().map(|p| p.total_score).collect();
        assert_eq!(totals, vec![0, 0, 26]);
    }

    #[test]
    fn test_lowest_total_keeps_ties() {
        let players = vec![player("a", 40), player("b", 12), player("c", 12), player("d", 100)];
        assert_eq!(lowest_total_players(&players), vec!["b".to_string(), "c".to_string()]);
        assert!(reached_ceiling(&players, 100));
        assert!(!reached_ceiling(&players, 101));
    }
}
