//! Win condition, evaluated after every elimination.

use crate::engine::models::Faction;

use super::types::{Role, RoleConfig, TraitorPlayer, TraitorRules};

/// Town wins when no mafia is left; mafia wins on reaching parity. With the
/// detective-required rule, losing every detective also hands mafia the game.
pub fn check_winner(players: &[TraitorPlayer], roles: &RoleConfig, rules: &TraitorRules) -> Option<Faction> {
    let alive_mafia = players.iter().filter(|p| p.is_alive && p.role == Role::Mafia).count();
    let alive_town = players.iter().filter(|p| p.is_alive && p.role != Role::Mafia).count();

    if alive_mafia == 0 {
        return Some(Faction::Town);
    }
    if alive_mafia >= alive_town {
        return Some(Faction::Mafia);
    }
    if rules.detective_required && roles.detective > 0 {
        let detectives = players.iter().filter(|p| p.is_alive && p.role == Role::Detective).count();
        if detectives == 0 {
            return Some(Faction::Mafia);
        }
    }
    None
}
