//! Role configuration and secret role assignment.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::identity::Shuffle;
use crate::engine::models::PlayerSeat;

use super::types::{Role, RoleConfig, TraitorPlayer};

/// Suggested role split for a table size.
pub fn recommended_roles(player_count: usize) -> RoleConfig {
    if player_count < 5 {
        return RoleConfig::with_civilians(player_count, 0, 0, 0);
    }
    let mafia = match player_count {
        18.. => 6,
        15.. => 5,
        12.. => 4,
        9.. => 3,
        6.. => 2,
        _ => 1,
    };
    let doctor = if player_count >= 7 { 1 } else { 0 };
    RoleConfig::with_civilians(player_count, mafia, 1, doctor)
}

/// Counts must cover every seat exactly, with at least one mafia member and
/// mafia strictly short of half the table.
pub fn validate_role_config(player_count: usize, roles: &RoleConfig) -> EngineResult<()> {
    if roles.total() != player_count {
        return Err(EngineError::RoleCountMismatch {
            expected: player_count,
            actual: roles.total(),
        });
    }
    if roles.mafia == 0 {
        return Err(EngineError::InvalidConfig("at least one mafia member is required".into()));
    }
    if 2 * roles.mafia as usize >= player_count {
        return Err(EngineError::InvalidConfig(format!(
            "{} mafia is too many for {} players",
            roles.mafia, player_count
        )));
    }
    Ok(())
}

/// One role per seat with the exact configured counts, unshuffled.
pub fn role_deck(roles: &RoleConfig) -> Vec<Role> {
    let mut deck = Vec::with_capacity(roles.total());
    for (role, count) in [
        (Role::Mafia, roles.mafia),
        (Role::Detective, roles.detective),
        (Role::Doctor, roles.doctor),
        (Role::Civilian, roles.civilian),
    ] {
        deck.extend(std::iter::repeat(role).take(count as usize));
    }
    deck
}

/// Shuffle the role deck and deal it to players in seat order.
pub fn assign_roles<S: Shuffle>(
    players: &[PlayerSeat],
    roles: &RoleConfig,
    shuffle: &mut S,
) -> EngineResult<Vec<TraitorPlayer>> {
    validate_role_config(players.len(), roles)?;
    let deck = shuffle.shuffle(role_deck(roles));
    if deck.len() != players.len() {
        return Err(EngineError::RoleCountMismatch {
            expected: players.len(),
            actual: deck.len(),
        });
    }
    Ok(players
        .iter()
        .zip(deck)
        .map(|(seat, role)| TraitorPlayer {
            player_id: seat.player_id.clone(),
            name: seat.display_name.clone(),
            role,
            is_alive: true,
            is_protected: false,
            elimination_reason: None,
            eliminated_round: None,
        })
        .collect())
}
