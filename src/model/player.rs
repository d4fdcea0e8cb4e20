use serde::{Deserialize, Serialize};

use crate::{
    model::{GameId, PlayerId},
    rating::Rating,
};

/// A registered account: identity, auth material, and the Glicko-2 triple
/// (spec §3). `auth_token` stands in for whatever the host's session layer
/// actually verifies — this crate never inspects it, only stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub auth_token: String,
    pub rating: Rating,
    pub games_played: u32,
    pub is_bot: bool,
    pub banned: bool,
    pub is_admin: bool,
    /// Set while the player is a participant in an `ongoing` game.
    pub current_game: Option<GameId>,
}

impl Player {
    pub fn new(id: PlayerId, username: String, auth_token: String) -> Player {
        Player {
            id,
            username,
            auth_token,
            rating: Rating::default(),
            games_played: 0,
            is_bot: false,
            banned: false,
            is_admin: false,
            current_game: None,
        }
    }

    pub fn new_bot(id: PlayerId, username: String) -> Player {
        Player {
            is_bot: true,
            ..Player::new(id, username, String::new())
        }
    }

    pub fn is_provisional(&self) -> bool {
        crate::rating::is_provisional(self.games_played)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_has_default_glicko2_triple() {
        let p = Player::new(PlayerId(1), "alice".into(), "tok".into());
        assert_eq!(p.rating, Rating::default());
        assert!(p.is_provisional());
    }

    #[test]
    fn new_bot_has_no_auth_token() {
        let p = Player::new_bot(PlayerId(2), "minimax-bot".into());
        assert!(p.is_bot);
        assert!(p.auth_token.is_empty());
    }
}
