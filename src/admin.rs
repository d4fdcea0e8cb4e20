//! Player administration (spec_full §B.1): ban/unban, soft-delete, bot
//! creation, and rating resets, gated on `Player::is_admin`. Not named in
//! `spec.md` itself, but present in the original implementation and needed
//! for the bot registry and moderation model described there to be
//! reachable at all.

use crate::{
    api::Error,
    bots,
    model::{Player, PlayerId},
    rating::Rating,
    store::Store,
};

fn require_admin(store: &Store, actor: PlayerId) -> Result<(), Error> {
    if store.get_player(actor)?.is_admin {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

pub fn ban(store: &Store, actor: PlayerId, target: PlayerId) -> Result<Player, Error> {
    require_admin(store, actor)?;
    store.update_player(target, |p| p.banned = true)
}

pub fn unban(store: &Store, actor: PlayerId, target: PlayerId) -> Result<Player, Error> {
    require_admin(store, actor)?;
    store.update_player(target, |p| p.banned = false)
}

/// Soft-deletes `target`: bans the account, forfeits any ongoing game to
/// the opponent, and deactivates every join row (spec §3's "cascaded
/// deletes of join rows, pairings, games" on admin soft-delete — pairing
/// history and finished games are left as historical record; only live
/// participation is torn down).
pub fn soft_delete(store: &Store, actor: PlayerId, target: PlayerId, now: crate::model::Timestamp) -> Result<(), Error> {
    require_admin(store, actor)?;
    let player = store.update_player(target, |p| {
        p.banned = true;
    })?;

    if let Some(game_id) = player.current_game {
        if let Ok(game) = store.get_game(game_id) {
            if game.result.is_ongoing() {
                let _ = crate::game::resign(store, game_id, target, now);
            }
        }
    }

    for tournament in store.list_tournaments() {
        store.update_tournament_player(tournament.id, target, |tp| tp.leave());
    }

    Ok(())
}

/// Creates a bot player registered against `engine_key` (must be a known
/// registry key; spec §4.5).
pub fn create_bot(store: &Store, actor: PlayerId, username: String, engine_key: &str) -> Result<Player, Error> {
    require_admin(store, actor)?;
    if !bots::list().iter().any(|(name, _)| *name == engine_key) {
        return Err(Error::InvalidBot);
    }
    let id = store.next_player_id();
    let bot = Player::new_bot(id, username);
    store.insert_player(bot.clone());
    store.insert_bot_config(crate::model::BotConfig::new(id, engine_key));
    Ok(bot)
}

/// Resets `target`'s Glicko-2 triple to the default `(500, 250, 0.06)`,
/// matching the defaults a fresh `Player` is created with (spec §3).
pub fn reset_rating(store: &Store, actor: PlayerId, target: PlayerId) -> Result<Player, Error> {
    require_admin(store, actor)?;
    store.update_player(target, |p| {
        p.rating = Rating::default();
        p.games_played = 0;
    })
}

/// `_performance_last_3_tournaments` (spec_full §B.3): the average of a
/// player's `performance_rating` across their last 3 finished tournaments,
/// newest first. `None` if the player has not finished any.
pub fn recent_performance(store: &Store, player: PlayerId) -> Option<f64> {
    let mut finished: Vec<_> = store
        .list_tournaments()
        .into_iter()
        .filter(|t| t.status == crate::model::TournamentStatus::Finished)
        .filter_map(|t| store.get_tournament_player(t.id, player).map(|tp| (t.ends_at, tp.performance_rating)))
        .collect();
    finished.sort_by_key(|(ends_at, _)| std::cmp::Reverse(*ends_at));
    finished.truncate(3);
    if finished.is_empty() {
        return None;
    }
    Some(finished.iter().map(|(_, perf)| perf).sum::<f64>() / finished.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Game, PlayerId, TimeControl, Timestamp, Tournament, TournamentPlayer, TournamentStatus,
    };

    fn admin(store: &Store) -> PlayerId {
        let id = store.next_player_id();
        let mut p = Player::new(id, "root".into(), "tok".into());
        p.is_admin = true;
        store.insert_player(p);
        id
    }

    #[test]
    fn non_admin_cannot_ban() {
        let store = Store::new();
        let actor = store.next_player_id();
        store.insert_player(Player::new(actor, "bob".into(), "tok".into()));
        let target = store.next_player_id();
        store.insert_player(Player::new(target, "eve".into(), "tok2".into()));
        assert!(matches!(ban(&store, actor, target), Err(Error::Forbidden)));
    }

    #[test]
    fn admin_can_ban_and_unban() {
        let store = Store::new();
        let actor = admin(&store);
        let target = store.next_player_id();
        store.insert_player(Player::new(target, "eve".into(), "tok2".into()));
        ban(&store, actor, target).unwrap();
        assert!(store.get_player(target).unwrap().banned);
        unban(&store, actor, target).unwrap();
        assert!(!store.get_player(target).unwrap().banned);
    }

    #[test]
    fn create_bot_rejects_unknown_engine() {
        let store = Store::new();
        let actor = admin(&store);
        assert!(matches!(
            create_bot(&store, actor, "x".into(), "no-such-engine"),
            Err(Error::InvalidBot)
        ));
    }

    #[test]
    fn reset_rating_restores_defaults() {
        let store = Store::new();
        let actor = admin(&store);
        let target = store.next_player_id();
        let mut p = Player::new(target, "eve".into(), "tok2".into());
        p.rating.rating = 2000.0;
        p.games_played = 40;
        store.insert_player(p);
        let reset = reset_rating(&store, actor, target).unwrap();
        assert_eq!(reset.rating, Rating::default());
        assert_eq!(reset.games_played, 0);
    }

    #[test]
    fn recent_performance_is_none_with_no_finished_tournaments() {
        let store = Store::new();
        assert_eq!(recent_performance(&store, PlayerId(1)), None);
        let _ = Timestamp(0);
    }

    #[test]
    fn soft_delete_bans_forfeits_the_ongoing_game_and_deactivates_join_rows() {
        let store = Store::new();
        let actor = admin(&store);
        let target = store.next_player_id();
        let opponent = store.next_player_id();
        store.insert_player(Player::new(target, "eve".into(), "tok2".into()));
        store.insert_player(Player::new(opponent, "mallory".into(), "tok3".into()));

        let tid = store.next_tournament_id();
        store.insert_tournament(Tournament {
            id: tid,
            name: "Weekly Arena".into(),
            duration_secs: 600,
            time_control: TimeControl::parse("3+2"),
            status: TournamentStatus::Active,
            started_at: Timestamp(0),
            ends_at: Timestamp(600_000),
        });
        store.insert_tournament_player(TournamentPlayer::new(tid, target, Timestamp(0)));
        store.insert_tournament_player(TournamentPlayer::new(tid, opponent, Timestamp(0)));
        let gid = store.next_game_id();
        store.insert_game(Game::new(gid, tid, target, opponent, 180_000, 2_000, Timestamp(0)));
        let _ = store.update_player(target, |p| p.current_game = Some(gid));
        let _ = store.update_player(opponent, |p| p.current_game = Some(gid));

        soft_delete(&store, actor, target, Timestamp(1_000)).unwrap();

        assert!(store.get_player(target).unwrap().banned);
        let game = store.get_game(gid).unwrap();
        assert_eq!(game.result, crate::model::GameResult::Black);
        assert!(!store.get_tournament_player(tid, target).unwrap().active);
    }

    #[test]
    fn soft_delete_requires_admin() {
        let store = Store::new();
        let actor = store.next_player_id();
        store.insert_player(Player::new(actor, "bob".into(), "tok".into()));
        let target = store.next_player_id();
        store.insert_player(Player::new(target, "eve".into(), "tok2".into()));
        assert!(matches!(
            soft_delete(&store, actor, target, Timestamp(0)),
            Err(Error::Forbidden)
        ));
    }
}
