//! The casual matchmaker (C8): one-off matches for players who are not in a
//! tournament, modeled as a synthetic `Tournament` whose name begins
//! `"Casual "` (spec §3/§4.8) so the arena's score-application and rating
//! pipeline applies to casual games without a second code path.

use crate::{
    api::Error,
    bots,
    model::{
        BotConfig, CasualQueueEntry, Game, Player, PlayerId, TimeControl, Timestamp, Tournament,
        TournamentPlayer, TournamentStatus,
    },
    store::Store,
};

/// 10 years in milliseconds, matching the original's "never auto-finish"
/// trick for casual events (spec §4.8: `ends_at = now + 10y`).
const CASUAL_LIFETIME_MS: u64 = 10 * 365 * 24 * 60 * 60 * 1000;

pub enum JoinOutcome {
    Queued,
    Matched { game_id: crate::model::GameId },
}

fn ensure_not_banned_or_playing(store: &Store, player: PlayerId) -> Result<(), Error> {
    let p = store.get_player(player)?;
    if p.banned {
        return Err(Error::Banned);
    }
    if let Some(game_id) = p.current_game {
        return Err(Error::AlreadyInGame { game_id });
    }
    Ok(())
}

fn spawn_casual_tournament(store: &Store, tc: TimeControl, now: Timestamp) -> Tournament {
    let id = store.next_tournament_id();
    let tournament = Tournament {
        id,
        name: format!("Casual {tc}"),
        duration_secs: 0,
        time_control: tc,
        status: TournamentStatus::Active,
        started_at: now,
        ends_at: now.plus_ms(CASUAL_LIFETIME_MS),
    };
    store.insert_tournament(tournament.clone());
    tournament
}

fn start_game(store: &Store, tournament: &Tournament, a: PlayerId, b: PlayerId, now: Timestamp) -> crate::model::GameId {
    store.insert_tournament_player(TournamentPlayer::new(tournament.id, a, now));
    store.insert_tournament_player(TournamentPlayer::new(tournament.id, b, now));
    let (white, black) = if fastrand::bool() { (a, b) } else { (b, a) };
    let game_id = store.next_game_id();
    let game = Game::new(
        game_id,
        tournament.id,
        white,
        black,
        tournament.time_control.base_ms,
        tournament.time_control.increment_ms,
        now,
    );
    store.insert_game(game);
    let _ = store.update_player(a, |p| p.current_game = Some(game_id));
    let _ = store.update_player(b, |p| p.current_game = Some(game_id));
    game_id
}

/// `join(player, TC)` (spec §4.8): upsert the queue row, sweep stale rows,
/// and pair with the oldest online queued player on the same time control.
pub fn join(store: &Store, player: PlayerId, tc: TimeControl, now: Timestamp, online_window_ms: u64) -> Result<JoinOutcome, Error> {
    ensure_not_banned_or_playing(store, player)?;

    store.upsert_casual_queue(CasualQueueEntry {
        player,
        time_control: tc,
        joined_at: now,
    });
    store.sweep_stale_casual_queue(now);

    let Some(opponent) = store.find_casual_match(player, tc, now, online_window_ms) else {
        return Ok(JoinOutcome::Queued);
    };

    store.remove_casual_queue(player);
    store.remove_casual_queue(opponent.player);
    let tournament = spawn_casual_tournament(store, tc, now);
    let game_id = start_game(store, &tournament, player, opponent.player, now);
    Ok(JoinOutcome::Matched { game_id })
}

/// `play_bot(player, bot_id, TC)` (spec §4.8): same preconditions, always
/// matches immediately against the given bot.
pub fn play_bot(store: &Store, player: PlayerId, bot_id: PlayerId, tc: TimeControl, now: Timestamp) -> Result<crate::model::GameId, Error> {
    ensure_not_banned_or_playing(store, player)?;
    let bot = store.get_player(bot_id)?;
    if !bot.is_bot {
        return Err(Error::InvalidBot);
    }
    if bot.banned {
        return Err(Error::Banned);
    }

    let tournament = spawn_casual_tournament(store, tc, now);
    Ok(start_game(store, &tournament, player, bot_id, now))
}

/// Registers `engine_key` for `bot_id`, used by admin bot-creation and by
/// tests that need a bot opponent without going through the admin surface.
pub fn register_bot_engine(store: &Store, bot: &Player, engine_key: &str) {
    store.insert_bot_config(BotConfig::new(bot.id, engine_key));
}

pub fn known_engine(engine_key: &str) -> bool {
    bots::list().iter().any(|(name, _)| *name == engine_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerId;

    fn player(store: &Store, name: &str) -> PlayerId {
        let id = store.next_player_id();
        store.insert_player(Player::new(id, name.into(), format!("tok-{name}")));
        id
    }

    #[test]
    fn first_joiner_is_queued_second_is_matched() {
        let store = Store::new();
        let tc = TimeControl::parse("3+2");
        let a = player(&store, "a");
        let b = player(&store, "b");
        store.touch_presence(a, Timestamp(0));
        store.touch_presence(b, Timestamp(0));

        let first = join(&store, a, tc, Timestamp(0), 25_000).unwrap();
        assert!(matches!(first, JoinOutcome::Queued));

        let second = join(&store, b, tc, Timestamp(1_000), 25_000).unwrap();
        assert!(matches!(second, JoinOutcome::Matched { .. }));
    }

    #[test]
    fn banned_player_is_refused() {
        let store = Store::new();
        let a = player(&store, "a");
        store.update_player(a, |p| p.banned = true).unwrap();
        let result = join(&store, a, TimeControl::parse("3+2"), Timestamp(0), 25_000);
        assert!(matches!(result, Err(Error::Banned)));
    }

    #[test]
    fn play_bot_creates_an_immediate_game() {
        let store = Store::new();
        let human = player(&store, "human");
        let bot_id = store.next_player_id();
        store.insert_player(Player::new_bot(bot_id, "minimax-bot".into()));
        store.insert_bot_config(BotConfig::new(bot_id, bots::MINIMAX));

        let game_id = play_bot(&store, human, bot_id, TimeControl::parse("3+0"), Timestamp(0)).unwrap();
        let game = store.get_game(game_id).unwrap();
        assert!(game.result.is_ongoing());
    }
}
