//! The game state machine (C4): applying a move, resigning, claiming time,
//! and berserking, each against a single `Game` behind its per-game lock.
//! Every operation that ends a game hands the terminal `Game` to
//! [`crate::arena::submit_result`] before returning, inside the same lock
//! hold — spec §5's "committed result is always reflected in the Game row
//! and the two TournamentPlayer rows" guarantee.

use log::warn;
use shakmaty::Color;

use crate::{
    api::Error,
    clock, rules,
    model::{Game, GameId, GameResult, PlayerId, Timestamp},
    store::Store,
};

fn finish(store: &Store, game: &mut Game, result: GameResult, ended_at: Timestamp) {
    game.result = result;
    game.ended_at = Some(ended_at);
    game.last_clock_update = ended_at;
    for player in [game.white, game.black] {
        let _ = store.update_player(player, |p| {
            if p.current_game == Some(game.id) {
                p.current_game = None;
            }
        });
    }
    if let Err(err) = crate::arena::submit_result(store, &*game) {
        warn!("submit_result failed for game {}: {}", game.id, err);
    }
}

/// Applies `uci` as played by `player`. Spec §4.4 steps 1-5.
pub fn apply_move(
    store: &Store,
    game_id: GameId,
    player: PlayerId,
    uci: &str,
    now: Timestamp,
) -> Result<Game, Error> {
    let handle = store.get_game_handle(game_id)?;
    let mut game = handle.lock().expect("game lock");

    if !game.result.is_ongoing() {
        return Err(Error::GameOver);
    }
    let mover = game.color_of(player).ok_or(Error::NotYourGame)?;
    let board = rules::from_fen(&game.fen)?;
    if rules::turn(&board) != mover {
        return Err(Error::NotYourTurn);
    }
    let mv = rules::parse_legal_uci(&board, uci)?;

    let (spent_ms, clocks) = clock::apply_move_clock(&game, mover, now);
    game.move_times_ms.push(spent_ms);
    game.white_clock_ms = clocks.white_ms;
    game.black_clock_ms = clocks.black_ms;
    game.clock_running_for = mover.other();
    game.last_clock_update = now;

    let next_board = rules::push(&board, &mv);
    game.move_list.push(rules::uci_of(&mv));
    game.fen = rules::fen(&next_board);

    if rules::is_checkmate(&next_board) {
        // The mover wins on checkmate (spec §9's resolved open question).
        finish(store, &mut game, GameResult::of_color(mover), now);
    } else if rules::is_stalemate(&next_board)
        || rules::is_insufficient_material(&next_board)
        || rules::is_seventyfive_moves(&next_board)
    {
        finish(store, &mut game, GameResult::Draw, now);
    } else if clocks.flag_fallen().is_some() {
        // The mover's own clock fell during this move; the opponent wins.
        finish(store, &mut game, GameResult::of_opposite(mover), now);
    }

    Ok(game.clone())
}

/// Recomputes live clocks for an ongoing game and ends it if a flag has
/// fallen, without any player action (spec §4.7 Phase A). A no-op if the
/// game is already over or neither clock has reached zero.
pub fn sweep_flag_fall(store: &Store, game_id: GameId, now: Timestamp) -> Result<(), Error> {
    let handle = store.get_game_handle(game_id)?;
    let mut game = handle.lock().expect("game lock");
    if !game.result.is_ongoing() {
        return Ok(());
    }
    let live = clock::live_clocks(&game, now);
    if let Some(winner) = live.flag_fallen() {
        game.white_clock_ms = live.white_ms;
        game.black_clock_ms = live.black_ms;
        finish(store, &mut game, GameResult::of_color(winner), now);
    }
    Ok(())
}

/// `player` resigns an ongoing game; the other color wins (spec §4.4).
pub fn resign(store: &Store, game_id: GameId, player: PlayerId, now: Timestamp) -> Result<Game, Error> {
    let handle = store.get_game_handle(game_id)?;
    let mut game = handle.lock().expect("game lock");
    if !game.result.is_ongoing() {
        return Err(Error::GameOver);
    }
    let mover = game.color_of(player).ok_or(Error::NotYourGame)?;
    finish(store, &mut game, GameResult::of_opposite(mover), now);
    Ok(game.clone())
}

pub struct ClaimOutcome {
    pub ok: bool,
    pub game: Game,
}

/// Either `player` observes their opponent's flag has fallen (game ends, the
/// caller wins) or it has not (clocks are refreshed and persisted, `ok:
/// false` is returned) — spec §4.4. Only the opponent's flag may be claimed.
pub fn claim_time(
    store: &Store,
    game_id: GameId,
    player: PlayerId,
    now: Timestamp,
) -> Result<ClaimOutcome, Error> {
    let handle = store.get_game_handle(game_id)?;
    let mut game = handle.lock().expect("game lock");
    if !game.result.is_ongoing() {
        return Err(Error::GameOver);
    }
    let mover = game.color_of(player).ok_or(Error::NotYourGame)?;

    let live = clock::live_clocks(&game, now);
    game.white_clock_ms = live.white_ms;
    game.black_clock_ms = live.black_ms;
    game.last_clock_update = now;

    let opponent_flagged = match mover {
        Color::White => live.black_ms == 0,
        Color::Black => live.white_ms == 0,
    };

    if opponent_flagged {
        finish(store, &mut game, GameResult::of_color(mover), now);
        Ok(ClaimOutcome { ok: true, game: game.clone() })
    } else {
        Ok(ClaimOutcome { ok: false, game: game.clone() })
    }
}

/// Halves `player`'s own clock once per game (spec §4.3). Scoring the +1
/// berserk bonus happens later, in [`crate::arena::apply_score`].
pub fn berserk(store: &Store, game_id: GameId, player: PlayerId) -> Result<Game, Error> {
    let handle = store.get_game_handle(game_id)?;
    let mut game = handle.lock().expect("game lock");
    if !game.result.is_ongoing() {
        return Err(Error::GameOver);
    }
    let color = game.color_of(player).ok_or(Error::NotYourGame)?;
    if game.berserked(color) {
        return Err(Error::AlreadyBerserked);
    }
    clock::berserk_halve(&mut game, color);
    match color {
        Color::White => game.white_berserk = true,
        Color::Black => game.black_berserk = true,
    }
    Ok(game.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Player, TimeControl, Tournament, TournamentId, TournamentStatus, TournamentPlayer};

    fn setup_tournament(store: &Store, now: Timestamp) -> TournamentId {
        let tid = store.next_tournament_id();
        store.insert_tournament(Tournament {
            id: tid,
            name: "Test Arena".into(),
            duration_secs: 600,
            time_control: TimeControl::parse("3+2"),
            status: TournamentStatus::Active,
            started_at: now,
            ends_at: now.plus_ms(600_000),
        });
        tid
    }

    fn setup_game(store: &Store, now: Timestamp) -> (GameId, PlayerId, PlayerId) {
        let tid = setup_tournament(store, now);
        let white = store.next_player_id();
        let black = store.next_player_id();
        store.insert_player(Player::new(white, "white".into(), "w".into()));
        store.insert_player(Player::new(black, "black".into(), "b".into()));
        store.insert_tournament_player(TournamentPlayer::new(tid, white, now));
        store.insert_tournament_player(TournamentPlayer::new(tid, black, now));
        let gid = store.next_game_id();
        store.insert_game(Game::new(gid, tid, white, black, 180_000, 2_000, now));
        (gid, white, black)
    }

    #[test]
    fn scholars_mate_ends_with_mover_winning() {
        let store = Store::new();
        let (gid, white, black) = setup_game(&store, Timestamp(0));
        let moves = ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"];
        let mut t = 0u64;
        let mut game = None;
        for (i, uci) in moves.iter().enumerate() {
            t += 100;
            let mover = if i % 2 == 0 { white } else { black };
            game = Some(apply_move(&store, gid, mover, uci, Timestamp(t)).expect("legal move"));
        }
        let game = game.unwrap();
        assert_eq!(game.result, GameResult::White);
        assert!(game.ended_at.is_some());
    }

    #[test]
    fn flag_fall_during_move_ends_game_for_opponent() {
        // TC=0+0 (spec §8 scenario 2): no increment to mask the flag-fall.
        let store = Store::new();
        let (gid, white, _black) = setup_game(&store, Timestamp(0));
        {
            let handle = store.get_game_handle(gid).unwrap();
            let mut game = handle.lock().unwrap();
            game.white_clock_ms = 500;
            game.increment_ms = 0;
        }
        let game = apply_move(&store, gid, white, "e2e4", Timestamp(600)).expect("legal move");
        assert_eq!(game.result, GameResult::Black);
        assert_eq!(game.white_clock_ms, 0);
    }

    #[test]
    fn resignation_awards_the_other_color() {
        let store = Store::new();
        let (gid, white, _) = setup_game(&store, Timestamp(0));
        let game = resign(&store, gid, white, Timestamp(10)).expect("resign");
        assert_eq!(game.result, GameResult::Black);
    }

    #[test]
    fn cannot_berserk_twice() {
        let store = Store::new();
        let (gid, white, _) = setup_game(&store, Timestamp(0));
        berserk(&store, gid, white).expect("first berserk");
        assert!(matches!(berserk(&store, gid, white), Err(Error::AlreadyBerserked)));
    }

    #[test]
    fn claim_time_only_succeeds_when_opponent_flagged() {
        let store = Store::new();
        let (gid, white, black) = setup_game(&store, Timestamp(0));
        let outcome = claim_time(&store, gid, white, Timestamp(1_000)).expect("claim");
        assert!(!outcome.ok);

        store
            .get_game_handle(gid)
            .unwrap()
            .lock()
            .unwrap()
            .black_clock_ms = 0;
        let outcome = claim_time(&store, gid, white, Timestamp(1_000)).expect("claim");
        assert!(outcome.ok);
        assert_eq!(outcome.game.result, GameResult::White);

        let _ = black;
    }
}
