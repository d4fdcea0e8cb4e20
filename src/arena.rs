//! The arena tournament engine (C7): a single 60-second ticker running three
//! phases per tick — clock sweep, pairing, and waiting→active promotion —
//! plus the score-application and finalization routines the game state
//! machine (C4) calls into when a game ends.

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::interval;

use crate::{
    api::Error,
    game,
    model::{
        Game, GameResult, PairingHistory, PlayerId, RatingHistory, Timestamp, Tournament,
        TournamentId, TournamentPlayer, TournamentStatus,
    },
    rating::{self, Opponent},
    store::Store,
};

pub const TICK_PERIOD: Duration = Duration::from_secs(60);
const RECENT_OPPONENT_WINDOW_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Outcome {
    Win,
    Draw,
    Loss,
}

/// Runs the ticker (default period `TICK_PERIOD`, overridable via
/// `--tick-period-secs`) until `shutdown` resolves. Intended to be
/// `tokio::spawn`ed once from `main` alongside the bot driver (spec §5).
pub async fn run(store: std::sync::Arc<Store>, period: Duration, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let mut ticker = interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Timestamp::now();
                if let Err(err) = tick_once(&store, now) {
                    error!("arena tick failed: {}", err);
                }
            }
            _ = shutdown.changed() => {
                info!("arena ticker shutting down");
                break;
            }
        }
    }
}

/// One full tick: Phase A, then Phase B (pairing or finalization), then
/// Phase C. Persistence errors never propagate past here (spec §7) — each
/// phase logs and continues rather than aborting the whole tick.
pub fn tick_once(store: &Store, now: Timestamp) -> Result<(), Error> {
    phase_a_clock_sweep(store, now);
    phase_b_pairing_and_finalization(store, now);
    phase_c_promotion(store, now);
    debug!("arena tick counters: {}", store.metrics().to_influx_string());
    Ok(())
}

fn phase_a_clock_sweep(store: &Store, now: Timestamp) {
    for handle in store.all_ongoing_game_handles() {
        let game_id = handle.lock().expect("game lock").id;
        if let Err(err) = game::sweep_flag_fall(store, game_id, now) {
            warn!("clock sweep failed for game {}: {}", game_id, err);
        }
    }
}

fn phase_b_pairing_and_finalization(store: &Store, now: Timestamp) {
    for tournament in store.list_tournaments_with_status(TournamentStatus::Active) {
        if tournament.should_finish(now) {
            if let Err(err) = finish_tournament(store, tournament.id, now) {
                warn!("finalization failed for tournament {}: {}", tournament.id, err);
            }
        } else {
            pair_tournament(store, &tournament, now);
        }
    }
}

fn phase_c_promotion(store: &Store, now: Timestamp) {
    for tournament in store.list_tournaments_with_status(TournamentStatus::Waiting) {
        if tournament.should_start(now) {
            let _ = store.update_tournament(tournament.id, |t| t.status = TournamentStatus::Active);
        }
    }
}

/// Greedy nearest-score/rating pairing with a 10-minute anti-rematch window
/// (spec §4.7 Phase B).
fn pair_tournament(store: &Store, tournament: &Tournament, now: Timestamp) {
    let mut queue: Vec<TournamentPlayer> = store
        .list_tournament_players(tournament.id)
        .into_iter()
        .filter(|tp| tp.in_queue && tp.active)
        .collect();
    // Queue order first (stable baseline for tie-breaking), then the real
    // sort key: highest score first, then lowest rating (spec §4.7 step 1).
    queue.sort_by_key(|tp| tp.queue_joined_at);
    queue.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| {
            player_rating(store, a.player)
                .partial_cmp(&player_rating(store, b.player))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });

    let mut paired = vec![false; queue.len()];
    for i in 0..queue.len() {
        if paired[i] {
            continue;
        }
        let recent = store.recent_opponents(tournament.id, queue[i].player, now, RECENT_OPPONENT_WINDOW_MS);
        let mut best: Option<usize> = None;
        let mut best_cost = f64::INFINITY;
        for (j, candidate) in queue.iter().enumerate() {
            if j == i || paired[j] || recent.contains(&candidate.player) {
                continue;
            }
            let cost = 1000.0 * (queue[i].score as f64 - candidate.score as f64).abs()
                + (player_rating(store, queue[i].player) - player_rating(store, candidate.player)).abs();
            if cost < best_cost {
                best_cost = cost;
                best = Some(j);
            }
        }
        if let Some(j) = best {
            paired[i] = true;
            paired[j] = true;
            create_paired_game(store, tournament, queue[i].player, queue[j].player, now);
        }
    }
}

fn player_rating(store: &Store, player: PlayerId) -> f64 {
    store.get_player(player).map(|p| p.rating.rating).unwrap_or(1500.0)
}

fn create_paired_game(store: &Store, tournament: &Tournament, a: PlayerId, b: PlayerId, now: Timestamp) {
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
    store.record_pairing(PairingHistory::new(tournament.id, a, b, now));
    store.metrics().inc_pairings_made();
    store.update_tournament_player(tournament.id, a, |tp| tp.in_queue = false);
    store.update_tournament_player(tournament.id, b, |tp| tp.in_queue = false);
    let _ = store.update_player(a, |p| p.current_game = Some(game_id));
    let _ = store.update_player(b, |p| p.current_game = Some(game_id));
}

/// Called by C4 when a game transitions out of `ongoing`. Applies the score
/// to both `TournamentPlayer` rows, replays performance ratings, and
/// re-enqueues both players — or finalizes immediately for a casual
/// one-off (spec §4.7 "Score application").
pub fn submit_result(store: &Store, game: &Game) -> Result<(), Error> {
    if !store.mark_scored(game.id) {
        return Ok(());
    }
    let now = game.ended_at.unwrap_or_else(Timestamp::now);

    let (white_outcome, black_outcome) = match game.result {
        GameResult::White => (Outcome::Win, Outcome::Loss),
        GameResult::Black => (Outcome::Loss, Outcome::Win),
        GameResult::Draw => (Outcome::Draw, Outcome::Draw),
        GameResult::Ongoing => return Ok(()),
    };

    apply_score(store, game.tournament, game.white, white_outcome, game.white_berserk);
    apply_score(store, game.tournament, game.black, black_outcome, game.black_berserk);
    store.metrics().inc_games_finished();

    for player in [game.white, game.black] {
        replay_performance_rating(store, game.tournament, player);
        store.update_tournament_player(game.tournament, player, |tp| tp.enqueue(now));
    }

    if let Ok(tournament) = store.get_tournament(game.tournament) {
        if tournament.is_casual() {
            finish_tournament(store, tournament.id, now)?;
        }
    }

    Ok(())
}

/// One row's score update for one finished game (spec §4.7's table).
fn apply_score(store: &Store, tournament: TournamentId, player: PlayerId, outcome: Outcome, berserked: bool) {
    store.update_tournament_player(tournament, player, |tp| {
        match outcome {
            Outcome::Win => {
                tp.win_streak += 1;
                let mut delta = 2;
                if tp.win_streak > 2 {
                    delta += 1;
                }
                if berserked {
                    delta += 1;
                }
                tp.score += delta;
                tp.wins += 1;
            }
            Outcome::Draw => {
                tp.score += 1;
                tp.draws += 1;
                tp.win_streak = 0;
            }
            Outcome::Loss => {
                tp.losses += 1;
                tp.win_streak = 0;
            }
        }
        tp.games_played += 1;
        if berserked {
            tp.berserks += 1;
        }
    });
}

fn replay_performance_rating(store: &Store, tournament: TournamentId, player: PlayerId) {
    let games = store.list_games_for_tournament(tournament, usize::MAX);
    let mut opponent_ratings = Vec::new();
    let mut scores = Vec::new();
    for g in &games {
        let Some(color) = g.color_of(player) else { continue };
        let result = match &g.result {
            GameResult::Ongoing => continue,
            other => *other,
        };
        let opponent = g.player_of(color.other());
        opponent_ratings.push(player_rating(store, opponent));
        scores.push(match result {
            GameResult::Draw => 0.5,
            r if r == GameResult::of_color(color) => 1.0,
            _ => 0.0,
        });
    }
    if opponent_ratings.is_empty() {
        return;
    }
    let prior = player_rating(store, player);
    let perf = rating::performance_rating(&opponent_ratings, &scores, Some(prior));
    store.update_tournament_player(tournament, player, |tp| tp.performance_rating = perf);
}

/// Glicko-2 finalization (spec §4.7 `_finish_tournament`): every join row's
/// opponents, RDs and scores across all completed games feed the rating
/// update; the new triple is persisted and a `RatingHistory` row appended.
pub fn finish_tournament(store: &Store, tournament_id: TournamentId, now: Timestamp) -> Result<(), Error> {
    let tournament = store.get_tournament(tournament_id)?;
    if tournament.status == TournamentStatus::Finished {
        return Ok(());
    }
    let games = store.list_games_for_tournament(tournament_id, usize::MAX);

    for tp in store.list_tournament_players(tournament_id) {
        let mut opponents = Vec::new();
        for g in &games {
            let Some(color) = g.color_of(tp.player) else { continue };
            if g.result.is_ongoing() {
                continue;
            }
            let opponent_id = g.player_of(color.other());
            let Ok(opponent) = store.get_player(opponent_id) else { continue };
            let score = match g.result {
                GameResult::Draw => 0.5,
                r if r == GameResult::of_color(color) => 1.0,
                _ => 0.0,
            };
            opponents.push(Opponent {
                rating: opponent.rating.rating,
                rd: opponent.rating.rd,
                score,
            });
        }
        let counted = opponents.len() as u32;
        if let Ok(player) = store.get_player(tp.player) {
            let updated = rating::update_rating(player.rating, &opponents);
            store.update_player(tp.player, |p| {
                p.rating = updated;
                p.games_played += counted;
            })?;
            store.record_rating_history(RatingHistory {
                player: tp.player,
                tournament: Some(tournament_id),
                rating: updated.rating,
                rd: updated.rd,
                recorded_at: now,
            });
        }
    }

    store.update_tournament(tournament_id, |t| t.status = TournamentStatus::Finished)?;
    store.metrics().inc_tournaments_finalized();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Player, TimeControl};

    fn new_tournament(store: &Store, now: Timestamp, casual: bool) -> TournamentId {
        let tid = store.next_tournament_id();
        store.insert_tournament(Tournament {
            id: tid,
            name: if casual { "Casual 3+2".into() } else { "Weekly Arena".into() },
            duration_secs: 600,
            time_control: TimeControl::parse("3+2"),
            status: TournamentStatus::Active,
            started_at: now,
            ends_at: if casual { now.plus_ms(10 * 365 * 24 * 60 * 60 * 1000) } else { now.plus_ms(600_000) },
        });
        tid
    }

    fn new_player(store: &Store, name: &str) -> PlayerId {
        let id = store.next_player_id();
        store.insert_player(Player::new(id, name.into(), format!("tok-{name}")));
        id
    }

    #[test]
    fn win_streak_bonus_sequence_matches_spec_scenario() {
        let store = Store::new();
        let tid = new_tournament(&store, Timestamp(0), false);
        let a = new_player(&store, "a");
        store.insert_tournament_player(TournamentPlayer::new(tid, a, Timestamp(0)));

        apply_score(&store, tid, a, Outcome::Win, false);
        assert_eq!(store.get_tournament_player(tid, a).unwrap().score, 2);
        apply_score(&store, tid, a, Outcome::Win, false);
        assert_eq!(store.get_tournament_player(tid, a).unwrap().score, 4);
        apply_score(&store, tid, a, Outcome::Win, false);
        assert_eq!(store.get_tournament_player(tid, a).unwrap().score, 7);
    }

    #[test]
    fn berserk_win_with_low_streak_scores_three() {
        let store = Store::new();
        let tid = new_tournament(&store, Timestamp(0), false);
        let a = new_player(&store, "a");
        store.insert_tournament_player(TournamentPlayer::new(tid, a, Timestamp(0)));
        apply_score(&store, tid, a, Outcome::Win, true);
        assert_eq!(store.get_tournament_player(tid, a).unwrap().score, 3);
        assert_eq!(store.get_tournament_player(tid, a).unwrap().berserks, 1);
    }

    #[test]
    fn submit_result_is_idempotent() {
        let store = Store::new();
        let tid = new_tournament(&store, Timestamp(0), false);
        let white = new_player(&store, "white");
        let black = new_player(&store, "black");
        store.insert_tournament_player(TournamentPlayer::new(tid, white, Timestamp(0)));
        store.insert_tournament_player(TournamentPlayer::new(tid, black, Timestamp(0)));
        let gid = store.next_game_id();
        let mut game = Game::new(gid, tid, white, black, 180_000, 2_000, Timestamp(0));
        game.result = GameResult::White;
        game.ended_at = Some(Timestamp(1_000));
        store.insert_game(game.clone());

        submit_result(&store, &game).unwrap();
        submit_result(&store, &game).unwrap();
        assert_eq!(store.get_tournament_player(tid, white).unwrap().wins, 1);
    }

    #[test]
    fn anti_rematch_keeps_recently_paired_players_unmatched() {
        let store = Store::new();
        let tid = new_tournament(&store, Timestamp(0), false);
        let a = new_player(&store, "a");
        let b = new_player(&store, "b");
        store.insert_tournament_player(TournamentPlayer::new(tid, a, Timestamp(0)));
        store.insert_tournament_player(TournamentPlayer::new(tid, b, Timestamp(0)));
        store.record_pairing(PairingHistory::new(tid, a, b, Timestamp(0)));

        let tournament = store.get_tournament(tid).unwrap();
        pair_tournament(&store, &tournament, Timestamp(60_000));

        assert!(store.get_tournament_player(tid, a).unwrap().in_queue);
        assert!(store.get_tournament_player(tid, b).unwrap().in_queue);
    }
}
