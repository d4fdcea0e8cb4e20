//! The bot driver (C6): advances a bot's move off the request path.
//!
//! Mirrors the teacher's indexer queue in shape — a process-local,
//! mutex-guarded set dedups in-flight work by key (there: game ids queued
//! for indexing; here: game ids with a bot move in flight) — but the unit
//! of work is "run an engine and commit its move" rather than "fetch and
//! index a game".

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use log::{error, warn};

use crate::{bots, model::GameId, rules, store::Store};

#[derive(Clone)]
pub struct BotDriver {
    store: Arc<Store>,
    in_flight: Arc<Mutex<HashSet<GameId>>>,
    semaphore: Arc<tokio::sync::Semaphore>,
}

impl BotDriver {
    pub fn new(store: Arc<Store>, max_concurrent: usize) -> BotDriver {
        BotDriver {
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent)),
        }
    }

    /// Checks whether `game_id` currently has a bot to move and, if so,
    /// spawns a background task to drive it — a no-op if a worker for this
    /// game is already in flight (spec §4.6).
    pub fn maybe_schedule(&self, game_id: GameId) {
        {
            let mut in_flight = self.in_flight.lock().expect("in-flight lock");
            if !in_flight.insert(game_id) {
                return;
            }
        }
        let driver = self.clone();
        tokio::spawn(async move {
            driver.drive(game_id).await;
            driver.in_flight.lock().expect("in-flight lock").remove(&game_id);
        });
    }

    async fn drive(&self, game_id: GameId) {
        let _permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let Ok(game) = self.store.get_game(game_id) else { return };
        if !game.result.is_ongoing() {
            return;
        }
        let side_to_move = match rules::from_fen(&game.fen) {
            Ok(board) => rules::turn(&board),
            Err(_) => return,
        };
        let mover_id = game.player_of(side_to_move);
        let Ok(mover) = self.store.get_player(mover_id) else { return };
        if !mover.is_bot || mover.banned {
            return;
        }
        let Ok(bot_config) = self.store.get_bot_config(mover_id) else { return };

        let observed_fen = game.fen.clone();
        let board = match rules::from_fen(&observed_fen) {
            Ok(b) => b,
            Err(_) => return,
        };

        let store = self.store.clone();
        let engine_key = bot_config.engine_key.clone();
        let chosen_uci = tokio::task::spawn_blocking(move || {
            bots::choose_move(&engine_key, &board).map(|m| rules::uci_of(&m))
        })
        .await;

        let Ok(Some(uci)) = chosen_uci else { return };

        match self.commit_if_unchanged(game_id, mover_id, &observed_fen, &uci) {
            Ok(true) => self.store.metrics().inc_bot_moves_committed(),
            Ok(false) => {
                self.store.metrics().inc_bot_moves_dropped();
                warn!("bot move for game {} dropped: fen changed underneath", game_id);
            }
            Err(err) => error!("bot move for game {} failed: {}", game_id, err),
        }
    }

    /// Applies `uci` only if the game's FEN still matches `observed_fen`
    /// (spec §4.6's optimistic concurrency check). Falls back to
    /// `random_capture` if the chosen move turns out illegal on re-read.
    fn commit_if_unchanged(
        &self,
        game_id: GameId,
        mover: crate::model::PlayerId,
        observed_fen: &str,
        uci: &str,
    ) -> Result<bool, crate::api::Error> {
        let handle = self.store.get_game_handle(game_id)?;
        let current_fen = handle.lock().expect("game lock").fen.clone();
        if current_fen != observed_fen {
            return Ok(false);
        }
        drop(handle);

        let now = crate::model::Timestamp::now();
        match crate::game::apply_move(&self.store, game_id, mover, uci, now) {
            Ok(_) => Ok(true),
            Err(_) => {
                // Re-read and fall back to random_capture (spec §4.6).
                let board = rules::from_fen(&current_fen)?;
                if let Some(m) = bots::choose_move(bots::RANDOM_CAPTURE, &board) {
                    crate::game::apply_move(&self.store, game_id, mover, &rules::uci_of(&m), now)?;
                }
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Game, GameId, Player, TimeControl, Timestamp, Tournament, TournamentId, TournamentStatus, TournamentPlayer};

    fn setup(store: &Store) -> GameId {
        let tid = store.next_tournament_id();
        store.insert_tournament(Tournament {
            id: tid,
            name: "Casual 3+2".into(),
            duration_secs: 0,
            time_control: TimeControl::parse("3+2"),
            status: TournamentStatus::Active,
            started_at: Timestamp(0),
            ends_at: Timestamp(u64::MAX),
        });
        let human = store.next_player_id();
        let bot = store.next_player_id();
        store.insert_player(Player::new(human, "human".into(), "tok".into()));
        store.insert_player(Player::new_bot(bot, "minimax-bot".into()));
        store.insert_bot_config(crate::model::BotConfig::new(bot, bots::MINIMAX));
        store.insert_tournament_player(TournamentPlayer::new(tid, human, Timestamp(0)));
        store.insert_tournament_player(TournamentPlayer::new(tid, bot, Timestamp(0)));
        let gid = store.next_game_id();
        // Bot plays white so it is immediately to move.
        store.insert_game(Game::new(gid, tid, bot, human, 180_000, 2_000, Timestamp(0)));
        gid
    }

    #[tokio::test]
    async fn duplicate_schedules_only_drive_once() {
        let store = Arc::new(Store::new());
        let gid = setup(&store);
        let driver = BotDriver::new(store.clone(), 4);

        driver.maybe_schedule(gid);
        driver.maybe_schedule(gid);

        tokio::time::sleep(std::time::Duration::from_millis(600)).await;
        let game = store.get_game(gid).unwrap();
        assert_eq!(game.move_list.len(), 1);
    }
}
