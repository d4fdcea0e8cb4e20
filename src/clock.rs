//! The clock module (C3): pure functions over a game's clock fields. No
//! mutation happens here — callers (C4, C7) read `LiveClocks`, decide what
//! to do, and write the result fields back themselves inside their own
//! transaction.

use shakmaty::Color;

use crate::model::{Game, Timestamp};

/// The two clocks as they stand at `now`, with the running side's clock
/// already debited for elapsed wall-clock time. A pure read — calling twice
/// without an intervening move yields the same pair modulo the wall-clock
/// delta (spec §8).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LiveClocks {
    pub white_ms: u64,
    pub black_ms: u64,
}

pub fn live_clocks(game: &Game, now: Timestamp) -> LiveClocks {
    let elapsed = game.last_clock_update.elapsed_ms_until(now);
    match game.clock_running_for {
        Color::White => LiveClocks {
            white_ms: game.white_clock_ms.saturating_sub(elapsed),
            black_ms: game.black_clock_ms,
        },
        Color::Black => LiveClocks {
            white_ms: game.white_clock_ms,
            black_ms: game.black_clock_ms.saturating_sub(elapsed),
        },
    }
}

impl LiveClocks {
    /// `white_ms <= 0` means black wins the flag-fall; `black_ms <= 0` means
    /// white does. Returns `None` while both clocks are still running.
    pub fn flag_fallen(&self) -> Option<Color> {
        if self.white_ms == 0 {
            Some(Color::Black)
        } else if self.black_ms == 0 {
            Some(Color::White)
        } else {
            None
        }
    }
}

/// Applies the side-to-move's clock debit + increment for a move submitted
/// at `t` (spec §4.3): subtract elapsed time from the mover's clock, then add
/// the increment, and hand back the ms actually spent on the move (for
/// `move_times_ms`) plus the post-move clocks with `running` flipped.
pub fn apply_move_clock(game: &Game, mover: Color, t: Timestamp) -> (u64, LiveClocks) {
    let elapsed = game.last_clock_update.elapsed_ms_until(t);
    let mut clocks = LiveClocks {
        white_ms: game.white_clock_ms,
        black_ms: game.black_clock_ms,
    };
    match mover {
        Color::White => {
            clocks.white_ms = clocks.white_ms.saturating_sub(elapsed).saturating_add(game.increment_ms);
        }
        Color::Black => {
            clocks.black_ms = clocks.black_ms.saturating_sub(elapsed).saturating_add(game.increment_ms);
        }
    }
    (elapsed, clocks)
}

/// Halves `color`'s remaining clock and zeroes the game's increment (spec
/// §4.3). The caller is responsible for also setting `{color}_berserk`.
pub fn berserk_halve(game: &mut Game, color: Color) {
    match color {
        Color::White => game.white_clock_ms /= 2,
        Color::Black => game.black_clock_ms /= 2,
    }
    game.increment_ms = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameId, PlayerId, TournamentId};

    fn game() -> Game {
        Game::new(
            GameId(1),
            TournamentId(1),
            PlayerId(1),
            PlayerId(2),
            180_000,
            2_000,
            Timestamp(0),
        )
    }

    #[test]
    fn live_clocks_debits_only_the_running_side() {
        let g = game();
        let live = live_clocks(&g, Timestamp(1_000));
        assert_eq!(live.white_ms, 179_000);
        assert_eq!(live.black_ms, 180_000);
    }

    #[test]
    fn flag_fall_detected_when_running_clock_hits_zero() {
        let mut g = game();
        g.white_clock_ms = 500;
        let live = live_clocks(&g, Timestamp(600));
        assert_eq!(live.flag_fallen(), Some(Color::Black));
    }

    #[test]
    fn apply_move_clock_adds_increment_after_subtracting_elapsed() {
        let g = game();
        let (elapsed, clocks) = apply_move_clock(&g, Color::White, Timestamp(1_000));
        assert_eq!(elapsed, 1_000);
        assert_eq!(clocks.white_ms, 180_000 - 1_000 + 2_000);
        assert_eq!(clocks.black_ms, 180_000);
    }

    #[test]
    fn apply_move_clock_adds_increment_even_after_the_clock_floors_to_zero() {
        let mut g = game();
        g.white_clock_ms = 500;
        let (_, clocks) = apply_move_clock(&g, Color::White, Timestamp(600));
        assert_eq!(clocks.white_ms, 2_000);
    }

    #[test]
    fn berserk_halves_clock_and_zeroes_increment() {
        let mut g = game();
        berserk_halve(&mut g, Color::White);
        assert_eq!(g.white_clock_ms, 90_000);
        assert_eq!(g.black_clock_ms, 180_000);
        assert_eq!(g.increment_ms, 0);
    }

    quickcheck::quickcheck! {
        /// Reading `live_clocks` twice at the same instant is idempotent:
        /// no intervening move means no extra debit (spec §8).
        fn prop_live_clocks_idempotent_without_a_move(elapsed_ms: u32) -> bool {
            let g = game();
            let t = Timestamp(elapsed_ms as u64);
            live_clocks(&g, t) == live_clocks(&g, t)
        }

        /// The running side's clock never increases from reading further
        /// into the future; the non-running side never moves at all.
        fn prop_live_clocks_running_side_is_monotonically_nonincreasing(delta_ms: u16) -> bool {
            let g = game();
            let t0 = Timestamp(0);
            let t1 = Timestamp(delta_ms as u64);
            let at_t0 = live_clocks(&g, t0);
            let at_t1 = live_clocks(&g, t1);
            at_t1.white_ms <= at_t0.white_ms && at_t1.black_ms == at_t0.black_ms
        }
    }
}
