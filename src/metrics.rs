//! Process-local counters, logged periodically by the arena ticker rather
//! than pushed to an external collector — the teacher's `Metrics` posts an
//! influx line to a deploy webhook; we have no such endpoint in scope, so
//! we keep the atomics-plus-`to_influx_string` shape (cheap, lock-free,
//! greppable in logs) and drop the push.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    games_finished: AtomicU64,
    pairings_made: AtomicU64,
    bot_moves_committed: AtomicU64,
    bot_moves_dropped: AtomicU64,
    tournaments_finalized: AtomicU64,
}

impl Metrics {
    pub fn inc_games_finished(&self) {
        self.games_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_pairings_made(&self) {
        self.pairings_made.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_bot_moves_committed(&self) {
        self.bot_moves_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_bot_moves_dropped(&self) {
        self.bot_moves_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tournaments_finalized(&self) {
        self.tournaments_finalized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn games_finished_count(&self) -> u64 {
        self.games_finished.load(Ordering::Relaxed)
    }

    pub fn to_influx_string(&self) -> String {
        [
            format!("games_finished={}u", self.games_finished.load(Ordering::Relaxed)),
            format!("pairings_made={}u", self.pairings_made.load(Ordering::Relaxed)),
            format!(
                "bot_moves_committed={}u",
                self.bot_moves_committed.load(Ordering::Relaxed)
            ),
            format!("bot_moves_dropped={}u", self.bot_moves_dropped.load(Ordering::Relaxed)),
            format!(
                "tournaments_finalized={}u",
                self.tournaments_finalized.load(Ordering::Relaxed)
            ),
        ]
        .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let m = Metrics::default();
        m.inc_games_finished();
        m.inc_games_finished();
        m.inc_pairings_made();
        let line = m.to_influx_string();
        assert!(line.contains("games_finished=2u"));
        assert!(line.contains("pairings_made=1u"));
    }
}
