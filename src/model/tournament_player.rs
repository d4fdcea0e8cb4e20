use serde::{Deserialize, Serialize};

use crate::model::{PlayerId, Timestamp, TournamentId};

/// A join row (spec §3). `score = 2*wins + draws + streak_bonuses +
/// berserk_bonuses`, tracked incrementally by the arena's score-application
/// routine rather than recomputed from the components on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentPlayer {
    pub tournament: TournamentId,
    pub player: PlayerId,
    pub score: u32,
    pub win_streak: u32,
    pub games_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub berserks: u32,
    pub performance_rating: f64,
    pub in_queue: bool,
    pub queue_joined_at: Timestamp,
    pub active: bool,
    pub joined_at: Timestamp,
}

impl TournamentPlayer {
    pub fn new(tournament: TournamentId, player: PlayerId, now: Timestamp) -> TournamentPlayer {
        TournamentPlayer {
            tournament,
            player,
            score: 0,
            win_streak: 0,
            games_played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            berserks: 0,
            performance_rating: 0.0,
            in_queue: true,
            queue_joined_at: now,
            active: true,
            joined_at: now,
        }
    }

    pub fn enqueue(&mut self, now: Timestamp) {
        self.in_queue = true;
        self.queue_joined_at = now;
    }

    pub fn leave(&mut self) {
        self.active = false;
        self.in_queue = false;
    }

    pub fn games_accounted_for(&self) -> bool {
        self.wins + self.draws + self.losses == self.games_played
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_row_starts_in_queue_with_zeroed_counters() {
        let tp = TournamentPlayer::new(TournamentId(1), PlayerId(1), Timestamp(100));
        assert!(tp.in_queue);
        assert!(tp.active);
        assert!(tp.games_accounted_for());
        assert_eq!(tp.queue_joined_at, Timestamp(100));
    }

    #[test]
    fn leaving_clears_active_and_queue_flags() {
        let mut tp = TournamentPlayer::new(TournamentId(1), PlayerId(1), Timestamp(0));
        tp.leave();
        assert!(!tp.active);
        assert!(!tp.in_queue);
    }
}
