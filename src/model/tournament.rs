use serde::{Deserialize, Serialize};

use crate::model::{time_control::TimeControl, Timestamp, TournamentId};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Waiting,
    Active,
    Finished,
}

/// An arena event (spec §3). Status only ever advances
/// `Waiting -> Active -> Finished`; casual one-off events are tournaments
/// whose name begins with `"Casual "` (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub duration_secs: u64,
    pub time_control: TimeControl,
    pub status: TournamentStatus,
    pub started_at: Timestamp,
    pub ends_at: Timestamp,
}

impl Tournament {
    pub fn is_casual(&self) -> bool {
        self.name.starts_with("Casual ")
    }

    pub fn should_start(&self, now: Timestamp) -> bool {
        self.status == TournamentStatus::Waiting && now >= self.started_at
    }

    pub fn should_finish(&self, now: Timestamp) -> bool {
        self.status == TournamentStatus::Active && !self.is_casual() && now >= self.ends_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tournament(name: &str) -> Tournament {
        Tournament {
            id: TournamentId(1),
            name: name.to_owned(),
            duration_secs: 600,
            time_control: TimeControl::parse("3+2"),
            status: TournamentStatus::Active,
            started_at: Timestamp(0),
            ends_at: Timestamp(600_000),
        }
    }

    #[test]
    fn casual_name_prefix_is_detected() {
        assert!(tournament("Casual 3+2").is_casual());
        assert!(!tournament("Weekly Blitz").is_casual());
    }

    #[test]
    fn casual_tournaments_never_auto_finish() {
        let mut t = tournament("Casual 3+2");
        t.ends_at = Timestamp(0);
        assert!(!t.should_finish(Timestamp(1)));
    }
}
