use serde::{Deserialize, Serialize};

use crate::model::{PlayerId, Timestamp, TournamentId};

/// One row per pairing ever made in a tournament, used only for the
/// anti-rematch lookup (spec §4.7 step 2). `a`/`b` are stored with the
/// lower-valued id first so membership checks don't need to try both
/// orderings.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct PairingHistory {
    pub tournament: TournamentId,
    pub a: PlayerId,
    pub b: PlayerId,
    pub paired_at: Timestamp,
}

impl PairingHistory {
    pub fn new(tournament: TournamentId, a: PlayerId, b: PlayerId, paired_at: Timestamp) -> Self {
        let (a, b) = if a.0 <= b.0 { (a, b) } else { (b, a) };
        PairingHistory { tournament, a, b, paired_at }
    }

    pub fn involves(&self, player: PlayerId) -> Option<PlayerId> {
        if self.a == player {
            Some(self.b)
        } else if self.b == player {
            Some(self.a)
        } else {
            None
        }
    }
}
