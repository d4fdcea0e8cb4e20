use serde::{Deserialize, Serialize};

use crate::model::{PlayerId, Timestamp, TournamentId};

/// Append-only log of materialized rating changes (spec §3), one row per
/// tournament finalization a player participates in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingHistory {
    pub player: PlayerId,
    pub tournament: Option<TournamentId>,
    pub rating: f64,
    pub rd: f64,
    pub recorded_at: Timestamp,
}
