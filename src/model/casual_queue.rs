use crate::model::{time_control::TimeControl, PlayerId, Timestamp};

/// `{player, time_control, joined_at}` (spec §3) — at most one row per
/// player, enforced by the store's keying rather than here.
#[derive(Debug, Copy, Clone)]
pub struct CasualQueueEntry {
    pub player: PlayerId,
    pub time_control: TimeControl,
    pub joined_at: Timestamp,
}

pub const STALE_AFTER_MS: u64 = 10 * 60 * 1000;

impl CasualQueueEntry {
    pub fn is_stale(&self, now: Timestamp) -> bool {
        self.joined_at.elapsed_ms_until(now) > STALE_AFTER_MS
    }
}
