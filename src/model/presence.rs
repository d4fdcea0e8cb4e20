use crate::model::{PlayerId, Timestamp};

/// `{player, last_seen_at}` (spec §3), touched on every authenticated
/// request. A player is online if `now - last_seen_at <= window`.
#[derive(Debug, Copy, Clone)]
pub struct Presence {
    pub player: PlayerId,
    pub last_seen_at: Timestamp,
}

impl Presence {
    pub fn is_online(&self, now: Timestamp, window_ms: u64) -> bool {
        self.last_seen_at.elapsed_ms_until(now) <= window_ms
    }
}
