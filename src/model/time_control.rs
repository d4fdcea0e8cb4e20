use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed `"M+I"` time control: base minutes plus per-move increment in
/// seconds. Malformed strings fall back to the 3+2 default, never to an
/// error — the time control string is user-supplied free text on tournament
/// creation, not something we want to 400 on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimeControl {
    pub base_ms: u64,
    pub increment_ms: u64,
}

impl TimeControl {
    const DEFAULT: TimeControl = TimeControl {
        base_ms: 180_000,
        increment_ms: 2_000,
    };

    pub fn parse(spec: &str) -> TimeControl {
        let mut parts = spec.splitn(2, '+');
        let minutes = parts.next().and_then(|p| p.parse::<u64>().ok());
        let increment = parts.next().and_then(|p| p.parse::<u64>().ok());
        match (minutes, increment) {
            (Some(minutes), Some(increment)) => TimeControl {
                base_ms: minutes * 60 * 1000,
                increment_ms: increment * 1000,
            },
            _ => TimeControl::DEFAULT,
        }
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.base_ms / 60_000, self.increment_ms / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_increment() {
        let tc = TimeControl::parse("3+2");
        assert_eq!(tc.base_ms, 180_000);
        assert_eq!(tc.increment_ms, 2_000);
    }

    #[test]
    fn parses_zero_increment() {
        let tc = TimeControl::parse("0+0");
        assert_eq!(tc.base_ms, 0);
        assert_eq!(tc.increment_ms, 0);
    }

    #[test]
    fn defaults_on_malformed_input() {
        let tc = TimeControl::parse("bogus");
        assert_eq!(tc, TimeControl::DEFAULT);
    }

    #[test]
    fn missing_increment_is_malformed_and_falls_back_to_default() {
        let tc = TimeControl::parse("5");
        assert_eq!(tc, TimeControl::DEFAULT);
    }

    #[test]
    fn roundtrips_through_display() {
        let tc = TimeControl::parse("3+2");
        assert_eq!(tc.to_string(), "3+2");
    }
}
