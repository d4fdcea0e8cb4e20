//! The bot engine registry (C5): a named set of move-choosers behind one
//! interface, populated once at first access the way the teacher's indexer
//! lazily builds its own process-local registries. Unknown keys fall
//! through to `random_capture` (spec §4.5).

mod martinbot;
mod minimax;
mod random_capture;

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use shakmaty::Move;

use crate::rules::Board;

pub const RANDOM_CAPTURE: &str = "random_capture";
pub const MINIMAX: &str = "minimax";
pub const MARTINBOT: &str = "martinbot";

type Chooser = fn(&Board) -> Option<Move>;

struct BotEntry {
    name: &'static str,
    description: &'static str,
    chooser: Chooser,
}

fn registry() -> &'static FxHashMap<&'static str, BotEntry> {
    static REGISTRY: OnceLock<FxHashMap<&'static str, BotEntry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = FxHashMap::default();
        map.insert(
            RANDOM_CAPTURE,
            BotEntry {
                name: RANDOM_CAPTURE,
                description: "uniform random over captures, else over all legal moves",
                chooser: random_capture::choose_move,
            },
        );
        map.insert(
            MINIMAX,
            BotEntry {
                name: MINIMAX,
                description: "negamax + alpha-beta, depth 3, 45000 nodes, 450ms",
                chooser: minimax::choose_move,
            },
        );
        map.insert(
            MARTINBOT,
            BotEntry {
                name: MARTINBOT,
                description: "minimax with a weaker, more human-like budget",
                chooser: martinbot::choose_move,
            },
        );
        map
    })
}

/// The engines available, for a roster-listing endpoint.
pub fn list() -> Vec<(&'static str, &'static str)> {
    registry().values().map(|e| (e.name, e.description)).collect()
}

/// Looks up `engine_key`, falling back to `random_capture` on an unknown
/// key (spec §4.5) — the driver clones the board before calling, so
/// engines never see a position they could mutate out from under a caller.
pub fn choose_move(engine_key: &str, board: &Board) -> Option<Move> {
    let chooser = registry().get(engine_key).map(|e| e.chooser).unwrap_or(random_capture::choose_move);
    chooser(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_falls_through_to_random_capture() {
        let board = crate::rules::new_board();
        assert!(choose_move("totally-unknown-engine", &board).is_some());
    }

    #[test]
    fn registry_lists_all_three_reference_engines() {
        let names: Vec<&str> = list().into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&RANDOM_CAPTURE));
        assert!(names.contains(&MINIMAX));
        assert!(names.contains(&MARTINBOT));
    }
}
