//! The sentinel engine (spec §4.5): uniform random over captures, falling
//! through to uniform random over all legal moves. Also the driver's own
//! fallback when a chosen move turns out illegal on re-read (spec §4.6).

use shakmaty::Move;

use crate::rules::{self, Board};

pub fn choose_move(board: &Board) -> Option<Move> {
    let moves = rules::legal_moves(board);
    let captures: Vec<&Move> = moves.iter().filter(|m| m.is_capture()).collect();
    if !captures.is_empty() {
        return Some(captures[fastrand::usize(..captures.len())].clone());
    }
    if moves.is_empty() {
        return None;
    }
    Some(moves[fastrand::usize(..moves.len())].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_a_capture_when_one_is_available() {
        // 1.e4 d5 2.exd5 - white to move, d5 pawn capturable by e4 pawn.
        let mut board = rules::new_board();
        for uci in ["e2e4", "d7d5"] {
            let mv = rules::parse_legal_uci(&board, uci).unwrap();
            board = rules::push(&board, &mv);
        }
        let mv = choose_move(&board).expect("a move exists");
        assert!(rules::is_capture(&board, &mv));
    }

    #[test]
    fn returns_none_on_terminal_position() {
        let mut board = rules::new_board();
        for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            let mv = rules::parse_legal_uci(&board, uci).unwrap();
            board = rules::push(&board, &mv);
        }
        assert!(rules::is_checkmate(&board));
        assert!(choose_move(&board).is_none());
    }
}
