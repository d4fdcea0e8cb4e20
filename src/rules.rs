//! Chess rules adapter (C2): a thin, deterministic façade over `shakmaty`.
//!
//! Everything here is a direct pass-through to `shakmaty::Chess` (the
//! standard-chess `Position` implementation). No variant support, no
//! host-locale dependence — `shakmaty` itself has none, and we add none.

use std::str::FromStr;

use shakmaty::{
    fen::Fen, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Move, Position,
};

use crate::api::Error;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A standard-chess position plus the move that reached it, when known.
pub type Board = Chess;

pub fn new_board() -> Board {
    Chess::default()
}

pub fn from_fen(s: &str) -> Result<Board, Error> {
    let fen = Fen::from_str(s).map_err(Error::Fen)?;
    fen.into_position::<Chess>(CastlingMode::Standard)
        .map_err(|err| Error::Position(err.into()))
}

pub fn fen(board: &Board) -> String {
    Fen::from_position(board, EnPassantMode::Legal).to_string()
}

pub fn legal_moves(board: &Board) -> Vec<Move> {
    board.legal_moves().into_iter().collect()
}

pub fn turn(board: &Board) -> Color {
    board.turn()
}

/// Parses `uci` and validates it against `board`'s legal moves in one step.
pub fn parse_legal_uci(board: &Board, uci: &str) -> Result<Move, Error> {
    let uci_move = UciMove::from_str(uci).map_err(|_| Error::InvalidUci(uci.to_owned()))?;
    uci_move
        .to_move(board)
        .map_err(|err| Error::IllegalUci(err.into()))
}

/// Applies `m` to `board`, returning the resulting position.
pub fn push(board: &Board, m: &Move) -> Board {
    board.clone().play(m).expect("move already validated legal")
}

pub fn is_checkmate(board: &Board) -> bool {
    board.is_checkmate()
}

pub fn is_stalemate(board: &Board) -> bool {
    board.is_stalemate()
}

pub fn is_insufficient_material(board: &Board) -> bool {
    board.is_insufficient_material()
}

pub fn is_seventyfive_moves(board: &Board) -> bool {
    board.is_seventyfive_moves()
}

pub fn is_capture(_board: &Board, m: &Move) -> bool {
    m.is_capture()
}

pub fn uci_of(m: &Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_matches_spec_fen() {
        assert_eq!(fen(&new_board()), STARTING_FEN);
    }

    #[test]
    fn rejects_illegal_uci() {
        let board = new_board();
        assert!(parse_legal_uci(&board, "e2e5").is_err());
    }

    #[test]
    fn accepts_legal_uci_and_advances_turn() {
        let board = new_board();
        let m = parse_legal_uci(&board, "e2e4").expect("legal");
        let next = push(&board, &m);
        assert_eq!(turn(&next), Color::Black);
    }

    #[test]
    fn detects_scholars_mate_checkmate() {
        let mut board = new_board();
        for uci in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"] {
            let m = parse_legal_uci(&board, uci).expect("legal");
            board = push(&board, &m);
        }
        assert!(is_checkmate(&board));
    }

    #[test]
    fn fen_roundtrips_through_from_fen() {
        let board = new_board();
        let m = parse_legal_uci(&board, "g1f3").expect("legal");
        let next = push(&board, &m);
        let roundtripped = from_fen(&fen(&next)).expect("valid fen");
        assert_eq!(fen(&roundtripped), fen(&next));
    }
}
