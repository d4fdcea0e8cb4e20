//! `martinbot` (spec §4.5): the same search as `minimax`, budgeted to play
//! more human-like, imperfect chess — fewer nodes, a wider random margin,
//! and more candidates to pick among at the root.

use shakmaty::Move;

use crate::{
    bots::minimax::{self, BotBudget},
    rules::Board,
};

const BUDGET: BotBudget = BotBudget {
    max_depth: 3,
    max_nodes: 10_000,
    max_time_ms: 450,
    random_top: 2,
    random_margin_cp: 90,
};

pub fn choose_move(board: &Board) -> Option<Move> {
    minimax::search(board, BUDGET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;

    #[test]
    fn finds_a_legal_move() {
        let board = rules::new_board();
        let mv = choose_move(&board).expect("a move exists");
        assert!(rules::legal_moves(&board).contains(&mv));
    }
}
