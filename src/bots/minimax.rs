//! The reference search engine (spec §4.5): negamax with alpha-beta
//! pruning, iterative deepening, a zobrist-keyed transposition table,
//! MVV-LVA + killer + history move ordering, and a capture/promotion
//! quiescence search at the leaves. `martinbot` reuses `search` with a
//! weaker budget to produce more human-like play.

use std::{collections::HashMap, time::Instant};

use shakmaty::{
    zobrist::{Zobrist64, ZobristHash},
    EnPassantMode, Move, Position, Role, Square,
};

use crate::rules::{self, Board};

#[derive(Debug, Copy, Clone)]
pub struct BotBudget {
    pub max_depth: u32,
    pub max_nodes: u64,
    pub max_time_ms: u64,
    pub random_top: usize,
    pub random_margin_cp: i32,
}

pub const DEFAULT_BUDGET: BotBudget = BotBudget {
    max_depth: 3,
    max_nodes: 45_000,
    max_time_ms: 450,
    random_top: 1,
    random_margin_cp: 0,
};

const MATE_SCORE: i32 = 1_000_000;

pub fn choose_move(board: &Board) -> Option<Move> {
    search(board, DEFAULT_BUDGET)
}

/// Runs iterative deepening up to `budget.max_depth` (or until the node/time
/// budget runs out), then breaks ties among root moves within
/// `random_margin_cp` of the best score uniformly among the best
/// `random_top` (spec §4.5).
pub fn search(board: &Board, budget: BotBudget) -> Option<Move> {
    let mut root_moves = rules::legal_moves(board);
    if root_moves.is_empty() {
        return None;
    }

    let mut s = Searcher {
        budget,
        nodes: 0,
        start: Instant::now(),
        tt: HashMap::new(),
        killers: vec![[None, None]; budget.max_depth as usize + 1],
        history: HashMap::new(),
    };

    let mut root_scores: Vec<(Move, i32)> =
        root_moves.drain(..).map(|m| (m, -MATE_SCORE - 1)).collect();

    'deepen: for depth in 1..=budget.max_depth {
        let mut best_this_depth = Vec::with_capacity(root_scores.len());
        for (m, _) in &root_scores {
            if s.time_up() {
                break 'deepen;
            }
            let next = rules::push(board, m);
            let score = -s.negamax(&next, depth - 1, 1, -MATE_SCORE, MATE_SCORE);
            best_this_depth.push((m.clone(), score));
        }
        if best_this_depth.len() == root_scores.len() {
            root_scores = best_this_depth;
            root_scores.sort_by_key(|(_, score)| std::cmp::Reverse(*score));
        } else {
            break;
        }
    }

    pick_with_margin(root_scores, budget)
}

fn pick_with_margin(mut scored: Vec<(Move, i32)>, budget: BotBudget) -> Option<Move> {
    scored.sort_by_key(|(_, score)| std::cmp::Reverse(*score));
    let best = scored.first()?.1;
    let within_margin: Vec<Move> = scored
        .iter()
        .filter(|(_, score)| best - score <= budget.random_margin_cp)
        .take(budget.random_top.max(1))
        .map(|(m, _)| m.clone())
        .collect();
    if within_margin.is_empty() {
        return scored.into_iter().next().map(|(m, _)| m);
    }
    Some(within_margin[fastrand::usize(..within_margin.len())].clone())
}

struct Searcher {
    budget: BotBudget,
    nodes: u64,
    start: Instant,
    tt: HashMap<u64, TtEntry>,
    killers: Vec<[Option<Move>; 2]>,
    history: HashMap<(Square, Square), i32>,
}

#[derive(Copy, Clone)]
enum Bound {
    Exact,
    Lower,
    Upper,
}

struct TtEntry {
    depth: u32,
    score: i32,
    bound: Bound,
}

impl Searcher {
    fn time_up(&self) -> bool {
        self.nodes >= self.budget.max_nodes
            || self.start.elapsed().as_millis() as u64 >= self.budget.max_time_ms
    }

    fn zobrist_key(board: &Board) -> u64 {
        let hash: Zobrist64 = board.zobrist_hash(EnPassantMode::Legal);
        hash.0
    }

    fn negamax(&mut self, board: &Board, depth: u32, ply: usize, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        if rules::is_checkmate(board) {
            return -MATE_SCORE + ply as i32;
        }
        if rules::is_stalemate(board) || rules::is_insufficient_material(board) || rules::is_seventyfive_moves(board) {
            return 0;
        }
        if depth == 0 || self.time_up() {
            return self.quiescence(board, alpha, beta);
        }

        let key = Self::zobrist_key(board);
        if let Some(entry) = self.tt.get(&key) {
            if entry.depth >= depth {
                match entry.bound {
                    Bound::Exact => return entry.score,
                    Bound::Lower if entry.score >= beta => return entry.score,
                    Bound::Upper if entry.score <= alpha => return entry.score,
                    _ => {}
                }
            }
        }

        let mut moves = rules::legal_moves(board);
        self.order_moves(&mut moves, ply);

        let original_alpha = alpha;
        let mut best_score = -MATE_SCORE - 1;
        for m in &moves {
            if self.time_up() {
                break;
            }
            let next = rules::push(board, m);
            let score = -self.negamax(&next, depth.saturating_sub(1), ply + 1, -beta, -alpha);
            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.record_cutoff(m, ply);
                break;
            }
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.insert(key, TtEntry { depth, score: best_score, bound });
        best_score
    }

    /// Extends the search over captures and promotions only, so the static
    /// evaluation at the leaf never fires in the middle of a capture
    /// exchange (spec §4.5's quiescence requirement).
    fn quiescence(&mut self, board: &Board, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        let stand_pat = evaluate(board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if self.time_up() {
            return stand_pat;
        }

        let mut tactical: Vec<Move> = rules::legal_moves(board)
            .into_iter()
            .filter(|m| m.is_capture() || m.promotion().is_some())
            .collect();
        tactical.sort_by_key(|m| std::cmp::Reverse(mvv_lva(m)));

        for m in &tactical {
            if self.time_up() {
                break;
            }
            let next = rules::push(board, m);
            let score = -self.quiescence(&next, -beta, -alpha);
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }

    fn order_moves(&self, moves: &mut [Move], ply: usize) {
        let killers = self.killers.get(ply);
        moves.sort_by_key(|m| {
            let mut score = mvv_lva(m);
            if let Some(k) = killers {
                if k.iter().flatten().any(|km| km == m) {
                    score += 5_000;
                }
            }
            score += *self
                .history
                .get(&(m.from().unwrap_or_else(|| m.to()), m.to()))
                .unwrap_or(&0);
            std::cmp::Reverse(score)
        });
    }

    fn record_cutoff(&mut self, m: &Move, ply: usize) {
        if !m.is_capture() {
            if let Some(slot) = self.killers.get_mut(ply) {
                if slot[0].as_ref() != Some(m) {
                    slot[1] = slot[0].take();
                    slot[0] = Some(m.clone());
                }
            }
            let key = (m.from().unwrap_or_else(|| m.to()), m.to());
            *self.history.entry(key).or_insert(0) += 1;
        }
    }
}

fn mvv_lva(m: &Move) -> i32 {
    match m.capture() {
        Some(captured) => 10_000 + piece_value(captured) * 10 - piece_value(m.role()),
        None => m.promotion().map(|p| 9_000 + piece_value(p)).unwrap_or(0),
    }
}

fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 320,
        Role::Bishop => 330,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 20_000,
    }
}

const KNIGHT_PST: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50, -40, -20, 0, 0, 0, 0, -20, -40, -30, 0, 10, 15, 15,
    10, 0, -30, -30, 5, 15, 20, 20, 15, 5, -30, -30, 0, 15, 20, 20, 15, 0, -30, -30, 5, 10, 15,
    15, 10, 5, -30, -40, -20, 0, 5, 5, 0, -20, -40, -50, -40, -30, -30, -30, -30, -40, -50,
];

const PAWN_PST: [i32; 64] = [
    0, 0, 0, 0, 0, 0, 0, 0, 50, 50, 50, 50, 50, 50, 50, 50, 10, 10, 20, 30, 30, 20, 10, 10, 5, 5,
    10, 25, 25, 10, 5, 5, 0, 0, 0, 20, 20, 0, 0, 0, 5, -5, -10, 0, 0, -10, -5, 5, 5, 10, 10, -20,
    -20, 10, 10, 5, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Static evaluation from the perspective of the side to move: material,
/// piece-square tables, and a bishop-pair bonus (spec §4.5).
fn evaluate(board: &Board) -> i32 {
    let placement = board.board();
    let mut score = 0i32;
    let mut bishops = [0u8; 2];

    for square in Square::ALL {
        let Some(piece) = placement.piece_at(square) else { continue };
        let idx = square_index(square, piece.color == shakmaty::Color::White);
        let value = piece_value(piece.role)
            + match piece.role {
                Role::Pawn => PAWN_PST[idx],
                Role::Knight => KNIGHT_PST[idx],
                _ => 0,
            };
        if piece.role == Role::Bishop {
            bishops[piece.color as usize] += 1;
        }
        score += if piece.color == board.turn() { value } else { -value };
    }

    let us = board.turn() as usize;
    let them = 1 - us;
    if bishops[us] >= 2 {
        score += 30;
    }
    if bishops[them] >= 2 {
        score -= 30;
    }

    score
}

fn square_index(square: Square, white: bool) -> usize {
    let file = square.file() as usize;
    let rank = square.rank() as usize;
    let rank = if white { 7 - rank } else { rank };
    rank * 8 + file
}
