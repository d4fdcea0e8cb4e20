use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::{
    model::{GameId, PlayerId, Timestamp, TournamentId},
    rules,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Ongoing,
    White,
    Black,
    Draw,
}

impl GameResult {
    pub fn is_ongoing(&self) -> bool {
        matches!(self, GameResult::Ongoing)
    }

    pub fn of_color(color: Color) -> GameResult {
        match color {
            Color::White => GameResult::White,
            Color::Black => GameResult::Black,
        }
    }

    /// The other color's result, used when one side's flag falls or they
    /// resign — the opponent is awarded the win.
    pub fn of_opposite(color: Color) -> GameResult {
        GameResult::of_color(color.other())
    }
}

/// A single game within a tournament (spec §3). Clock bookkeeping lives
/// here directly rather than in a separate value type — every mutation to a
/// clock field happens alongside a move, resignation, or claim, so keeping
/// them on `Game` avoids a second lock for what is always one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub tournament: TournamentId,
    pub white: PlayerId,
    pub black: PlayerId,
    pub result: GameResult,
    pub fen: String,
    pub move_list: Vec<String>,
    pub move_times_ms: Vec<u64>,
    pub white_clock_ms: u64,
    pub black_clock_ms: u64,
    pub increment_ms: u64,
    pub clock_running_for: Color,
    pub last_clock_update: Timestamp,
    pub white_berserk: bool,
    pub black_berserk: bool,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl Game {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: GameId,
        tournament: TournamentId,
        white: PlayerId,
        black: PlayerId,
        base_ms: u64,
        increment_ms: u64,
        now: Timestamp,
    ) -> Game {
        Game {
            id,
            tournament,
            white,
            black,
            result: GameResult::Ongoing,
            fen: rules::STARTING_FEN.to_owned(),
            move_list: Vec::new(),
            move_times_ms: Vec::new(),
            white_clock_ms: base_ms,
            black_clock_ms: base_ms,
            increment_ms,
            clock_running_for: Color::White,
            // Open question resolved per spec §9: always anchor the clock to
            // `started_at`, never left unset.
            last_clock_update: now,
            white_berserk: false,
            black_berserk: false,
            started_at: now,
            ended_at: None,
        }
    }

    pub fn color_of(&self, player: PlayerId) -> Option<Color> {
        if player == self.white {
            Some(Color::White)
        } else if player == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn player_of(&self, color: Color) -> PlayerId {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn berserked(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_berserk,
            Color::Black => self.black_berserk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_anchors_clock_to_start() {
        let g = Game::new(
            GameId(1),
            TournamentId(1),
            PlayerId(1),
            PlayerId(2),
            180_000,
            2_000,
            Timestamp(1_000),
        );
        assert_eq!(g.last_clock_update, Timestamp(1_000));
        assert_eq!(g.fen, rules::STARTING_FEN);
        assert!(g.result.is_ongoing());
    }

    #[test]
    fn color_of_identifies_participants_only() {
        let g = Game::new(
            GameId(1),
            TournamentId(1),
            PlayerId(1),
            PlayerId(2),
            0,
            0,
            Timestamp(0),
        );
        assert_eq!(g.color_of(PlayerId(1)), Some(Color::White));
        assert_eq!(g.color_of(PlayerId(2)), Some(Color::Black));
        assert_eq!(g.color_of(PlayerId(3)), None);
    }
}
