use axum::http::StatusCode;
use shakmaty::{fen::ParseFenError, uci::IllegalUciError, Chess, PositionError};
use thiserror::Error as ThisError;

use crate::model::{GameId, PlayerId, TournamentId};

/// The crate-wide error taxonomy (spec §7). Validation, authorization, and
/// not-found errors surface to the API as plain-text bodies with the
/// matching status code; infrastructure failures never reach here — the
/// arena ticker and store log those themselves and carry on.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("malformed fen: {0}")]
    Fen(#[from] ParseFenError),
    #[error("illegal position: {0}")]
    Position(Box<PositionError<Chess>>),
    #[error("invalid uci: {0}")]
    InvalidUci(String),
    #[error("illegal move: {0}")]
    IllegalUci(Box<IllegalUciError>),
    #[error("tournament {0} not found")]
    TournamentNotFound(TournamentId),
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("bot {0} not found")]
    BotNotFound(PlayerId),
    #[error("not your game")]
    NotYourGame,
    #[error("not your turn")]
    NotYourTurn,
    #[error("forbidden")]
    Forbidden,
    #[error("account banned")]
    Banned,
    #[error("game already over")]
    GameOver,
    #[error("already in an ongoing game {game_id}")]
    AlreadyInGame { game_id: GameId },
    #[error("already berserked")]
    AlreadyBerserked,
    #[error("bot_id required")]
    MissingBotId,
    #[error("unknown bot engine")]
    InvalidBot,
    #[error("invalid move format")]
    InvalidMoveFormat,
}

impl From<PositionError<Chess>> for Error {
    fn from(err: PositionError<Chess>) -> Error {
        Error::Position(Box::new(err))
    }
}

impl From<IllegalUciError> for Error {
    fn from(err: IllegalUciError) -> Error {
        Error::IllegalUci(Box::new(err))
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Error::Fen(_)
            | Error::Position(_)
            | Error::InvalidUci(_)
            | Error::IllegalUci(_)
            | Error::GameOver
            | Error::AlreadyInGame { .. }
            | Error::AlreadyBerserked
            | Error::MissingBotId
            | Error::InvalidBot
            | Error::InvalidMoveFormat => StatusCode::BAD_REQUEST,
            Error::NotYourGame | Error::NotYourTurn | Error::Forbidden | Error::Banned => {
                StatusCode::FORBIDDEN
            }
            Error::TournamentNotFound(_)
            | Error::GameNotFound(_)
            | Error::PlayerNotFound(_)
            | Error::BotNotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}
