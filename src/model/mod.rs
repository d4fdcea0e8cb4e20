mod bot_config;
mod casual_queue;
mod game;
mod ids;
mod pairing_history;
mod player;
mod presence;
mod rating_history;
pub mod time_control;
mod tournament;
mod tournament_player;

pub use bot_config::BotConfig;
pub use casual_queue::CasualQueueEntry;
pub use game::{Game, GameResult};
pub use ids::{GameId, IdSequence, PlayerId, Timestamp, TournamentId};
pub use pairing_history::PairingHistory;
pub use player::Player;
pub use presence::Presence;
pub use rating_history::RatingHistory;
pub use time_control::TimeControl;
pub use tournament::{Tournament, TournamentStatus};
pub use tournament_player::TournamentPlayer;
