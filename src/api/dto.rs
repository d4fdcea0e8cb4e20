//! Wire types for the JSON API (C9, spec §6 + spec_full §B). Kept separate
//! from the domain model so a response shape can change without touching
//! `crate::model`, mirroring the teacher's `ExplorerResponse`/`ExplorerGame`
//! split from its own `model::` types.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, SpaceSeparator, StringWithSeparator};

use crate::{
    model::{Game, GameId, GameResult, Player, PlayerId, Tournament, TournamentPlayer},
    store::Store,
};

#[derive(Serialize)]
pub struct JoinResponse {
    pub ok: bool,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: PlayerId,
    pub username: String,
    pub score: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub win_streak: u32,
    pub berserks: u32,
    pub performance_rating: f64,
    pub rating: f64,
    pub provisional: bool,
    pub in_queue: bool,
}

pub fn leaderboard(store: &Store, tournament: crate::model::TournamentId) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<TournamentPlayer> = store.list_tournament_players(tournament);
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, tp)| {
            let player = store.get_player(tp.player).ok()?;
            Some(LeaderboardEntry {
                rank: i + 1,
                player_id: tp.player,
                username: player.username,
                score: tp.score,
                wins: tp.wins,
                draws: tp.draws,
                losses: tp.losses,
                win_streak: tp.win_streak,
                berserks: tp.berserks,
                performance_rating: tp.performance_rating,
                rating: player.rating.rating,
                provisional: player.is_provisional(),
                in_queue: tp.in_queue,
            })
        })
        .collect()
}

/// UCI move history renders as one space-separated string on the wire
/// (`#[serde_as(as = "StringWithSeparator::<SpaceSeparator, String>")]`), the
/// same idiom the teacher uses for PGN-sourced move lists.
#[serde_as]
#[derive(Serialize)]
pub struct GameView {
    pub id: GameId,
    pub tournament: crate::model::TournamentId,
    pub white: PlayerId,
    pub black: PlayerId,
    pub result: GameResult,
    pub fen: String,
    #[serde_as(as = "StringWithSeparator::<SpaceSeparator, String>")]
    pub move_list: Vec<String>,
    pub move_times_ms: Vec<u64>,
    pub white_clock_ms: u64,
    pub black_clock_ms: u64,
    pub increment_ms: u64,
    pub white_berserk: bool,
    pub black_berserk: bool,
    pub started_at: crate::model::Timestamp,
    pub ended_at: Option<crate::model::Timestamp>,
}

impl From<Game> for GameView {
    fn from(g: Game) -> GameView {
        GameView {
            id: g.id,
            tournament: g.tournament,
            white: g.white,
            black: g.black,
            result: g.result,
            fen: g.fen,
            move_list: g.move_list,
            move_times_ms: g.move_times_ms,
            white_clock_ms: g.white_clock_ms,
            black_clock_ms: g.black_clock_ms,
            increment_ms: g.increment_ms,
            white_berserk: g.white_berserk,
            black_berserk: g.black_berserk,
            started_at: g.started_at,
            ended_at: g.ended_at,
        }
    }
}

/// Live clocks are folded into the same view on read, so a polling client
/// never has to run the clock math itself (spec §4.3's `live_clocks` is a
/// pure read — we just apply it before serializing).
pub fn game_view_live(game: Game, now: crate::model::Timestamp) -> GameView {
    let live = crate::clock::live_clocks(&game, now);
    let mut view = GameView::from(game);
    if view.result == GameResult::Ongoing {
        view.white_clock_ms = live.white_ms;
        view.black_clock_ms = live.black_ms;
    }
    view
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub uci: String,
}

#[derive(Serialize)]
pub struct ClaimTimeResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct CasualJoinRequest {
    pub time_control: String,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum CasualJoinResponse {
    Queued { queued: bool },
    Matched { matched: bool, game_id: GameId },
}

#[derive(Deserialize)]
pub struct CasualPlayBotRequest {
    pub bot_id: PlayerId,
    pub time_control: String,
}

#[derive(Serialize)]
pub struct CasualPlayBotResponse {
    pub ok: bool,
    pub game_id: GameId,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_games_played: u64,
    pub players_online: usize,
}

#[derive(Serialize)]
pub struct BotRosterEntry {
    pub player_id: PlayerId,
    pub username: String,
    pub engine_key: String,
}

pub fn bot_roster(store: &Store) -> Vec<BotRosterEntry> {
    store
        .list_bots()
        .into_iter()
        .filter(|(p, _)| !p.banned)
        .map(|(p, cfg)| BotRosterEntry {
            player_id: p.id,
            username: p.username,
            engine_key: cfg.engine_key,
        })
        .collect()
}

#[derive(Serialize)]
pub struct RatingHistoryEntry {
    pub tournament: Option<crate::model::TournamentId>,
    pub rating: f64,
    pub rd: f64,
    pub recorded_at: crate::model::Timestamp,
}

#[derive(Serialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub username: String,
    pub rating: f64,
    pub rd: f64,
    pub provisional: bool,
    pub is_bot: bool,
    pub games_played: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_performance: Option<f64>,
}

pub fn player_profile(store: &Store, player: Player) -> PlayerProfile {
    let recent_performance = crate::admin::recent_performance(store, player.id);
    PlayerProfile {
        id: player.id,
        username: player.username,
        rating: player.rating.rating,
        rd: player.rating.rd,
        provisional: player.is_provisional(),
        is_bot: player.is_bot,
        games_played: player.games_played,
        recent_performance,
    }
}

#[derive(Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub time_control: String,
    pub duration_secs: u64,
    pub starts_in_secs: u64,
}

#[derive(Serialize)]
pub struct TournamentView {
    pub id: crate::model::TournamentId,
    pub name: String,
    pub time_control: String,
    pub status: crate::model::TournamentStatus,
    pub started_at: crate::model::Timestamp,
    pub ends_at: crate::model::Timestamp,
}

impl From<Tournament> for TournamentView {
    fn from(t: Tournament) -> TournamentView {
        TournamentView {
            id: t.id,
            name: t.name,
            time_control: t.time_control.to_string(),
            status: t.status,
            started_at: t.started_at,
            ends_at: t.ends_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateBotRequest {
    pub username: String,
    pub engine_key: String,
}

