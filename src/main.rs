#![forbid(unsafe_code)]

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts, Path, State},
    http::{header, request::Parts},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use log::info;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;

use arena_tourney::{
    admin, api::dto, api::Error, arena, bot_driver::BotDriver, casual,
    model::{
        Game, GameId, Player, PlayerId, Timestamp, TimeControl, Tournament, TournamentId,
        TournamentPlayer, TournamentStatus,
    },
    rules, store::Store,
    util::NevermindExt as _,
};

#[derive(Parser)]
#[command(author, version, about = "Arena tournament coordination core")]
struct Opt {
    /// Binding address. Administrative endpoints must be protected by a
    /// reverse proxy, as in the teacher's own deployment notes.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
    /// Selects the persistent store backend. Only the embedded in-process
    /// store is implemented (spec §1 scope); set for forward compatibility
    /// with a future networked store.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    /// Session/auth signing material. Unused by this crate directly — the
    /// HTTP/session layer is out of scope (spec §1) — but accepted so the
    /// process fails fast on a missing deployment secret.
    #[arg(long, env = "SECRET_KEY", default_value = "dev-secret-change-me")]
    secret_key: String,
    #[arg(long, env = "ONLINE_WINDOW_SECONDS", default_value_t = 25)]
    online_window_seconds: u64,
    #[arg(long, env = "PRESENCE_TOUCH_MIN_INTERVAL_SECONDS", default_value_t = 10)]
    presence_touch_min_interval_seconds: u64,
    /// Arena ticker period; overridable so integration tests do not have to
    /// wait 60 real seconds for a tick.
    #[arg(long, default_value_t = 60)]
    tick_period_secs: u64,
    /// Allow access from all origins.
    #[arg(long)]
    cors: bool,
}

#[derive(Clone, FromRef)]
struct AppState {
    store: Arc<Store>,
    bot_driver: Arc<BotDriver>,
    online_window_ms: u64,
    presence_touch_min_interval_ms: u64,
}

/// The authenticated caller of a request, resolved from a bearer token
/// against the store (spec §1 treats the session/auth layer itself as an
/// external collaborator; this crate only consumes the resulting identity).
struct AuthedPlayer(Player);

impl<S> FromRequestParts<S> for AuthedPlayer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(Error::Forbidden)?;
        let player = app.store.find_player_by_token(token).ok_or(Error::Forbidden)?;
        if player.banned {
            return Err(Error::Banned);
        }
        app.store
            .touch_presence_throttled(player.id, Timestamp::now(), app.presence_touch_min_interval_ms);
        Ok(AuthedPlayer(player))
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("ARENA_LOG", "info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    let opt = Opt::parse();
    if opt.database_url.is_some() {
        info!("DATABASE_URL is set but only the embedded store is implemented; ignoring");
    }
    info!("secret key configured: {}", !opt.secret_key.is_empty());

    let store = Arc::new(Store::new());
    let bot_driver = Arc::new(BotDriver::new(store.clone(), 4));
    let state = AppState {
        store: store.clone(),
        bot_driver: bot_driver.clone(),
        online_window_ms: opt.online_window_seconds * 1000,
        presence_touch_min_interval_ms: opt.presence_touch_min_interval_seconds * 1000,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let ticker_store = store.clone();
    let tick_period = std::time::Duration::from_secs(opt.tick_period_secs);
    let ticker = tokio::spawn(async move {
        arena::run(ticker_store, tick_period, shutdown_rx).await;
    });

    let mut app = Router::new()
        .route("/api/tournaments", get(list_tournaments).post(create_tournament))
        .route("/api/tournaments/{id}/join", post(join_tournament))
        .route("/api/tournaments/{id}/leave", post(leave_tournament))
        .route("/api/tournaments/{id}/leaderboard", get(leaderboard))
        .route("/api/tournaments/{id}/games", get(tournament_games))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{id}/move", post(submit_move))
        .route("/api/games/{id}/resign", post(resign_game))
        .route("/api/games/{id}/claim-time", post(claim_time))
        .route("/api/games/{id}/berserk", post(berserk_game))
        .route("/api/casual/join", post(casual_join))
        .route("/api/casual/play-bot", post(casual_play_bot))
        .route("/api/bots", get(list_bots))
        .route("/api/players/{id}", get(player_profile))
        .route("/api/players/{id}/rating-history", get(rating_history))
        .route("/api/me/rating-history", get(my_rating_history))
        .route("/api/stats", get(stats))
        .route("/api/admin/players/{id}/ban", post(admin_ban))
        .route("/api/admin/players/{id}/unban", post(admin_unban))
        .route("/api/admin/players/{id}/reset-rating", post(admin_reset_rating))
        .route("/api/admin/players/{id}/delete", post(admin_soft_delete))
        .route("/api/admin/bots", post(admin_create_bot))
        .with_state(state);

    if opt.cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = TcpListener::bind(opt.bind).await.expect("bind listener");
    info!("listening on {}", opt.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .nevermind("server loop exited");

    shutdown_tx.send(true).nevermind("shutdown already sent");
    let _ = ticker.await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("install ctrl-c handler");
    };
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("install sigterm handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

fn parse_time_control(spec: &str) -> TimeControl {
    TimeControl::parse(spec)
}

async fn list_tournaments(State(state): State<AppState>) -> Json<Vec<dto::TournamentView>> {
    Json(state.store.list_tournaments().into_iter().map(Into::into).collect())
}

async fn create_tournament(
    State(state): State<AppState>,
    AuthedPlayer(actor): AuthedPlayer,
    Json(req): Json<dto::CreateTournamentRequest>,
) -> Result<Json<dto::TournamentView>, Error> {
    if !actor.is_admin {
        return Err(Error::Forbidden);
    }
    let now = Timestamp::now();
    let id = state.store.next_tournament_id();
    let tournament = Tournament {
        id,
        name: req.name,
        duration_secs: req.duration_secs,
        time_control: parse_time_control(&req.time_control),
        status: TournamentStatus::Waiting,
        started_at: now.plus_ms(req.starts_in_secs * 1000),
        ends_at: now.plus_ms((req.starts_in_secs + req.duration_secs) * 1000),
    };
    state.store.insert_tournament(tournament.clone());
    Ok(Json(tournament.into()))
}

async fn join_tournament(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<dto::JoinResponse>, Error> {
    let _ = state.store.get_tournament(tournament_id)?;
    if let Some(game_id) = player.current_game {
        return Err(Error::AlreadyInGame { game_id });
    }
    let now = Timestamp::now();
    let status = if state.store.get_tournament_player(tournament_id, player.id).is_some() {
        state.store.update_tournament_player(tournament_id, player.id, |tp| {
            tp.active = true;
            tp.enqueue(now);
        });
        "rejoined"
    } else {
        state
            .store
            .insert_tournament_player(TournamentPlayer::new(tournament_id, player.id, now));
        "joined"
    };
    Ok(Json(dto::JoinResponse { ok: true, status }))
}

async fn leave_tournament(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Path(tournament_id): Path<TournamentId>,
) -> Json<dto::OkResponse> {
    state.store.update_tournament_player(tournament_id, player.id, |tp| tp.leave());
    Json(dto::OkResponse { ok: true })
}

async fn leaderboard(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Vec<dto::LeaderboardEntry>>, Error> {
    let _ = state.store.get_tournament(tournament_id)?;
    Ok(Json(dto::leaderboard(&state.store, tournament_id)))
}

async fn tournament_games(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Vec<dto::GameView>>, Error> {
    let _ = state.store.get_tournament(tournament_id)?;
    let now = Timestamp::now();
    let games = state.store.list_games_for_tournament(tournament_id, 50);
    Ok(Json(games.into_iter().map(|g| dto::game_view_live(g, now)).collect()))
}

async fn get_game(State(state): State<AppState>, Path(game_id): Path<GameId>) -> Result<Json<dto::GameView>, Error> {
    let game = state.store.get_game(game_id)?;
    schedule_if_bot_to_move(&state, &game);
    Ok(Json(dto::game_view_live(game, Timestamp::now())))
}

fn schedule_if_bot_to_move(state: &AppState, game: &Game) {
    if !game.result.is_ongoing() {
        return;
    }
    let Ok(board) = rules::from_fen(&game.fen) else { return };
    let mover = game.player_of(rules::turn(&board));
    if state.store.get_player(mover).map(|p| p.is_bot).unwrap_or(false) {
        state.bot_driver.maybe_schedule(game.id);
    }
}

async fn submit_move(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Path(game_id): Path<GameId>,
    Json(req): Json<dto::MoveRequest>,
) -> Result<Json<dto::GameView>, Error> {
    if req.uci.is_empty() {
        return Err(Error::InvalidMoveFormat);
    }
    let now = Timestamp::now();
    let game = arena_tourney::game::apply_move(&state.store, game_id, player.id, &req.uci, now)?;
    schedule_if_bot_to_move(&state, &game);
    Ok(Json(dto::game_view_live(game, now)))
}

async fn resign_game(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Path(game_id): Path<GameId>,
) -> Result<Json<serde_json::Value>, Error> {
    let now = Timestamp::now();
    let game = arena_tourney::game::resign(&state.store, game_id, player.id, now)?;
    Ok(Json(serde_json::json!({ "ok": true, "result": game.result })))
}

async fn claim_time(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Path(game_id): Path<GameId>,
) -> Result<Json<dto::ClaimTimeResponse>, Error> {
    let now = Timestamp::now();
    let outcome = arena_tourney::game::claim_time(&state.store, game_id, player.id, now)?;
    Ok(Json(if outcome.ok {
        dto::ClaimTimeResponse { ok: true, result: Some(outcome.game.result), message: None }
    } else {
        dto::ClaimTimeResponse {
            ok: false,
            result: None,
            message: Some("opponent's flag has not fallen".to_owned()),
        }
    }))
}

async fn berserk_game(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Path(game_id): Path<GameId>,
) -> Result<Json<dto::OkResponse>, Error> {
    arena_tourney::game::berserk(&state.store, game_id, player.id)?;
    Ok(Json(dto::OkResponse { ok: true }))
}

async fn casual_join(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Json(req): Json<dto::CasualJoinRequest>,
) -> Result<Json<dto::CasualJoinResponse>, Error> {
    let tc = parse_time_control(&req.time_control);
    let now = Timestamp::now();
    let outcome = casual::join(&state.store, player.id, tc, now, state.online_window_ms)?;
    Ok(Json(match outcome {
        casual::JoinOutcome::Queued => dto::CasualJoinResponse::Queued { queued: true },
        casual::JoinOutcome::Matched { game_id } => {
            if let Ok(game) = state.store.get_game(game_id) {
                schedule_if_bot_to_move(&state, &game);
            }
            dto::CasualJoinResponse::Matched { matched: true, game_id }
        }
    }))
}

async fn casual_play_bot(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
    Json(req): Json<dto::CasualPlayBotRequest>,
) -> Result<Json<dto::CasualPlayBotResponse>, Error> {
    let tc = parse_time_control(&req.time_control);
    let now = Timestamp::now();
    let game_id = casual::play_bot(&state.store, player.id, req.bot_id, tc, now)?;
    if let Ok(game) = state.store.get_game(game_id) {
        schedule_if_bot_to_move(&state, &game);
    }
    Ok(Json(dto::CasualPlayBotResponse { ok: true, game_id }))
}

async fn list_bots(State(state): State<AppState>) -> Json<Vec<dto::BotRosterEntry>> {
    Json(dto::bot_roster(&state.store))
}

async fn player_profile(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<dto::PlayerProfile>, Error> {
    let player = state.store.get_player(player_id)?;
    Ok(Json(dto::player_profile(&state.store, player)))
}

async fn rating_history(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Json<Vec<dto::RatingHistoryEntry>> {
    Json(
        state
            .store
            .list_rating_history(player_id)
            .into_iter()
            .map(|r| dto::RatingHistoryEntry { tournament: r.tournament, rating: r.rating, rd: r.rd, recorded_at: r.recorded_at })
            .collect(),
    )
}

async fn my_rating_history(
    State(state): State<AppState>,
    AuthedPlayer(player): AuthedPlayer,
) -> Json<Vec<dto::RatingHistoryEntry>> {
    Json(
        state
            .store
            .list_rating_history(player.id)
            .into_iter()
            .map(|r| dto::RatingHistoryEntry { tournament: r.tournament, rating: r.rating, rd: r.rd, recorded_at: r.recorded_at })
            .collect(),
    )
}

async fn stats(State(state): State<AppState>) -> Json<dto::StatsResponse> {
    let now = Timestamp::now();
    Json(dto::StatsResponse {
        total_games_played: state.store.metrics().games_finished_count(),
        players_online: state.store.players_online(now, state.online_window_ms),
    })
}

async fn admin_ban(
    State(state): State<AppState>,
    AuthedPlayer(actor): AuthedPlayer,
    Path(target): Path<PlayerId>,
) -> Result<Json<dto::OkResponse>, Error> {
    admin::ban(&state.store, actor.id, target)?;
    Ok(Json(dto::OkResponse { ok: true }))
}

async fn admin_unban(
    State(state): State<AppState>,
    AuthedPlayer(actor): AuthedPlayer,
    Path(target): Path<PlayerId>,
) -> Result<Json<dto::OkResponse>, Error> {
    admin::unban(&state.store, actor.id, target)?;
    Ok(Json(dto::OkResponse { ok: true }))
}

async fn admin_reset_rating(
    State(state): State<AppState>,
    AuthedPlayer(actor): AuthedPlayer,
    Path(target): Path<PlayerId>,
) -> Result<Json<dto::OkResponse>, Error> {
    admin::reset_rating(&state.store, actor.id, target)?;
    Ok(Json(dto::OkResponse { ok: true }))
}

async fn admin_soft_delete(
    State(state): State<AppState>,
    AuthedPlayer(actor): AuthedPlayer,
    Path(target): Path<PlayerId>,
) -> Result<Json<dto::OkResponse>, Error> {
    admin::soft_delete(&state.store, actor.id, target, Timestamp::now())?;
    Ok(Json(dto::OkResponse { ok: true }))
}

async fn admin_create_bot(
    State(state): State<AppState>,
    AuthedPlayer(actor): AuthedPlayer,
    Json(req): Json<dto::CreateBotRequest>,
) -> Result<Json<Player>, Error> {
    let bot = admin::create_bot(&state.store, actor.id, req.username, &req.engine_key)?;
    Ok(Json(bot))
}
