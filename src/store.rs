//! A transactional key-value façade standing in for the persistent store
//! (spec §1 explicitly treats persistence as out of scope). Modeled the way
//! the teacher's RocksDB `Database`/`QueryableDatabase` split one physical
//! handle into typed, per-entity accessors — except here each "column
//! family" is an in-process `RwLock`-guarded map, and the default
//! `DATABASE_URL` is this local embedded store (spec §6).
//!
//! Mutations to a single `Game` are serialized through that game's own
//! `Mutex`, not the outer map lock (spec §5's per-game write lock) — the
//! bot driver relies on exactly this to implement its optimistic FEN-race
//! check.

use std::sync::{Arc, Mutex, RwLock};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    api::Error,
    metrics::Metrics,
    model::{
        BotConfig, CasualQueueEntry, Game, GameId, IdSequence, PairingHistory, Player, PlayerId,
        Presence, RatingHistory, Timestamp, Tournament, TournamentId, TournamentPlayer,
        TournamentStatus,
    },
};

#[derive(Default)]
pub struct Store {
    player_ids: IdSequence,
    tournament_ids: IdSequence,
    game_ids: IdSequence,

    players: RwLock<FxHashMap<PlayerId, Player>>,
    tournaments: RwLock<FxHashMap<TournamentId, Tournament>>,
    tournament_players: RwLock<FxHashMap<(TournamentId, PlayerId), TournamentPlayer>>,
    games: RwLock<FxHashMap<GameId, Arc<Mutex<Game>>>>,
    pairing_history: RwLock<Vec<PairingHistory>>,
    rating_history: RwLock<Vec<RatingHistory>>,
    presence: RwLock<FxHashMap<PlayerId, Presence>>,
    casual_queue: RwLock<FxHashMap<PlayerId, CasualQueueEntry>>,
    bot_configs: RwLock<FxHashMap<PlayerId, BotConfig>>,
    scored_games: RwLock<FxHashSet<GameId>>,
    metrics: Metrics,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // -- players ---------------------------------------------------------

    pub fn next_player_id(&self) -> PlayerId {
        PlayerId(self.player_ids.next())
    }

    pub fn insert_player(&self, player: Player) {
        self.players.write().expect("players lock").insert(player.id, player);
    }

    pub fn get_player(&self, id: PlayerId) -> Result<Player, Error> {
        self.players
            .read()
            .expect("players lock")
            .get(&id)
            .cloned()
            .ok_or(Error::PlayerNotFound(id))
    }

    pub fn find_player_by_token(&self, token: &str) -> Option<Player> {
        self.players
            .read()
            .expect("players lock")
            .values()
            .find(|p| p.auth_token == token)
            .cloned()
    }

    pub fn update_player<F>(&self, id: PlayerId, f: F) -> Result<Player, Error>
    where
        F: FnOnce(&mut Player),
    {
        let mut players = self.players.write().expect("players lock");
        let player = players.get_mut(&id).ok_or(Error::PlayerNotFound(id))?;
        f(player);
        Ok(player.clone())
    }

    pub fn players_online(&self, now: Timestamp, window_ms: u64) -> usize {
        let presence = self.presence.read().expect("presence lock");
        presence.values().filter(|p| p.is_online(now, window_ms)).count()
    }

    // -- presence ---------------------------------------------------------

    pub fn touch_presence(&self, player: PlayerId, now: Timestamp) {
        self.presence
            .write()
            .expect("presence lock")
            .insert(player, Presence { player, last_seen_at: now });
    }

    /// As [`Store::touch_presence`], but skips the write if `player` was
    /// already touched within `min_interval_ms` (spec §6's
    /// `PRESENCE_TOUCH_MIN_INTERVAL_SECONDS`) — every authenticated request
    /// would otherwise take a presence write lock.
    pub fn touch_presence_throttled(&self, player: PlayerId, now: Timestamp, min_interval_ms: u64) {
        let fresh_enough = self
            .presence
            .read()
            .expect("presence lock")
            .get(&player)
            .is_some_and(|p| p.last_seen_at.elapsed_ms_until(now) < min_interval_ms);
        if !fresh_enough {
            self.touch_presence(player, now);
        }
    }

    pub fn is_online(&self, player: PlayerId, now: Timestamp, window_ms: u64) -> bool {
        self.presence
            .read()
            .expect("presence lock")
            .get(&player)
            .is_some_and(|p| p.is_online(now, window_ms))
    }

    // -- bot configs --------------------------------------------------------

    pub fn insert_bot_config(&self, config: BotConfig) {
        self.bot_configs
            .write()
            .expect("bot configs lock")
            .insert(config.player, config);
    }

    pub fn get_bot_config(&self, player: PlayerId) -> Result<BotConfig, Error> {
        self.bot_configs
            .read()
            .expect("bot configs lock")
            .get(&player)
            .cloned()
            .ok_or(Error::BotNotFound(player))
    }

    pub fn list_bots(&self) -> Vec<(Player, BotConfig)> {
        let players = self.players.read().expect("players lock");
        let bots = self.bot_configs.read().expect("bot configs lock");
        bots.values()
            .filter_map(|cfg| players.get(&cfg.player).map(|p| (p.clone(), cfg.clone())))
            .collect()
    }

    // -- tournaments -------------------------------------------------------

    pub fn next_tournament_id(&self) -> TournamentId {
        TournamentId(self.tournament_ids.next())
    }

    pub fn insert_tournament(&self, tournament: Tournament) {
        self.tournaments
            .write()
            .expect("tournaments lock")
            .insert(tournament.id, tournament);
    }

    pub fn get_tournament(&self, id: TournamentId) -> Result<Tournament, Error> {
        self.tournaments
            .read()
            .expect("tournaments lock")
            .get(&id)
            .cloned()
            .ok_or(Error::TournamentNotFound(id))
    }

    pub fn update_tournament<F>(&self, id: TournamentId, f: F) -> Result<Tournament, Error>
    where
        F: FnOnce(&mut Tournament),
    {
        let mut tournaments = self.tournaments.write().expect("tournaments lock");
        let tournament = tournaments.get_mut(&id).ok_or(Error::TournamentNotFound(id))?;
        f(tournament);
        Ok(tournament.clone())
    }

    pub fn list_tournaments(&self) -> Vec<Tournament> {
        self.tournaments.read().expect("tournaments lock").values().cloned().collect()
    }

    pub fn list_tournaments_with_status(&self, status: TournamentStatus) -> Vec<Tournament> {
        self.tournaments
            .read()
            .expect("tournaments lock")
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    // -- tournament players -------------------------------------------------

    pub fn insert_tournament_player(&self, tp: TournamentPlayer) {
        self.tournament_players
            .write()
            .expect("tournament players lock")
            .insert((tp.tournament, tp.player), tp);
    }

    pub fn get_tournament_player(
        &self,
        tournament: TournamentId,
        player: PlayerId,
    ) -> Option<TournamentPlayer> {
        self.tournament_players
            .read()
            .expect("tournament players lock")
            .get(&(tournament, player))
            .cloned()
    }

    pub fn update_tournament_player<F>(
        &self,
        tournament: TournamentId,
        player: PlayerId,
        f: F,
    ) -> Option<TournamentPlayer>
    where
        F: FnOnce(&mut TournamentPlayer),
    {
        let mut rows = self.tournament_players.write().expect("tournament players lock");
        let row = rows.get_mut(&(tournament, player))?;
        f(row);
        Some(row.clone())
    }

    pub fn list_tournament_players(&self, tournament: TournamentId) -> Vec<TournamentPlayer> {
        self.tournament_players
            .read()
            .expect("tournament players lock")
            .values()
            .filter(|tp| tp.tournament == tournament)
            .cloned()
            .collect()
    }

    // -- games ---------------------------------------------------------------

    pub fn next_game_id(&self) -> GameId {
        GameId(self.game_ids.next())
    }

    pub fn insert_game(&self, game: Game) -> Arc<Mutex<Game>> {
        let handle = Arc::new(Mutex::new(game.clone()));
        self.games.write().expect("games lock").insert(game.id, handle.clone());
        handle
    }

    pub fn get_game_handle(&self, id: GameId) -> Result<Arc<Mutex<Game>>, Error> {
        self.games
            .read()
            .expect("games lock")
            .get(&id)
            .cloned()
            .ok_or(Error::GameNotFound(id))
    }

    pub fn get_game(&self, id: GameId) -> Result<Game, Error> {
        let handle = self.get_game_handle(id)?;
        let game = handle.lock().expect("game lock").clone();
        Ok(game)
    }

    pub fn list_games_for_tournament(&self, tournament: TournamentId, limit: usize) -> Vec<Game> {
        let games = self.games.read().expect("games lock");
        let mut matching: Vec<Game> = games
            .values()
            .map(|g| g.lock().expect("game lock").clone())
            .filter(|g| g.tournament == tournament)
            .collect();
        matching.sort_by_key(|g| std::cmp::Reverse(g.started_at));
        matching.truncate(limit);
        matching
    }

    pub fn all_ongoing_game_handles(&self) -> Vec<Arc<Mutex<Game>>> {
        self.games
            .read()
            .expect("games lock")
            .values()
            .filter(|g| g.lock().expect("game lock").result.is_ongoing())
            .cloned()
            .collect()
    }

    /// Marks `game` as having had its result applied; returns `false` if it
    /// was already marked, so callers can skip re-scoring (spec §8's
    /// `submit_result` idempotence law).
    pub fn mark_scored(&self, game: GameId) -> bool {
        self.scored_games.write().expect("scored games lock").insert(game)
    }

    // -- pairing history -------------------------------------------------------

    pub fn record_pairing(&self, pairing: PairingHistory) {
        self.pairing_history.write().expect("pairing history lock").push(pairing);
    }

    /// All players paired with `player` in `tournament` within the last
    /// `window_ms` as of `now` (spec §4.7 step 2).
    pub fn recent_opponents(
        &self,
        tournament: TournamentId,
        player: PlayerId,
        now: Timestamp,
        window_ms: u64,
    ) -> Vec<PlayerId> {
        self.pairing_history
            .read()
            .expect("pairing history lock")
            .iter()
            .filter(|p| p.tournament == tournament && p.paired_at.elapsed_ms_until(now) <= window_ms)
            .filter_map(|p| p.involves(player))
            .collect()
    }

    // -- rating history -------------------------------------------------------

    pub fn record_rating_history(&self, entry: RatingHistory) {
        self.rating_history.write().expect("rating history lock").push(entry);
    }

    pub fn list_rating_history(&self, player: PlayerId) -> Vec<RatingHistory> {
        let mut rows: Vec<RatingHistory> = self
            .rating_history
            .read()
            .expect("rating history lock")
            .iter()
            .filter(|r| r.player == player)
            .cloned()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.recorded_at));
        rows
    }

    // -- casual queue -------------------------------------------------------

    pub fn upsert_casual_queue(&self, entry: CasualQueueEntry) {
        self.casual_queue.write().expect("casual queue lock").insert(entry.player, entry);
    }

    pub fn remove_casual_queue(&self, player: PlayerId) -> Option<CasualQueueEntry> {
        self.casual_queue.write().expect("casual queue lock").remove(&player)
    }

    pub fn sweep_stale_casual_queue(&self, now: Timestamp) {
        self.casual_queue
            .write()
            .expect("casual queue lock")
            .retain(|_, entry| !entry.is_stale(now));
    }

    /// The oldest other queued player with a matching time control, gated on
    /// presence (spec §4.8).
    pub fn find_casual_match(
        &self,
        exclude: PlayerId,
        time_control: crate::model::TimeControl,
        now: Timestamp,
        online_window_ms: u64,
    ) -> Option<CasualQueueEntry> {
        let queue = self.casual_queue.read().expect("casual queue lock");
        queue
            .values()
            .filter(|entry| entry.player != exclude && entry.time_control == time_control)
            .filter(|entry| self.is_online(entry.player, now, online_window_ms))
            .min_by_key(|entry| entry.joined_at)
            .copied()
    }
}
