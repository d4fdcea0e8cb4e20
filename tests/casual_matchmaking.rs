//! End-to-end coverage of the casual one-off matchmaker (spec §4.8): queue
//! join/match, immediate bot play, and that a casual game still flows
//! through the same scoring and finalization pipeline as an arena game.

use arena_tourney::{
    admin, casual,
    model::{Player, TimeControl, Timestamp},
    store::Store,
};

fn new_player(store: &Store, name: &str) -> arena_tourney::model::PlayerId {
    let id = store.next_player_id();
    store.insert_player(Player::new(id, name.into(), format!("tok-{name}")));
    id
}

#[test]
fn two_queued_players_are_matched_and_settle_through_resignation() {
    let store = Store::new();
    let tc = TimeControl::parse("3+2");
    let alice = new_player(&store, "alice");
    let bob = new_player(&store, "bob");
    store.touch_presence(alice, Timestamp(0));
    store.touch_presence(bob, Timestamp(0));

    let first = casual::join(&store, alice, tc, Timestamp(0), 25_000).unwrap();
    assert!(matches!(first, casual::JoinOutcome::Queued));

    let second = casual::join(&store, bob, tc, Timestamp(500), 25_000).unwrap();
    let game_id = match second {
        casual::JoinOutcome::Matched { game_id } => game_id,
        _ => panic!("expected an immediate match"),
    };

    // Both players are now considered in-game and cannot queue again.
    assert!(store.get_player(alice).unwrap().current_game.is_some());
    let rejoin = casual::join(&store, alice, tc, Timestamp(600), 25_000);
    assert!(matches!(rejoin, Err(arena_tourney::api::Error::AlreadyInGame { game_id: g }) if g == game_id));

    let game = store.get_game(game_id).unwrap();
    let winner = arena_tourney::game::resign(&store, game_id, game.black, Timestamp(1_000)).unwrap();
    assert_eq!(winner.result, arena_tourney::model::GameResult::White);

    // The casual "tournament" auto-finalizes as soon as its one game ends.
    let tournament = store.get_tournament(game.tournament).unwrap();
    assert_eq!(tournament.status, arena_tourney::model::TournamentStatus::Finished);
    assert_eq!(store.list_rating_history(game.white).len(), 1);

    // current_game is cleared on both sides once the game is over.
    assert!(store.get_player(alice).unwrap().current_game.is_none());
    assert!(store.get_player(bob).unwrap().current_game.is_none());
}

#[test]
fn playing_a_bot_is_immediate_and_reachable_through_the_roster() {
    let store = Store::new();
    let admin_id = new_player(&store, "root");
    store.update_player(admin_id, |p| p.is_admin = true).unwrap();

    let bot = admin::create_bot(&store, admin_id, "minimax-bot".into(), arena_tourney::bots::MINIMAX).unwrap();
    let human = new_player(&store, "human");

    let game_id = casual::play_bot(&store, human, bot.id, TimeControl::parse("3+0"), Timestamp(0)).unwrap();
    let game = store.get_game(game_id).unwrap();
    assert!(game.result.is_ongoing());
    assert!(game.white == human || game.black == human);
}
