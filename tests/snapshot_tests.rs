//! Snapshot format and file relay
//!
//! Board captures survive a text round trip, bulk loads are all-or-nothing,
//! and two relays sharing a file can hand a game back and forth.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::time::Duration;

use chain_reaction::board::Board;
use chain_reaction::config::RulesConfig;
use chain_reaction::engine::GameState;
use chain_reaction::error::SnapshotError;
use chain_reaction::eval::Evaluator;
use chain_reaction::relay::{RelayOutcome, SnapshotRelay};
use chain_reaction::search::SearchEngine;
use chain_reaction::snapshot::{Mover, Snapshot};
use chain_reaction::types::{Color, MAX_CELL_ORBS};

fn played_game(rows: usize, cols: usize, seed: u64, turns: u32) -> GameState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = GameState::new(rows, cols).unwrap();
    while game.turn() < turns && !game.is_over() {
        let moves = game.legal_moves();
        let &pos = moves.choose(&mut rng).unwrap();
        game.apply_move(pos.row, pos.col).unwrap();
    }
    game
}

fn temp_relay(name: &str, timeout_ms: u64) -> SnapshotRelay {
    let path = std::env::temp_dir().join(format!(
        "chain_reaction_it_{}_{}.txt",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    SnapshotRelay::new(path, Duration::from_millis(5), Duration::from_millis(timeout_ms))
}

#[test]
fn test_played_boards_survive_text_round_trip() {
    for (seed, (rows, cols)) in [(1, (5, 6)), (2, (6, 6)), (3, (9, 6))].into_iter() {
        let game = played_game(rows, cols, seed, 24);
        let text = Snapshot::capture(game.board(), Mover::Ai).render();
        let parsed: Snapshot = text.parse().unwrap();

        assert_eq!(parsed.mover, Mover::Ai);
        assert_eq!((parsed.rows(), parsed.cols()), (rows, cols));
        assert_eq!(&Board::from_snapshot(&parsed).unwrap(), game.board());
        assert_eq!(parsed.render(), text);
    }
}

#[test]
fn test_failed_load_leaves_game_untouched() {
    let mut game = played_game(5, 6, 9, 10);
    let before = game.clone();

    let wrong_size = Snapshot::parse("HUMAN MOVE:\n1R 0\n0 1B\n").unwrap();
    assert!(matches!(
        game.load_snapshot(&wrong_size),
        Err(SnapshotError::DimensionMismatch { rows: 5, cols: 6, .. })
    ));
    assert_eq!(game, before);
}

#[test]
fn test_oversized_orb_counts_are_rejected() {
    assert!(matches!(
        Snapshot::parse("HUMAN MOVE:\n4294967295R 0 0\n0 0 1B\n"),
        Err(SnapshotError::BadToken { line: 2, .. })
    ));
    assert!(matches!(
        Snapshot::parse("HUMAN MOVE:\n129R 0 0\n0 0 1B\n"),
        Err(SnapshotError::BadToken { line: 2, .. })
    ));

    let mut board = Board::new(2, 3).unwrap();
    let before = board.clone();
    assert!(matches!(
        board.force_set_cell(0, 0, Some(Color::Red), u32::MAX),
        Err(SnapshotError::InconsistentCell { .. })
    ));
    assert_eq!(board, before);
}

#[test]
fn test_fullest_loadable_cell_still_plays() {
    let text = format!("HUMAN MOVE:\n{}R 0 0\n0 0 1B\n", MAX_CELL_ORBS);
    let mut game = GameState::new(2, 3).unwrap();
    game.load_snapshot(&text.parse().unwrap()).unwrap();

    let score = Evaluator::default().evaluate(game.board(), Color::Red);
    assert!(score <= Evaluator::default().heuristic_limit());

    // The overloaded corner explodes once and loses its excess orbs
    let outcome = game.apply_move(0, 0).unwrap();
    assert_eq!(outcome.explosions, 1);
    assert!(game.board().cell(0, 0).unwrap().is_empty());
    assert_eq!(game.board().score(Color::Red), 2);
    assert_eq!(game.board().score(Color::Blue), 1);
}

#[test]
fn test_loaded_board_decides_the_game() {
    // Only Red orbs left after the threshold: Red has won
    let mut game = played_game(5, 6, 4, 6);
    assert!(game.turn() > 4);

    let mut board = Board::new(5, 6).unwrap();
    board.force_set_cell(2, 2, Some(Color::Red), 3).unwrap();
    let text = Snapshot::capture(&board, Mover::Human).render();

    game.load_snapshot(&text.parse().unwrap()).unwrap();
    assert_eq!(game.winner(), Some(Color::Red));
    assert!(game.legal_moves().is_empty());
}

#[test]
fn test_resumed_game_plays_on() {
    let game = played_game(5, 6, 12, 8);
    let snapshot = Snapshot::capture(game.board(), Mover::Human);
    let board = Board::from_snapshot(&snapshot).unwrap();
    let resumed = GameState::resume(board, game.current_color(), game.turn(), &RulesConfig::default());

    let color = game.current_color();
    let original = SearchEngine::new(color, 2).search(&game).unwrap();
    let restored = SearchEngine::new(color, 2).search(&resumed).unwrap();
    assert_eq!(original.best_move, restored.best_move);
    assert_eq!(original.score, restored.score);
}

#[tokio::test]
async fn test_relay_reports_no_response() {
    let relay = temp_relay("silent", 30);
    let human = Snapshot::capture(&Board::new(5, 6).unwrap(), Mover::Human);

    let outcome = relay.exchange(&human, Mover::Ai).await.unwrap();
    assert_eq!(outcome, RelayOutcome::NoResponse);

    // Our own move is still on file
    assert_eq!(relay.read().await.unwrap(), Some(human));
    let _ = std::fs::remove_file(relay.path());
}

#[tokio::test]
async fn test_relay_round_trip_with_ai_side() {
    let human_side = temp_relay("roundtrip", 2_000);
    let ai_side = SnapshotRelay::new(
        human_side.path().to_path_buf(),
        Duration::from_millis(5),
        Duration::from_millis(2_000),
    );

    let mut game = GameState::new(5, 6).unwrap();
    game.apply_move(0, 0).unwrap();
    let human = Snapshot::capture(game.board(), Mover::Human);

    let responder = tokio::spawn(async move {
        let RelayOutcome::Received(snapshot) = ai_side.wait_for(Mover::Human).await.unwrap() else {
            panic!("AI side timed out");
        };
        let board = Board::from_snapshot(&snapshot).unwrap();
        let mut state = GameState::resume(board, Color::Blue, 1, &RulesConfig::default());
        SearchEngine::new(Color::Blue, 1).make_move(&mut state).unwrap();
        ai_side
            .publish(&Snapshot::capture(state.board(), Mover::Ai))
            .await
            .unwrap();
    });

    let outcome = human_side.exchange(&human, Mover::Ai).await.unwrap();
    responder.await.unwrap();

    let RelayOutcome::Received(reply) = outcome else {
        panic!("no AI reply");
    };
    let board = Board::from_snapshot(&reply).unwrap();
    assert_eq!(board.score(Color::Red), 1);
    assert_eq!(board.score(Color::Blue), 1);
    let _ = std::fs::remove_file(human_side.path());
}
