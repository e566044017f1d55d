// Replay engine tests
//
// Tests the core functionality of the replay engine including:
// - Loading JSONL move logs
// - Re-applying logged moves
// - Re-running the AI at the logged depth
// - Generating statistics

use chain_reaction::config::Config;
use chain_reaction::debug_logger::{DebugLogger, MoveLogEntry};
use chain_reaction::engine::GameState;
use chain_reaction::error::ReplayError;
use chain_reaction::replay::ReplayEngine;
use chain_reaction::search::SearchEngine;
use chain_reaction::types::{Color, PlayerKind, Position};
use std::path::PathBuf;

/// Helper function to get the path to test fixtures
fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(filename)
}

#[test]
fn test_load_fixture() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    let entries = engine
        .load_log_file(fixture_path("human_vs_easy_ai.jsonl"))
        .expect("Failed to load human_vs_easy_ai.jsonl");

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].turn, 1);
    assert_eq!(entries[0].color, Color::Red);
    assert_eq!(entries[1].controller, PlayerKind::Ai);
    assert_eq!(entries[1].depth, Some(1));
    assert_eq!(entries[2].controller, PlayerKind::Human);
}

#[test]
fn test_replay_fixture_matches() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), true);
    let entries = engine
        .load_log_file(fixture_path("human_vs_easy_ai.jsonl"))
        .unwrap();
    let results = engine.replay_all(&entries);

    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(result.matches(), "turn {} differs: {:?}", result.turn, result);
    }

    let ai_turn = &results[1];
    assert_eq!(ai_turn.replayed_move, Some(Position::new(0, 5)));
    assert_eq!(ai_turn.search_depth, Some(1));

    let stats = engine.generate_stats(&results);
    assert_eq!(stats.total_turns, 3);
    assert_eq!(stats.ai_turns, 1);
    assert_eq!(stats.move_mismatches, 0);
    assert_eq!(stats.board_mismatches, 0);
}

#[test]
fn test_replay_specific_turns() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    let entries = engine
        .load_log_file(fixture_path("human_vs_easy_ai.jsonl"))
        .unwrap();

    let results = engine.replay_turns(&entries, &[3]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].turn, 3);
    assert!(results[0].board_matches);

    assert!(matches!(
        engine.replay_turns(&entries, &[9]),
        Err(ReplayError::MissingTurn(9))
    ));
}

#[test]
fn test_missing_file_is_an_error() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    assert!(matches!(
        engine.load_log_file(fixture_path("does_not_exist.jsonl")),
        Err(ReplayError::Io { .. })
    ));
}

#[test]
fn test_changed_ai_choice_is_a_mismatch() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    let mut entries = engine
        .load_log_file(fixture_path("human_vs_easy_ai.jsonl"))
        .unwrap();

    // Pretend the AI had picked another corner; the board no longer lines up either
    entries[1].row = 4;
    entries[1].col = 0;

    let result = engine.replay_entry(&entries, 1).unwrap();
    assert!(!result.move_matches());
    assert!(!result.board_matches);
}

#[tokio::test]
async fn test_logged_self_play_replays_cleanly() {
    let path = std::env::temp_dir().join(format!(
        "chain_reaction_selfplay_{}.jsonl",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let path_str = path.to_string_lossy().to_string();

    let config = Config::default_hardcoded();
    let logger = DebugLogger::new(true, &path_str).await;
    assert!(logger.is_enabled());

    let mut game = GameState::with_rules(5, 6, &config.rules).unwrap();
    while !game.is_over() && game.turn() < 20 {
        let engine = SearchEngine::from_config(game.current_color(), 2, &config.ai, &config.scores);
        let (result, outcome) = engine.make_move(&mut game).unwrap();
        logger
            .log_move_now(MoveLogEntry::new(
                &outcome,
                PlayerKind::Ai,
                Some(result.depth),
                game.board(),
            ))
            .await;
    }

    let engine = ReplayEngine::new(config, false);
    let entries = engine.load_log_file(&path).unwrap();
    assert_eq!(entries.len() as u32, game.turn());

    let results = engine.replay_all(&entries);
    assert_eq!(results.len(), entries.len());
    assert!(results.iter().all(|r| r.matches()));

    let _ = std::fs::remove_file(&path);
}
