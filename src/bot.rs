// Asynchronous AI driver
//
// The search is CPU bound, so it runs on tokio's blocking pool while the
// async side polls for the result with a fixed time budget. When the budget
// runs out the search is told to stop and the caller gets `NoResponse`.

use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::engine::GameState;
use crate::error::EngineError;
use crate::search::{SearchEngine, SearchResult};
use crate::types::Difficulty;

/// Outcome of asking the AI for a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReply {
    Move(SearchResult),
    /// The search did not finish inside the response budget
    NoResponse,
    Failed(EngineError),
}

/// State shared between the polling task and the blocking search
#[derive(Debug, Default)]
struct SharedSearchState {
    result: Mutex<Option<Result<SearchResult, EngineError>>>,
    search_complete: AtomicBool,
    cancel: AtomicBool,
}

/// Chain Reaction AI player
/// Holds the static configuration and turns search requests into replies
pub struct Bot {
    config: Config,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    pub fn new(config: Config) -> Self {
        Bot { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Search engine for the side to move in `state` at the given difficulty
    pub fn engine_for(&self, state: &GameState, difficulty: Difficulty) -> SearchEngine {
        SearchEngine::from_config(
            state.current_color(),
            self.config.ai.depth_for(difficulty),
            &self.config.ai,
            &self.config.scores,
        )
    }

    /// Computes a move for the side to move without touching `state`
    ///
    /// 1. Spawns the search on the blocking thread pool
    /// 2. Polls until it completes or the response budget is spent
    /// 3. On timeout, cancels the search and reports `NoResponse`
    pub async fn get_move(&self, state: &GameState, difficulty: Difficulty) -> BotReply {
        let start_time = Instant::now();
        let engine = self.engine_for(state, difficulty);

        info!(
            "Turn {}: {} computing move (depth {})",
            state.turn() + 1,
            engine.color(),
            engine.depth()
        );

        let shared = Arc::new(SharedSearchState::default());
        let shared_clone = shared.clone();
        let state = state.clone();

        tokio::task::spawn_blocking(move || {
            let result = engine.search_with_cancel(&state, &shared_clone.cancel);
            *shared_clone.result.lock() = Some(result);
            shared_clone.search_complete.store(true, Ordering::Release);
        });

        let budget = self.config.timing.response_time_budget_ms;
        let polling_interval = Duration::from_millis(self.config.timing.polling_interval_ms);

        loop {
            if shared.search_complete.load(Ordering::Acquire) {
                break;
            }

            let elapsed = start_time.elapsed().as_millis() as u64;
            if elapsed >= budget {
                shared.cancel.store(true, Ordering::Release);
                warn!("AI gave no response within {}ms", budget);
                return BotReply::NoResponse;
            }

            tokio::time::sleep(polling_interval).await;
        }

        let result = shared.result.lock().take();
        match result {
            Some(Ok(result)) => {
                info!(
                    "Chose {} (score: {}, depth: {}, nodes: {}, time: {}ms)",
                    result.best_move,
                    result.score,
                    result.depth,
                    result.nodes,
                    start_time.elapsed().as_millis()
                );
                BotReply::Move(result)
            }
            Some(Err(e)) => {
                warn!("AI search failed: {}", e);
                BotReply::Failed(e)
            }
            // The blocking task panicked before storing a result
            None => BotReply::Failed(EngineError::SearchCancelled),
        }
    }
}
