// Library exports for the Chain Reaction engine
// The HTTP server, the self-play and relay tools and the replay tool all build on these

pub mod board;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod engine;
pub mod error;
pub mod eval;
pub mod handler;
pub mod relay;
pub mod replay;
pub mod search;
pub mod session;
pub mod simple_profiler;
pub mod snapshot;
pub mod types;
