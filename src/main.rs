#[macro_use]
extern crate rocket;

use log::{error, info};
use std::env;
use std::process;

use chain_reaction::config::Config;
use chain_reaction::debug_logger::DebugLogger;
use chain_reaction::handler;

#[launch]
async fn rocket() -> _ {
    // Rocket reads `ROCKET_PORT`; hosting services usually hand out `PORT`.
    if let Ok(port) = env::var("PORT") {
        env::set_var("ROCKET_PORT", &port);
    }

    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Chain Reaction server...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;

    match handler::build_rocket(config, logger) {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Cannot start server: {}", e);
            process::exit(1);
        }
    }
}
