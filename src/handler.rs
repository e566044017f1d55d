// HTTP handler bindings for the game API
//
// Thin wrappers that bind Rocket routes to the game service. Handlers are
// responsible for:
// - Deserializing incoming JSON requests
// - Extracting the service from Rocket's managed state
// - Delegating to the session and the AI driver
// - Mapping failures to status codes

use log::{error, info};
use parking_lot::Mutex;
use rocket::fairing::AdHoc;
use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::{get, post, put, routes, Build, Request, Rocket, State};
use serde_json::{json, Value};

use crate::bot::{Bot, BotReply};
use crate::config::Config;
use crate::debug_logger::{DebugLogger, MoveLogEntry};
use crate::error::{EngineError, SessionError};
use crate::session::GameSession;
use crate::snapshot::{Mover, Snapshot};
use crate::types::{BoardPreset, Difficulty, GameView, MoveRequest, MoveResponse, NewGameRequest, PlayerKind, Position};

/// Error body returned to clients as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub message: String,
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match &e {
            SessionError::Engine(EngineError::IllegalMove { .. }) => Status::UnprocessableEntity,
            SessionError::Engine(EngineError::InvalidDimensions { .. })
            | SessionError::Snapshot(_) => Status::BadRequest,
            SessionError::NoResponse(_) => Status::GatewayTimeout,
            other if other.is_client_error() => Status::Conflict,
            _ => Status::InternalServerError,
        };
        if status == Status::InternalServerError {
            error!("Request failed: {}", e);
        }
        ApiError {
            status,
            message: e.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let body = Json(json!({ "error": self.message }));
        Response::build_from(body.respond_to(request)?)
            .status(self.status)
            .ok()
    }
}

/// Everything the routes share: the AI, the one live session and the move log
pub struct GameService {
    bot: Bot,
    session: Mutex<GameSession>,
    logger: DebugLogger,
}

impl GameService {
    pub fn new(config: Config, logger: DebugLogger) -> Result<Self, SessionError> {
        let session = GameSession::from_config(&config)?;
        Ok(GameService {
            bot: Bot::new(config),
            session: Mutex::new(session),
            logger,
        })
    }

    pub fn view(&self) -> GameView {
        self.session.lock().view()
    }

    pub fn new_game(&self, request: &NewGameRequest) -> Result<GameView, SessionError> {
        let session = GameSession::from_request(request, self.bot.config())?;
        let view = session.view();
        info!(
            "New {}x{} game: Red {:?}, Blue {:?}, {:?}",
            view.rows, view.cols, view.red, view.blue, view.difficulty
        );
        self.session.lock().replace(session);
        Ok(view)
    }

    pub fn human_move(&self, position: Position) -> Result<MoveResponse, SessionError> {
        let mut session = self.session.lock();
        let outcome = session.human_move(position)?;
        self.logger.log_move(MoveLogEntry::new(
            &outcome,
            PlayerKind::Human,
            None,
            session.state().board(),
        ));
        Ok(MoveResponse {
            outcome,
            game: session.view(),
        })
    }

    /// Searches on a copy without holding the session lock, then applies the
    /// move if the game has not moved on in the meantime
    pub async fn ai_move(&self) -> Result<MoveResponse, SessionError> {
        let (ticket, difficulty) = {
            let session = self.session.lock();
            (session.ai_position()?, session.difficulty())
        };

        let result = match self.bot.get_move(&ticket.state, difficulty).await {
            BotReply::Move(result) => result,
            BotReply::NoResponse => {
                return Err(SessionError::NoResponse(
                    self.bot.config().timing.response_time_budget_ms,
                ))
            }
            BotReply::Failed(e) => return Err(e.into()),
        };

        let mut session = self.session.lock();
        let outcome = session.apply_ai_move(ticket.generation, result.best_move)?;
        self.logger.log_move(MoveLogEntry::new(
            &outcome,
            PlayerKind::Ai,
            Some(result.depth),
            session.state().board(),
        ));
        Ok(MoveResponse {
            outcome,
            game: session.view(),
        })
    }

    pub fn reset(&self) -> Result<GameView, SessionError> {
        let mut session = self.session.lock();
        session.reset(None)?;
        Ok(session.view())
    }

    /// Snapshot headed by whoever made the last move
    pub fn snapshot(&self) -> Snapshot {
        let session = self.session.lock();
        let state = session.state();
        let mover = if state.turn() == 0 {
            Mover::Human
        } else {
            match session.controller(state.current_color().opponent()) {
                PlayerKind::Human => Mover::Human,
                PlayerKind::Ai => Mover::Ai,
            }
        };
        session.snapshot(mover)
    }

    pub fn load_snapshot(&self, text: &str) -> Result<GameView, SessionError> {
        let snapshot = Snapshot::parse(text)?;
        let mut session = self.session.lock();
        session.load_snapshot(&snapshot)?;
        Ok(session.view())
    }
}

/// GET / endpoint
/// Returns server metadata and the supported options
#[get("/")]
pub fn index() -> Json<Value> {
    info!("INFO");

    let presets: Vec<String> = BoardPreset::all().iter().map(|p| p.to_string()).collect();
    Json(json!({
        "name": "chain-reaction",
        "version": env!("CARGO_PKG_VERSION"),
        "presets": presets,
        "difficulties": [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard],
        "players": [PlayerKind::Human, PlayerKind::Ai],
    }))
}

/// POST /games endpoint
/// Replaces the current game with a new one
#[post("/games", format = "json", data = "<request>")]
pub fn new_game(
    service: &State<GameService>,
    request: Json<NewGameRequest>,
) -> Result<Json<GameView>, ApiError> {
    Ok(Json(service.new_game(&request)?))
}

/// GET /games/current endpoint
#[get("/games/current")]
pub fn current_game(service: &State<GameService>) -> Json<GameView> {
    Json(service.view())
}

/// POST /games/current/move endpoint
/// Human placement for the side to move
#[post("/games/current/move", format = "json", data = "<move_req>")]
pub fn human_move(
    service: &State<GameService>,
    move_req: Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let position = Position::new(move_req.row, move_req.col);
    Ok(Json(service.human_move(position)?))
}

/// POST /games/current/ai-move endpoint
/// Lets the AI play for the side to move
#[post("/games/current/ai-move")]
pub async fn ai_move(service: &State<GameService>) -> Result<Json<MoveResponse>, ApiError> {
    Ok(Json(service.ai_move().await?))
}

/// POST /games/current/reset endpoint
#[post("/games/current/reset")]
pub fn reset(service: &State<GameService>) -> Result<Json<GameView>, ApiError> {
    Ok(Json(service.reset()?))
}

/// GET /games/current/snapshot endpoint
/// Board in the plain-text hand-off format
#[get("/games/current/snapshot")]
pub fn get_snapshot(service: &State<GameService>) -> String {
    service.snapshot().render()
}

/// PUT /games/current/snapshot endpoint
/// Bulk-loads the board from the plain-text hand-off format
#[put("/games/current/snapshot", data = "<body>")]
pub fn put_snapshot(service: &State<GameService>, body: String) -> Result<Json<GameView>, ApiError> {
    Ok(Json(service.load_snapshot(&body)?))
}

/// Rocket instance serving the game API
pub fn build_rocket(config: Config, logger: DebugLogger) -> Result<Rocket<Build>, SessionError> {
    let service = GameService::new(config, logger)?;

    Ok(rocket::build()
        .manage(service)
        .attach(AdHoc::on_response("Server ID Middleware", |_, res| {
            Box::pin(async move {
                res.set_raw_header("Server", "chain-reaction");
            })
        }))
        .mount(
            "/",
            routes![
                index,
                new_game,
                current_game,
                human_move,
                ai_move,
                reset,
                get_snapshot,
                put_snapshot
            ],
        ))
}
