//! Single binary web server: JSON REST API over the bracket engine.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, DEFAULT_ROUNDS_PER_MATCH.

use actix_web::{
    get, post, put,
    http::StatusCode,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use bracket_engine_web::{
    assignments_from_csv, check_grand_finals_reset, generate_bracket,
    generate_grand_finals_match, generate_grand_finals_reset_match,
    generate_losers_bracket_matches, generate_next_round_matches, get_current_round_info,
    is_round_complete, ordered_assignments, progression_channel, shuffled_assignments,
    BracketAssignment, BracketError, BracketType, Format, MatchId, MatchStore, MemoryStore,
    ProgressionHandle, TeamId, Tournament, TournamentId,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Shared handler state: the match store and the queue into the progression worker.
struct AppState {
    store: Arc<MemoryStore>,
    progression: ProgressionHandle,
    default_rounds_per_match: u32,
}

type State = Data<AppState>;

/// Settings read from the environment at startup.
struct ServerConfig {
    host: String,
    port: u16,
    default_rounds_per_match: u32,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            default_rounds_per_match: std::env::var("DEFAULT_ROUNDS_PER_MATCH")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    format: String,
    #[serde(default = "default_game_id")]
    game_id: String,
    rounds_per_match: Option<u32>,
    scheduled_start: Option<DateTime<Utc>>,
}

fn default_game_id() -> String {
    "generic".to_string()
}

/// Either explicit positions, or a plain team list (kept in order unless `shuffle`).
#[derive(Deserialize)]
struct GenerateBracketBody {
    assignments: Option<Vec<BracketAssignment>>,
    team_ids: Option<Vec<TeamId>>,
    #[serde(default)]
    shuffle: bool,
    start_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct SetWinnerBody {
    team_id: TeamId,
}

#[derive(Deserialize)]
struct NextRoundBody {
    round: u32,
    bracket_type: BracketType,
}

#[derive(Deserialize)]
struct LosersRouteBody {
    source_winners_round: u32,
    eliminated_team_ids: Vec<TeamId>,
}

#[derive(Deserialize)]
struct GrandFinalsBody {
    winners_bracket_champion: TeamId,
    losers_bracket_champion: TeamId,
}

#[derive(Deserialize)]
struct ResetCheckQuery {
    final_winner_id: TeamId,
    losers_bracket_champion_id: TeamId,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and match id.
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

#[derive(Deserialize)]
struct RoundPath {
    id: TournamentId,
    bracket_type: BracketType,
    round: u32,
}

/// Engine errors as `{ "error": ... }` with 400/404/500.
fn error_response(e: BracketError) -> HttpResponse {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    log::warn!("Request rejected ({}): {}", status.as_u16(), e);
    HttpResponse::build(status).json(serde_json::json!({ "error": e.to_string() }))
}

fn respond<T: serde::Serialize>(result: Result<T, BracketError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => error_response(e),
    }
}

/// Fetch a match and make sure it belongs to the tournament in the path.
fn match_in_tournament(state: &AppState, path: &TournamentMatchPath) -> Result<(), BracketError> {
    match state.store.get_match(path.match_id)? {
        Some(m) if m.tournament_id == path.id => Ok(()),
        _ => Err(BracketError::MatchNotFound(path.match_id)),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-engine-web",
    })
}

/// Create a tournament in `assign` state.
#[post("/api/tournaments")]
async fn api_create_tournament(state: State, body: Json<CreateTournamentBody>) -> HttpResponse {
    let result = (|| -> Result<Tournament, BracketError> {
        let format: Format = body.format.parse()?;
        let rounds = body
            .rounds_per_match
            .unwrap_or(state.default_rounds_per_match);
        let mut tournament =
            Tournament::new(body.name.trim(), format, body.game_id.clone(), rounds);
        tournament.scheduled_start = body.scheduled_start;
        tournament.validate()?;
        state.store.create_tournament(tournament.clone())?;
        log::info!("Created {} tournament {} ({})", format, tournament.id, tournament.name);
        Ok(tournament)
    })();
    respond(result)
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    let result = state
        .store
        .get_tournament(path.id)
        .map_err(BracketError::from)
        .and_then(|t| t.ok_or(BracketError::TournamentNotFound(path.id)));
    respond(result)
}

/// All matches of a tournament, ordered by bracket line, round and match order.
#[get("/api/tournaments/{id}/matches")]
async fn api_list_matches(state: State, path: Path<TournamentPath>) -> HttpResponse {
    let result = get_current_round_info(state.store.as_ref(), path.id).and_then(|_| {
        let mut matches = state.store.list_matches(path.id)?;
        matches.sort_by_key(|m| (m.bracket_type, m.round, m.match_order));
        Ok(matches)
    });
    respond(result)
}

#[get("/api/tournaments/{id}/rounds")]
async fn api_round_info(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(get_current_round_info(state.store.as_ref(), path.id))
}

#[get("/api/tournaments/{id}/rounds/{bracket_type}/{round}/complete")]
async fn api_round_complete(state: State, path: Path<RoundPath>) -> HttpResponse {
    let result = is_round_complete(state.store.as_ref(), path.id, path.round, path.bracket_type)
        .map(|complete| serde_json::json!({ "complete": complete }));
    respond(result)
}

/// Generate round 1 (format taken from the tournament).
#[post("/api/tournaments/{id}/bracket")]
async fn api_generate_bracket(
    state: State,
    path: Path<TournamentPath>,
    body: Json<GenerateBracketBody>,
) -> HttpResponse {
    let assignments = match (&body.assignments, &body.team_ids) {
        (Some(a), _) => a.clone(),
        (None, Some(teams)) if body.shuffle => shuffled_assignments(teams),
        (None, Some(teams)) => ordered_assignments(teams),
        (None, None) => Vec::new(),
    };
    respond(generate_bracket(
        state.store.as_ref(),
        path.id,
        &assignments,
        body.start_time,
    ))
}

/// Generate round 1 from a `position,team_id` CSV body.
#[post("/api/tournaments/{id}/bracket/csv")]
async fn api_generate_bracket_csv(
    state: State,
    path: Path<TournamentPath>,
    body: String,
) -> HttpResponse {
    let result = assignments_from_csv(body.as_bytes())
        .and_then(|a| generate_bracket(state.store.as_ref(), path.id, &a, None));
    respond(result)
}

/// Scoring stand-in: mark a match as being played.
#[put("/api/tournaments/{id}/matches/{match_id}/start")]
async fn api_start_match(state: State, path: Path<TournamentMatchPath>) -> HttpResponse {
    let result = match_in_tournament(&state, &path)
        .and_then(|_| Ok(state.store.start_match(path.match_id)?));
    respond(result)
}

/// Scoring stand-in: record the winner of a match.
#[put("/api/tournaments/{id}/matches/{match_id}/winner")]
async fn api_set_match_winner(
    state: State,
    path: Path<TournamentMatchPath>,
    body: Json<SetWinnerBody>,
) -> HttpResponse {
    let result = match_in_tournament(&state, &path)
        .and_then(|_| Ok(state.store.record_result(path.match_id, body.team_id)?));
    respond(result)
}

/// Progress everything currently possible (serialized through the worker).
#[post("/api/tournaments/{id}/advance")]
async fn api_advance(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.progression.advance(path.id).await)
}

#[post("/api/tournaments/{id}/rounds/next")]
async fn api_next_round(
    state: State,
    path: Path<TournamentPath>,
    body: Json<NextRoundBody>,
) -> HttpResponse {
    respond(generate_next_round_matches(
        state.store.as_ref(),
        path.id,
        body.round,
        body.bracket_type,
    ))
}

#[post("/api/tournaments/{id}/losers")]
async fn api_route_losers(
    state: State,
    path: Path<TournamentPath>,
    body: Json<LosersRouteBody>,
) -> HttpResponse {
    respond(generate_losers_bracket_matches(
        state.store.as_ref(),
        path.id,
        body.source_winners_round,
        &body.eliminated_team_ids,
    ))
}

#[post("/api/tournaments/{id}/grand-finals")]
async fn api_grand_finals(
    state: State,
    path: Path<TournamentPath>,
    body: Json<GrandFinalsBody>,
) -> HttpResponse {
    respond(generate_grand_finals_match(
        state.store.as_ref(),
        path.id,
        body.winners_bracket_champion,
        body.losers_bracket_champion,
    ))
}

#[post("/api/tournaments/{id}/grand-finals/reset")]
async fn api_grand_finals_reset(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(generate_grand_finals_reset_match(state.store.as_ref(), path.id))
}

#[get("/api/tournaments/{id}/grand-finals/reset-check")]
async fn api_grand_finals_reset_check(
    state: State,
    path: Path<TournamentPath>,
    query: Query<ResetCheckQuery>,
) -> HttpResponse {
    let result = check_grand_finals_reset(
        state.store.as_ref(),
        path.id,
        query.final_winner_id,
        query.losers_bracket_champion_id,
    )
    .map(|reset| serde_json::json!({ "reset": reset }));
    respond(result)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.as_str(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let store = Arc::new(MemoryStore::new());
    let (progression, worker) = progression_channel(
        store.clone(),
        bracket_engine_web::worker::DEFAULT_QUEUE_CAPACITY,
    );
    actix_web::rt::spawn(worker.run());

    let state = Data::new(AppState {
        store,
        progression,
        default_rounds_per_match: config.default_rounds_per_match,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_list_matches)
            .service(api_round_info)
            .service(api_round_complete)
            .service(api_generate_bracket)
            .service(api_generate_bracket_csv)
            .service(api_start_match)
            .service(api_set_match_winner)
            .service(api_advance)
            .service(api_next_round)
            .service(api_route_losers)
            .service(api_grand_finals)
            .service(api_grand_finals_reset)
            .service(api_grand_finals_reset_check)
    })
    .bind(bind)?
    .run()
    .await
}
